//! In-memory identity provider for workflow tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use keywarden_keys::{
    AccessKeyMetadata, Credential, IdentityProvider, IssuedAccessKey, KeyStatus, ProviderError,
    ProviderResult, User,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateUser,
    DeleteUser,
    ListAccessKeys,
    GetAccessKeyLastUsed,
    CreateAccessKey,
    DeleteAccessKey,
    ListGroupsForUser,
    AddUserToGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateUser(String),
    DeleteUser(String),
    ListAccessKeys(String),
    GetAccessKeyLastUsed(String),
    CreateAccessKey(String),
    DeleteAccessKey(String),
    ListGroupsForUser(String),
    AddUserToGroup(String, String),
}

struct StoredKey {
    metadata: AccessKeyMetadata,
    last_used: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    users: HashSet<String>,
    keys: Vec<StoredKey>,
    groups: HashMap<String, Vec<String>>,
    defined_groups: HashSet<String>,
    always: HashMap<Op, ProviderError>,
    scripted: HashMap<Op, VecDeque<Option<ProviderError>>>,
    calls: Vec<Call>,
    issued: u32,
}

pub struct MemoryIdentityProvider {
    state: Mutex<State>,
    key_limit: usize,
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - TimeDelta::days(days)
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            key_limit: 2,
        }
    }

    pub fn with_key_limit(mut self, limit: usize) -> Self {
        self.key_limit = limit;
        self
    }

    pub fn with_user(self, user_name: &str) -> Self {
        self.state.lock().unwrap().users.insert(user_name.to_string());
        self
    }

    pub fn with_key(
        self,
        user_name: &str,
        access_key_id: &str,
        created_at: DateTime<Utc>,
        last_used: Option<DateTime<Utc>>,
    ) -> Self {
        self.state.lock().unwrap().keys.push(StoredKey {
            metadata: AccessKeyMetadata {
                access_key_id: access_key_id.to_string(),
                user_name: user_name.to_string(),
                created_at,
                status: KeyStatus::Active,
            },
            last_used,
        });
        self
    }

    /// Groups that exist in the account; adding a user to any other group fails
    pub fn with_defined_groups(self, groups: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .defined_groups
            .extend(groups.iter().map(|g| g.to_string()));
        self
    }

    pub fn with_groups(self, user_name: &str, groups: &[&str]) -> Self {
        let provider = self.with_defined_groups(groups);
        provider.state.lock().unwrap().groups.insert(
            user_name.to_string(),
            groups.iter().map(|g| g.to_string()).collect(),
        );
        provider
    }

    /// Every call of `op` fails with `error`
    pub fn failing(self, op: Op, error: ProviderError) -> Self {
        self.state.lock().unwrap().always.insert(op, error);
        self
    }

    /// Successive calls of `op` take the next outcome; `None` behaves normally
    pub fn scripted(self, op: Op, outcomes: Vec<Option<ProviderError>>) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripted
            .insert(op, outcomes.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls()
            .iter()
            .filter(|call| call_op(call) == op)
            .count()
    }

    pub fn key_ids(&self, user_name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .keys
            .iter()
            .filter(|k| k.metadata.user_name == user_name)
            .map(|k| k.metadata.access_key_id.clone())
            .collect()
    }

    pub fn groups_of(&self, user_name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(user_name)
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, op: Op, call: Call) -> ProviderResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(error) = state.always.get(&op) {
            return Err(error.clone());
        }
        if let Some(Some(error)) = state.scripted.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        Ok(state)
    }
}

fn call_op(call: &Call) -> Op {
    match call {
        Call::CreateUser(_) => Op::CreateUser,
        Call::DeleteUser(_) => Op::DeleteUser,
        Call::ListAccessKeys(_) => Op::ListAccessKeys,
        Call::GetAccessKeyLastUsed(_) => Op::GetAccessKeyLastUsed,
        Call::CreateAccessKey(_) => Op::CreateAccessKey,
        Call::DeleteAccessKey(_) => Op::DeleteAccessKey,
        Call::ListGroupsForUser(_) => Op::ListGroupsForUser,
        Call::AddUserToGroup(_, _) => Op::AddUserToGroup,
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_user(&self, user_name: &str) -> ProviderResult<User> {
        let mut state = self.enter(Op::CreateUser, Call::CreateUser(user_name.to_string()))?;
        if !state.users.insert(user_name.to_string()) {
            return Err(ProviderError::AlreadyExists(format!(
                "User with name {} already exists.",
                user_name
            )));
        }
        Ok(User {
            user_name: user_name.to_string(),
            user_id: format!("AIDA{}", user_name.to_uppercase()),
            arn: format!("arn:aws:iam::123456789012:user/{}", user_name),
            created_at: Some(Utc::now()),
        })
    }

    async fn delete_user(&self, user_name: &str) -> ProviderResult<()> {
        let mut state = self.enter(Op::DeleteUser, Call::DeleteUser(user_name.to_string()))?;
        if !state.users.remove(user_name) {
            return Err(ProviderError::NoSuchEntity(user_name.to_string()));
        }
        Ok(())
    }

    async fn list_access_keys(&self, user_name: &str) -> ProviderResult<Vec<AccessKeyMetadata>> {
        let state = self.enter(Op::ListAccessKeys, Call::ListAccessKeys(user_name.to_string()))?;
        Ok(state
            .keys
            .iter()
            .filter(|k| k.metadata.user_name == user_name)
            .map(|k| k.metadata.clone())
            .collect())
    }

    async fn get_access_key_last_used(
        &self,
        access_key_id: &str,
    ) -> ProviderResult<Option<DateTime<Utc>>> {
        let state = self.enter(
            Op::GetAccessKeyLastUsed,
            Call::GetAccessKeyLastUsed(access_key_id.to_string()),
        )?;
        state
            .keys
            .iter()
            .find(|k| k.metadata.access_key_id == access_key_id)
            .map(|k| k.last_used)
            .ok_or_else(|| ProviderError::NoSuchEntity(access_key_id.to_string()))
    }

    async fn create_access_key(&self, user_name: &str) -> ProviderResult<IssuedAccessKey> {
        let mut state = self.enter(Op::CreateAccessKey, Call::CreateAccessKey(user_name.to_string()))?;
        if !state.users.contains(user_name) {
            return Err(ProviderError::NoSuchEntity(user_name.to_string()));
        }
        let existing = state
            .keys
            .iter()
            .filter(|k| k.metadata.user_name == user_name)
            .count();
        if existing >= self.key_limit {
            return Err(ProviderError::LimitExceeded(format!(
                "Cannot exceed quota for AccessKeysPerUser: {}",
                self.key_limit
            )));
        }

        state.issued += 1;
        let access_key_id = format!("AKIANEW{}", state.issued);
        let created_at = Utc::now();
        state.keys.push(StoredKey {
            metadata: AccessKeyMetadata {
                access_key_id: access_key_id.clone(),
                user_name: user_name.to_string(),
                created_at,
                status: KeyStatus::Active,
            },
            last_used: None,
        });

        Ok(IssuedAccessKey {
            user_name: user_name.to_string(),
            status: KeyStatus::Active,
            created_at: Some(created_at),
            credential: Credential::new(access_key_id, format!("secret-{}", state.issued)),
        })
    }

    async fn delete_access_key(&self, access_key_id: &str, user_name: &str) -> ProviderResult<()> {
        let mut state = self.enter(
            Op::DeleteAccessKey,
            Call::DeleteAccessKey(access_key_id.to_string()),
        )?;
        let before = state.keys.len();
        state.keys.retain(|k| {
            !(k.metadata.access_key_id == access_key_id && k.metadata.user_name == user_name)
        });
        if state.keys.len() == before {
            return Err(ProviderError::NoSuchEntity(access_key_id.to_string()));
        }
        Ok(())
    }

    async fn list_groups_for_user(&self, user_name: &str) -> ProviderResult<Vec<String>> {
        let state = self.enter(
            Op::ListGroupsForUser,
            Call::ListGroupsForUser(user_name.to_string()),
        )?;
        Ok(state.groups.get(user_name).cloned().unwrap_or_default())
    }

    async fn add_user_to_group(&self, user_name: &str, group_name: &str) -> ProviderResult<()> {
        let mut state = self.enter(
            Op::AddUserToGroup,
            Call::AddUserToGroup(user_name.to_string(), group_name.to_string()),
        )?;
        if !state.defined_groups.contains(group_name) {
            return Err(ProviderError::NoSuchEntity(format!(
                "The group with name {} cannot be found.",
                group_name
            )));
        }
        state
            .groups
            .entry(user_name.to_string())
            .or_default()
            .push(group_name.to_string());
        Ok(())
    }
}
