//! Record of what a provisioning run did
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::key_types::{AccessKey, Credential, IssuedAccessKey, User};
use std::fmt;

/// How the user step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOutcome {
    Created(User),
    AlreadyExists,
}

/// Provider-side changes made by one run, complete or partial.
///
/// Nothing here is rolled back on failure.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub user_name: String,
    pub user: Option<UserOutcome>,
    pub groups_added: Vec<String>,
    /// First key creation hit the per-user quota
    pub quota_exceeded: bool,
    pub retired_key: Option<AccessKey>,
    pub issued_key: Option<IssuedAccessKey>,
}

impl ProvisionReport {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user: None,
            groups_added: Vec::new(),
            quota_exceeded: false,
            retired_key: None,
            issued_key: None,
        }
    }

    pub fn rotated(&self) -> bool {
        self.retired_key.is_some() && self.issued_key.is_some()
    }

    /// A key was deleted and nothing replaced it
    pub fn retired_without_replacement(&self) -> bool {
        self.retired_key.is_some() && self.issued_key.is_none()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.issued_key.as_ref().map(|issued| &issued.credential)
    }
}

// Secrets are never rendered here
impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(UserOutcome::Created(user)) => {
                writeln!(f, "Created user {} ({})", user.user_name, user.arn)?
            }
            Some(UserOutcome::AlreadyExists) => {
                writeln!(f, "User {} already exists", self.user_name)?
            }
            None => writeln!(f, "User {} not created", self.user_name)?,
        }
        for group in &self.groups_added {
            writeln!(f, "Added {} to group {}", self.user_name, group)?;
        }
        if self.quota_exceeded {
            writeln!(f, "Access key quota exceeded for {}", self.user_name)?;
        }
        if let Some(key) = &self.retired_key {
            writeln!(f, "Deleted access key {}", key)?;
        }
        match &self.issued_key {
            Some(issued) => write!(
                f,
                "Created access key {} ({})",
                issued.access_key_id(),
                issued.status
            ),
            None => write!(f, "No access key created"),
        }
    }
}
