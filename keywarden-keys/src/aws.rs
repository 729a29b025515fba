//! AWS IAM identity provider
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


use crate::error::{ProviderError, ProviderResult, SessionError};
use crate::key_types::{AccessKeyMetadata, Credential, IssuedAccessKey, KeyStatus, User};
use crate::provider::IdentityProvider;
use crate::session::{build_iam_client, SessionConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusoto_core::RusotoError;
use rusoto_iam::{
    AddUserToGroupRequest, CreateAccessKeyError, CreateAccessKeyRequest, CreateUserError,
    CreateUserRequest, DeleteAccessKeyError, DeleteAccessKeyRequest, DeleteUserRequest,
    GetAccessKeyLastUsedRequest, Iam, IamClient, ListAccessKeysError, ListAccessKeysRequest,
    ListGroupsForUserRequest,
};
use tracing::debug;

/// Identity provider backed by the IAM API
pub struct AwsIdentityProvider {
    client: IamClient,
}

impl AwsIdentityProvider {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }

    /// Build a provider for the configured session
    pub fn from_session(config: &SessionConfig) -> Result<Self, SessionError> {
        Ok(Self::new(build_iam_client(config)?))
    }
}

#[async_trait]
impl IdentityProvider for AwsIdentityProvider {
    async fn create_user(&self, user_name: &str) -> ProviderResult<User> {
        let response = self
            .client
            .create_user(CreateUserRequest {
                user_name: user_name.to_string(),
                ..Default::default()
            })
            .await
            .map_err(map_create_user_error)?;

        let user = response
            .user
            .ok_or_else(|| ProviderError::InvalidResponse("CreateUser returned no user".to_string()))?;
        Ok(User {
            created_at: parse_timestamp(&user.create_date).ok(),
            user_name: user.user_name,
            user_id: user.user_id,
            arn: user.arn,
        })
    }

    async fn delete_user(&self, user_name: &str) -> ProviderResult<()> {
        self.client
            .delete_user(DeleteUserRequest {
                user_name: user_name.to_string(),
            })
            .await
            .map_err(service_error)
    }

    async fn list_access_keys(&self, user_name: &str) -> ProviderResult<Vec<AccessKeyMetadata>> {
        let mut keys = Vec::new();
        let mut marker = None;

        loop {
            let response = self
                .client
                .list_access_keys(ListAccessKeysRequest {
                    user_name: Some(user_name.to_string()),
                    marker: marker.take(),
                    ..Default::default()
                })
                .await
                .map_err(map_list_access_keys_error)?;

            for metadata in response.access_key_metadata {
                keys.push(convert_metadata(metadata, user_name)?);
            }

            match (response.is_truncated, response.marker) {
                (Some(true), Some(next)) => marker = Some(next),
                _ => break,
            }
        }

        debug!(user_name = user_name, count = keys.len(), "Listed access keys");
        Ok(keys)
    }

    async fn get_access_key_last_used(
        &self,
        access_key_id: &str,
    ) -> ProviderResult<Option<DateTime<Utc>>> {
        let response = self
            .client
            .get_access_key_last_used(GetAccessKeyLastUsedRequest {
                access_key_id: access_key_id.to_string(),
            })
            .await
            .map_err(service_error)?;

        match response.access_key_last_used {
            Some(last_used) if !last_used.last_used_date.is_empty() => {
                parse_timestamp(&last_used.last_used_date).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn create_access_key(&self, user_name: &str) -> ProviderResult<IssuedAccessKey> {
        let response = self
            .client
            .create_access_key(CreateAccessKeyRequest {
                user_name: Some(user_name.to_string()),
            })
            .await
            .map_err(map_create_access_key_error)?;

        let key = response.access_key;
        let status = parse_status(&key.status)?;
        let created_at = key.create_date.as_deref().map(parse_timestamp).transpose()?;
        Ok(IssuedAccessKey {
            user_name: key.user_name,
            status,
            created_at,
            credential: Credential::new(key.access_key_id, key.secret_access_key),
        })
    }

    async fn delete_access_key(&self, access_key_id: &str, user_name: &str) -> ProviderResult<()> {
        self.client
            .delete_access_key(DeleteAccessKeyRequest {
                access_key_id: access_key_id.to_string(),
                user_name: Some(user_name.to_string()),
            })
            .await
            .map_err(map_delete_access_key_error)
    }

    async fn list_groups_for_user(&self, user_name: &str) -> ProviderResult<Vec<String>> {
        let mut groups = Vec::new();
        let mut marker = None;

        loop {
            let response = self
                .client
                .list_groups_for_user(ListGroupsForUserRequest {
                    user_name: user_name.to_string(),
                    marker: marker.take(),
                    ..Default::default()
                })
                .await
                .map_err(service_error)?;

            groups.extend(response.groups.into_iter().map(|g| g.group_name));

            match (response.is_truncated, response.marker) {
                (Some(true), Some(next)) => marker = Some(next),
                _ => break,
            }
        }

        Ok(groups)
    }

    async fn add_user_to_group(&self, user_name: &str, group_name: &str) -> ProviderResult<()> {
        self.client
            .add_user_to_group(AddUserToGroupRequest {
                group_name: group_name.to_string(),
                user_name: user_name.to_string(),
            })
            .await
            .map_err(service_error)
    }
}

fn parse_timestamp(value: &str) -> ProviderResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ProviderError::InvalidResponse(format!("Invalid timestamp {:?}: {}", value, e)))
}

fn parse_status(value: &str) -> ProviderResult<KeyStatus> {
    KeyStatus::from_provider(value)
        .ok_or_else(|| ProviderError::InvalidResponse(format!("Unknown access key status {:?}", value)))
}

fn convert_metadata(
    metadata: rusoto_iam::AccessKeyMetadata,
    user_name: &str,
) -> ProviderResult<AccessKeyMetadata> {
    let access_key_id = metadata
        .access_key_id
        .ok_or_else(|| ProviderError::InvalidResponse("Access key without id".to_string()))?;
    let created_at = metadata
        .create_date
        .as_deref()
        .map(parse_timestamp)
        .transpose()?
        .ok_or_else(|| {
            ProviderError::InvalidResponse(format!("Access key {} without creation date", access_key_id))
        })?;
    let status = match metadata.status.as_deref() {
        Some(status) => parse_status(status)?,
        None => KeyStatus::Active,
    };

    Ok(AccessKeyMetadata {
        access_key_id,
        user_name: metadata.user_name.unwrap_or_else(|| user_name.to_string()),
        created_at,
        status,
    })
}

fn service_error<E: std::error::Error + 'static>(error: RusotoError<E>) -> ProviderError {
    ProviderError::Service(error.to_string())
}

fn map_create_user_error(error: RusotoError<CreateUserError>) -> ProviderError {
    match error {
        RusotoError::Service(CreateUserError::EntityAlreadyExists(message)) => {
            ProviderError::AlreadyExists(message)
        }
        RusotoError::Service(CreateUserError::LimitExceeded(message)) => {
            ProviderError::LimitExceeded(message)
        }
        other => service_error(other),
    }
}

fn map_create_access_key_error(error: RusotoError<CreateAccessKeyError>) -> ProviderError {
    match error {
        RusotoError::Service(CreateAccessKeyError::LimitExceeded(message)) => {
            ProviderError::LimitExceeded(message)
        }
        RusotoError::Service(CreateAccessKeyError::NoSuchEntity(message)) => {
            ProviderError::NoSuchEntity(message)
        }
        other => service_error(other),
    }
}

fn map_delete_access_key_error(error: RusotoError<DeleteAccessKeyError>) -> ProviderError {
    match error {
        RusotoError::Service(DeleteAccessKeyError::NoSuchEntity(message)) => {
            ProviderError::NoSuchEntity(message)
        }
        other => service_error(other),
    }
}

fn map_list_access_keys_error(error: RusotoError<ListAccessKeysError>) -> ProviderError {
    match error {
        RusotoError::Service(ListAccessKeysError::NoSuchEntity(message)) => {
            ProviderError::NoSuchEntity(message)
        }
        other => service_error(other),
    }
}
