//! Identity provider interface
//!
//! Capability trait over the IAM operations provisioning needs. The AWS
//! implementation lives in [`crate::aws`]; tests drive the workflow through an
//! in-memory implementation instead of the network.
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


use crate::error::ProviderResult;
use crate::key_types::{AccessKeyMetadata, IssuedAccessKey, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for identity provider backends
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a user; `ProviderError::AlreadyExists` if the name is taken
    async fn create_user(&self, user_name: &str) -> ProviderResult<User>;

    /// Delete a user
    async fn delete_user(&self, user_name: &str) -> ProviderResult<()>;

    /// List every access key of a user, in provider order
    async fn list_access_keys(&self, user_name: &str) -> ProviderResult<Vec<AccessKeyMetadata>>;

    /// Last recorded use of an access key, `None` if it was never used
    async fn get_access_key_last_used(
        &self,
        access_key_id: &str,
    ) -> ProviderResult<Option<DateTime<Utc>>>;

    /// Create an access key; `ProviderError::LimitExceeded` when the user is at quota
    async fn create_access_key(&self, user_name: &str) -> ProviderResult<IssuedAccessKey>;

    /// Delete an access key
    async fn delete_access_key(&self, access_key_id: &str, user_name: &str) -> ProviderResult<()>;

    /// Names of the groups the user belongs to
    async fn list_groups_for_user(&self, user_name: &str) -> ProviderResult<Vec<String>>;

    /// Add the user to a group
    async fn add_user_to_group(&self, user_name: &str, group_name: &str) -> ProviderResult<()>;
}
