//! User and access key provisioning
//!
//! Steps run strictly in order, each awaited before the next:
//! 1. create the user (an existing user is accepted only when allowed)
//! 2. join the allowlisted groups the user lacks
//! 3. create an access key
//! 4. on quota, retire the least recently used key and create again
//!
//! Every provider mutation is irreversible. At most one key is deleted per
//! run, and no creation is attempted after a failed deletion.
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


use crate::catalog::KeyCatalog;
use crate::error::{LookupError, ProviderError, ProvisionError, ProvisionFailure};
use crate::key_types::AccessKey;
use crate::membership::lacking_groups;
use crate::policy::{RotationDecision, RotationPolicy};
use crate::provider::IdentityProvider;
use crate::report::{ProvisionReport, UserOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Default minimum idle time before a key may be retired
pub const DEFAULT_KEY_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Parameters of one provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub user_name: String,
    /// Accept an existing user and rotate its keys when at quota
    pub allow_existing_user: bool,
    pub key_expiration: Duration,
    /// Groups the user must belong to; empty skips the group step
    pub groups: Vec<String>,
}

impl ProvisionConfig {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            allow_existing_user: false,
            key_expiration: DEFAULT_KEY_EXPIRATION,
            groups: Vec::new(),
        }
    }

    pub fn allow_existing_user(mut self, allow: bool) -> Self {
        self.allow_existing_user = allow;
        self
    }

    pub fn key_expiration(mut self, expiration: Duration) -> Self {
        self.key_expiration = expiration;
        self
    }

    pub fn groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }
}

/// Drives provisioning against an identity provider
pub struct ProvisionWorkflow<P: ?Sized> {
    provider: Arc<P>,
}

impl<P> ProvisionWorkflow<P>
where
    P: IdentityProvider + ?Sized,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Run every step. A failure carries the report of what already happened.
    pub async fn provision(
        &self,
        config: &ProvisionConfig,
    ) -> Result<ProvisionReport, ProvisionFailure> {
        let mut report = ProvisionReport::new(&config.user_name);

        let policy = match RotationPolicy::from_std(config.key_expiration) {
            Ok(policy) => policy,
            Err(e) => return Err(ProvisionFailure::new(report, e.into())),
        };

        info!(
            user_name = %config.user_name,
            allow_existing_user = config.allow_existing_user,
            key_expiration = %humantime::format_duration(config.key_expiration),
            "Provisioning user"
        );

        match self.run(config, &policy, &mut report).await {
            Ok(()) => Ok(report),
            Err(error) => Err(ProvisionFailure::new(report, error)),
        }
    }

    async fn run(
        &self,
        config: &ProvisionConfig,
        policy: &RotationPolicy,
        report: &mut ProvisionReport,
    ) -> Result<(), ProvisionError> {
        let user_name = config.user_name.as_str();

        report.user = Some(self.create_user(config).await?);
        self.join_groups(config, report).await?;

        match self.provider.create_access_key(user_name).await {
            Ok(issued) => {
                info!(
                    user_name = user_name,
                    access_key_id = issued.access_key_id(),
                    "Created access key"
                );
                report.issued_key = Some(issued);
                return Ok(());
            }
            Err(ProviderError::LimitExceeded(message)) if config.allow_existing_user => {
                warn!(
                    user_name = user_name,
                    message = %message,
                    "Access key quota exceeded, attempting rotation"
                );
                report.quota_exceeded = true;
            }
            Err(source @ ProviderError::LimitExceeded(_)) => {
                return Err(ProvisionError::Quota {
                    user_name: user_name.to_string(),
                    source,
                });
            }
            Err(source) => {
                return Err(ProvisionError::KeyCreation {
                    user_name: user_name.to_string(),
                    source,
                });
            }
        }

        let retired = self.retire_oldest_key(user_name, policy).await?;
        let retired_key_id = retired.access_key_id.clone();
        report.retired_key = Some(retired);

        let issued = self
            .provider
            .create_access_key(user_name)
            .await
            .map_err(|source| {
                error!(
                    user_name = user_name,
                    retired_access_key_id = %retired_key_id,
                    error = %source,
                    "Access key deleted but replacement creation failed"
                );
                ProvisionError::ReplacementCreation {
                    user_name: user_name.to_string(),
                    retired_key_id: retired_key_id.clone(),
                    source,
                }
            })?;

        info!(
            user_name = user_name,
            retired_access_key_id = %retired_key_id,
            access_key_id = issued.access_key_id(),
            "Rotated access key"
        );
        report.issued_key = Some(issued);
        Ok(())
    }

    async fn create_user(&self, config: &ProvisionConfig) -> Result<UserOutcome, ProvisionError> {
        let user_name = config.user_name.as_str();
        match self.provider.create_user(user_name).await {
            Ok(user) => {
                info!(user_name = user_name, arn = %user.arn, "Created user");
                Ok(UserOutcome::Created(user))
            }
            Err(ProviderError::AlreadyExists(_)) if config.allow_existing_user => {
                info!(user_name = user_name, "User already exists, continuing");
                Ok(UserOutcome::AlreadyExists)
            }
            Err(ProviderError::AlreadyExists(_)) => {
                Err(ProvisionError::UserExists(user_name.to_string()))
            }
            Err(source) => Err(ProvisionError::UserCreation {
                user_name: user_name.to_string(),
                source,
            }),
        }
    }

    async fn join_groups(
        &self,
        config: &ProvisionConfig,
        report: &mut ProvisionReport,
    ) -> Result<(), ProvisionError> {
        if config.groups.is_empty() {
            return Ok(());
        }
        let user_name = config.user_name.as_str();

        let current = self
            .provider
            .list_groups_for_user(user_name)
            .await
            .map_err(|source| LookupError::Groups {
                user_name: user_name.to_string(),
                source,
            })?;

        for group_name in lacking_groups(&config.groups, &current) {
            self.provider
                .add_user_to_group(user_name, &group_name)
                .await
                .map_err(|source| ProvisionError::Membership {
                    user_name: user_name.to_string(),
                    group_name: group_name.clone(),
                    source,
                })?;
            info!(user_name = user_name, group = %group_name, "Added user to group");
            report.groups_added.push(group_name);
        }
        Ok(())
    }

    /// Delete the least recently used key if the policy allows it
    async fn retire_oldest_key(
        &self,
        user_name: &str,
        policy: &RotationPolicy,
    ) -> Result<AccessKey, ProvisionError> {
        let catalog = KeyCatalog::build(self.provider.as_ref(), user_name).await?;
        if catalog.is_empty() {
            return Err(ProvisionError::EmptyCatalog(user_name.to_string()));
        }

        let candidate = match policy.decide(&catalog)? {
            RotationDecision::Retire(key) => key,
            RotationDecision::Blocked(reason) => {
                warn!(user_name = user_name, reason = %reason, "Rotation blocked");
                return Err(ProvisionError::RotationBlocked {
                    user_name: user_name.to_string(),
                    reason,
                });
            }
        };

        info!(
            user_name = user_name,
            access_key_id = %candidate.access_key_id,
            last_used = %candidate.effective_last_used().to_rfc3339(),
            "Deleting least recently used access key"
        );
        self.provider
            .delete_access_key(&candidate.access_key_id, &candidate.user_name)
            .await
            .map_err(|source| ProvisionError::Deletion {
                user_name: user_name.to_string(),
                access_key_id: candidate.access_key_id.clone(),
                source,
            })?;

        Ok(candidate)
    }
}
