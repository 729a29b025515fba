//! Authenticated IAM client construction
//!
//! Without a role ARN the default credential chain is used. With one, the
//! client signs with temporary credentials from an STS assume-role session.
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


use crate::error::SessionError;
use rusoto_core::{request::HttpClient, Region};
use rusoto_credential::{AutoRefreshingProvider, DefaultCredentialsProvider};
use rusoto_iam::IamClient;
use rusoto_sts::{StsAssumeRoleSessionCredentialsProvider, StsClient};
use tracing::info;

pub const MIN_SESSION_DURATION_SECS: u64 = 900;
pub const MAX_SESSION_DURATION_SECS: u64 = 3600;
pub const DEFAULT_SESSION_DURATION_SECS: u64 = MAX_SESSION_DURATION_SECS;

/// Role assumption parameters. Empty strings count as unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub role_arn: Option<String>,
    pub role_session_name: Option<String>,
    pub duration_secs: u64,
    pub external_id: Option<String>,
    /// Session policy in JSON
    pub policy: Option<String>,
    /// MFA device serial number
    pub serial_number: Option<String>,
    /// MFA token code
    pub token_code: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role_arn: None,
            role_session_name: None,
            duration_secs: DEFAULT_SESSION_DURATION_SECS,
            external_id: None,
            policy: None,
            serial_number: None,
            token_code: None,
        }
    }
}

impl SessionConfig {
    pub fn role_arn(&self) -> Option<&str> {
        non_empty(&self.role_arn)
    }

    /// Configured session name, else `<role-name>-<local user>`
    pub fn session_name(&self, local_user: Option<&str>) -> Option<String> {
        let role_arn = self.role_arn()?;
        Some(
            non_empty(&self.role_session_name)
                .map(str::to_string)
                .unwrap_or_else(|| default_session_name(role_arn, local_user)),
        )
    }

    /// An MFA device serial number is set
    pub fn uses_mfa(&self) -> bool {
        non_empty(&self.serial_number).is_some()
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if !(MIN_SESSION_DURATION_SECS..=MAX_SESSION_DURATION_SECS).contains(&self.duration_secs) {
            return Err(SessionError::InvalidDuration(self.duration_secs));
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Role name is the ARN suffix after the last `/`
pub fn role_name(role_arn: &str) -> &str {
    role_arn.rsplit('/').next().unwrap_or(role_arn)
}

pub fn default_session_name(role_arn: &str, local_user: Option<&str>) -> String {
    match local_user.filter(|u| !u.is_empty()) {
        Some(user) => format!("{}-{}", role_name(role_arn), user),
        None => role_name(role_arn).to_string(),
    }
}

/// Build an IAM client for the configured session
pub fn build_iam_client(config: &SessionConfig) -> Result<IamClient, SessionError> {
    let region = Region::default();

    let Some(role_arn) = config.role_arn() else {
        info!("Using default credential chain");
        let credentials = DefaultCredentialsProvider::new()?;
        return Ok(IamClient::new_with(HttpClient::new()?, credentials, region));
    };

    config.validate()?;
    let local_user = std::env::var("USER").ok();
    let session_name = config
        .session_name(local_user.as_deref())
        .unwrap_or_else(|| role_name(role_arn).to_string());

    info!(
        role_arn = role_arn,
        session_name = %session_name,
        duration_secs = config.duration_secs,
        mfa = config.uses_mfa(),
        "Assuming role"
    );

    let sts = StsClient::new_with(
        HttpClient::new()?,
        DefaultCredentialsProvider::new()?,
        region.clone(),
    );
    let mut provider = StsAssumeRoleSessionCredentialsProvider::new(
        sts,
        role_arn.to_string(),
        session_name,
        non_empty(&config.external_id).map(str::to_string),
        Some(chrono::Duration::seconds(config.duration_secs as i64)),
        non_empty(&config.policy).map(str::to_string),
        non_empty(&config.serial_number).map(str::to_string),
    );
    if let Some(code) = non_empty(&config.token_code) {
        provider.set_mfa_code(code);
    }

    let credentials = AutoRefreshingProvider::new(provider)?;
    Ok(IamClient::new_with(HttpClient::new()?, credentials, region))
}
