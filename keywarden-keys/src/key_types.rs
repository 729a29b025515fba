//! Access key type definitions
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


use chrono::{DateTime, Utc};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Provider-issued access key identifier
pub type AccessKeyId = String;

/// Access key status as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStatus {
    Active,
    Inactive,
}

impl KeyStatus {
    /// Parse the provider's status string
    pub fn from_provider(status: &str) -> Option<Self> {
        match status {
            "Active" => Some(KeyStatus::Active),
            "Inactive" => Some(KeyStatus::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Active => "Active",
            KeyStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An IAM user as returned by user creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_name: String,
    pub user_id: String,
    pub arn: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Access key metadata as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyMetadata {
    pub access_key_id: AccessKeyId,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub status: KeyStatus,
}

/// An access key together with its last recorded use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub access_key_id: AccessKeyId,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
    pub status: KeyStatus,
    /// Last use reported by the provider, `None` if the key was never used
    pub last_used: Option<DateTime<Utc>>,
}

impl AccessKey {
    pub fn new(metadata: AccessKeyMetadata, last_used: Option<DateTime<Utc>>) -> Self {
        Self {
            access_key_id: metadata.access_key_id,
            user_name: metadata.user_name,
            created_at: metadata.created_at,
            status: metadata.status,
            last_used,
        }
    }

    /// Last use if the provider recorded one, otherwise the creation time.
    ///
    /// A provider-reported value is authoritative even when it precedes
    /// `created_at`.
    pub fn effective_last_used(&self) -> DateTime<Utc> {
        self.last_used.unwrap_or(self.created_at)
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ID:{} CreateAt:{} lastUsed:{}}}",
            self.access_key_id,
            self.created_at.to_rfc3339(),
            self.effective_last_used().to_rfc3339()
        )
    }
}

/// Secret material of a freshly created access key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    pub access_key_id: AccessKeyId,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credential {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a successful access key creation
#[derive(Debug, Clone)]
pub struct IssuedAccessKey {
    pub user_name: String,
    pub status: KeyStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub credential: Credential,
}

impl IssuedAccessKey {
    pub fn access_key_id(&self) -> &str {
        &self.credential.access_key_id
    }
}
