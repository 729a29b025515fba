//! Error types for access key provisioning
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


use crate::policy::NotExpired;
use crate::report::ProvisionReport;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by an identity provider backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("No such entity: {0}")]
    NoSuchEntity(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider request failed: {0}")]
    Service(String),
}

/// Result type for identity provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A read-only provider call failed
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Failed to list access keys of user {user_name}")]
    AccessKeys {
        user_name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to read last use of access key {access_key_id} (user {user_name})")]
    LastUsed {
        user_name: String,
        access_key_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to list groups of user {user_name}")]
    Groups {
        user_name: String,
        #[source]
        source: ProviderError,
    },
}

/// Rotation policy errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Cannot choose a rotation candidate from an empty key catalog")]
    EmptyCatalog,

    #[error("Key expiration {0:?} is out of range")]
    ThresholdOutOfRange(std::time::Duration),
}

/// Provisioning workflow errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("User {0} already exists")]
    UserExists(String),

    #[error("Failed to create user {user_name}")]
    UserCreation {
        user_name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to add user {user_name} to group {group_name}")]
    Membership {
        user_name: String,
        group_name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Access key quota exceeded for user {user_name} and rotation is not permitted")]
    Quota {
        user_name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to create access key for user {user_name}")]
    KeyCreation {
        user_name: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Access key quota exceeded for user {0} but the user has no access keys")]
    EmptyCatalog(String),

    #[error("Rotation blocked for user {user_name}: {reason}")]
    RotationBlocked { user_name: String, reason: NotExpired },

    #[error("Failed to delete access key {access_key_id} of user {user_name}")]
    Deletion {
        user_name: String,
        access_key_id: String,
        #[source]
        source: ProviderError,
    },

    #[error(
        "Access key {retired_key_id} of user {user_name} was deleted but no replacement could be created"
    )]
    ReplacementCreation {
        user_name: String,
        retired_key_id: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// A failed provisioning run together with whatever it completed before failing
#[derive(Error, Debug)]
#[error("Provisioning of user {} failed", .report.user_name)]
pub struct ProvisionFailure {
    pub report: ProvisionReport,
    #[source]
    pub error: ProvisionError,
}

impl ProvisionFailure {
    pub fn new(report: ProvisionReport, error: ProvisionError) -> Self {
        Self { report, error }
    }
}

/// Shared credentials file errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User home directory not found")]
    HomeNotFound,

    #[error("Failed to {action} shared credentials file {}", .path.display())]
    Persist {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse shared credentials file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::ParseError,
    },
}

/// Result type for shared credentials file operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors building an authenticated provider session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("TLS initialization failed: {0}")]
    Tls(#[from] rusoto_core::request::TlsError),

    #[error("Credentials error: {0}")]
    Credentials(#[from] rusoto_credential::CredentialsError),

    #[error("Session duration must be between 900 and 3600 seconds, got {0}")]
    InvalidDuration(u64),
}
