//! Access key lifecycle management for keywarden
//!
//! Provisions IAM users, issues their access keys, rotates the least recently
//! used key when the per-user quota is reached, and stores new secrets in the
//! shared credentials file.
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


pub mod aws;
pub mod catalog;
pub mod credential_store;
pub mod error;
pub mod key_types;
pub mod membership;
pub mod policy;
pub mod provider;
pub mod report;
pub mod session;
pub mod workflow;

pub use aws::AwsIdentityProvider;
pub use catalog::KeyCatalog;
pub use credential_store::{ProfileRecord, SharedCredentialsFile};
pub use error::{
    LookupError, PolicyError, ProviderError, ProviderResult, ProvisionError, ProvisionFailure,
    SessionError, StoreError, StoreResult,
};
pub use key_types::{AccessKey, AccessKeyId, AccessKeyMetadata, Credential, IssuedAccessKey, KeyStatus, User};
pub use policy::{NotExpired, RotationDecision, RotationPolicy};
pub use provider::IdentityProvider;
pub use report::{ProvisionReport, UserOutcome};
pub use session::SessionConfig;
pub use workflow::{ProvisionConfig, ProvisionWorkflow};
