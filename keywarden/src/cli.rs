//! Command line interface
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


use clap::Parser;
use keywarden_config::AppConfig;
use keywarden_keys::membership::parse_group_list;
use keywarden_keys::session::{
    DEFAULT_SESSION_DURATION_SECS, MAX_SESSION_DURATION_SECS, MIN_SESSION_DURATION_SECS,
};
use keywarden_keys::workflow::DEFAULT_KEY_EXPIRATION;
use keywarden_keys::{ProvisionConfig, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "keywarden", version)]
#[command(about = "Create an IAM user and issue it a fresh access key", long_about = None)]
pub struct Cli {
    /// User name to provision
    #[arg(long, alias = "addUser", value_name = "NAME")]
    pub add_user: String,

    /// Comma separated groups to add the user to; none unless given
    #[arg(long, value_name = "GROUPS")]
    pub group: Option<String>,

    /// Role to assume, e.g. arn:aws:iam::123456789012:role/role-name
    #[arg(long, alias = "assumeRole", value_name = "ARN")]
    pub assume_role: Option<String>,

    /// Role session name [default: <role-name>-$USER]
    #[arg(long, alias = "roleSessionName")]
    pub role_session_name: Option<String>,

    /// Assumed role session duration in seconds
    #[arg(
        long,
        alias = "durationSec",
        default_value_t = DEFAULT_SESSION_DURATION_SECS,
        value_parser = clap::value_parser!(u64).range(MIN_SESSION_DURATION_SECS..=MAX_SESSION_DURATION_SECS)
    )]
    pub duration_sec: u64,

    /// External ID for the assumed role
    #[arg(long, alias = "externalId")]
    pub external_id: Option<String>,

    /// Session policy in JSON
    #[arg(long)]
    pub policy: Option<String>,

    /// MFA device serial number
    #[arg(long, alias = "serialNumber")]
    pub serial_number: Option<String>,

    /// MFA token code
    #[arg(long, alias = "tokencode")]
    pub token_code: Option<String>,

    /// Minimum idle time before a key may be retired, e.g. 24h or 7days [default: 24h]
    #[arg(long, alias = "keyExpiration", value_parser = humantime::parse_duration)]
    pub key_expiration: Option<Duration>,

    /// Accept an existing user and rotate its oldest key when at quota
    #[arg(long)]
    pub skip: bool,

    /// Print the provisioning report
    #[arg(long)]
    pub show: bool,

    /// Store the issued key under this profile of the shared credentials file
    #[arg(long)]
    pub profile: Option<String>,

    /// Shared credentials file [default: $AWS_SHARED_CREDENTIALS_FILE or ~/.aws/credentials]
    #[arg(long, value_name = "PATH")]
    pub credentials_file: Option<PathBuf>,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            role_arn: self.assume_role.clone(),
            role_session_name: self.role_session_name.clone(),
            duration_secs: self.duration_sec,
            external_id: self.external_id.clone(),
            policy: self.policy.clone(),
            serial_number: self.serial_number.clone(),
            token_code: self.token_code.clone(),
        }
    }

    /// Flags override configuration, which overrides built-in defaults
    pub fn provision_config(&self, config: &AppConfig) -> ProvisionConfig {
        let groups = self
            .group
            .as_deref()
            .or(config.groups.as_deref())
            .map(parse_group_list)
            .unwrap_or_default();
        let key_expiration = self
            .key_expiration
            .or(config.key_expiration)
            .unwrap_or(DEFAULT_KEY_EXPIRATION);

        ProvisionConfig::new(self.add_user.as_str())
            .allow_existing_user(self.skip)
            .key_expiration(key_expiration)
            .groups(groups)
    }

    /// Profile to persist the issued key under, if any
    pub fn profile(&self, config: &AppConfig) -> Option<String> {
        self.profile.clone().or_else(|| config.profile.clone())
    }
}
