//! Wiring between the command line, the identity provider and the
//! credentials file
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


use crate::cli::Cli;
use anyhow::Result;
use keywarden_config::AppConfig;
use keywarden_keys::{
    IdentityProvider, ProvisionReport, ProvisionWorkflow, SharedCredentialsFile, StoreError,
    StoreResult,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// The key was issued but could not be written to the credentials file.
///
/// `output` holds the report with the secret; it is the only remaining copy.
#[derive(Error)]
#[error("Access key {access_key_id} was issued but could not be stored in profile {profile}")]
pub struct UndeliveredKey {
    pub access_key_id: String,
    pub profile: String,
    pub output: String,
    #[source]
    pub source: StoreError,
}

impl fmt::Debug for UndeliveredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndeliveredKey")
            .field("access_key_id", &self.access_key_id)
            .field("profile", &self.profile)
            .field("output", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

// Partial progress is not rolled back; show what was changed
fn log_report(report: &ProvisionReport) {
    for line in report.to_string().lines() {
        warn!(user_name = %report.user_name, "{}", line);
    }
}

/// Provision the user named on the command line and deliver the new key.
///
/// Returns the text to print on stdout, empty unless `--show` was given.
/// If the issued key cannot be stored, the error is an [`UndeliveredKey`]
/// carrying the report and the secret.
pub async fn run<P>(cli: &Cli, config: &AppConfig, provider: Arc<P>) -> Result<String>
where
    P: IdentityProvider + ?Sized,
{
    let workflow = ProvisionWorkflow::new(provider);
    let report = match workflow.provision(&cli.provision_config(config)).await {
        Ok(report) => report,
        Err(failure) => {
            error!(
                user_name = %failure.report.user_name,
                error = %failure.error,
                "Provisioning failed"
            );
            log_report(&failure.report);
            return Err(failure.into());
        }
    };

    let profile = cli.profile(config);
    let stored = match &profile {
        Some(profile) => match store_credential(&report, profile, cli.credentials_file.clone()) {
            Ok(stored) => stored,
            Err(source) => {
                error!(
                    user_name = %report.user_name,
                    profile = %profile,
                    error = %source,
                    "Failed to store issued access key"
                );
                log_report(&report);
                return Err(UndeliveredKey {
                    access_key_id: report
                        .credential()
                        .map(|c| c.access_key_id.clone())
                        .unwrap_or_default(),
                    profile: profile.clone(),
                    output: render(&report, true),
                    source,
                }
                .into());
            }
        },
        None => None,
    };

    if report.issued_key.is_some() && stored.is_none() && !cli.show {
        warn!(
            user_name = %report.user_name,
            "Issued secret was neither stored nor shown; use --profile or --show"
        );
    }

    Ok(if cli.show {
        render(&report, stored.is_none())
    } else {
        String::new()
    })
}

/// Write the issued key to `profile`; `None` when no key was issued
pub fn store_credential(
    report: &ProvisionReport,
    profile: &str,
    credentials_file: Option<PathBuf>,
) -> StoreResult<Option<PathBuf>> {
    let Some(credential) = report.credential() else {
        return Ok(None);
    };

    let store = SharedCredentialsFile::locate(credentials_file)?;
    store.persist(profile, credential)?;

    info!(
        profile = profile,
        path = %store.path().display(),
        access_key_id = %credential.access_key_id,
        "Access key stored"
    );
    Ok(Some(store.path().to_path_buf()))
}

/// Report text; the secret is included only when `reveal_secret` is set
pub fn render(report: &ProvisionReport, reveal_secret: bool) -> String {
    let mut out = report.to_string();
    if let (true, Some(credential)) = (reveal_secret, report.credential()) {
        out.push_str("\nSecretAccessKey: ");
        out.push_str(&credential.secret_access_key);
    }
    out
}
