//! keywarden
//!
//! Provisions an IAM user and hands out a fresh access key:
//! - Creates the user (or accepts an existing one with `--skip`)
//! - Adds it to the configured groups
//! - Rotates the least recently used key when the key quota is reached
//! - Stores the new key in the shared credentials file (`--profile`)
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


use anyhow::{Context, Result};
use clap::Parser;
use keywarden::{Cli, UndeliveredKey};
use keywarden_config::{AppConfig, LogFormat};
use keywarden_keys::AwsIdentityProvider;
use keywarden_logging::{init_console_logging, init_logging};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    match config.log_format {
        LogFormat::Console => init_console_logging("keywarden", config.log_level()),
        LogFormat::Json => init_logging("keywarden", config.log_level()),
    }

    info!(
        user_name = %cli.add_user,
        assume_role = cli.assume_role.as_deref().unwrap_or(""),
        "Starting keywarden"
    );

    let provider = AwsIdentityProvider::from_session(&cli.session_config())
        .context("Failed to set up IAM session")?;

    let output = match keywarden::run(&cli, &config, Arc::new(provider)).await {
        Ok(output) => output,
        Err(e) => {
            // Print the issued secret; it exists nowhere else
            if let Some(undelivered) = e.downcast_ref::<UndeliveredKey>() {
                println!("{}", undelivered.output);
            }
            return Err(e);
        }
    };
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
