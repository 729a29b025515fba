//! Shared credentials file storage
//!
//! Profiles live in an INI file (`~/.aws/credentials` by default). Writes
//! replace the whole file through a temporary file in the same directory, so
//! other profiles survive and a profile's key id and secret change together.
//! Values of other profiles are written back unchanged; comment lines are not
//! preserved.
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


use crate::error::{StoreError, StoreResult};
use crate::key_types::Credential;
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the credentials file location
pub const CREDENTIALS_FILE_ENV: &str = "AWS_SHARED_CREDENTIALS_FILE";

pub const DEFAULT_PROFILE: &str = "default";

const AWS_ACCESS_KEY_ID: &str = "aws_access_key_id";
const AWS_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const AWS_SESSION_TOKEN: &str = "aws_session_token";

// Values are kept verbatim: backslashes and quotes belong to the value
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    }
}

fn write_option() -> WriteOption {
    WriteOption {
        escape_policy: EscapePolicy::Nothing,
        kv_separator: " = ",
        ..Default::default()
    }
}

/// One profile section of the credentials file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRecord {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

/// Resolve the credentials file path.
///
/// An explicit path wins; otherwise `<home>/.aws/credentials`. Empty values
/// count as unset.
pub fn resolve_path(explicit: Option<&Path>, home: Option<&Path>) -> StoreResult<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path.to_path_buf());
    }
    match home.filter(|h| !h.as_os_str().is_empty()) {
        Some(home) => Ok(home.join(".aws").join("credentials")),
        None => Err(StoreError::HomeNotFound),
    }
}

/// Profile-keyed credentials file
#[derive(Debug, Clone)]
pub struct SharedCredentialsFile {
    path: PathBuf,
}

impl SharedCredentialsFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Locate the file from an explicit path, `AWS_SHARED_CREDENTIALS_FILE`,
    /// or `$HOME`, in that order
    pub fn locate(explicit: Option<PathBuf>) -> StoreResult<Self> {
        let explicit = explicit.or_else(|| env::var_os(CREDENTIALS_FILE_ENV).map(PathBuf::from));
        let home = env::var_os("HOME").map(PathBuf::from);
        let path = resolve_path(explicit.as_deref(), home.as_deref())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upsert `credential` under `profile` (empty means `default`).
    ///
    /// A credential without a session token removes any token previously
    /// stored for that profile.
    pub fn persist(&self, profile: &str, credential: &Credential) -> StoreResult<()> {
        let profile = normalize_profile(profile);
        self.ensure_file()?;

        let mut config = self.load()?;
        config
            .with_section(Some(profile))
            .set(AWS_ACCESS_KEY_ID, credential.access_key_id.as_str())
            .set(AWS_SECRET_ACCESS_KEY, credential.secret_access_key.as_str());

        match &credential.session_token {
            Some(token) => {
                config
                    .with_section(Some(profile))
                    .set(AWS_SESSION_TOKEN, token.as_str());
            }
            None => {
                if let Some(section) = config.section_mut(Some(profile)) {
                    section.remove(AWS_SESSION_TOKEN);
                }
            }
        }

        self.write(&config)?;
        info!(
            path = %self.path.display(),
            profile = profile,
            access_key_id = %credential.access_key_id,
            "Stored credentials"
        );
        Ok(())
    }

    /// Read one profile back; `None` if the file or the profile is missing
    pub fn load_profile(&self, profile: &str) -> StoreResult<Option<ProfileRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let config = self.load()?;
        Ok(config
            .section(Some(normalize_profile(profile)))
            .map(|section| ProfileRecord {
                access_key_id: section.get(AWS_ACCESS_KEY_ID).map(str::to_string),
                secret_access_key: section.get(AWS_SECRET_ACCESS_KEY).map(str::to_string),
                session_token: section.get(AWS_SESSION_TOKEN).map(str::to_string),
            }))
    }

    /// Create the parent directory (0700) and the file (0600) if missing
    fn ensure_file(&self) -> StoreResult<()> {
        let dir = self.parent_dir();
        create_private_dir(dir).map_err(|source| StoreError::Persist {
            action: "create directory for",
            path: self.path.clone(),
            source,
        })?;

        if self.path.exists() {
            return Ok(());
        }

        debug!(path = %self.path.display(), "Creating shared credentials file");
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options
            .open(&self.path)
            .and_then(|_| restrict_file(&self.path))
            .map_err(|source| StoreError::Persist {
                action: "create",
                path: self.path.clone(),
                source,
            })
    }

    fn load(&self) -> StoreResult<Ini> {
        Ini::load_from_file_opt(&self.path, parse_option()).map_err(|e| match e {
            ini::Error::Io(source) => StoreError::Persist {
                action: "read",
                path: self.path.clone(),
                source,
            },
            ini::Error::Parse(source) => StoreError::Parse {
                path: self.path.clone(),
                source,
            },
        })
    }

    fn write(&self, config: &Ini) -> StoreResult<()> {
        let persist_err = |source| StoreError::Persist {
            action: "write",
            path: self.path.clone(),
            source,
        };

        // NamedTempFile is created owner read/write only
        let mut tmp = tempfile::NamedTempFile::new_in(self.parent_dir()).map_err(persist_err)?;
        config
            .write_to_opt(&mut tmp, write_option())
            .map_err(persist_err)?;
        tmp.flush().map_err(persist_err)?;
        tmp.as_file().sync_all().map_err(persist_err)?;
        tmp.persist(&self.path).map_err(|e| persist_err(e.error))?;
        Ok(())
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

fn normalize_profile(profile: &str) -> &str {
    if profile.is_empty() {
        DEFAULT_PROFILE
    } else {
        profile
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

#[cfg(unix)]
fn restrict_file(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_file(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
