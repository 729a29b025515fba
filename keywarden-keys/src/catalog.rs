//! Snapshot of a user's access keys ordered by last use
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


use crate::error::LookupError;
use crate::key_types::AccessKey;
use crate::provider::IdentityProvider;
use tracing::debug;

/// Access keys of one user, oldest effective last use first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCatalog {
    user_name: String,
    keys: Vec<AccessKey>,
}

impl KeyCatalog {
    /// Build a catalog from the provider.
    ///
    /// Every key's last use is queried one after another; the first failure
    /// aborts the whole build.
    pub async fn build<P>(provider: &P, user_name: &str) -> Result<Self, LookupError>
    where
        P: IdentityProvider + ?Sized,
    {
        let listed = provider
            .list_access_keys(user_name)
            .await
            .map_err(|source| LookupError::AccessKeys {
                user_name: user_name.to_string(),
                source,
            })?;

        let mut keys = Vec::with_capacity(listed.len());
        for metadata in listed {
            let last_used = provider
                .get_access_key_last_used(&metadata.access_key_id)
                .await
                .map_err(|source| LookupError::LastUsed {
                    user_name: user_name.to_string(),
                    access_key_id: metadata.access_key_id.clone(),
                    source,
                })?;
            keys.push(AccessKey::new(metadata, last_used));
        }

        let catalog = Self::from_keys(user_name, keys);
        debug!(
            user_name = user_name,
            keys = catalog.len(),
            "Built access key catalog"
        );
        Ok(catalog)
    }

    /// Order already-fetched keys. Ties keep their listing order.
    pub fn from_keys(user_name: impl Into<String>, mut keys: Vec<AccessKey>) -> Self {
        keys.sort_by_key(AccessKey::effective_last_used);
        Self {
            user_name: user_name.into(),
            keys,
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Least recently used key
    pub fn oldest(&self) -> Option<&AccessKey> {
        self.keys.first()
    }

    /// Most recently used key
    pub fn newest(&self) -> Option<&AccessKey> {
        self.keys.last()
    }

    pub fn keys(&self) -> &[AccessKey] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
