//! Group allowlist helpers
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


/// Split a comma separated group list, dropping blanks and duplicates
pub fn parse_group_list(list: &str) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !groups.iter().any(|g| g == name) {
            groups.push(name.to_string());
        }
    }
    groups
}

/// Wanted groups the user is not yet a member of, in `wanted` order
pub fn lacking_groups(wanted: &[String], current: &[String]) -> Vec<String> {
    wanted
        .iter()
        .filter(|name| !current.contains(name))
        .cloned()
        .collect()
}
