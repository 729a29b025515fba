//! Rotation decision for a user at access key quota
//!
//! The candidate is always the key with the oldest effective last use. It may
//! only be retired once it has gone unused for at least the expiration
//! threshold; a younger candidate blocks rotation.
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


use crate::catalog::KeyCatalog;
use crate::error::PolicyError;
use crate::key_types::{AccessKey, AccessKeyId};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Why rotation was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotExpired {
    pub access_key_id: AccessKeyId,
    pub last_used: DateTime<Utc>,
    pub age: TimeDelta,
    pub expiration: TimeDelta,
}

impl fmt::Display for NotExpired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidate not yet expired: {} last used {} ({} ago, expiration {})",
            self.access_key_id,
            self.last_used.to_rfc3339(),
            human(self.age),
            human(self.expiration)
        )
    }
}

fn human(delta: TimeDelta) -> String {
    match delta.to_std() {
        Ok(d) => humantime::format_duration(d).to_string(),
        // Negative age: last use reported in the future
        Err(_) => format!("-{}", humantime::format_duration(delta.abs().to_std().unwrap_or_default())),
    }
}

/// Outcome of a rotation decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationDecision {
    /// The oldest key is still too young to delete
    Blocked(NotExpired),
    /// Delete this key, then create a replacement
    Retire(AccessKey),
}

/// Expiration threshold applied to the least recently used key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    expiration: TimeDelta,
}

impl RotationPolicy {
    pub fn new(expiration: TimeDelta) -> Self {
        Self { expiration }
    }

    pub fn from_std(expiration: std::time::Duration) -> Result<Self, PolicyError> {
        TimeDelta::from_std(expiration)
            .map(Self::new)
            .map_err(|_| PolicyError::ThresholdOutOfRange(expiration))
    }

    pub fn expiration(&self) -> TimeDelta {
        self.expiration
    }

    /// Decide against the current time, read once for the whole call
    pub fn decide(&self, catalog: &KeyCatalog) -> Result<RotationDecision, PolicyError> {
        self.decide_at(catalog, Utc::now())
    }

    /// Decide as of `now`
    pub fn decide_at(
        &self,
        catalog: &KeyCatalog,
        now: DateTime<Utc>,
    ) -> Result<RotationDecision, PolicyError> {
        let candidate = catalog.oldest().ok_or(PolicyError::EmptyCatalog)?;
        let last_used = candidate.effective_last_used();
        let age = now - last_used;

        if age < self.expiration {
            return Ok(RotationDecision::Blocked(NotExpired {
                access_key_id: candidate.access_key_id.clone(),
                last_used,
                age,
                expiration: self.expiration,
            }));
        }

        Ok(RotationDecision::Retire(candidate.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_types::KeyStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn key_used(id: &str, ago: TimeDelta) -> AccessKey {
        AccessKey {
            access_key_id: id.to_string(),
            user_name: "deploy".to_string(),
            created_at: now() - TimeDelta::days(365),
            status: KeyStatus::Active,
            last_used: Some(now() - ago),
        }
    }

    fn catalog(keys: Vec<AccessKey>) -> KeyCatalog {
        KeyCatalog::from_keys("deploy", keys)
    }

    fn retired_id(decision: RotationDecision) -> String {
        match decision {
            RotationDecision::Retire(key) => key.access_key_id,
            RotationDecision::Blocked(reason) => panic!("expected retirement, got {}", reason),
        }
    }

    #[test]
    fn test_empty_catalog_fails_fast() {
        let policy = RotationPolicy::new(TimeDelta::hours(24));
        let result = policy.decide_at(&catalog(Vec::new()), now());
        assert_eq!(result, Err(PolicyError::EmptyCatalog));
    }

    #[test]
    fn test_age_equal_to_expiration_is_blocked() {
        let policy = RotationPolicy::new(TimeDelta::hours(24));
        let decision = policy
            .decide_at(&catalog(vec![key_used("k1", TimeDelta::hours(24))]), now())
            .unwrap();

        match decision {
            RotationDecision::Blocked(reason) => {
                assert_eq!(reason.access_key_id, "k1");
                assert_eq!(reason.age, TimeDelta::hours(24));
                assert_eq!(reason.expiration, TimeDelta::hours(24));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[test]
    fn test_one_second_past_expiration_retires() {
        let policy = RotationPolicy::new(TimeDelta::hours(24));
        let ago = TimeDelta::hours(24) + TimeDelta::seconds(1);
        let decision = policy
            .decide_at(&catalog(vec![key_used("k1", ago)]), now())
            .unwrap();
        assert_eq!(retired_id(decision), "k1");
    }

    #[test]
    fn test_young_key_is_blocked() {
        let policy = RotationPolicy::new(TimeDelta::days(5));
        let decision = policy
            .decide_at(
                &catalog(vec![
                    key_used("k1", TimeDelta::days(3)),
                    key_used("k2", TimeDelta::days(4)),
                ]),
                now(),
            )
            .unwrap();

        match decision {
            RotationDecision::Blocked(reason) => assert_eq!(reason.access_key_id, "k2"),
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[test]
    fn test_retires_least_recently_used_key() {
        let policy = RotationPolicy::new(TimeDelta::hours(24));
        let decision = policy
            .decide_at(
                &catalog(vec![
                    key_used("k1", TimeDelta::days(3)),
                    key_used("k2", TimeDelta::days(4)),
                ]),
                now(),
            )
            .unwrap();
        assert_eq!(retired_id(decision), "k2");
    }

    #[test]
    fn test_never_selects_anything_but_the_minimum() {
        let policy = RotationPolicy::new(TimeDelta::zero());
        let ages = [7, 2, 30, 30, 1, 15];
        // Rotate the input so every position holds the minimum once
        for shift in 0..ages.len() {
            let keys: Vec<_> = (0..ages.len())
                .map(|i| {
                    let idx = (i + shift) % ages.len();
                    key_used(&format!("k{}", idx), TimeDelta::days(ages[idx]))
                })
                .collect();
            let catalog = catalog(keys);
            let minimum = catalog
                .iter()
                .map(AccessKey::effective_last_used)
                .min()
                .unwrap();

            let decision = policy.decide_at(&catalog, now()).unwrap();
            match decision {
                RotationDecision::Retire(key) => {
                    assert_eq!(key.effective_last_used(), minimum);
                    // The two 30-day keys tie; the one listed first wins
                    let expected = if shift == 3 { "k3" } else { "k2" };
                    assert_eq!(key.access_key_id, expected, "shift {}", shift);
                }
                other => panic!("expected retirement, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_never_used_key_ages_from_creation() {
        let policy = RotationPolicy::new(TimeDelta::hours(24));
        let unused = AccessKey {
            access_key_id: "fresh".to_string(),
            user_name: "deploy".to_string(),
            created_at: now() - TimeDelta::hours(2),
            status: KeyStatus::Inactive,
            last_used: None,
        };
        let decision = policy.decide_at(&catalog(vec![unused]), now()).unwrap();
        assert!(matches!(decision, RotationDecision::Blocked(_)));
    }

    #[test]
    fn test_last_use_in_the_future_is_blocked() {
        let policy = RotationPolicy::new(TimeDelta::zero());
        let decision = policy
            .decide_at(&catalog(vec![key_used("k1", TimeDelta::minutes(-5))]), now())
            .unwrap();

        match decision {
            RotationDecision::Blocked(reason) => {
                assert!(reason.age < TimeDelta::zero());
                assert!(reason.to_string().contains("-5m"));
            }
            other => panic!("expected blocked, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_expiration_retires_key_used_just_now() {
        let policy = RotationPolicy::new(TimeDelta::zero());
        let decision = policy
            .decide_at(&catalog(vec![key_used("k1", TimeDelta::zero())]), now())
            .unwrap();
        assert_eq!(retired_id(decision), "k1");
    }

    #[test]
    fn test_from_std_threshold() {
        let policy = RotationPolicy::from_std(std::time::Duration::from_secs(86_400)).unwrap();
        assert_eq!(policy.expiration(), TimeDelta::hours(24));

        let too_large = std::time::Duration::from_secs(u64::MAX);
        assert_eq!(
            RotationPolicy::from_std(too_large),
            Err(PolicyError::ThresholdOutOfRange(too_large))
        );
    }

    #[test]
    fn test_decide_uses_wall_clock() {
        let policy = RotationPolicy::new(TimeDelta::hours(1));
        let old = AccessKey {
            access_key_id: "old".to_string(),
            user_name: "deploy".to_string(),
            created_at: Utc::now() - TimeDelta::days(10),
            status: KeyStatus::Active,
            last_used: None,
        };
        let decision = policy.decide(&catalog(vec![old])).unwrap();
        assert_eq!(retired_id(decision), "old");
    }

    #[test]
    fn test_blocked_reason_display() {
        let reason = NotExpired {
            access_key_id: "k1".to_string(),
            last_used: now(),
            age: TimeDelta::hours(3),
            expiration: TimeDelta::hours(24),
        };
        let text = reason.to_string();
        assert!(text.starts_with("candidate not yet expired: k1"));
        assert!(text.contains("3h ago"));
        assert!(text.contains("expiration 1day"));
    }
}
