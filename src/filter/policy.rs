//! # Filter Policy
//!
//! Gates every command by name before it reaches the store. Names are
//! compared upper-cased so mixed-case spellings cannot slip through.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::sets::{DANGEROUS_COMMANDS, SAFE_COMMANDS};

/// Filtering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Deny the dangerous set plus the configured extras
    #[default]
    Blocklist,
    /// Permit only the safe set plus the configured extras
    Allowlist,
    /// Permit everything. Unsafe: exposes destructive and admin commands.
    #[serde(rename = "none")]
    Off,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::Blocklist => "blocklist",
            FilterMode::Allowlist => "allowlist",
            FilterMode::Off => "none",
        }
    }
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blocklist" => Ok(FilterMode::Blocklist),
            "allowlist" => Ok(FilterMode::Allowlist),
            "none" => Ok(FilterMode::Off),
            other => Err(format!("unknown filter mode: {}", other)),
        }
    }
}

/// Outcome of a filter check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Allow,
    Deny(String),
}

impl FilterDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, FilterDecision::Allow)
    }
}

/// Command filter policy
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    mode: FilterMode,
    dangerous: HashSet<String>,
    safe: HashSet<String>,
    additional_blocked: HashSet<String>,
    additional_allowed: HashSet<String>,
}

impl FilterPolicy {
    /// Create a policy from a mode and the configured extra lists
    pub fn new<S: AsRef<str>>(mode: FilterMode, blocked: &[S], allowed: &[S]) -> Self {
        Self {
            mode,
            dangerous: DANGEROUS_COMMANDS.iter().map(|s| s.to_string()).collect(),
            safe: SAFE_COMMANDS.iter().map(|s| s.to_string()).collect(),
            additional_blocked: normalize(blocked),
            additional_allowed: normalize(allowed),
        }
    }

    /// Blocklist policy with no extras
    pub fn blocklist() -> Self {
        Self::new::<&str>(FilterMode::Blocklist, &[], &[])
    }

    /// Allowlist policy with no extras
    pub fn allowlist() -> Self {
        Self::new::<&str>(FilterMode::Allowlist, &[], &[])
    }

    /// Policy that lets everything through
    pub fn permissive() -> Self {
        Self::new::<&str>(FilterMode::Off, &[], &[])
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Decide whether a command may be executed
    pub fn decide(&self, command: &str) -> FilterDecision {
        let name = command.trim().to_uppercase();

        match self.mode {
            FilterMode::Off => FilterDecision::Allow,
            FilterMode::Blocklist => {
                if self.dangerous.contains(&name) || self.additional_blocked.contains(&name) {
                    FilterDecision::Deny(format!(
                        "Command '{}' is blocked by the security policy",
                        name
                    ))
                } else {
                    FilterDecision::Allow
                }
            }
            FilterMode::Allowlist => {
                if self.safe.contains(&name) || self.additional_allowed.contains(&name) {
                    FilterDecision::Allow
                } else {
                    FilterDecision::Deny(format!(
                        "Command '{}' is blocked: not in the allowed command list",
                        name
                    ))
                }
            }
        }
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::blocklist()
    }
}

/// Free-function form of [`FilterPolicy::decide`]
pub fn decide(command: &str, policy: &FilterPolicy) -> FilterDecision {
    policy.decide(command)
}

fn normalize<S: AsRef<str>>(names: &[S]) -> HashSet<String> {
    names
        .iter()
        .map(|s| s.as_ref().trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocklist_denies_flushall() {
        match decide("FLUSHALL", &FilterPolicy::blocklist()) {
            FilterDecision::Deny(reason) => {
                assert!(reason.contains("FLUSHALL"));
                assert!(reason.contains("blocked"));
            }
            FilterDecision::Allow => panic!("FLUSHALL must be denied"),
        }
    }

    #[test]
    fn test_blocklist_is_case_insensitive() {
        let policy = FilterPolicy::blocklist();
        assert!(!policy.decide("flushAll").is_allowed());
        assert!(!policy.decide("keys").is_allowed());
        assert!(policy.decide("get").is_allowed());
    }

    #[test]
    fn test_blocklist_additional_entries() {
        let policy = FilterPolicy::new(FilterMode::Blocklist, &["del", " Unlink "], &[]);
        assert!(!policy.decide("DEL").is_allowed());
        assert!(!policy.decide("unlink").is_allowed());
        assert!(policy.decide("SET").is_allowed());
    }

    #[test]
    fn test_allowlist_permits_only_safe_and_extras() {
        let policy = FilterPolicy::new(FilterMode::Allowlist, &[], &["custom.cmd"]);
        assert!(policy.decide("hgetall").is_allowed());
        assert!(policy.decide("JSON.GET").is_allowed());
        assert!(policy.decide("CUSTOM.CMD").is_allowed());
        assert!(!policy.decide("FLUSHALL").is_allowed());
        assert!(!policy.decide("SOMETHING").is_allowed());
    }

    #[test]
    fn test_allowlist_denial_names_command() {
        match FilterPolicy::allowlist().decide("config") {
            FilterDecision::Deny(reason) => assert!(reason.contains("CONFIG")),
            FilterDecision::Allow => panic!("CONFIG must be denied"),
        }
    }

    #[test]
    fn test_off_allows_everything() {
        let policy = FilterPolicy::permissive();
        for name in DANGEROUS_COMMANDS.iter().chain(SAFE_COMMANDS) {
            assert!(policy.decide(name).is_allowed());
        }
        assert!(policy.decide("anything-at-all").is_allowed());
    }

    #[test]
    fn test_blocklist_matches_set_membership() {
        let policy = FilterPolicy::new(FilterMode::Blocklist, &["EXTRA"], &[]);
        let candidates = ["GET", "flushdb", "Eval", "EXTRA", "extra", "HSET", "keys", "SCAN"];
        for name in candidates {
            let upper = name.to_uppercase();
            let listed = DANGEROUS_COMMANDS.contains(&upper.as_str()) || upper == "EXTRA";
            assert_eq!(policy.decide(name).is_allowed(), !listed, "{}", name);
        }
    }

    #[test]
    fn test_allowlist_matches_set_membership() {
        let policy = FilterPolicy::new(FilterMode::Allowlist, &[], &["EXTRA"]);
        let candidates = ["GET", "flushdb", "Eval", "EXTRA", "zadd", "HSET", "keys", "multi"];
        for name in candidates {
            let upper = name.to_uppercase();
            let listed = SAFE_COMMANDS.contains(&upper.as_str()) || upper == "EXTRA";
            assert_eq!(policy.decide(name).is_allowed(), listed, "{}", name);
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Blocklist".parse::<FilterMode>(), Ok(FilterMode::Blocklist));
        assert_eq!("none".parse::<FilterMode>(), Ok(FilterMode::Off));
        assert!("open".parse::<FilterMode>().is_err());

        let mode: FilterMode = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(mode, FilterMode::Off);
    }
}
