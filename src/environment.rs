//! Key-value environment shared between requests of one run.
//!
//! The environment is a plain value owned by the caller and passed by
//! reference to whatever needs it. It can be persisted as a flat JSON
//! object so a password survives between runs.

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run-scoped variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    values: BTreeMap<String, String>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value. Empty strings count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Set a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Whether a non-empty value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse an environment from a JSON object of strings.
    pub fn from_json(json: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(json)
            .map_err(|e| HarnessError::Config(format!("invalid environment file: {}", e)))
    }

    /// Serialize as a pretty-printed JSON object.
    pub fn to_json(&self) -> Result<String, HarnessError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| HarnessError::Config(format!("cannot serialize environment: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut env = Environment::new();
        assert!(env.is_empty());
        assert_eq!(env.set("password", "abc"), None);
        assert_eq!(env.get("password"), Some("abc"));
        assert_eq!(env.set("password", "def"), Some("abc".to_string()));
        assert_eq!(env.get("password"), Some("def"));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let mut env = Environment::new();
        env.set("password", "");
        assert_eq!(env.get("password"), None);
        assert!(!env.contains("password"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut env = Environment::new();
        env.set("password", "abc");
        env.set("base_url", "https://example.test");
        let json = env.to_json().unwrap();
        assert!(json.contains("\"password\": \"abc\""));
        assert_eq!(Environment::from_json(&json).unwrap(), env);
    }

    #[test]
    fn test_invalid_json() {
        let err = Environment::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}
