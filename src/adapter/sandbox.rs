//! Script sandbox seam
//!
//! [`ScriptEngine`] is the pluggable "run this script with these bindings"
//! capability behind the script adapter. [`ExecutionLimits`] bounds what a
//! single run may consume.

use crate::variables::VariableBag;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resource limits applied to every script run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    /// Maximum interpreter operations per run
    pub max_operations: u64,
    /// Maximum function call nesting
    pub max_call_levels: usize,
    /// Maximum expression nesting depth
    pub max_expr_depth: usize,
    /// Maximum string length in bytes
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
    /// Wall-clock limit, unlimited when absent
    pub timeout_ms: Option<u64>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_operations: 10_000_000,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_string_size: 10 * 1024 * 1024,
            max_array_size: 100_000,
            max_map_size: 100_000,
            timeout_ms: None,
        }
    }
}

impl ExecutionLimits {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Host values made visible to one script run
#[derive(Debug, Clone, Default)]
pub struct ScriptBindings {
    /// Read-only top-level values, in binding order
    pub constants: Vec<(String, serde_json::Value)>,
    /// Backing store for the variable accessor function
    pub variables: VariableBag,
}

impl ScriptBindings {
    pub fn new(variables: VariableBag) -> Self {
        Self { constants: Vec::new(), variables }
    }

    pub fn constant(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.constants.push((name.into(), value));
        self
    }
}

/// A script interpreter that runs each script in isolation
#[async_trait]
pub trait ScriptEngine: Send + Sync {
    /// Language tag of the scripts this engine runs
    fn language(&self) -> &str;

    /// Evaluate `script` and return its final value as JSON
    async fn run(&self, script: &str, bindings: ScriptBindings) -> Result<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_from_partial_toml() {
        let limits: ExecutionLimits = toml::from_str("max_operations = 500\ntimeout_ms = 3000").unwrap();
        assert_eq!(limits.max_operations, 500);
        assert_eq!(limits.timeout(), Some(Duration::from_secs(3)));
        assert_eq!(limits.max_call_levels, ExecutionLimits::default().max_call_levels);
    }

    #[test]
    fn test_no_timeout_by_default() {
        assert!(ExecutionLimits::default().timeout().is_none());
        let limits = ExecutionLimits::default().with_timeout(Duration::from_millis(10));
        assert_eq!(limits.timeout(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let limits = ExecutionLimits::default().with_timeout(Duration::MAX);
        assert_eq!(limits.timeout_ms, Some(u64::MAX));
    }
}
