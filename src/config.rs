use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default bound on rewrite steps along one path to a fixpoint.
pub const DEFAULT_STEP_LIMIT: usize = 64;

/// Settings for a rewriting run.
///
/// Every field has a default, so a partial JSON object is a valid
/// configuration:
///
/// ```json
/// { "step_limit": 16, "commutative": ["add", "mul", "maximum"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Maximum number of rewrite steps along one path. `None` is unbounded.
    pub step_limit: Option<usize>,
    /// Maximum number of fixpoints collected in enumerate mode.
    pub max_results: Option<usize>,
    /// Operators whose operands may be matched in any order.
    pub commutative: Vec<String>,
    /// Operators whose nested applications are flattened before matching.
    pub associative: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            step_limit: Some(DEFAULT_STEP_LIMIT),
            max_results: None,
            commutative: vec!["add".to_string(), "mul".to_string()],
            associative: vec!["add".to_string(), "mul".to_string()],
        }
    }
}

impl RewriteConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn with_max_results(mut self, max: Option<usize>) -> Self {
        self.max_results = max;
        self
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
