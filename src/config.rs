use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// What happens when an extractor or the sink fails after the original method returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and hand the original result back to the caller.
    #[default]
    Isolate,
    /// Surface the failure to the caller in place of the original result.
    /// On the sequence path the remaining records are not sent.
    Propagate,
}

/// Declarative monitor setup: which methods to watch and which registered
/// extractor handles each one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub failure_policy: FailurePolicy,
    /// method name -> extractor name
    pub watch: BTreeMap<String, String>,
}

impl MonitorConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, MonitorError> {
        serde_json::from_str(raw).map_err(|e| MonitorError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }
}
