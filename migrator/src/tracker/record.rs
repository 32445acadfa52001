use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker that a script has run to completion.
///
/// Keyed by `script`. Created once at the end of a successful run and never
/// updated afterwards; the counters describe that run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Script name (the store key)
    pub script: String,
    /// When the run finished
    pub executed_at: DateTime<Utc>,
    /// Whether the run bypassed the idempotency check
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub pages_read: u64,
    #[serde(default)]
    pub items_written: u64,
    #[serde(default)]
    pub batches_written: u64,
    /// Wall-clock time of the run in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl ExecutionRecord {
    /// A bare record for `script`, stamped now.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            executed_at: Utc::now(),
            forced: false,
            pages_read: 0,
            items_written: 0,
            batches_written: 0,
            duration_ms: 0,
        }
    }
}
