//! Execution tracking.
//!
//! A tracker answers one question: has this script already run to completion?
//! - `ExecutionTracker` - the capability the engine depends on
//! - `RedisScriptTracker` - records executions in a Redis hash
//! - `InMemoryTracker` - process-local records for tests and embedding

mod memory;
mod record;
mod redis_hash;

pub use memory::{InMemoryTracker, MemoryStore};
pub use record::ExecutionRecord;
pub use redis_hash::{RedisScriptTracker, list_store_records};

use crate::errors::TrackerError;

/// Checks and records whether the configured script has already executed.
///
/// `is_executed` has no side effects. `store_execution` is called at most once
/// per successful run and must tolerate a record that already exists.
#[allow(async_fn_in_trait)]
pub trait ExecutionTracker {
    /// Name of the script this tracker answers for.
    fn script_name(&self) -> &str;

    async fn is_executed(&mut self) -> Result<bool, TrackerError>;

    async fn store_execution(&mut self, record: &ExecutionRecord) -> Result<(), TrackerError>;

    /// Every record in the tracker's store, oldest first.
    async fn list_executions(&mut self) -> Result<Vec<ExecutionRecord>, TrackerError>;
}
