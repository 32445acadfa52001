//! Idempotent batch-migration runner.
//!
//! A script supplies [`DataOperations`] (paged read, optional transform, batched
//! write) and an [`ExecutionTracker`]; the [`MigrationEngine`] drives the
//! read → transform → write loop over every page and records, once, that the
//! script has completed. Running the same script again is a no-op unless forced.

pub mod config;
pub mod engine;
pub mod errors;
pub mod operations;
pub mod page;
pub mod registry;
pub mod status;
pub mod tracker;

pub use config::{Configuration, DEFAULT_BATCH_SIZE, RunOptions};
pub use engine::{EngineState, MigrationEngine, RunOutcome, RunStats};
pub use errors::{BoxError, MigrationError, TrackerError};
pub use operations::{DataOperations, JsonDocument, RedisJsonOperations};
pub use page::{Batches, Page};
pub use registry::{ScriptEnv, ScriptFuture, ScriptRegistration, duplicate_script_names, find_script, registered_scripts};
pub use status::{LogReporter, Phase, SilentReporter, StatusReporter};
pub use tracker::{ExecutionRecord, ExecutionTracker, InMemoryTracker, MemoryStore, RedisScriptTracker, list_store_records};

// Re-export redis types so scripts don't need to depend on a specific redis version
pub use redis;
pub use redis::aio::ConnectionManager;

// Re-export inventory for script registration
pub use inventory;
