//! Script auto-registration via inventory crate.
//!
//! Each migration/seed script is a thin entry point that wires its operations
//! into a [`MigrationEngine`]. Scripts announce themselves with
//! `inventory::submit!`, so the CLI can list and run every script linked into
//! the binary without a hand-maintained table.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use redis::aio::ConnectionManager;

use crate::config::{Configuration, RunOptions};
use crate::engine::{MigrationEngine, RunOutcome};
use crate::operations::DataOperations;
use crate::status::StatusReporter;
use crate::tracker::RedisScriptTracker;

/// Future returned by a registered script's entry point.
pub type ScriptFuture = Pin<Box<dyn Future<Output = RunOutcome>>>;

/// Everything a script needs from the caller to run.
#[derive(Clone)]
pub struct ScriptEnv {
    /// Connection shared by the tracker and the script's own operations
    pub redis: ConnectionManager,
    /// Hash holding execution records
    pub script_store: String,
    pub options: RunOptions,
    pub reporter: Arc<dyn StatusReporter>,
}

impl ScriptEnv {
    /// Run `operations` under the idempotency gate for `script_name`.
    pub async fn run_engine<O>(&self, script_name: &str, operations: O) -> RunOutcome
    where
        O: DataOperations,
    {
        let config = match script_configuration(script_name, &self.script_store, self.reporter.as_ref()) {
            Ok(config) => config,
            Err(outcome) => return outcome,
        };

        let tracker = RedisScriptTracker::new(self.redis.clone(), config);
        let mut engine = MigrationEngine::new(tracker, operations)
            .with_options(self.options)
            .with_reporter(Arc::clone(&self.reporter));
        engine.run().await
    }
}

/// Validated configuration for `script_name`, or the reported failure.
fn script_configuration(
    script_name: &str,
    script_store: &str,
    reporter: &dyn StatusReporter,
) -> Result<Configuration, RunOutcome> {
    Configuration::new(script_name, script_store).map_err(|err| {
        let outcome = RunOutcome::Failed(err);
        reporter.finished(script_name, &outcome);
        outcome
    })
}

/// Metadata and entry point of a script, submitted to the inventory.
pub struct ScriptRegistration {
    /// Tracker key (e.g., "uppercase_first_name")
    pub name: &'static str,
    /// Folder the script source lives in (e.g., "accounts")
    pub folder: &'static str,
    pub description: &'static str,
    pub run: fn(ScriptEnv) -> ScriptFuture,
}

inventory::collect!(ScriptRegistration);

/// All registered scripts, sorted by folder then name.
pub fn registered_scripts() -> Vec<&'static ScriptRegistration> {
    let mut scripts: Vec<_> = inventory::iter::<ScriptRegistration>().collect();
    scripts.sort_by(|a, b| a.folder.cmp(b.folder).then_with(|| a.name.cmp(b.name)));
    scripts
}

/// Look a script up by name.
pub fn find_script(name: &str) -> Option<&'static ScriptRegistration> {
    inventory::iter::<ScriptRegistration>().find(|script| script.name == name)
}

/// Names registered more than once. Such scripts would share one execution record.
pub fn duplicate_script_names() -> Vec<&'static str> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for script in inventory::iter::<ScriptRegistration>() {
        *counts.entry(script.name).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect()
}
