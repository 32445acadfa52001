//! Progress reporting for a migration run.
//!
//! The engine announces each phase and the final outcome to a [`StatusReporter`].
//! Reporting has no effect on the run itself.

use std::fmt;
use std::sync::Arc;

use log::{error, info, warn};

use crate::engine::RunOutcome;

/// A step of the run, in the order the engine reaches them.
///
/// Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Checking,
    Starting,
    Reading { page: u64 },
    Transforming { page: u64 },
    Saving { page: u64, items: usize, batches: usize },
    Paging { page: u64 },
    Storing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Checking => write!(f, "Checking if the script has been run before"),
            Phase::Starting => write!(f, "Starting execution"),
            Phase::Reading { page } => write!(f, "Reading data in chunks (page {page})"),
            Phase::Transforming { page } => write!(f, "Transforming page {page}"),
            Phase::Saving { page, items, batches } => {
                write!(f, "Saving data: {items} item(s) in {batches} batch(es) from page {page}")
            }
            Phase::Paging { page } => write!(f, "Fetching the next chunk (page {page})"),
            Phase::Storing => write!(f, "Recording the script execution"),
        }
    }
}

/// Receives status updates from the engine.
pub trait StatusReporter {
    fn phase(&self, script: &str, phase: &Phase);

    fn finished(&self, script: &str, outcome: &RunOutcome);
}

impl<R: StatusReporter + ?Sized> StatusReporter for &R {
    fn phase(&self, script: &str, phase: &Phase) {
        (**self).phase(script, phase);
    }

    fn finished(&self, script: &str, outcome: &RunOutcome) {
        (**self).finished(script, outcome);
    }
}

impl<R: StatusReporter + ?Sized> StatusReporter for Arc<R> {
    fn phase(&self, script: &str, phase: &Phase) {
        (**self).phase(script, phase);
    }

    fn finished(&self, script: &str, outcome: &RunOutcome) {
        (**self).finished(script, outcome);
    }
}

impl<R: StatusReporter + ?Sized> StatusReporter for Box<R> {
    fn phase(&self, script: &str, phase: &Phase) {
        (**self).phase(script, phase);
    }

    fn finished(&self, script: &str, outcome: &RunOutcome) {
        (**self).finished(script, outcome);
    }
}

/// Writes every update through the `log` facade.
///
/// Failures are logged at `error`, "already executed" at `warn`, the rest at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn phase(&self, script: &str, phase: &Phase) {
        info!("[{script}] {phase}");
    }

    fn finished(&self, script: &str, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Completed(_) => info!("[{script}] {}", outcome.message()),
            RunOutcome::Skipped => warn!("[{script}] {}", outcome.message()),
            RunOutcome::Failed(err) => error!("[{script}] {} ({})", outcome.message(), err.kind()),
        }
    }
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl StatusReporter for SilentReporter {
    fn phase(&self, _script: &str, _phase: &Phase) {}

    fn finished(&self, _script: &str, _outcome: &RunOutcome) {}
}
