//! The read → transform → batched write loop and its idempotency gate.

use std::time::Instant;

use log::debug;

use crate::config::RunOptions;
use crate::errors::MigrationError;
use crate::operations::DataOperations;
use crate::page::Batches;
use crate::status::{LogReporter, Phase, StatusReporter};
use crate::tracker::{ExecutionRecord, ExecutionTracker};

/// Where a run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    CheckingIdempotency,
    /// The script had already been recorded; nothing ran.
    Skipped,
    Running,
    Completed,
    Failed,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::Skipped | EngineState::Completed | EngineState::Failed)
    }
}

/// Counters from a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_read: u64,
    pub items_read: u64,
    pub items_written: u64,
    pub batches_written: u64,
    pub duration_ms: u64,
    /// Writes and the execution record were skipped.
    pub dry_run: bool,
}

impl RunStats {
    fn to_record(&self, script: &str, forced: bool) -> ExecutionRecord {
        let mut record = ExecutionRecord::new(script);
        record.forced = forced;
        record.pages_read = self.pages_read;
        record.items_written = self.items_written;
        record.batches_written = self.batches_written;
        record.duration_ms = self.duration_ms;
        record
    }
}

/// Terminal result of [`MigrationEngine::run`].
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunStats),
    /// Already executed and not forced.
    Skipped,
    Failed(MigrationError),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RunOutcome::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }

    pub fn stats(&self) -> Option<&RunStats> {
        match self {
            RunOutcome::Completed(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MigrationError> {
        match self {
            RunOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Final status line shown to the operator.
    pub fn message(&self) -> String {
        match self {
            RunOutcome::Completed(stats) if stats.dry_run => format!(
                "Dry run finished: {} page(s), {} item(s) read; nothing was written",
                stats.pages_read, stats.items_read
            ),
            RunOutcome::Completed(_) => "The script has finished successfully".to_string(),
            RunOutcome::Skipped => "The script has already been run!".to_string(),
            RunOutcome::Failed(err) => format!("Something went wrong; please see logs! {err}"),
        }
    }
}

/// Drives a script's operations across every page and records completion once.
///
/// Reads, transforms and writes happen strictly one after another: a page is
/// split into batches of at most `batch_size` items which are written in order,
/// each awaited before the next. Pagination follows the token returned by
/// `read` until none is returned. Only after the last batch of the last page
/// is the execution recorded.
///
/// Failures never escape [`run`](Self::run); they end the run in
/// [`RunOutcome::Failed`] without retry or rollback, and leave the script
/// unrecorded. Two engines started concurrently for the same script can both
/// pass the idempotency check; nothing here coordinates them.
pub struct MigrationEngine<T, O, R = LogReporter> {
    tracker: T,
    operations: O,
    reporter: R,
    options: RunOptions,
    state: EngineState,
}

impl<T, O> MigrationEngine<T, O, LogReporter>
where
    T: ExecutionTracker,
    O: DataOperations,
{
    pub fn new(tracker: T, operations: O) -> Self {
        Self {
            tracker,
            operations,
            reporter: LogReporter,
            options: RunOptions::default(),
            state: EngineState::Idle,
        }
    }
}

impl<T, O, R> MigrationEngine<T, O, R>
where
    T: ExecutionTracker,
    O: DataOperations,
    R: StatusReporter,
{
    pub fn with_reporter<R2: StatusReporter>(self, reporter: R2) -> MigrationEngine<T, O, R2> {
        MigrationEngine {
            tracker: self.tracker,
            operations: self.operations,
            reporter,
            options: self.options,
            state: self.state,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Bypass the idempotency check.
    pub fn force(mut self, force: bool) -> Self {
        self.options.force = force;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.options.dry_run = dry_run;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Result<Self, MigrationError> {
        self.options = self.options.with_batch_size(batch_size)?;
        Ok(self)
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn operations(&self) -> &O {
        &self.operations
    }

    pub fn into_parts(self) -> (T, O) {
        (self.tracker, self.operations)
    }

    /// Execute the script unless it already ran.
    pub async fn run(&mut self) -> RunOutcome {
        let script = self.tracker.script_name().to_string();
        self.state = EngineState::Idle;

        let outcome = match self.execute(&script).await {
            Ok(Some(stats)) => RunOutcome::Completed(stats),
            Ok(None) => RunOutcome::Skipped,
            Err(err) => RunOutcome::Failed(err),
        };

        self.state = match outcome {
            RunOutcome::Completed(_) => EngineState::Completed,
            RunOutcome::Skipped => EngineState::Skipped,
            RunOutcome::Failed(_) => EngineState::Failed,
        };
        self.reporter.finished(&script, &outcome);
        outcome
    }

    /// `Ok(None)` means the script was already recorded.
    async fn execute(&mut self, script: &str) -> Result<Option<RunStats>, MigrationError> {
        let started = Instant::now();

        if self.options.force {
            debug!("[{script}] forced run, idempotency check bypassed");
        } else {
            self.state = EngineState::CheckingIdempotency;
            self.reporter.phase(script, &Phase::Checking);
            if self.tracker.is_executed().await? {
                return Ok(None);
            }
        }

        self.state = EngineState::Running;
        self.reporter.phase(script, &Phase::Starting);

        let mut stats = RunStats {
            dry_run: self.options.dry_run,
            ..RunStats::default()
        };
        let mut token: Option<O::Token> = None;

        loop {
            let page = stats.pages_read + 1;

            self.reporter.phase(script, &Phase::Reading { page });
            let (items, next_page_token) = self
                .operations
                .read(token.take())
                .await
                .map_err(|source| MigrationError::ReadFailed { page, source })?
                .into_parts();
            stats.pages_read = page;
            stats.items_read += items.len() as u64;

            self.reporter.phase(script, &Phase::Transforming { page });
            let items = self
                .operations
                .transform(items)
                .map_err(|source| MigrationError::TransformFailed { page, source })?;

            let item_count = items.len();
            let batches = Batches::new(items, self.options.batch_size);
            self.reporter.phase(
                script,
                &Phase::Saving {
                    page,
                    items: item_count,
                    batches: batches.len(),
                },
            );

            for (index, batch) in batches.enumerate() {
                let batch_number = index as u64 + 1;
                let batch_len = batch.len() as u64;

                if self.options.dry_run {
                    debug!("[{script}] dry run: skipped batch {batch_number} of page {page} ({batch_len} item(s))");
                    continue;
                }

                self.operations
                    .write(batch)
                    .await
                    .map_err(|source| MigrationError::WriteFailed {
                        page,
                        batch: batch_number,
                        source,
                    })?;
                stats.batches_written += 1;
                stats.items_written += batch_len;
                debug!("[{script}] wrote batch {batch_number} of page {page} ({batch_len} item(s))");
            }

            match next_page_token {
                Some(next) => {
                    self.reporter.phase(script, &Phase::Paging { page: page + 1 });
                    token = Some(next);
                }
                None => break,
            }
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;

        if self.options.dry_run {
            debug!("[{script}] dry run: execution not recorded");
            return Ok(Some(stats));
        }

        self.reporter.phase(script, &Phase::Storing);
        let record = stats.to_record(script, self.options.force);
        self.tracker.store_execution(&record).await?;

        Ok(Some(stats))
    }
}
