//! End-to-end behaviour of the migration engine against in-process fakes.
//!
//! The fakes share one call log so ordering across tracker, operations and
//! reporter can be asserted directly.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use migrator::{
    BoxError, Configuration, DataOperations, EngineState, ExecutionRecord, ExecutionTracker, InMemoryTracker,
    MemoryStore, MigrationEngine, MigrationError, Page, Phase, RunOutcome, RunStats, StatusReporter, TrackerError,
};

// ============================================================================
// Test Doubles
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    IsExecuted,
    Store(String),
    Read(Option<u32>),
    Transform(Vec<String>),
    Write(Vec<String>),
}

type CallLog = Rc<RefCell<Vec<Call>>>;

struct RecordingTracker {
    script: String,
    executed: bool,
    fail_check: bool,
    fail_store: bool,
    calls: CallLog,
}

impl RecordingTracker {
    fn new(script: &str, calls: &CallLog) -> Self {
        Self {
            script: script.to_string(),
            executed: false,
            fail_check: false,
            fail_store: false,
            calls: calls.clone(),
        }
    }

    fn already_executed(mut self) -> Self {
        self.executed = true;
        self
    }
}

impl ExecutionTracker for RecordingTracker {
    fn script_name(&self) -> &str {
        &self.script
    }

    async fn is_executed(&mut self) -> Result<bool, TrackerError> {
        self.calls.borrow_mut().push(Call::IsExecuted);
        if self.fail_check {
            return Err(TrackerError::Other {
                message: "tracker offline".into(),
            });
        }
        Ok(self.executed)
    }

    async fn store_execution(&mut self, record: &ExecutionRecord) -> Result<(), TrackerError> {
        self.calls.borrow_mut().push(Call::Store(record.script.clone()));
        if self.fail_store {
            return Err(TrackerError::Other {
                message: "tracker offline".into(),
            });
        }
        self.executed = true;
        Ok(())
    }

    async fn list_executions(&mut self) -> Result<Vec<ExecutionRecord>, TrackerError> {
        Ok(Vec::new())
    }
}

/// Serves pre-built pages; page `n` carries token `n` for the page after it.
struct ScriptedOperations {
    pages: VecDeque<Vec<String>>,
    uppercase: bool,
    fail_read_on: Option<u32>,
    fail_transform: bool,
    fail_write_on: Option<usize>,
    writes: usize,
    calls: CallLog,
}

impl ScriptedOperations {
    fn new(pages: Vec<Vec<&str>>, calls: &CallLog) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(str::to_string).collect())
                .collect(),
            uppercase: false,
            fail_read_on: None,
            fail_transform: false,
            fail_write_on: None,
            writes: 0,
            calls: calls.clone(),
        }
    }

    fn numbered(count: usize, calls: &CallLog) -> Self {
        let items: Vec<String> = (0..count).map(|n| format!("item-{n}")).collect();
        let mut ops = Self::new(Vec::new(), calls);
        ops.pages.push_back(items);
        ops
    }
}

impl DataOperations for ScriptedOperations {
    type Item = String;
    type Token = u32;

    async fn read(&mut self, page_token: Option<u32>) -> Result<Page<String, u32>, BoxError> {
        self.calls.borrow_mut().push(Call::Read(page_token));
        let page_number = page_token.unwrap_or(0) + 1;
        if self.fail_read_on == Some(page_number) {
            return Err("source unreachable".into());
        }

        let items = self.pages.pop_front().unwrap_or_default();
        Ok(if self.pages.is_empty() {
            Page::last(items)
        } else {
            Page::more(items, page_number)
        })
    }

    fn transform(&self, items: Vec<String>) -> Result<Vec<String>, BoxError> {
        self.calls.borrow_mut().push(Call::Transform(items.clone()));
        if self.fail_transform {
            return Err("cannot transform".into());
        }
        if self.uppercase {
            Ok(items.into_iter().map(|item| item.to_uppercase()).collect())
        } else {
            Ok(items)
        }
    }

    async fn write(&mut self, batch: Vec<String>) -> Result<(), BoxError> {
        self.writes += 1;
        self.calls.borrow_mut().push(Call::Write(batch));
        if self.fail_write_on == Some(self.writes) {
            return Err("sink rejected batch".into());
        }
        Ok(())
    }
}

/// Operations that never override `transform`.
struct PassThrough {
    written: Vec<Vec<u8>>,
}

impl DataOperations for PassThrough {
    type Item = u8;
    type Token = ();

    async fn read(&mut self, _page_token: Option<()>) -> Result<Page<u8, ()>, BoxError> {
        Ok(Page::last(vec![1, 2, 3]))
    }

    async fn write(&mut self, batch: Vec<u8>) -> Result<(), BoxError> {
        self.written.push(batch);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingReporter {
    phases: RefCell<Vec<Phase>>,
    finished: RefCell<Vec<String>>,
}

impl StatusReporter for RecordingReporter {
    fn phase(&self, _script: &str, phase: &Phase) {
        self.phases.borrow_mut().push(*phase);
    }

    fn finished(&self, script: &str, outcome: &RunOutcome) {
        self.finished.borrow_mut().push(format!("{script}: {}", outcome.message()));
    }
}

fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

fn writes(calls: &CallLog) -> Vec<Vec<String>> {
    calls
        .borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Write(batch) => Some(batch.clone()),
            _ => None,
        })
        .collect()
}

fn count(calls: &CallLog, predicate: impl Fn(&Call) -> bool) -> usize {
    calls.borrow().iter().filter(|call| predicate(call)).count()
}

// ============================================================================
// Idempotency
// ============================================================================

#[tokio::test]
async fn fresh_script_runs_and_records_once_after_last_write() {
    let calls = call_log();
    let tracker = RecordingTracker::new("seed_users", &calls);
    let ops = ScriptedOperations::new(vec![vec!["a", "b"], vec!["c"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(outcome.is_completed());
    assert_eq!(engine.state(), EngineState::Completed);

    let log = calls.borrow();
    let stores: Vec<usize> = log
        .iter()
        .enumerate()
        .filter(|(_, call)| matches!(call, Call::Store(_)))
        .map(|(index, _)| index)
        .collect();
    assert_eq!(stores.len(), 1);
    let last_write = log.iter().rposition(|call| matches!(call, Call::Write(_))).unwrap();
    assert!(stores[0] > last_write);
    assert_eq!(log.last(), Some(&Call::Store("seed_users".to_string())));
}

#[tokio::test]
async fn already_executed_script_touches_no_operations() {
    let calls = call_log();
    let tracker = RecordingTracker::new("seed_users", &calls).already_executed();
    let ops = ScriptedOperations::new(vec![vec!["a"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(outcome.is_skipped());
    assert_eq!(engine.state(), EngineState::Skipped);
    assert_eq!(*calls.borrow(), vec![Call::IsExecuted]);
}

#[tokio::test]
async fn second_run_against_same_store_is_skipped() {
    let store = MemoryStore::new();
    let config = Configuration::new("seed_users", "migration-seed-scripts").unwrap();

    let first_calls = call_log();
    let mut first = MigrationEngine::new(
        store.tracker(&config),
        ScriptedOperations::new(vec![vec!["a"]], &first_calls),
    );
    assert!(first.run().await.is_completed());
    assert!(store.contains("seed_users").unwrap());

    let second_calls = call_log();
    let mut second = MigrationEngine::new(
        store.tracker(&config),
        ScriptedOperations::new(vec![vec!["a"]], &second_calls),
    );
    assert!(second.run().await.is_skipped());
    assert!(second_calls.borrow().is_empty());
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn force_bypasses_check_and_reruns_full_flow() {
    let calls = call_log();
    let tracker = RecordingTracker::new("seed_users", &calls).already_executed();
    let ops = ScriptedOperations::new(vec![vec!["a", "b"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops).force(true);
    let outcome = engine.run().await;

    assert!(outcome.is_completed());
    assert_eq!(count(&calls, |call| matches!(call, Call::IsExecuted)), 0);
    assert_eq!(writes(&calls), vec![vec!["a".to_string(), "b".to_string()]]);
    assert_eq!(count(&calls, |call| matches!(call, Call::Store(_))), 1);
}

#[tokio::test]
async fn forced_run_is_flagged_in_record() {
    let store = MemoryStore::new();
    let config = Configuration::new("seed_users", "seeds").unwrap();
    let calls = call_log();

    let mut engine = MigrationEngine::new(
        store.tracker(&config),
        ScriptedOperations::new(vec![vec!["a"]], &calls),
    )
    .force(true);
    assert!(engine.run().await.is_completed());

    let record = store.get("seed_users").unwrap().unwrap();
    assert!(record.forced);
    assert_eq!(record.items_written, 1);
    assert_eq!(record.batches_written, 1);
}

// ============================================================================
// Paging and Batching
// ============================================================================

#[tokio::test]
async fn pages_are_followed_in_order_until_no_token() {
    let calls = call_log();
    let tracker = RecordingTracker::new("paged", &calls);
    let ops = ScriptedOperations::new(vec![vec!["p1"], vec!["p2"], vec!["p3"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    let reads: Vec<Call> = calls
        .borrow()
        .iter()
        .filter(|call| matches!(call, Call::Read(_)))
        .cloned()
        .collect();
    assert_eq!(reads, vec![Call::Read(None), Call::Read(Some(1)), Call::Read(Some(2))]);
    assert_eq!(
        writes(&calls),
        vec![vec!["p1".to_string()], vec!["p2".to_string()], vec!["p3".to_string()]]
    );
    assert_eq!(outcome.stats().map(|stats| stats.pages_read), Some(3));
}

#[tokio::test]
async fn page_is_split_into_batches_of_fifty() {
    for (items, expected_batches) in [(1, 1), (50, 1), (51, 2), (100, 2), (120, 3)] {
        let calls = call_log();
        let tracker = RecordingTracker::new("batched", &calls);
        let ops = ScriptedOperations::numbered(items, &calls);

        let mut engine = MigrationEngine::new(tracker, ops);
        let outcome = engine.run().await;

        let batches = writes(&calls);
        assert_eq!(batches.len(), expected_batches, "{items} item(s)");
        assert!(batches.iter().all(|batch| batch.len() <= 50));

        let flattened: Vec<String> = batches.into_iter().flatten().collect();
        let expected: Vec<String> = (0..items).map(|n| format!("item-{n}")).collect();
        assert_eq!(flattened, expected);

        let stats = outcome.stats().unwrap();
        assert_eq!(stats.items_written, items as u64);
        assert_eq!(stats.batches_written, expected_batches as u64);
    }
}

#[tokio::test]
async fn custom_batch_size_is_honoured() {
    let calls = call_log();
    let tracker = RecordingTracker::new("batched", &calls);
    let ops = ScriptedOperations::numbered(7, &calls);

    let mut engine = MigrationEngine::new(tracker, ops).batch_size(3).unwrap();
    engine.run().await;

    let sizes: Vec<usize> = writes(&calls).iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[tokio::test]
async fn zero_batch_size_is_rejected() {
    let calls = call_log();
    let result = MigrationEngine::new(
        RecordingTracker::new("batched", &calls),
        ScriptedOperations::numbered(1, &calls),
    )
    .batch_size(0);
    assert!(matches!(result, Err(MigrationError::InvalidConfig { .. })));
}

#[tokio::test]
async fn empty_page_writes_nothing_but_still_records() {
    let calls = call_log();
    let tracker = RecordingTracker::new("empty", &calls);
    let ops = ScriptedOperations::new(vec![Vec::new()], &calls);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(outcome.is_completed());
    assert!(writes(&calls).is_empty());
    assert_eq!(count(&calls, |call| matches!(call, Call::Store(_))), 1);
}

// ============================================================================
// Transform
// ============================================================================

#[tokio::test]
async fn default_transform_is_identity() {
    let config = Configuration::new("pass_through", "seeds").unwrap();
    let tracker = InMemoryTracker::new(&config);
    let ops = PassThrough { written: Vec::new() };

    let mut engine = MigrationEngine::new(tracker, ops);
    assert!(engine.run().await.is_completed());

    let (tracker, ops) = engine.into_parts();
    assert_eq!(ops.written, vec![vec![1, 2, 3]]);
    assert!(tracker.store().contains("pass_through").unwrap());
}

#[tokio::test]
async fn transformed_items_are_what_gets_written() {
    let calls = call_log();
    let tracker = RecordingTracker::new("upper", &calls);
    let mut ops = ScriptedOperations::new(vec![vec!["a", "b", "c"]], &calls);
    ops.uppercase = true;

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(outcome.is_completed());
    assert_eq!(
        *calls.borrow(),
        vec![
            Call::IsExecuted,
            Call::Read(None),
            Call::Transform(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
            Call::Write(vec!["A".to_string(), "B".to_string(), "C".to_string()]),
            Call::Store("upper".to_string()),
        ]
    );
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn tracker_failure_before_start_runs_nothing() {
    let calls = call_log();
    let mut tracker = RecordingTracker::new("offline", &calls);
    tracker.fail_check = true;
    let ops = ScriptedOperations::new(vec![vec!["a"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(matches!(outcome.error(), Some(MigrationError::TrackerUnavailable(_))));
    assert_eq!(engine.state(), EngineState::Failed);
    assert_eq!(*calls.borrow(), vec![Call::IsExecuted]);
}

#[tokio::test]
async fn read_failure_on_later_page_keeps_earlier_writes_and_skips_record() {
    let calls = call_log();
    let tracker = RecordingTracker::new("flaky_read", &calls);
    let mut ops = ScriptedOperations::new(vec![vec!["a"], vec!["b"]], &calls);
    ops.fail_read_on = Some(2);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(matches!(outcome.error(), Some(MigrationError::ReadFailed { page: 2, .. })));
    assert_eq!(writes(&calls), vec![vec!["a".to_string()]]);
    assert_eq!(count(&calls, |call| matches!(call, Call::Store(_))), 0);
}

#[tokio::test]
async fn transform_failure_writes_nothing_from_that_page() {
    let calls = call_log();
    let tracker = RecordingTracker::new("bad_transform", &calls);
    let mut ops = ScriptedOperations::new(vec![vec!["a", "b"]], &calls);
    ops.fail_transform = true;

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(matches!(outcome.error(), Some(MigrationError::TransformFailed { page: 1, .. })));
    assert!(writes(&calls).is_empty());
    assert_eq!(count(&calls, |call| matches!(call, Call::Store(_))), 0);
}

#[tokio::test]
async fn write_failure_stops_remaining_batches_and_skips_record() {
    let calls = call_log();
    let tracker = RecordingTracker::new("flaky_write", &calls);
    let mut ops = ScriptedOperations::numbered(120, &calls);
    ops.fail_write_on = Some(2);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(matches!(
        outcome.error(),
        Some(MigrationError::WriteFailed { page: 1, batch: 2, .. })
    ));
    assert_eq!(writes(&calls).len(), 2);
    assert_eq!(count(&calls, |call| matches!(call, Call::Store(_))), 0);
}

#[tokio::test]
async fn failed_store_reports_tracker_unavailable_after_writes() {
    let calls = call_log();
    let mut tracker = RecordingTracker::new("store_down", &calls);
    tracker.fail_store = true;
    let ops = ScriptedOperations::new(vec![vec!["a"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops);
    let outcome = engine.run().await;

    assert!(matches!(outcome.error(), Some(MigrationError::TrackerUnavailable(_))));
    assert_eq!(writes(&calls).len(), 1);
}

#[tokio::test]
async fn failed_run_can_be_retried_from_scratch() {
    let store = MemoryStore::new();
    let config = Configuration::new("retry_me", "seeds").unwrap();

    let calls = call_log();
    let mut ops = ScriptedOperations::new(vec![vec!["a"]], &calls);
    ops.fail_write_on = Some(1);
    let mut engine = MigrationEngine::new(store.tracker(&config), ops);
    assert!(engine.run().await.is_failed());
    assert!(!store.contains("retry_me").unwrap());

    let retry_calls = call_log();
    let mut retry = MigrationEngine::new(
        store.tracker(&config),
        ScriptedOperations::new(vec![vec!["a"]], &retry_calls),
    );
    assert!(retry.run().await.is_completed());
    assert!(store.contains("retry_me").unwrap());
}

// ============================================================================
// Dry Run
// ============================================================================

#[tokio::test]
async fn dry_run_reads_and_transforms_but_never_writes_or_records() {
    let calls = call_log();
    let tracker = RecordingTracker::new("preview", &calls);
    let ops = ScriptedOperations::new(vec![vec!["a", "b"], vec!["c"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops).dry_run(true);
    let outcome = engine.run().await;

    let stats = outcome.stats().cloned().unwrap();
    assert_eq!(
        stats,
        RunStats {
            pages_read: 2,
            items_read: 3,
            dry_run: true,
            duration_ms: stats.duration_ms,
            ..RunStats::default()
        }
    );
    assert!(writes(&calls).is_empty());
    assert_eq!(count(&calls, |call| matches!(call, Call::Transform(_))), 2);
    assert_eq!(count(&calls, |call| matches!(call, Call::Store(_))), 0);
}

// ============================================================================
// Status Reporting
// ============================================================================

#[tokio::test]
async fn reporter_sees_phases_in_order() {
    let calls = call_log();
    let reporter = RecordingReporter::default();
    let tracker = RecordingTracker::new("reported", &calls);
    let ops = ScriptedOperations::new(vec![vec!["a"], vec!["b", "c"]], &calls);

    let mut engine = MigrationEngine::new(tracker, ops).with_reporter(&reporter);
    engine.run().await;

    assert_eq!(
        *reporter.phases.borrow(),
        vec![
            Phase::Checking,
            Phase::Starting,
            Phase::Reading { page: 1 },
            Phase::Transforming { page: 1 },
            Phase::Saving {
                page: 1,
                items: 1,
                batches: 1
            },
            Phase::Paging { page: 2 },
            Phase::Reading { page: 2 },
            Phase::Transforming { page: 2 },
            Phase::Saving {
                page: 2,
                items: 2,
                batches: 1
            },
            Phase::Storing,
        ]
    );
    assert_eq!(
        *reporter.finished.borrow(),
        vec!["reported: The script has finished successfully".to_string()]
    );
}

#[tokio::test]
async fn reporter_hears_skip_and_failure() {
    let reporter = RecordingReporter::default();

    let calls = call_log();
    let mut skipped = MigrationEngine::new(
        RecordingTracker::new("done", &calls).already_executed(),
        ScriptedOperations::new(vec![vec!["a"]], &calls),
    )
    .with_reporter(&reporter);
    skipped.run().await;

    let calls = call_log();
    let mut ops = ScriptedOperations::new(vec![vec!["a"]], &calls);
    ops.fail_read_on = Some(1);
    let mut failed = MigrationEngine::new(RecordingTracker::new("broken", &calls), ops).with_reporter(&reporter);
    failed.run().await;

    let finished = reporter.finished.borrow();
    assert_eq!(finished[0], "done: The script has already been run!");
    assert_eq!(
        finished[1],
        "broken: Something went wrong; please see logs! read failed on page 1: source unreachable"
    );
}
