use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ExecutionRecord, ExecutionTracker};
use crate::config::Configuration;
use crate::errors::TrackerError;

/// Process-local store of execution records, shared by every tracker handed out.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<BTreeMap<String, ExecutionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker for `config`'s script backed by this store.
    pub fn tracker(&self, config: &Configuration) -> InMemoryTracker {
        InMemoryTracker {
            store: self.clone(),
            script_name: config.script_name().to_string(),
        }
    }

    /// Mark `script` as executed without running anything.
    pub fn mark_executed(&self, script: &str) -> Result<(), TrackerError> {
        self.lock()?
            .entry(script.to_string())
            .or_insert_with(|| ExecutionRecord::new(script));
        Ok(())
    }

    pub fn contains(&self, script: &str) -> Result<bool, TrackerError> {
        Ok(self.lock()?.contains_key(script))
    }

    pub fn get(&self, script: &str) -> Result<Option<ExecutionRecord>, TrackerError> {
        Ok(self.lock()?.get(script).cloned())
    }

    pub fn len(&self) -> Result<usize, TrackerError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, TrackerError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, ExecutionRecord>>, TrackerError> {
        self.records.lock().map_err(|_| TrackerError::Other {
            message: Cow::Borrowed("in-memory execution store is poisoned"),
        })
    }
}

/// [`ExecutionTracker`] over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct InMemoryTracker {
    store: MemoryStore,
    script_name: String,
}

impl InMemoryTracker {
    /// Tracker with a fresh, private store.
    pub fn new(config: &Configuration) -> Self {
        MemoryStore::new().tracker(config)
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl ExecutionTracker for InMemoryTracker {
    fn script_name(&self) -> &str {
        &self.script_name
    }

    async fn is_executed(&mut self) -> Result<bool, TrackerError> {
        self.store.contains(&self.script_name)
    }

    async fn store_execution(&mut self, record: &ExecutionRecord) -> Result<(), TrackerError> {
        let mut record = record.clone();
        record.script = self.script_name.clone();
        self.store.lock()?.entry(self.script_name.clone()).or_insert(record);
        Ok(())
    }

    async fn list_executions(&mut self) -> Result<Vec<ExecutionRecord>, TrackerError> {
        let mut records: Vec<ExecutionRecord> = self.store.lock()?.values().cloned().collect();
        records.sort_by(|a, b| a.executed_at.cmp(&b.executed_at).then_with(|| a.script.cmp(&b.script)));
        Ok(records)
    }
}
