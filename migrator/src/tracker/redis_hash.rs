//! Execution tracking in Redis.

use std::collections::HashMap;

use log::{debug, warn};
use redis::aio::{ConnectionLike, ConnectionManager};

use super::{ExecutionRecord, ExecutionTracker};
use crate::config::Configuration;
use crate::errors::TrackerError;

/// Records executed scripts in a Redis hash.
///
/// The hash is named after the configured script store. Each field is a script
/// name and holds the JSON-encoded [`ExecutionRecord`].
pub struct RedisScriptTracker<C = ConnectionManager>
where
    C: ConnectionLike + Send,
{
    conn: C,
    config: Configuration,
}

impl RedisScriptTracker<ConnectionManager> {
    /// Open a managed connection to `redis_url` and track `config`'s script.
    pub async fn connect(redis_url: &str, config: Configuration) -> Result<Self, TrackerError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn, config))
    }
}

impl<C> RedisScriptTracker<C>
where
    C: ConnectionLike + Send,
{
    pub fn new(conn: C, config: Configuration) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }
}

impl<C> ExecutionTracker for RedisScriptTracker<C>
where
    C: ConnectionLike + Send,
{
    fn script_name(&self) -> &str {
        self.config.script_name()
    }

    async fn is_executed(&mut self) -> Result<bool, TrackerError> {
        let exists: bool = redis::cmd("HEXISTS")
            .arg(self.config.script_store())
            .arg(self.config.script_name())
            .query_async(&mut self.conn)
            .await?;
        Ok(exists)
    }

    async fn store_execution(&mut self, record: &ExecutionRecord) -> Result<(), TrackerError> {
        let mut record = record.clone();
        record.script = self.config.script_name().to_string();
        let payload = serde_json::to_string(&record)?;

        let inserted: bool = redis::cmd("HSETNX")
            .arg(self.config.script_store())
            .arg(self.config.script_name())
            .arg(&payload)
            .query_async(&mut self.conn)
            .await?;

        if inserted {
            debug!(
                "recorded execution of '{}' in '{}'",
                self.config.script_name(),
                self.config.script_store()
            );
        } else {
            // A concurrent or forced run already holds the record; the first one wins.
            warn!(
                "execution of '{}' was already recorded in '{}'; keeping the existing record",
                self.config.script_name(),
                self.config.script_store()
            );
        }
        Ok(())
    }

    async fn list_executions(&mut self) -> Result<Vec<ExecutionRecord>, TrackerError> {
        list_store_records(&mut self.conn, self.config.script_store()).await
    }
}

/// Every record in `script_store`, oldest first.
pub async fn list_store_records<C>(conn: &mut C, script_store: &str) -> Result<Vec<ExecutionRecord>, TrackerError>
where
    C: ConnectionLike + Send,
{
    let raw: HashMap<String, String> = redis::cmd("HGETALL").arg(script_store).query_async(conn).await?;

    let mut records = raw
        .into_iter()
        .map(|(script, json)| {
            serde_json::from_str::<ExecutionRecord>(&json).map_err(|err| TrackerError::Corrupt {
                script,
                message: err.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    records.sort_by(|a, b| a.executed_at.cmp(&b.executed_at).then_with(|| a.script.cmp(&b.script)));
    Ok(records)
}
