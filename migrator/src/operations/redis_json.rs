//! RedisJSON documents as a migration source and sink.

use log::debug;
use redis::aio::{ConnectionLike, ConnectionManager};
use serde_json::Value;

use super::DataOperations;
use crate::errors::BoxError;
use crate::page::Page;

/// Keys requested per `SCAN` call unless overridden.
const DEFAULT_SCAN_COUNT: usize = 100;

/// Per-document mapping applied during the transform step.
pub type DocumentTransform = Box<dyn Fn(JsonDocument) -> Result<JsonDocument, BoxError> + Send + Sync>;

/// A RedisJSON document and the key it lives under.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonDocument {
    pub key: String,
    pub data: Value,
}

/// Reads documents matching a key pattern and writes them back in place.
///
/// Pages follow the `SCAN` cursor, so the continuation token is the cursor
/// itself and a returned cursor of 0 ends the stream. `SCAN` may return a key
/// more than once; `JSON.SET` makes the rewrite idempotent. Each batch is
/// written inside one `MULTI`/`EXEC`.
pub struct RedisJsonOperations<C = ConnectionManager>
where
    C: ConnectionLike + Send,
{
    conn: C,
    pattern: String,
    scan_count: usize,
    transform: Option<DocumentTransform>,
}

impl<C> RedisJsonOperations<C>
where
    C: ConnectionLike + Send,
{
    /// Operations over every document whose key matches `pattern` (e.g. `accounts:*`).
    pub fn new(conn: C, pattern: impl Into<String>) -> Self {
        Self {
            conn,
            pattern: pattern.into(),
            scan_count: DEFAULT_SCAN_COUNT,
            transform: None,
        }
    }

    /// Hint for how many keys one page inspects.
    pub fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(JsonDocument) -> Result<JsonDocument, BoxError> + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl<C> DataOperations for RedisJsonOperations<C>
where
    C: ConnectionLike + Send,
{
    type Item = JsonDocument;
    type Token = u64;

    async fn read(&mut self, page_token: Option<u64>) -> Result<Page<JsonDocument, u64>, BoxError> {
        let cursor = page_token.unwrap_or(0);
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(&self.pattern)
            .arg("COUNT")
            .arg(self.scan_count)
            .query_async(&mut self.conn)
            .await?;

        let mut documents = Vec::with_capacity(keys.len());
        if !keys.is_empty() {
            let raw: Vec<Option<String>> = redis::cmd("JSON.MGET")
                .arg(&keys)
                .arg("$")
                .query_async(&mut self.conn)
                .await?;

            for (key, json) in keys.into_iter().zip(raw) {
                // Deleted between SCAN and JSON.MGET.
                let Some(json) = json else {
                    continue;
                };
                if let Some(data) = parse_json_get(&json)? {
                    documents.push(JsonDocument { key, data });
                }
            }
        }

        debug!(
            "scanned '{}' at cursor {cursor}: {} document(s), next cursor {next_cursor}",
            self.pattern,
            documents.len()
        );

        Ok(if next_cursor == 0 {
            Page::last(documents)
        } else {
            Page::more(documents, next_cursor)
        })
    }

    fn transform(&self, items: Vec<JsonDocument>) -> Result<Vec<JsonDocument>, BoxError> {
        match &self.transform {
            Some(transform) => items.into_iter().map(transform).collect(),
            None => Ok(items),
        }
    }

    async fn write(&mut self, batch: Vec<JsonDocument>) -> Result<(), BoxError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for document in &batch {
            let json = serde_json::to_string(&document.data)?;
            pipe.cmd("JSON.SET").arg(&document.key).arg("$").arg(json).ignore();
        }

        let _: () = pipe.query_async(&mut self.conn).await?;
        Ok(())
    }
}

/// `JSON.GET key $` answers with a JSON array holding the root value.
fn parse_json_get(raw: &str) -> Result<Option<Value>, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(raw)?;
    Ok(values.into_iter().next())
}
