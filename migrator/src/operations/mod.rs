//! Source/sink capability supplied per migration.

mod redis_json;

pub use redis_json::{DocumentTransform, JsonDocument, RedisJsonOperations};

use crate::errors::BoxError;
use crate::page::Page;

/// Reads pages of items, optionally transforms them, and writes batches.
///
/// `read` must be a function of its token over a stable dataset: following the
/// tokens from `None` to the last page visits every item once. `transform` is
/// applied to one page at a time and defaults to the identity. `write` persists
/// one batch and only returns once the sink has accepted it.
#[allow(async_fn_in_trait)]
pub trait DataOperations {
    type Item;
    /// Opaque continuation token, handed back to `read` verbatim.
    type Token;

    async fn read(&mut self, page_token: Option<Self::Token>) -> Result<Page<Self::Item, Self::Token>, BoxError>;

    fn transform(&self, items: Vec<Self::Item>) -> Result<Vec<Self::Item>, BoxError> {
        Ok(items)
    }

    async fn write(&mut self, batch: Vec<Self::Item>) -> Result<(), BoxError>;
}
