//! In-memory cursor

use super::Cursor;
use crate::error::Result;
use crate::types::CommitTimestamp;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cursor that lives only as long as the process
///
/// Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCursor {
    value: Arc<RwLock<Option<CommitTimestamp>>>,
}

impl InMemoryCursor {
    /// Create a cursor, optionally seeded with a start value
    pub fn new(start: Option<CommitTimestamp>) -> Self {
        Self {
            value: Arc::new(RwLock::new(start)),
        }
    }
}

#[async_trait]
impl Cursor for InMemoryCursor {
    async fn get(&self) -> Result<Option<CommitTimestamp>> {
        Ok(*self.value.read().await)
    }

    async fn set(&self, value: CommitTimestamp) {
        *self.value.write().await = Some(value);
    }
}
