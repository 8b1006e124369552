//! Cursor module
//!
//! Persistence of the crawler's checkpoint: the commit timestamp up to and
//! including which every catalog leaf has been fully applied.
//!
//! # Overview
//!
//! The cursor module provides:
//! - `Cursor` - The storage contract the batch processor reads and advances
//! - `InMemoryCursor` - Process-local cursor for one-shot dumps and tests
//! - `FileCursor` - JSON file cursor with atomic writes
//!
//! Writing a cursor never fails from the caller's point of view. A store that
//! cannot persist logs the problem and keeps the value in memory, so the next
//! run simply re-processes the same window.
//!
//! Reading is fallible. A store that exists but cannot be read is an error,
//! never "no checkpoint": treating it as absent would rewind the crawl.

mod file;
mod memory;

pub use file::{CursorDocument, FileCursor};
pub use memory::InMemoryCursor;

use crate::error::Result;
use crate::types::CommitTimestamp;
use async_trait::async_trait;

/// Checkpoint storage used by the batch processor
#[async_trait]
pub trait Cursor: Send + Sync {
    /// Last persisted checkpoint, if any
    ///
    /// Fails when a checkpoint may exist but could not be read.
    async fn get(&self) -> Result<Option<CommitTimestamp>>;

    /// Persist a new checkpoint (best effort)
    async fn set(&self, value: CommitTimestamp);
}

#[cfg(test)]
mod tests;
