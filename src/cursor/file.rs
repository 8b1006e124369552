//! File-backed cursor
//!
//! Stores the checkpoint as a small JSON document with atomic writes.

use super::Cursor;
use crate::error::{Error, Result};
use crate::types::CommitTimestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// On-disk cursor document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorDocument {
    /// Checkpoint value
    #[serde(default)]
    pub value: Option<CommitTimestamp>,
}

/// Cursor persisted to a JSON file
#[derive(Debug, Clone)]
pub struct FileCursor {
    /// Path to the cursor file
    path: PathBuf,
    /// Last value this instance set, persisted or not
    last_known: Arc<RwLock<Option<CommitTimestamp>>>,
}

impl FileCursor {
    /// Create a cursor stored at the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            last_known: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the cursor file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cursor file
    ///
    /// Returns `Ok(None)` when the file does not exist yet, and an error when
    /// it exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<Option<CommitTimestamp>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::cursor(format!("Failed to read cursor file: {e}")))?;

        let document: CursorDocument = serde_json::from_str(&contents)
            .map_err(|e| Error::cursor(format!("Failed to parse cursor file: {e}")))?;

        Ok(document.value)
    }

    /// Write the cursor file, reporting failures
    pub async fn try_set(&self, value: CommitTimestamp) -> Result<()> {
        *self.last_known.write().await = Some(value);

        let document = CursorDocument { value: Some(value) };
        let contents = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::cursor(format!("Failed to serialize cursor: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::cursor(format!("Failed to create cursor directory: {e}"))
                })?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::cursor(format!("Failed to write cursor file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::cursor(format!("Failed to rename cursor file: {e}")))?;

        debug!(path = %self.path.display(), %value, "Cursor saved");
        Ok(())
    }
}

#[async_trait]
impl Cursor for FileCursor {
    async fn get(&self) -> Result<Option<CommitTimestamp>> {
        let stored = self.load().await.map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Unreadable cursor");
            e
        })?;

        // A write that failed to persist is still ahead of the file
        let last_known = *self.last_known.read().await;
        Ok(stored.max(last_known))
    }

    async fn set(&self, value: CommitTimestamp) {
        if let Err(e) = self.try_set(value).await {
            warn!(path = %self.path.display(), error = %e, "Failed to persist cursor");
        }
    }
}
