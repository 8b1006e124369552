//! Time window resolution

use crate::config::ProcessorSettings;
use crate::types::CommitTimestamp;
use std::fmt;

/// Commit timestamp range `(min, max]` considered by one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Exclusive lower bound
    pub min: CommitTimestamp,
    /// Inclusive upper bound
    pub max: CommitTimestamp,
}

impl Window {
    /// Create a window
    pub fn new(min: CommitTimestamp, max: CommitTimestamp) -> Self {
        Self { min, max }
    }

    /// Whether a commit timestamp falls inside the window
    pub fn contains(&self, timestamp: CommitTimestamp) -> bool {
        timestamp > self.min && timestamp <= self.max
    }

    /// Whether no timestamp can fall inside the window
    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }

    /// Resolve the window for an invocation
    ///
    /// The lower bound is the persisted cursor, else the configured default
    /// start, else the floor, and never below the floor.
    pub fn resolve(cursor: Option<CommitTimestamp>, settings: &ProcessorSettings) -> Self {
        let start = cursor
            .or(settings.default_min_commit_timestamp)
            .unwrap_or(settings.min_commit_timestamp);

        Self {
            min: start.max(settings.min_commit_timestamp),
            max: settings.max_commit_timestamp,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.min.to_rfc3339(), self.max.to_rfc3339())
    }
}
