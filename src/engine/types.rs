//! Engine types
//!
//! Per-leaf outcomes and the summary of one batch invocation.

use super::window::Window;
use crate::catalog::LeafType;
use crate::types::CommitTimestamp;
use std::fmt;

/// Result of dispatching a single leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafOutcome {
    /// Fetched and accepted by the leaf processor
    Applied,
    /// Fetched, but the leaf processor reported failure
    Rejected,
    /// Fetching or processing failed
    Failed(String),
    /// The leaf kind is not understood
    Unsupported(LeafType),
    /// Not attempted because cancellation was requested
    Cancelled,
}

impl LeafOutcome {
    /// Whether the leaf was applied
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl fmt::Display for LeafOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Rejected => f.write_str("rejected by processor"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Unsupported(leaf_type) => write!(f, "unsupported leaf type {leaf_type}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Summary of one invocation of the batch processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Whether the whole batch was applied (true when there was nothing to do)
    pub success: bool,
    /// Window used for this invocation
    pub window: Window,
    /// Pages past the lower bound in the index
    pub pages_in_bounds: usize,
    /// Pages taken into the batch
    pub pages_selected: usize,
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Pages that failed to fetch or were skipped
    pub pages_failed: usize,
    /// Leaves dispatched after deduplication
    pub leaves_selected: usize,
    /// Leaves applied
    pub leaves_applied: usize,
    /// Leaves not applied, for any reason
    pub leaves_failed: usize,
    /// Whether cancellation was observed
    pub cancelled: bool,
    /// Checkpoint value the batch would commit on success
    pub proposed_checkpoint: Option<CommitTimestamp>,
    /// Checkpoint value actually committed
    pub committed_checkpoint: Option<CommitTimestamp>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl BatchSummary {
    /// Empty summary for a window
    pub fn new(window: Window) -> Self {
        Self {
            success: true,
            window,
            pages_in_bounds: 0,
            pages_selected: 0,
            pages_fetched: 0,
            pages_failed: 0,
            leaves_selected: 0,
            leaves_applied: 0,
            leaves_failed: 0,
            cancelled: false,
            proposed_checkpoint: None,
            committed_checkpoint: None,
            duration_ms: 0,
        }
    }

    /// Record a leaf outcome
    pub fn add_leaf(&mut self, outcome: &LeafOutcome) {
        if outcome.is_success() {
            self.leaves_applied += 1;
        } else {
            self.leaves_failed += 1;
        }
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
