//! Common types used throughout catalog-sync
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Point in time assigned by the feed to a page or leaf
pub type CommitTimestamp = DateTime<Utc>;

/// Earliest representable commit timestamp (the default window floor)
pub fn min_commit_timestamp() -> CommitTimestamp {
    DateTime::<Utc>::MIN_UTC
}

/// Latest representable commit timestamp (the default window ceiling)
pub fn max_commit_timestamp() -> CommitTimestamp {
    DateTime::<Utc>::MAX_UTC
}

/// Year of the published date the feed uses to mark a package as unlisted
pub const UNLISTED_PUBLISHED_YEAR: i32 = 1900;

// ============================================================================
// Retry Types
// ============================================================================

/// Backoff strategy for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_type_serde() {
        let json = serde_json::to_string(&BackoffType::Linear).unwrap();
        assert_eq!(json, "\"linear\"");

        let parsed: BackoffType = serde_json::from_str("\"constant\"").unwrap();
        assert_eq!(parsed, BackoffType::Constant);
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }

    #[test]
    fn test_timestamp_bounds() {
        assert!(min_commit_timestamp() < Utc::now());
        assert!(max_commit_timestamp() > Utc::now());
    }
}
