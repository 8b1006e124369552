// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # catalog-sync
//!
//! An incremental crawler for append-only, timestamp-ordered catalog feeds.
//!
//! Each invocation of the [`BatchCatalogProcessor`] reads a persisted cursor,
//! takes a bounded batch of catalog pages committed after it, fetches those
//! pages and their leaves concurrently under one shared limit, collapses
//! superseded events for the same package version, and hands the survivors
//! to a [`LeafProcessor`]. The cursor only moves when the whole batch was
//! applied, so a failure or cancellation never loses an event.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_sync::{
//!     BatchCatalogProcessor, CancellationToken, FileCursor, HttpCatalogClient, HttpClient,
//!     OperationFormat, OperationWriter, ProcessorSettings, Result,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = ProcessorSettings::new("https://api.nuget.org/v3/index.json");
//!     let engine = BatchCatalogProcessor::new(
//!         Arc::new(FileCursor::new("cursor.json")),
//!         Arc::new(HttpCatalogClient::new(HttpClient::new()?)),
//!         Arc::new(OperationWriter::new(std::io::stdout(), OperationFormat::Pretty)),
//!         &settings,
//!     )?;
//!
//!     while engine.process(&CancellationToken::new()).await? {
//!         tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    BatchCatalogProcessor                        │
//! │  window → select pages → fetch → dedup leaves → apply → commit  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌───────────┬───────────────────┬───────────────┬───────────────┐
//! │  Cursor   │   CatalogClient   │ LeafProcessor │     HTTP      │
//! ├───────────┼───────────────────┼───────────────┼───────────────┤
//! │ In-memory │ Service index     │ Delegating    │ Retry         │
//! │ File      │ Index/page/leaf   │ Op. writer    │ Rate limit    │
//! └───────────┴───────────────────┴───────────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Catalog documents and feed client
pub mod catalog;

/// Checkpoint storage
pub mod cursor;

/// Leaf processors
pub mod processor;

/// Batch catalog processor
pub mod engine;

/// Settings and config file
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use catalog::{CatalogClient, CatalogLeaf, HttpCatalogClient, LeafType};
pub use config::{ProcessorSettings, SyncConfig};
pub use cursor::{Cursor, FileCursor, InMemoryCursor};
pub use engine::{BatchCatalogProcessor, BatchSummary, CancellationToken, LeafOutcome};
pub use http::HttpClient;
pub use processor::{DelegatingLeafProcessor, LeafProcessor, OperationFormat, OperationWriter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
