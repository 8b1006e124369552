//! Execution engine module
//!
//! The batch catalog processor: one invocation reads the cursor, selects a
//! bounded batch of catalog pages, fetches them and their leaves through a
//! shared concurrency gate, hands each leaf to the leaf processor and advances
//! the cursor only when the whole batch was applied.
//!
//! # Overview
//!
//! ```text
//! cursor ─► window ─► index ─► select ≤ batch_size pages
//!                                   │
//!                        fetch pages (concurrent, gated)
//!                                   │
//!                  window filter ─► redundancy policy ─► latest per entity
//!                                   │
//!                  fetch + apply leaves (concurrent, gated)
//!                                   │
//!                    all applied && !cancelled ─► cursor.set(latest page)
//! ```
//!
//! A failed batch leaves the cursor untouched, so the next invocation sees
//! the same window again and re-delivers every leaf in it.

mod cancel;
mod gate;
mod selection;
mod types;
mod window;

pub use cancel::CancellationToken;
pub use gate::ConcurrencyGate;
pub use selection::{
    collect_leaves, select_pages, KeepAllLeaves, LatestPerPagePolicy, PageBatch,
    RedundancyPolicy,
};
pub use types::{BatchSummary, LeafOutcome};
pub use window::Window;

use crate::catalog::{CatalogClient, CatalogLeafItem, CatalogPage, CatalogPageItem};
use crate::config::ProcessorSettings;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::processor::LeafProcessor;
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of fetching one page
enum PageFetch {
    Fetched(CatalogPage),
    Failed,
    Skipped,
}

/// Windowed, checkpointed catalog processor
pub struct BatchCatalogProcessor {
    /// Checkpoint store
    cursor: Arc<dyn Cursor>,
    /// Feed access
    client: Arc<dyn CatalogClient>,
    /// Downstream applier
    processor: Arc<dyn LeafProcessor>,
    /// Frozen settings
    settings: ProcessorSettings,
    /// Redundant leaf predicate
    redundancy: Arc<dyn RedundancyPolicy>,
    /// Shared admission gate for page and leaf fetches
    gate: ConcurrencyGate,
}

impl BatchCatalogProcessor {
    /// Create a processor
    ///
    /// The settings are validated and copied; later changes to the caller's
    /// value have no effect on this processor.
    pub fn new(
        cursor: Arc<dyn Cursor>,
        client: Arc<dyn CatalogClient>,
        processor: Arc<dyn LeafProcessor>,
        settings: &ProcessorSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let settings = settings.clone();

        let redundancy: Arc<dyn RedundancyPolicy> = if settings.exclude_redundant_leaves {
            Arc::new(LatestPerPagePolicy)
        } else {
            Arc::new(KeepAllLeaves)
        };

        Ok(Self {
            cursor,
            client,
            processor,
            gate: ConcurrencyGate::new(settings.max_concurrency),
            settings,
            redundancy,
        })
    }

    /// Replace the redundant leaf policy
    #[must_use]
    pub fn with_redundancy_policy(mut self, policy: Arc<dyn RedundancyPolicy>) -> Self {
        self.redundancy = policy;
        self
    }

    /// Get the frozen settings
    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// Get the concurrency gate
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Process one batch; `true` when it was fully applied or empty
    pub async fn process(&self, cancel: &CancellationToken) -> Result<bool> {
        Ok(self.process_with_summary(cancel).await?.success)
    }

    /// Process one batch and report what happened
    ///
    /// Only an unreadable cursor and discovery failures are returned as
    /// errors; the cursor is left untouched in both cases. Page and leaf
    /// failures and cancellation produce an unsuccessful summary instead.
    pub async fn process_with_summary(&self, cancel: &CancellationToken) -> Result<BatchSummary> {
        let start = Instant::now();

        let checkpoint = self.cursor.get().await?;
        let window = Window::resolve(checkpoint, &self.settings);
        info!(
            "Using time bounds {} (exclusive) to {} (inclusive)",
            window.min.to_rfc3339(),
            window.max.to_rfc3339()
        );

        let mut summary = BatchSummary::new(window);
        if window.is_empty() {
            info!("Time window {window} is empty, nothing to do");
            summary.set_duration(start.elapsed().as_millis() as u64);
            return Ok(summary);
        }

        let catalog_url = self.catalog_index_url().await?;
        let index = self.client.get_index(&catalog_url).await.map_err(|e| {
            Error::discovery(format!("Failed to fetch catalog index {catalog_url}: {e}"))
        })?;

        let batch = select_pages(&index, &window, self.settings.batch_size);
        summary.pages_in_bounds = batch.pages_in_bounds;
        summary.pages_selected = batch.pages.len();
        info!(
            "{} pages were in the time bounds, out of {}; processing {}",
            batch.pages_in_bounds,
            index.items.len(),
            batch.pages.len()
        );

        let Some(latest_commit) = batch.latest_commit() else {
            summary.set_duration(start.elapsed().as_millis() as u64);
            return Ok(summary);
        };
        let proposed = latest_commit.min(window.max);
        summary.proposed_checkpoint = Some(proposed);

        // Stage 1: pages
        let fetches = join_all(batch.pages.iter().map(|page| self.fetch_page(page, cancel))).await;
        let mut pages = Vec::with_capacity(fetches.len());
        for fetch in fetches {
            match fetch {
                PageFetch::Fetched(page) => pages.push(page),
                PageFetch::Failed | PageFetch::Skipped => summary.pages_failed += 1,
            }
        }
        summary.pages_fetched = pages.len();

        // Stage 2: leaves
        let leaves = collect_leaves(&pages, &window, self.redundancy.as_ref());
        summary.leaves_selected = leaves.len();
        debug!(
            "{} leaves to process from {} pages",
            leaves.len(),
            pages.len()
        );

        let outcomes = join_all(leaves.iter().map(|leaf| self.process_leaf(leaf, cancel))).await;
        for outcome in &outcomes {
            summary.add_leaf(outcome);
        }

        summary.cancelled = cancel.is_cancelled();
        summary.success =
            summary.pages_failed == 0 && summary.leaves_failed == 0 && !summary.cancelled;

        if summary.cancelled {
            warn!("Stop processing because of cancellation request");
        } else if summary.pages_failed > 0 {
            warn!(
                "{} of {} pages could not be fetched, cursor not advanced",
                summary.pages_failed, summary.pages_selected
            );
        } else if summary.leaves_failed > 0 {
            warn!(
                "{} of {} leaves failed, cursor not advanced",
                summary.leaves_failed, summary.leaves_selected
            );
        }

        if summary.success && proposed > window.min {
            self.cursor.set(proposed).await;
            summary.committed_checkpoint = Some(proposed);
            info!("Cursor advanced to {}", proposed.to_rfc3339());
        }

        summary.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Batch finished in {}ms: {} applied, {} failed, success={}",
            summary.duration_ms, summary.leaves_applied, summary.leaves_failed, summary.success
        );

        Ok(summary)
    }

    /// Resolve the catalog index URL from the service index
    async fn catalog_index_url(&self) -> Result<String> {
        let service_index_url = &self.settings.service_index_url;
        info!("Getting catalog index URL from {service_index_url}");

        let service_index = self
            .client
            .get_service_index(service_index_url)
            .await
            .map_err(|e| {
                Error::discovery(format!(
                    "Failed to fetch service index {service_index_url}: {e}"
                ))
            })?;

        service_index
            .catalog_url()
            .map(ToString::to_string)
            .ok_or_else(|| {
                Error::discovery(format!(
                    "The service index does not contain resource '{}'",
                    crate::catalog::CATALOG_RESOURCE_TYPE
                ))
            })
    }

    /// Fetch one page through the gate
    async fn fetch_page(&self, page: &CatalogPageItem, cancel: &CancellationToken) -> PageFetch {
        let Some(_permit) = self.gate.enter(cancel).await else {
            debug!("Skipping page {} after cancellation", page.url);
            return PageFetch::Skipped;
        };

        match self.client.get_page(&page.url).await {
            Ok(_) if cancel.is_cancelled() => PageFetch::Skipped,
            Ok(fetched) => PageFetch::Fetched(fetched),
            Err(e) => {
                warn!(url = %page.url, error = %e, "Failed to fetch catalog page");
                PageFetch::Failed
            }
        }
    }

    /// Fetch and apply one leaf through the gate
    async fn process_leaf(&self, leaf: &CatalogLeafItem, cancel: &CancellationToken) -> LeafOutcome {
        let outcome = match self.gate.enter(cancel).await {
            None => LeafOutcome::Cancelled,
            Some(_permit) => self.apply_leaf(leaf).await,
        };

        if !outcome.is_success() {
            warn!(
                "Failed to process leaf {} ({} {}, {}): {}",
                leaf.url, leaf.package_id, leaf.package_version, leaf.leaf_type, outcome
            );
        }
        outcome
    }

    async fn apply_leaf(&self, leaf: &CatalogLeafItem) -> LeafOutcome {
        if !leaf.leaf_type.is_known() {
            return LeafOutcome::Unsupported(leaf.leaf_type.clone());
        }

        let work = async {
            let materialized = self.client.get_leaf(&leaf.url, &leaf.leaf_type).await?;
            Ok::<bool, Error>(self.processor.process(&materialized).await)
        };

        match AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(true)) => LeafOutcome::Applied,
            Ok(Ok(false)) => LeafOutcome::Rejected,
            Ok(Err(Error::UnsupportedLeafType { .. })) => {
                LeafOutcome::Unsupported(leaf.leaf_type.clone())
            }
            Ok(Err(e)) => {
                error!(url = %leaf.url, error = %e, "An error occurred while processing leaf");
                LeafOutcome::Failed(e.to_string())
            }
            Err(_) => {
                error!(url = %leaf.url, "Leaf processing panicked");
                LeafOutcome::Failed("leaf processing panicked".to_string())
            }
        }
    }
}

impl std::fmt::Debug for BatchCatalogProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCatalogProcessor")
            .field("settings", &self.settings)
            .field("redundancy", &self.redundancy)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
