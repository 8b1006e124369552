//! Page selection and leaf collection
//!
//! Pure functions over fetched feed documents: which pages an invocation
//! takes, and which leaves of those pages it dispatches.

use super::window::Window;
use crate::catalog::{CatalogIndex, CatalogLeafItem, CatalogPage, CatalogPageItem, EntityKey};
use crate::types::CommitTimestamp;
use std::collections::HashMap;
use std::fmt::Debug;

// ============================================================================
// Page Selection
// ============================================================================

/// Pages taken by one invocation
#[derive(Debug, Clone)]
pub struct PageBatch<'a> {
    /// Selected pages, oldest first
    pub pages: Vec<&'a CatalogPageItem>,
    /// Number of pages past the lower bound before the batch limit applied
    pub pages_in_bounds: usize,
}

impl PageBatch<'_> {
    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Latest page commit timestamp in the batch
    pub fn latest_commit(&self) -> Option<CommitTimestamp> {
        self.pages.iter().map(|page| page.commit_timestamp).max()
    }
}

/// Select at most `batch_size` pages committed after the window's lower bound
///
/// A page's timestamp is that of its newest leaf, so a page at or below the
/// lower bound holds nothing new. The oldest pages are taken first so that
/// successive invocations work through a backlog in order.
pub fn select_pages<'a>(index: &'a CatalogIndex, window: &Window, batch_size: usize) -> PageBatch<'a> {
    let mut pages = index.pages_after(window.min);
    let pages_in_bounds = pages.len();
    pages.truncate(batch_size);

    PageBatch {
        pages,
        pages_in_bounds,
    }
}

// ============================================================================
// Redundant Leaf Policies
// ============================================================================

/// Decides which leaves of a single page are redundant
///
/// Receives the in-window leaves of one page, oldest first, and returns the
/// ones to keep in the same order.
pub trait RedundancyPolicy: Send + Sync + Debug {
    /// Drop redundant leaves
    fn retain<'a>(&self, leaves: Vec<&'a CatalogLeafItem>) -> Vec<&'a CatalogLeafItem>;
}

/// Keeps every leaf
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAllLeaves;

impl RedundancyPolicy for KeepAllLeaves {
    fn retain<'a>(&self, leaves: Vec<&'a CatalogLeafItem>) -> Vec<&'a CatalogLeafItem> {
        leaves
    }
}

/// Within a page, keeps only the latest leaf per package id and version
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestPerPagePolicy;

impl RedundancyPolicy for LatestPerPagePolicy {
    fn retain<'a>(&self, leaves: Vec<&'a CatalogLeafItem>) -> Vec<&'a CatalogLeafItem> {
        let mut last_index: HashMap<EntityKey, usize> = HashMap::new();
        for (i, leaf) in leaves.iter().enumerate() {
            last_index.insert(leaf.entity_key(), i);
        }

        leaves
            .into_iter()
            .enumerate()
            .filter(|(i, leaf)| last_index.get(&leaf.entity_key()) == Some(i))
            .map(|(_, leaf)| leaf)
            .collect()
    }
}

// ============================================================================
// Leaf Collection
// ============================================================================

/// Flatten, window, filter and deduplicate the leaves of fetched pages
///
/// At most one leaf per logical entity survives: the one with the greatest
/// commit timestamp, with later feed position winning ties. The result is
/// ordered by commit timestamp.
pub fn collect_leaves(
    pages: &[CatalogPage],
    window: &Window,
    policy: &dyn RedundancyPolicy,
) -> Vec<CatalogLeafItem> {
    let mut latest: HashMap<EntityKey, &CatalogLeafItem> = HashMap::new();

    for page in pages {
        let in_window = page.leaves_in_bounds(window.min, window.max);
        for leaf in policy.retain(in_window) {
            latest
                .entry(leaf.entity_key())
                .and_modify(|current| {
                    if leaf.commit_timestamp >= current.commit_timestamp {
                        *current = leaf;
                    }
                })
                .or_insert(leaf);
        }
    }

    let mut leaves: Vec<CatalogLeafItem> = latest.into_values().cloned().collect();
    leaves.sort_by(|a, b| {
        a.commit_timestamp
            .cmp(&b.commit_timestamp)
            .then_with(|| a.entity_key().cmp(&b.entity_key()))
    });
    leaves
}
