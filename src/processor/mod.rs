//! Leaf processor module
//!
//! The downstream side of the crawler: whatever applies an add or delete
//! event to a search index, queue or table implements [`LeafProcessor`].
//!
//! Processors must tolerate repeats. A batch that fails anywhere is retried
//! as a whole, so leaves that already succeeded are delivered again: adds
//! should behave like upserts and deletes should be no-ops when the package
//! is already gone.

mod delegating;
mod operation;
mod writer;

pub use delegating::DelegatingLeafProcessor;
pub use operation::{
    normalize_version, package_url, OperationAction, PackageOperation,
    DEFAULT_PACKAGE_URL_TEMPLATE,
};
pub use writer::{OperationFormat, OperationWriter};

use crate::catalog::{CatalogLeaf, PackageDeleteLeaf, PackageDetailsLeaf};
use async_trait::async_trait;

/// Applies materialized catalog leaves to a downstream system
#[async_trait]
pub trait LeafProcessor: Send + Sync {
    /// Apply an added or updated package; `false` marks the leaf failed
    async fn process_package_details(&self, leaf: &PackageDetailsLeaf) -> bool;

    /// Apply a deleted package; `false` marks the leaf failed
    async fn process_package_delete(&self, leaf: &PackageDeleteLeaf) -> bool;

    /// Dispatch on the leaf kind
    async fn process(&self, leaf: &CatalogLeaf) -> bool {
        match leaf {
            CatalogLeaf::Details(details) => self.process_package_details(details).await,
            CatalogLeaf::Delete(delete) => self.process_package_delete(delete).await,
        }
    }
}
