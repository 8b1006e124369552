//! Closure-backed leaf processor

use super::LeafProcessor;
use crate::catalog::{PackageDeleteLeaf, PackageDetailsLeaf};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

type Handler<L> = Box<dyn Fn(L) -> BoxFuture<'static, bool> + Send + Sync>;

/// Leaf processor that forwards each leaf kind to an async closure
///
/// ```rust,ignore
/// let processor = DelegatingLeafProcessor::new(
///     |added| async move { index.upsert(added).await.is_ok() },
///     |deleted| async move { index.remove(deleted).await.is_ok() },
/// );
/// ```
pub struct DelegatingLeafProcessor {
    on_details: Handler<PackageDetailsLeaf>,
    on_delete: Handler<PackageDeleteLeaf>,
}

impl DelegatingLeafProcessor {
    /// Create a processor from an add handler and a delete handler
    pub fn new<FA, RA, FD, RD>(on_details: FA, on_delete: FD) -> Self
    where
        FA: Fn(PackageDetailsLeaf) -> RA + Send + Sync + 'static,
        RA: Future<Output = bool> + Send + 'static,
        FD: Fn(PackageDeleteLeaf) -> RD + Send + Sync + 'static,
        RD: Future<Output = bool> + Send + 'static,
    {
        Self {
            on_details: Box::new(move |leaf| on_details(leaf).boxed()),
            on_delete: Box::new(move |leaf| on_delete(leaf).boxed()),
        }
    }
}

impl std::fmt::Debug for DelegatingLeafProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatingLeafProcessor").finish_non_exhaustive()
    }
}

#[async_trait]
impl LeafProcessor for DelegatingLeafProcessor {
    async fn process_package_details(&self, leaf: &PackageDetailsLeaf) -> bool {
        (self.on_details)(leaf.clone()).await
    }

    async fn process_package_delete(&self, leaf: &PackageDeleteLeaf) -> bool {
        (self.on_delete)(leaf.clone()).await
    }
}
