//! Catalog client
//!
//! The crawler only talks to the feed through [`CatalogClient`], which keeps
//! the engine testable against in-memory feeds. [`HttpCatalogClient`] is the
//! network implementation.

use super::models::{
    CatalogIndex, CatalogLeaf, CatalogPage, LeafType, PackageDeleteLeaf, PackageDetailsLeaf,
    ServiceIndex,
};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use async_trait::async_trait;
use tracing::debug;

/// Read access to a catalog feed
///
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the feed's service index
    async fn get_service_index(&self, url: &str) -> Result<ServiceIndex>;

    /// Fetch the catalog index
    async fn get_index(&self, url: &str) -> Result<CatalogIndex>;

    /// Fetch one catalog page
    async fn get_page(&self, url: &str) -> Result<CatalogPage>;

    /// Fetch and materialize a leaf of the given kind
    async fn get_leaf(&self, url: &str, leaf_type: &LeafType) -> Result<CatalogLeaf>;
}

/// Catalog client backed by [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: HttpClient,
}

impl HttpCatalogClient {
    /// Create a catalog client over an HTTP client
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_service_index(&self, url: &str) -> Result<ServiceIndex> {
        debug!(url, "Fetching service index");
        self.http.get_json(url).await
    }

    async fn get_index(&self, url: &str) -> Result<CatalogIndex> {
        debug!(url, "Fetching catalog index");
        self.http.get_json(url).await
    }

    async fn get_page(&self, url: &str) -> Result<CatalogPage> {
        debug!(url, "Fetching catalog page");
        self.http.get_json(url).await
    }

    async fn get_leaf(&self, url: &str, leaf_type: &LeafType) -> Result<CatalogLeaf> {
        match leaf_type {
            LeafType::PackageDetails => Ok(CatalogLeaf::Details(
                self.http.get_json::<PackageDetailsLeaf>(url).await?,
            )),
            LeafType::PackageDelete => Ok(CatalogLeaf::Delete(
                self.http.get_json::<PackageDeleteLeaf>(url).await?,
            )),
            LeafType::Unknown(other) => Err(Error::unsupported_leaf(other.clone())),
        }
    }
}
