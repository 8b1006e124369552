//! Catalog feed module
//!
//! Models and client for the append-only, paginated package catalog.
//!
//! # Overview
//!
//! ```text
//! service index ──► catalog index ──► pages ──► leaf items ──► leaves
//!   (resources)      (page refs)                (refs)        (details/delete)
//! ```
//!
//! Every page and leaf carries a commit timestamp; the crawler orders and
//! windows the feed by it.

mod client;
mod models;

pub use client::{CatalogClient, HttpCatalogClient};
pub use models::{
    CatalogIndex, CatalogLeaf, CatalogLeafItem, CatalogPage, CatalogPageItem, EntityKey, LeafType,
    PackageDeleteLeaf, PackageDetailsLeaf, ServiceIndex, ServiceResource, CATALOG_RESOURCE_TYPE,
};

#[cfg(test)]
mod tests;
