//! Catalog feed documents
//!
//! Serde models for the service index, catalog index, catalog pages and the
//! two materialized leaf kinds. Only the fields the crawler and its leaf
//! processors read are modelled; unknown fields are ignored.

use crate::types::{CommitTimestamp, UNLISTED_PUBLISHED_YEAR};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource type under which the service index advertises the catalog
pub const CATALOG_RESOURCE_TYPE: &str = "Catalog/3.0.0";

// ============================================================================
// Service Index
// ============================================================================

/// Root document of a feed, listing the resources it exposes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceIndex {
    /// Protocol version
    #[serde(default)]
    pub version: Option<String>,

    /// Advertised resources
    #[serde(default)]
    pub resources: Vec<ServiceResource>,
}

/// A single resource entry of the service index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResource {
    /// Resource URL
    #[serde(rename = "@id")]
    pub url: String,

    /// Resource type (e.g. `Catalog/3.0.0`)
    #[serde(rename = "@type")]
    pub resource_type: String,
}

impl ServiceIndex {
    /// URL of the first resource with the given type
    pub fn resource_url(&self, resource_type: &str) -> Option<&str> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type)
            .map(|r| r.url.as_str())
    }

    /// URL of the catalog index, if the feed exposes one
    pub fn catalog_url(&self) -> Option<&str> {
        self.resource_url(CATALOG_RESOURCE_TYPE)
    }
}

// ============================================================================
// Catalog Index
// ============================================================================

/// Catalog index: the ordered list of page references
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogIndex {
    /// Timestamp of the most recent commit in the catalog
    #[serde(rename = "commitTimeStamp", default)]
    pub commit_timestamp: Option<CommitTimestamp>,

    /// Number of pages
    #[serde(default)]
    pub count: usize,

    /// Page references
    #[serde(default)]
    pub items: Vec<CatalogPageItem>,
}

/// Reference to a catalog page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPageItem {
    /// Page URL
    #[serde(rename = "@id")]
    pub url: String,

    /// Timestamp of the latest leaf in the page
    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: CommitTimestamp,

    /// Number of leaves in the page
    #[serde(default)]
    pub count: usize,
}

impl CatalogIndex {
    /// Pages whose commit timestamp is strictly after `min`, oldest first
    ///
    /// Pages sharing a timestamp keep their index order.
    pub fn pages_after(&self, min: CommitTimestamp) -> Vec<&CatalogPageItem> {
        let mut pages: Vec<_> = self
            .items
            .iter()
            .filter(|page| page.commit_timestamp > min)
            .collect();
        pages.sort_by_key(|page| page.commit_timestamp);
        pages
    }
}

// ============================================================================
// Catalog Page
// ============================================================================

/// A catalog page: the leaf references committed in one time range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPage {
    /// Timestamp of the latest leaf in the page
    #[serde(rename = "commitTimeStamp", default)]
    pub commit_timestamp: Option<CommitTimestamp>,

    /// Leaf references
    #[serde(default)]
    pub items: Vec<CatalogLeafItem>,
}

impl CatalogPage {
    /// Leaves with `min < commit_timestamp <= max`, oldest first
    pub fn leaves_in_bounds(
        &self,
        min: CommitTimestamp,
        max: CommitTimestamp,
    ) -> Vec<&CatalogLeafItem> {
        let mut leaves: Vec<_> = self
            .items
            .iter()
            .filter(|leaf| leaf.commit_timestamp > min && leaf.commit_timestamp <= max)
            .collect();
        leaves.sort_by_key(|leaf| leaf.commit_timestamp);
        leaves
    }
}

/// Reference to one change event in a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLeafItem {
    /// Leaf URL
    #[serde(rename = "@id")]
    pub url: String,

    /// Kind of change
    #[serde(rename = "@type")]
    pub leaf_type: LeafType,

    /// Commit timestamp of the event
    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: CommitTimestamp,

    /// Package id
    #[serde(rename = "nuget:id")]
    pub package_id: String,

    /// Package version (as written by the feed)
    #[serde(rename = "nuget:version")]
    pub package_version: String,
}

impl CatalogLeafItem {
    /// Logical entity this leaf changes
    pub fn entity_key(&self) -> EntityKey {
        EntityKey::new(&self.package_id, &self.package_version)
    }
}

/// Case-insensitive identity of a logical entity (package id + version)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    /// Lower-cased package id
    pub id: String,
    /// Lower-cased package version
    pub version: String,
}

impl EntityKey {
    /// Build a key, folding case
    pub fn new(id: &str, version: &str) -> Self {
        Self {
            id: id.to_lowercase(),
            version: version.to_lowercase(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

// ============================================================================
// Leaf Type
// ============================================================================

/// Kind of a catalog leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeafType {
    /// A package was added or its metadata changed
    PackageDetails,
    /// A package was deleted
    PackageDelete,
    /// A leaf kind this crawler does not understand
    Unknown(String),
}

impl LeafType {
    /// Whether this is a kind the crawler can materialize
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for LeafType {
    fn from(value: String) -> Self {
        match value.strip_prefix("nuget:").unwrap_or(&value) {
            "PackageDetails" => Self::PackageDetails,
            "PackageDelete" => Self::PackageDelete,
            _ => Self::Unknown(value),
        }
    }
}

impl From<LeafType> for String {
    fn from(value: LeafType) -> Self {
        match value {
            LeafType::PackageDetails => "nuget:PackageDetails".to_string(),
            LeafType::PackageDelete => "nuget:PackageDelete".to_string(),
            LeafType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageDetails => f.write_str("PackageDetails"),
            Self::PackageDelete => f.write_str("PackageDelete"),
            Self::Unknown(other) => f.write_str(other),
        }
    }
}

// ============================================================================
// Materialized Leaves
// ============================================================================

/// Full metadata of an added or updated package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetailsLeaf {
    /// Leaf URL
    #[serde(rename = "@id")]
    pub url: String,

    /// Commit timestamp of the event
    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: CommitTimestamp,

    /// Package id
    #[serde(rename = "id")]
    pub package_id: String,

    /// Package version
    #[serde(rename = "version")]
    pub package_version: String,

    /// Version exactly as it appeared in the package manifest
    #[serde(default)]
    pub verbatim_version: Option<String>,

    /// Publish date; the 1900-01-01 sentinel marks an unlisted package
    #[serde(default)]
    pub published: Option<CommitTimestamp>,

    /// Creation date
    #[serde(default)]
    pub created: Option<CommitTimestamp>,

    /// Explicit listed flag (newer leaves only)
    #[serde(default)]
    pub listed: Option<bool>,

    /// Package authors
    #[serde(default)]
    pub authors: Option<String>,

    /// Package description
    #[serde(default)]
    pub description: Option<String>,
}

impl PackageDetailsLeaf {
    /// Whether the package is visible in search
    pub fn is_listed(&self) -> bool {
        if let Some(listed) = self.listed {
            return listed;
        }
        self.published
            .map_or(true, |published| published.year() != UNLISTED_PUBLISHED_YEAR)
    }
}

/// Identity of a deleted package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDeleteLeaf {
    /// Leaf URL
    #[serde(rename = "@id")]
    pub url: String,

    /// Commit timestamp of the event
    #[serde(rename = "commitTimeStamp")]
    pub commit_timestamp: CommitTimestamp,

    /// Package id
    #[serde(rename = "id")]
    pub package_id: String,

    /// Package version
    #[serde(rename = "version")]
    pub package_version: String,

    /// Deletion date
    #[serde(default)]
    pub published: Option<CommitTimestamp>,
}

/// A fetched leaf, tagged by kind
#[derive(Debug, Clone)]
pub enum CatalogLeaf {
    /// Add / update
    Details(PackageDetailsLeaf),
    /// Delete
    Delete(PackageDeleteLeaf),
}

impl CatalogLeaf {
    /// Kind of this leaf
    pub fn leaf_type(&self) -> LeafType {
        match self {
            Self::Details(_) => LeafType::PackageDetails,
            Self::Delete(_) => LeafType::PackageDelete,
        }
    }

    /// Logical entity this leaf changes
    pub fn entity_key(&self) -> EntityKey {
        match self {
            Self::Details(leaf) => EntityKey::new(&leaf.package_id, &leaf.package_version),
            Self::Delete(leaf) => EntityKey::new(&leaf.package_id, &leaf.package_version),
        }
    }
}
