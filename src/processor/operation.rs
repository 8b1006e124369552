//! Package operations
//!
//! The flat add/delete record handed to downstream consumers.

use crate::catalog::{PackageDeleteLeaf, PackageDetailsLeaf};
use crate::types::CommitTimestamp;
use serde::{Deserialize, Serialize};

/// Default download URL template; `{id}` and `{version}` are substituted
pub const DEFAULT_PACKAGE_URL_TEMPLATE: &str =
    "https://api.nuget.org/v3-flatcontainer/{id}/{version}/{id}.{version}.nupkg";

/// What happened to a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationAction {
    /// Added or updated
    Add,
    /// Deleted
    Delete,
}

/// A single package change, ready for a downstream system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOperation {
    /// Package id
    pub id: String,
    /// Version as written by the feed
    pub version: String,
    /// Version as it appeared in the manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_verbatim: Option<String>,
    /// Normalized version
    pub version_normalized: String,
    /// Publish date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<CommitTimestamp>,
    /// Download URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_url: Option<String>,
    /// Whether the package is listed
    pub is_listed: bool,
    /// Add or delete
    pub action: OperationAction,
    /// Commit timestamp of the originating leaf
    pub commit_timestamp: CommitTimestamp,
}

impl PackageOperation {
    /// Build an add operation from a details leaf
    pub fn for_add(leaf: &PackageDetailsLeaf, url_template: &str) -> Self {
        let normalized = normalize_version(&leaf.package_version);
        Self {
            package_url: Some(package_url(url_template, &leaf.package_id, &normalized)),
            id: leaf.package_id.clone(),
            version: leaf.package_version.clone(),
            version_verbatim: leaf.verbatim_version.clone(),
            version_normalized: normalized,
            published: leaf.published,
            is_listed: leaf.is_listed(),
            action: OperationAction::Add,
            commit_timestamp: leaf.commit_timestamp,
        }
    }

    /// Build a delete operation from a delete leaf
    pub fn for_delete(leaf: &PackageDeleteLeaf) -> Self {
        Self {
            id: leaf.package_id.clone(),
            version: leaf.package_version.clone(),
            version_verbatim: None,
            version_normalized: normalize_version(&leaf.package_version),
            published: leaf.published,
            package_url: None,
            is_listed: false,
            action: OperationAction::Delete,
            commit_timestamp: leaf.commit_timestamp,
        }
    }

    /// Whether this is an add
    pub fn is_add(&self) -> bool {
        self.action == OperationAction::Add
    }

    /// Whether this is a delete
    pub fn is_delete(&self) -> bool {
        self.action == OperationAction::Delete
    }
}

/// Render a download URL, lower-cased
pub fn package_url(template: &str, id: &str, normalized_version: &str) -> String {
    template
        .replace("{id}", id)
        .replace("{version}", normalized_version)
        .to_lowercase()
}

/// Normalize a package version string
///
/// Drops build metadata and leading zeros, pads to three numeric parts and
/// drops a zero fourth part: `1.0` → `1.0.0`, `1.02.3.0-beta+sha` → `1.2.3-beta`.
/// Strings that do not start with a numeric version are returned unchanged.
pub fn normalize_version(version: &str) -> String {
    let without_metadata = version.split('+').next().unwrap_or(version);
    let (release, prerelease) = match without_metadata.split_once('-') {
        Some((release, prerelease)) => (release, Some(prerelease)),
        None => (without_metadata, None),
    };

    let parts: Option<Vec<u64>> = release.split('.').map(|p| p.parse().ok()).collect();
    let Some(mut parts) = parts.filter(|p| (1..=4).contains(&p.len())) else {
        return version.to_string();
    };

    while parts.len() < 3 {
        parts.push(0);
    }
    if parts.len() == 4 && parts[3] == 0 {
        parts.pop();
    }

    let mut normalized = parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    if let Some(prerelease) = prerelease {
        normalized.push('-');
        normalized.push_str(prerelease);
    }
    normalized
}
