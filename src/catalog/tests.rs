//! Tests for the catalog module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn leaf_item(url: &str, id: &str, version: &str, commit: &str) -> CatalogLeafItem {
    CatalogLeafItem {
        url: url.to_string(),
        leaf_type: LeafType::PackageDetails,
        commit_timestamp: ts(commit),
        package_id: id.to_string(),
        package_version: version.to_string(),
    }
}

// ============================================================================
// Model Tests
// ============================================================================

#[test]
fn test_service_index_catalog_url() {
    let index: ServiceIndex = serde_json::from_value(json!({
        "version": "3.0.0",
        "resources": [
            {"@id": "https://example.org/query", "@type": "SearchQueryService"},
            {"@id": "https://example.org/v3/catalog0/index.json", "@type": "Catalog/3.0.0"}
        ]
    }))
    .unwrap();

    assert_eq!(
        index.catalog_url(),
        Some("https://example.org/v3/catalog0/index.json")
    );
    assert_eq!(index.resource_url("Nope/1.0.0"), None);
}

#[test]
fn test_service_index_without_catalog() {
    let index: ServiceIndex = serde_json::from_value(json!({"resources": []})).unwrap();
    assert!(index.catalog_url().is_none());
}

#[test]
fn test_catalog_index_pages_after_sorts_and_filters() {
    let index: CatalogIndex = serde_json::from_value(json!({
        "commitTimeStamp": "2024-01-03T00:00:00Z",
        "count": 3,
        "items": [
            {"@id": "p2", "commitTimeStamp": "2024-01-02T00:00:00Z", "count": 10},
            {"@id": "p0", "commitTimeStamp": "2023-12-31T00:00:00Z", "count": 10},
            {"@id": "p1", "commitTimeStamp": "2024-01-01T00:00:00Z", "count": 10}
        ]
    }))
    .unwrap();

    let urls: Vec<_> = index
        .pages_after(ts("2023-12-31T00:00:00Z"))
        .into_iter()
        .map(|p| p.url.as_str())
        .collect();

    assert_eq!(urls, vec!["p1", "p2"]);
}

#[test]
fn test_catalog_page_leaves_in_bounds_is_min_exclusive_max_inclusive() {
    let page = CatalogPage {
        commit_timestamp: None,
        items: vec![
            leaf_item("l3", "A", "1.0.0", "2024-01-03T00:00:00Z"),
            leaf_item("l1", "A", "1.0.0", "2024-01-01T00:00:00Z"),
            leaf_item("l2", "B", "1.0.0", "2024-01-02T00:00:00Z"),
            leaf_item("l4", "C", "1.0.0", "2024-01-04T00:00:00Z"),
        ],
    };

    let urls: Vec<_> = page
        .leaves_in_bounds(ts("2024-01-01T00:00:00Z"), ts("2024-01-03T00:00:00Z"))
        .into_iter()
        .map(|l| l.url.as_str())
        .collect();

    assert_eq!(urls, vec!["l2", "l3"]);
}

#[test]
fn test_leaf_item_deserialize() {
    let item: CatalogLeafItem = serde_json::from_value(json!({
        "@id": "https://example.org/data/newtonsoft.json.13.0.1.json",
        "@type": "nuget:PackageDetails",
        "commitId": "2a8e3e1e-0000-0000-0000-000000000000",
        "commitTimeStamp": "2021-03-22T20:13:54.474Z",
        "nuget:id": "Newtonsoft.Json",
        "nuget:version": "13.0.1"
    }))
    .unwrap();

    assert_eq!(item.leaf_type, LeafType::PackageDetails);
    assert_eq!(item.package_id, "Newtonsoft.Json");
    assert_eq!(
        item.entity_key(),
        EntityKey::new("newtonsoft.json", "13.0.1")
    );
}

#[test_case("nuget:PackageDetails", LeafType::PackageDetails ; "prefixed details")]
#[test_case("PackageDetails", LeafType::PackageDetails ; "bare details")]
#[test_case("nuget:PackageDelete", LeafType::PackageDelete ; "prefixed delete")]
#[test_case("PackageDelete", LeafType::PackageDelete ; "bare delete")]
#[test_case("nuget:Frobnicate", LeafType::Unknown("nuget:Frobnicate".to_string()) ; "unknown")]
fn test_leaf_type_from_string(raw: &str, expected: LeafType) {
    assert_eq!(LeafType::from(raw.to_string()), expected);
}

#[test]
fn test_leaf_type_is_known() {
    assert!(LeafType::PackageDetails.is_known());
    assert!(LeafType::PackageDelete.is_known());
    assert!(!LeafType::Unknown("x".to_string()).is_known());
}

#[test]
fn test_entity_key_is_case_insensitive() {
    assert_eq!(
        EntityKey::new("Newtonsoft.Json", "1.0.0-Beta"),
        EntityKey::new("NEWTONSOFT.JSON", "1.0.0-beta")
    );
    assert_eq!(
        EntityKey::new("Foo", "1.0.0").to_string(),
        "foo 1.0.0".to_string()
    );
}

#[test]
fn test_package_details_listed() {
    let mut leaf: PackageDetailsLeaf = serde_json::from_value(json!({
        "@id": "https://example.org/leaf.json",
        "commitTimeStamp": "2024-01-01T00:00:00Z",
        "id": "Foo",
        "version": "1.0.0",
        "verbatimVersion": "1.0",
        "published": "1900-01-01T00:00:00Z"
    }))
    .unwrap();

    assert_eq!(leaf.verbatim_version.as_deref(), Some("1.0"));
    assert!(!leaf.is_listed());

    leaf.published = Some(ts("2024-01-01T00:00:00Z"));
    assert!(leaf.is_listed());

    leaf.listed = Some(false);
    assert!(!leaf.is_listed());
}

#[test_case("1900-01-01T00:00:00Z", false ; "exact sentinel")]
#[test_case("1900-01-01T00:00:00.123Z", false ; "sentinel with fraction")]
#[test_case("1900-07-15T08:00:00Z", false ; "any date in 1900")]
#[test_case("1899-12-31T23:59:59Z", true ; "year before")]
#[test_case("1901-01-01T00:00:00Z", true ; "year after")]
fn test_package_details_unlisted_year(published: &str, listed: bool) {
    let leaf: PackageDetailsLeaf = serde_json::from_value(json!({
        "@id": "https://example.org/leaf.json",
        "commitTimeStamp": "2024-01-01T00:00:00Z",
        "id": "Foo",
        "version": "1.0.0",
        "published": published
    }))
    .unwrap();

    assert_eq!(leaf.is_listed(), listed);
    assert!(!leaf.is_listed());
}

// ============================================================================
// HttpCatalogClient Tests
// ============================================================================

fn http_catalog() -> HttpCatalogClient {
    let config = HttpClientConfig::builder().max_retries(0).build();
    HttpCatalogClient::new(HttpClient::with_config(config).unwrap())
}

#[tokio::test]
async fn test_http_catalog_client_fetches_documents() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/page0.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "commitTimeStamp": "2024-01-01T00:00:00Z",
            "items": [{
                "@id": "https://example.org/leaf.json",
                "@type": "nuget:PackageDelete",
                "commitTimeStamp": "2024-01-01T00:00:00Z",
                "nuget:id": "Foo",
                "nuget:version": "1.0.0"
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/catalog/delete.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@id": "https://example.org/delete.json",
            "@type": ["PackageDelete", "catalog:Permalink"],
            "commitTimeStamp": "2024-01-01T00:00:00Z",
            "id": "Foo",
            "version": "1.0.0",
            "published": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let client = http_catalog();

    let page = client
        .get_page(&format!("{}/catalog/page0.json", server.uri()))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].leaf_type, LeafType::PackageDelete);

    let leaf = client
        .get_leaf(
            &format!("{}/catalog/delete.json", server.uri()),
            &LeafType::PackageDelete,
        )
        .await
        .unwrap();
    assert_eq!(leaf.leaf_type(), LeafType::PackageDelete);
    assert_eq!(leaf.entity_key(), EntityKey::new("foo", "1.0.0"));
}

#[tokio::test]
async fn test_http_catalog_client_unknown_leaf_type() {
    let server = MockServer::start().await;
    let client = http_catalog();

    let err = client
        .get_leaf(
            &format!("{}/whatever.json", server.uri()),
            &LeafType::Unknown("nuget:Odd".to_string()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedLeafType { .. }));
}

#[tokio::test]
async fn test_http_catalog_client_propagates_http_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/index.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = http_catalog();
    let err = client
        .get_index(&format!("{}/catalog/index.json", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}
