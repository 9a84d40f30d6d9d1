//! Catalog loading tests

mod helper;

use serde_json::json;
use tempfile::TempDir;

use helper::{app_release, create_test_catalog, rule};
use update_resolver::catalog::JsonCatalog;
use update_resolver::error::SourceError;
use update_resolver::source::{ReleaseSource, RuleSource, ShutoffSource};

#[tokio::test]
async fn loads_every_table_from_disk() {
    let (_temp_dir, catalog) = create_test_catalog(&json!({
        "rules": [rule(1, 50, "P", "P-10.0-release")],
        "releases": [app_release("P-10.0-release", "P", "10.0", "2021")],
        "shutoffs": [{ "product": "P", "channel": "nightly" }],
    }));

    let rules = catalog.list_rules().await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].mapping(), Some("P-10.0-release"));

    let release = catalog.release_blob("P-10.0-release").await.unwrap().unwrap();
    assert_eq!(release.name(), "P-10.0-release");
    assert_eq!(
        catalog.release_product("P-10.0-release").await.unwrap().as_deref(),
        Some("P")
    );

    assert!(catalog.is_update_disabled("P", "nightly").await.unwrap());
}

#[test]
fn missing_file_is_an_io_error() {
    let temp_dir = TempDir::new().unwrap();

    let err = JsonCatalog::load(&temp_dir.path().join("absent.json")).unwrap_err();

    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn invalid_document_is_a_json_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.json");
    std::fs::write(&path, r#"{"rules": [{"mapping": "no-priority"}]}"#).unwrap();

    let err = JsonCatalog::load(&path).unwrap_err();

    assert!(matches!(err, SourceError::Json(_)));
}
