//! Catalog fixtures written to disk

use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use update_resolver::catalog::JsonCatalog;
use update_resolver::query::UpdateQuery;
use update_resolver::resolve::{Resolver, RolloutSampler};

pub const DOWNLOAD_HOST: &str = "download.example.com";

/// Sampler returning the same draw every time
pub struct FixedSampler(pub u8);

impl RolloutSampler for FixedSampler {
    fn draw(&self) -> u8 {
        self.0
    }
}

/// Write `document` to `catalog.json` in a fresh temp dir and load it back
pub fn create_test_catalog(document: &Value) -> (TempDir, Arc<JsonCatalog>) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.json");
    std::fs::write(&path, document.to_string()).unwrap();

    let catalog = JsonCatalog::load(&path).unwrap();
    (temp_dir, Arc::new(catalog))
}

pub fn create_test_resolver(catalog: &Arc<JsonCatalog>, draw: u8) -> Resolver {
    Resolver::new(catalog.clone(), catalog.clone(), catalog.clone())
        .with_sampler(Arc::new(FixedSampler(draw)))
}

pub fn rule(id: i64, priority: i64, product: &str, mapping: &str) -> Value {
    json!({
        "rule_id": id,
        "priority": priority,
        "product": product,
        "channel": "release",
        "mapping": mapping,
    })
}

pub fn app_release(name: &str, product: &str, app_version: &str, build_id: &str) -> Value {
    json!({
        "name": name,
        "product": product,
        "schema": "app",
        "appVersion": app_version,
        "buildID": build_id,
        "patches": [{
            "type": "complete",
            "URL": format!("https://{DOWNLOAD_HOST}/{name}.mar"),
            "hashValue": "deadbeef",
            "size": 1024,
        }],
    })
}

pub fn query(product: &str, version: &str, build_id: &str) -> UpdateQuery {
    UpdateQuery {
        query_version: 4,
        product: product.to_string(),
        version: version.to_string(),
        build_id: build_id.to_string(),
        channel: "release".to_string(),
        os_version: "Windows_NT 10.0".to_string(),
        build_target: Some("WINNT_x86_64-msvc".to_string()),
        locale: Some("en-US".to_string()),
        ..Default::default()
    }
}
