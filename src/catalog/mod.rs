//! File-backed catalog of rules, releases and shutoffs
//!
//! A single JSON document stands in for the rule table, the release store
//! and the emergency-shutoff table:
//!
//! ```json
//! {
//!   "rules": [{ "rule_id": 1, "priority": 100, "product": "Firefox", "mapping": "Firefox-10.0" }],
//!   "releases": [{ "name": "Firefox-10.0", "product": "Firefox", "schema": "app", "appVersion": "10.0", ... }],
//!   "shutoffs": [{ "product": "Firefox", "channel": "nightly" }]
//! }
//! ```

pub mod app;
pub mod superblob;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::release::Release;
use crate::rules::Rule;
use crate::source::{ReleaseSource, RuleSource, ShutoffSource};

pub use app::{AppRelease, Patch};
pub use superblob::Superblob;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";
pub const XML_UPDATES_OPEN: &str = "<updates>";
pub const XML_UPDATES_CLOSE: &str = "</updates>";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CatalogDocument {
    rules: Vec<Rule>,
    releases: Vec<ReleaseEntry>,
    shutoffs: Vec<Shutoff>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReleaseEntry {
    name: String,
    product: String,
    #[serde(flatten)]
    data: ReleaseData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
enum ReleaseData {
    App(AppRelease),
    Superblob(Superblob),
}

impl ReleaseData {
    fn into_release(self, name: &str) -> Arc<dyn Release> {
        match self {
            ReleaseData::App(mut app) => {
                app.name = name.to_string();
                Arc::new(app)
            }
            ReleaseData::Superblob(mut superblob) => {
                superblob.name = name.to_string();
                Arc::new(superblob)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Shutoff {
    product: String,
    channel: String,
}

/// In-memory catalog answering every collaborator lookup
#[derive(Debug, Default)]
pub struct JsonCatalog {
    rules: Vec<Rule>,
    /// name -> (product, release)
    releases: IndexMap<String, (String, Arc<dyn Release>)>,
    shutoffs: HashSet<(String, String)>,
}

impl JsonCatalog {
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let document: CatalogDocument = serde_json::from_str(json)?;

        let mut releases = IndexMap::with_capacity(document.releases.len());
        for entry in document.releases {
            let release = entry.data.into_release(&entry.name);
            // First entry wins, like a lookup by name in the release table
            if releases.contains_key(&entry.name) {
                warn!("Duplicate release {} ignored", entry.name);
                continue;
            }
            releases.insert(entry.name, (entry.product, release));
        }

        let shutoffs = document
            .shutoffs
            .into_iter()
            .map(|s| (s.product, s.channel))
            .collect();

        debug!(
            "Loaded catalog with {} rules and {} releases",
            document.rules.len(),
            releases.len()
        );

        Ok(Self {
            rules: document.rules,
            releases,
            shutoffs,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[async_trait::async_trait]
impl RuleSource for JsonCatalog {
    async fn list_rules(&self) -> Result<Vec<Rule>, SourceError> {
        Ok(self.rules.clone())
    }
}

#[async_trait::async_trait]
impl ShutoffSource for JsonCatalog {
    async fn is_update_disabled(&self, product: &str, channel: &str) -> Result<bool, SourceError> {
        Ok(self
            .shutoffs
            .contains(&(product.to_string(), channel.to_string())))
    }
}

#[async_trait::async_trait]
impl ReleaseSource for JsonCatalog {
    async fn release_blob(&self, name: &str) -> Result<Option<Arc<dyn Release>>, SourceError> {
        Ok(self
            .releases
            .get(name)
            .map(|(_, release)| Arc::clone(release)))
    }

    async fn release_product(&self, name: &str) -> Result<Option<String>, SourceError> {
        Ok(self.releases.get(name).map(|(product, _)| product.clone()))
    }
}
