//! Update resolution pipeline
//!
//! Decides which release (if any) a query receives:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────────┐
//! │ Shutoff  │───▶│   Rule   │───▶│  Staged  │───▶│ Eligibility &│
//! │  check   │    │selection │    │ rollout  │    │ composition  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────────┘
//! ```
//!
//! Every phase may end resolution with "no update". Only malformed input,
//! bad rule data and collaborator failures are returned as errors.

pub mod sampler;

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::cache::MaybeCache;
use crate::error::ResolveError;
use crate::query::{RolloutOverride, UpdateQuery};
use crate::release::Release;
use crate::rules::{Rule, select_rule};
use crate::source::{ReleaseSource, RuleSource, ShutoffSource};

pub use sampler::{RolloutSampler, ThreadRngSampler};

/// Cache key for emergency shutoffs: (product, channel)
pub type ShutoffKey = (String, String);

/// A release paired with the query it should be rendered for
#[derive(Debug, Clone)]
pub struct Artifact {
    pub blob: Arc<dyn Release>,
    pub query: UpdateQuery,
}

/// Outcome of resolving one query
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// `None` means no update; secondaries are then meaningless
    pub primary: Option<Artifact>,
    /// Bundled artifacts: products first, then blobs, in declaration order
    pub secondaries: Vec<Artifact>,
}

impl Resolution {
    pub fn no_update() -> Self {
        Self::default()
    }

    pub fn is_update(&self) -> bool {
        self.primary.is_some()
    }
}

pub struct Resolver {
    rules: Arc<dyn RuleSource>,
    releases: Arc<dyn ReleaseSource>,
    shutoffs: Arc<dyn ShutoffSource>,
    shutoff_cache: MaybeCache<ShutoffKey, bool>,
    sampler: Arc<dyn RolloutSampler>,
}

impl Resolver {
    /// Resolver with caching disabled and thread-local random sampling
    pub fn new(
        rules: Arc<dyn RuleSource>,
        releases: Arc<dyn ReleaseSource>,
        shutoffs: Arc<dyn ShutoffSource>,
    ) -> Self {
        Self {
            rules,
            releases,
            shutoffs,
            shutoff_cache: MaybeCache::disabled(),
            sampler: Arc::new(ThreadRngSampler),
        }
    }

    pub fn with_shutoff_cache(mut self, cache: MaybeCache<ShutoffKey, bool>) -> Self {
        self.shutoff_cache = cache;
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn RolloutSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Resolve a query to the release it should be served
    ///
    /// No matching rule and unknown releases are ordinary "no update"
    /// outcomes, not errors.
    pub async fn resolve(&self, query: &UpdateQuery) -> Result<Resolution, ResolveError> {
        match self.resolve_primary(query).await {
            Err(e) if e.is_no_update() => {
                info!("No update for {}/{}: {}", query.product, query.channel, e);
                Ok(Resolution::no_update())
            }
            result => result,
        }
    }

    async fn resolve_primary(&self, query: &UpdateQuery) -> Result<Resolution, ResolveError> {
        let mut query = query.clone();
        // Version 1 requests never carried an OS version
        if query.query_version == 1 {
            query.os_version = String::new();
        }

        if self.updates_disabled(&query).await? {
            info!(
                "Updates are disabled for {}/{}",
                query.product, query.channel
            );
            return Ok(Resolution::no_update());
        }

        let rule = select_rule(self.rules.as_ref(), &query).await?;
        let Some(mapping) = rule.mapping() else {
            info!("{} has no mapping", rule.label());
            return Ok(Resolution::no_update());
        };

        let blob = self.fetch_release(mapping).await?;

        if !self.in_rollout(&rule, &query) {
            debug!(
                "Client excluded from {}% rollout of {}",
                rule.background_rate, mapping
            );
            if let Some(fallback) = rule.fallback_mapping() {
                // Looked up for the store's side effects only; the client still gets nothing
                match self.fetch_release(fallback).await {
                    Ok(_) => {}
                    Err(e) if e.is_no_update() => warn!("{}", e),
                    Err(e) => return Err(e),
                }
            }
            return Ok(Resolution::no_update());
        }

        if !blob.should_serve_update(&query) {
            info!("{} declined to serve {}", blob.name(), query.version);
            return Ok(Resolution::no_update());
        }

        let secondaries = self.compose(blob.as_ref(), &query).await?;
        info!(
            "Serving {} to {}/{} with {} bundled artifacts",
            blob.name(),
            query.product,
            query.channel,
            secondaries.len()
        );

        Ok(Resolution {
            primary: Some(Artifact { blob, query }),
            secondaries,
        })
    }

    /// Check the shutoff table for the channel, then for its partner fallback
    async fn updates_disabled(&self, query: &UpdateQuery) -> Result<bool, ResolveError> {
        let fallback = query.fallback_channel();
        let mut channels = vec![query.channel.as_str()];
        if fallback != query.channel {
            channels.push(fallback);
        }

        for channel in channels {
            let key = (query.product.clone(), channel.to_string());
            let disabled = match self.shutoff_cache.get(&key) {
                Some(cached) => *cached,
                None => {
                    let disabled = self
                        .shutoffs
                        .is_update_disabled(&query.product, channel)
                        .await?;
                    self.shutoff_cache.put(key, Arc::new(disabled));
                    disabled
                }
            };
            if disabled {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn in_rollout(&self, rule: &Rule, query: &UpdateQuery) -> bool {
        match query.force {
            RolloutOverride::ForceInclude => true,
            _ if rule.background_rate >= 100 => true,
            RolloutOverride::ForceExclude => false,
            RolloutOverride::Unset => self.sampler.draw() < rule.background_rate,
        }
    }

    async fn fetch_release(&self, name: &str) -> Result<Arc<dyn Release>, ResolveError> {
        self.releases
            .release_blob(name)
            .await?
            .ok_or_else(|| ResolveError::NotFound(format!("release {name}")))
    }

    async fn compose(
        &self,
        blob: &dyn Release,
        query: &UpdateQuery,
    ) -> Result<Vec<Artifact>, ResolveError> {
        let products = try_join_all(
            blob.response_products()
                .into_iter()
                .map(|product| skip_missing(self.resolve_product(product, query))),
        )
        .await?;
        let blobs = try_join_all(
            blob.response_blobs()
                .into_iter()
                .map(|name| skip_missing(self.resolve_blob(name, query))),
        )
        .await?;

        Ok(products.into_iter().chain(blobs).flatten().collect())
    }

    /// Bundled product: match its own rule, skipping shutoff and rollout checks
    async fn resolve_product(
        &self,
        product: String,
        query: &UpdateQuery,
    ) -> Result<Artifact, ResolveError> {
        let product_query = query.for_product(&product);
        let rule = select_rule(self.rules.as_ref(), &product_query).await?;
        let mapping = rule.mapping().ok_or_else(|| {
            ResolveError::NotFound(format!("mapping of {} for {}", rule.label(), product))
        })?;

        Ok(Artifact {
            blob: self.fetch_release(mapping).await?,
            query: product_query,
        })
    }

    /// Bundled release by name, rendered for the product that owns it
    async fn resolve_blob(&self, name: String, query: &UpdateQuery) -> Result<Artifact, ResolveError> {
        let blob = self.fetch_release(&name).await?;
        let product = self
            .releases
            .release_product(&name)
            .await?
            .ok_or_else(|| ResolveError::NotFound(format!("product of release {name}")))?;

        Ok(Artifact {
            blob,
            query: query.for_product(&product),
        })
    }
}

/// Bundled artifacts that resolve to "no update" are left out of the response
async fn skip_missing(
    artifact: impl Future<Output = Result<Artifact, ResolveError>>,
) -> Result<Option<Artifact>, ResolveError> {
    match artifact.await {
        Ok(artifact) => Ok(Some(artifact)),
        Err(e) if e.is_no_update() => {
            warn!("Skipping bundled artifact: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
