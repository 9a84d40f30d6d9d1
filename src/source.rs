//! Collaborator ports the resolver reads through
//!
//! The rule catalog, release store and emergency-shutoff table live outside
//! this crate. Implementations only need to answer these lookups; how they
//! store, cache or retry is their own business.

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::error::SourceError;
use crate::release::Release;
use crate::rules::Rule;

/// Snapshot access to the rule table
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RuleSource: Send + Sync {
    /// All rules at call time, in catalog order
    async fn list_rules(&self) -> Result<Vec<Rule>, SourceError>;
}

/// Emergency shutoff table
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ShutoffSource: Send + Sync {
    /// Whether updates are switched off for this product and channel
    async fn is_update_disabled(&self, product: &str, channel: &str) -> Result<bool, SourceError>;
}

/// Release store
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch a release by name
    ///
    /// # Returns
    /// * `Ok(Some(release))` - the release exists
    /// * `Ok(None)` - no release with this name
    /// * `Err(SourceError)` - the store could not be read
    async fn release_blob(&self, name: &str) -> Result<Option<Arc<dyn Release>>, SourceError>;

    /// Product owning the named release (first match)
    async fn release_product(&self, name: &str) -> Result<Option<String>, SourceError>;
}
