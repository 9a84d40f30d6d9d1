//! Release capability set
//!
//! The resolver never inspects concrete release documents. Whatever the
//! store produces (a plain app release, a superblob bundling others) is
//! handled through this trait.

use std::fmt::Debug;

use crate::query::UpdateQuery;

/// Update type written into every `<update>` element
pub const UPDATE_TYPE: &str = "minor";

/// Per-request rendering configuration
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Download domains a patch URL may point at
    pub whitelisted_domains: &'a [String],
    /// URL prefixes that get `force=1` when the client forced the update
    pub special_force_hosts: &'a [String],
}

pub trait Release: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Whether this release should be offered to this exact query at all
    fn should_serve_update(&self, query: &UpdateQuery) -> bool;

    /// Products whose own rules must be resolved and bundled into the response
    fn response_products(&self) -> Vec<String> {
        Vec::new()
    }

    /// Releases bundled into the response by name
    fn response_blobs(&self) -> Vec<String> {
        Vec::new()
    }

    fn render_header(&self) -> Vec<String>;

    fn render_inner_header(&self, _query: &UpdateQuery, _ctx: &RenderContext<'_>) -> Vec<String> {
        Vec::new()
    }

    fn render_inner(&self, query: &UpdateQuery, ctx: &RenderContext<'_>) -> Vec<String>;

    fn render_inner_footer(&self, _query: &UpdateQuery, _ctx: &RenderContext<'_>) -> Vec<String> {
        Vec::new()
    }

    fn render_footer(&self) -> Vec<String>;
}
