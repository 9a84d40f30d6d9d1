//! Releases that only bundle other products or releases

use serde::Deserialize;

use crate::catalog::{XML_DECLARATION, XML_UPDATES_CLOSE, XML_UPDATES_OPEN};
use crate::query::UpdateQuery;
use crate::release::{Release, RenderContext};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Superblob {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub blobs: Vec<String>,
}

impl Release for Superblob {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_serve_update(&self, _query: &UpdateQuery) -> bool {
        true
    }

    fn response_products(&self) -> Vec<String> {
        self.products.clone()
    }

    fn response_blobs(&self) -> Vec<String> {
        self.blobs.clone()
    }

    fn render_header(&self) -> Vec<String> {
        vec![XML_DECLARATION.to_string(), XML_UPDATES_OPEN.to_string()]
    }

    /// The bundled artifacts carry the content
    fn render_inner(&self, _query: &UpdateQuery, _ctx: &RenderContext<'_>) -> Vec<String> {
        Vec::new()
    }

    fn render_footer(&self) -> Vec<String> {
        vec![XML_UPDATES_CLOSE.to_string()]
    }
}
