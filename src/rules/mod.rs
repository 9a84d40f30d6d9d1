//! Rule matching
//!
//! # Modules
//!
//! - [`types`]: [`Rule`] records as stored in the catalog
//! - [`matchers`]: Per-field predicates (channel, version, buildID, ...)
//! - [`engine`]: Priority-ordered rule selection for a query

pub mod engine;
pub mod matchers;
pub mod types;

pub use engine::{matching_rules, select_rule};
pub use types::Rule;
