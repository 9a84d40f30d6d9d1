//! Version model for update requests
//!
//! Product versions follow a relaxed dotted grammar with an optional
//! pre-release marker (`1.2.3a1`, `3.6.3plugin1`), and build ids are
//! arbitrarily long decimal timestamps. Both are totally ordered so that
//! rule expressions like `<=10.0` or `>20200101000000` can be evaluated.
//!
//! # Modules
//!
//! - [`mozilla`]: [`Version`] parsing, ordering and canonical rendering
//! - [`build_id`]: [`BuildId`] numeric ordering of build identifiers
//! - [`error`]: Parse errors for both

pub mod build_id;
pub mod error;
pub mod mozilla;

pub use build_id::BuildId;
pub use error::{MalformedBuildIdError, MalformedVersionError};
pub use mozilla::{PreRelease, Version, compare_versions};
