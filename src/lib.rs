pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod release;
pub mod resolve;
pub mod response;
pub mod rules;
pub mod source;
pub mod version;
