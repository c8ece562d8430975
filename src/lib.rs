//! Resolves product update metadata from update feeds.
//!
//! Given a product code and either a native XML update feed or a GitHub
//! release object, the crate finds the matching product and builds the
//! canonical [`model::Product`] → [`model::UpdateChannel`] →
//! [`model::BuildInfo`] → [`model::PatchInfo`] graph.

pub mod config;
pub mod feed;
pub mod model;
pub mod util;
