//! Canonical in-memory model of an update feed.
//!
//! A [`Product`] owns its [`UpdateChannel`]s, each channel owns its
//! [`BuildInfo`] entries and each build owns its [`PatchInfo`] list. Every
//! value is built once by the parsers in [`crate::feed`] and never mutated.

mod build_number;
mod types;

pub use build_number::{BuildNumber, BuildNumberError, BuildRange, Component};
pub use types::{
    BuildInfo, ButtonInfo, ChannelStatus, FeedError, Licensing, OsSuffix, PatchInfo, Product,
    UpdateChannel,
};
