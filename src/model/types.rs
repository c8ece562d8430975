use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

use super::build_number::{BuildNumber, BuildRange};

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while turning a feed document or release payload into a
/// [`Product`]. Any of these aborts the whole parse.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A mandatory attribute or element is missing, a value is unparsable,
    /// or the markup itself is broken.
    #[error("Malformed update feed: {0}")]
    MalformedDocument(String),

    /// The release JSON object lacks a required field.
    #[error("Malformed release payload: missing field `{0}`")]
    MalformedReleasePayload(&'static str),

    /// A channel's `status` attribute is not a known stability level.
    #[error("Unrecognized channel status: {0:?}")]
    UnrecognizedChannelStatus(String),

    /// The release payload is not valid JSON.
    #[error("Invalid release JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl FeedError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        FeedError::MalformedDocument(message.into())
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Release stability level of an update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelStatus {
    Eap,
    Milestone,
    Beta,
    Release,
}

impl ChannelStatus {
    pub const ALL: [ChannelStatus; 4] = [
        ChannelStatus::Eap,
        ChannelStatus::Milestone,
        ChannelStatus::Beta,
        ChannelStatus::Release,
    ];

    /// The code used in the `status` attribute of a feed.
    pub fn code(self) -> &'static str {
        match self {
            ChannelStatus::Eap => "eap",
            ChannelStatus::Milestone => "milestone",
            ChannelStatus::Beta => "beta",
            ChannelStatus::Release => "release",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ChannelStatus::Eap => "Early Access Program",
            ChannelStatus::Milestone => "Milestone Releases",
            ChannelStatus::Beta => "Beta Releases or Public Previews",
            ChannelStatus::Release => "New Stable Releases",
        }
    }
}

impl FromStr for ChannelStatus {
    type Err = FeedError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| FeedError::UnrecognizedChannelStatus(code.to_string()))
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Licensing tier of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Licensing {
    Eap,
    #[default]
    Release,
}

impl Licensing {
    /// Only the exact literal `eap` selects [`Licensing::Eap`].
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some("eap") => Licensing::Eap,
            _ => Licensing::Release,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Licensing::Eap => "eap",
            Licensing::Release => "release",
        }
    }
}

/// Platform tag used in a patch's `exclusions` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsSuffix {
    Win,
    Mac,
    Unix,
    Unknown,
}

impl OsSuffix {
    /// Suffix of the platform this binary was built for.
    pub const fn current() -> Self {
        if cfg!(windows) {
            OsSuffix::Win
        } else if cfg!(target_os = "macos") {
            OsSuffix::Mac
        } else if cfg!(unix) {
            OsSuffix::Unix
        } else {
            OsSuffix::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OsSuffix::Win => "win",
            OsSuffix::Mac => "mac",
            OsSuffix::Unix => "unix",
            OsSuffix::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OsSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Feed Model
// ============================================================================

/// A product entry resolved from an update feed.
///
/// `code` is the code the caller resolved against, not something read from
/// the document; [`fmt::Display`] renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub code: String,
    pub channels: Vec<UpdateChannel>,
    pub disable_machine_id: bool,
}

impl Product {
    pub fn channel(&self, id: &str) -> Option<&UpdateChannel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// First channel with the given stability level, in document order.
    pub fn channel_with_status(&self, status: ChannelStatus) -> Option<&UpdateChannel> {
        self.channels.iter().find(|c| c.status == status)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// A named update track with its own build history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateChannel {
    pub id: String,
    pub status: ChannelStatus,
    pub licensing: Licensing,
    pub eval_days: u32,
    pub url: Option<String>,
    pub major_version: Option<String>,
    pub builds: Vec<BuildInfo>,
}

impl UpdateChannel {
    pub const DEFAULT_EVAL_DAYS: u32 = 30;

    /// Highest build number in the channel.
    pub fn latest_build(&self) -> Option<&BuildInfo> {
        self.builds.iter().max_by(|a, b| a.number.compare_components(&b.number))
    }

    /// Builds strictly newer than `current`, in document order.
    pub fn builds_newer_than<'a>(
        &'a self,
        current: &'a BuildNumber,
    ) -> impl Iterator<Item = &'a BuildInfo> + 'a {
        self.builds
            .iter()
            .filter(move |b| b.number.compare_components(current).is_gt())
    }
}

/// One released version entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub number: BuildNumber,
    pub api_version: BuildNumber,
    pub version: String,
    pub message: String,
    pub blog_post: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub target: Option<BuildRange>,
    pub patches: Vec<PatchInfo>,
    pub download_url: Option<String>,
    pub buttons: Vec<ButtonInfo>,
}

impl BuildInfo {
    /// First available patch upgrading from `from`, ignoring product codes.
    pub fn patch_from(&self, from: &BuildNumber) -> Option<&PatchInfo> {
        self.patches.iter().find(|p| {
            p.is_available && p.from_build.compare_components(from).is_eq()
        })
    }
}

/// An incremental update from one prior build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchInfo {
    pub from_build: BuildNumber,
    pub size: Option<String>,
    pub is_available: bool,
}

/// A `button` element attached to a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonInfo {
    pub name: Option<String>,
    pub url: Option<String>,
    pub is_download: bool,
}
