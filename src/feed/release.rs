//! Bridges a GitHub release object onto the native feed format.
//!
//! The release is rewritten as a one-product, one-channel, one-build feed
//! document and parsed by [`parse_feed`], so both ingestion paths share every
//! field-resolution rule.

use std::io::Cursor;

use chrono::DateTime;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::markdown::{CommonMarkRenderer, MarkdownRenderer};
use super::parser::parse_feed;
use crate::model::{ChannelStatus, FeedError, Licensing, OsSuffix, Product};

const RELEASES_SUFFIX: &str = "/releases";
const ISSUES_SUFFIX: &str = "/issues";

/// Fields read from a release object; everything else is ignored.
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: Option<String>,
    body: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    html_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    published_at: Option<String>,
}

/// Optional extras never fail the conversion; a non-string value is dropped.
fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Where a release lands in the synthesized feed.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseTarget<'a> {
    pub product_code: &'a str,
    pub product_name: &'a str,
    /// Update channel selected in the caller's settings.
    pub channel: ChannelStatus,
    /// Repository web URL, e.g. `https://github.com/owner/repo`.
    pub repository_url: &'a str,
}

/// Converts a release JSON object into a [`Product`] using the CommonMark
/// renderer and the host platform.
pub fn from_release(json: &Value, target: &ReleaseTarget<'_>) -> Result<Option<Product>, FeedError> {
    from_release_with(json, target, &CommonMarkRenderer, OsSuffix::current())
}

/// Parses release JSON text, then behaves like [`from_release`].
pub fn from_release_str(
    content: &str,
    target: &ReleaseTarget<'_>,
) -> Result<Option<Product>, FeedError> {
    let json: Value = serde_json::from_str(content)?;
    from_release(&json, target)
}

/// Converts a release JSON object into a [`Product`].
///
/// # Errors
///
/// - [`FeedError::MalformedReleasePayload`] if `tag_name` or `body` is
///   missing or null
/// - [`FeedError::InvalidJson`] if the value is not an object, or if
///   `tag_name` or `body` is not a string
/// - any error the feed parser raises for the synthesized document, e.g. a
///   tag that is not a valid build number
pub fn from_release_with<R: MarkdownRenderer + ?Sized>(
    json: &Value,
    target: &ReleaseTarget<'_>,
    renderer: &R,
    os: OsSuffix,
) -> Result<Option<Product>, FeedError> {
    if !json.is_object() {
        return Err(FeedError::InvalidJson(serde::de::Error::custom(
            "release payload must be a JSON object",
        )));
    }
    let release = GitHubRelease::deserialize(json)?;
    let version = release
        .tag_name
        .ok_or(FeedError::MalformedReleasePayload("tag_name"))?;
    let body = release
        .body
        .ok_or(FeedError::MalformedReleasePayload("body"))?;

    // Some providers deliver CRLF bodies; Markdown line handling expects LF.
    let notes = renderer.to_html(&body.replace("\r\n", "\n"));

    let release_date = release.published_at.as_deref().and_then(|raw| {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.date_naive().format("%Y%m%d").to_string()),
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "Ignoring unparsable release published_at");
                None
            }
        }
    });

    let version = version.trim();
    let feed = synthesize_feed(&SyntheticBuild {
        target,
        version,
        notes: &notes,
        release_date: release_date.as_deref(),
        blog_post: release.html_url.as_deref(),
    })?;
    tracing::debug!(
        code = %target.product_code,
        version = %version,
        bytes = feed.len(),
        "Synthesized update feed from release"
    );

    parse_feed(&feed, target.product_code, os)
}

struct SyntheticBuild<'a> {
    target: &'a ReleaseTarget<'a>,
    version: &'a str,
    notes: &'a str,
    release_date: Option<&'a str>,
    blog_post: Option<&'a str>,
}

/// Writes the feed document for a single release.
///
/// Notes are written as escaped text rather than CDATA so any `]]>` inside
/// the HTML survives the round trip.
fn synthesize_feed(build: &SyntheticBuild<'_>) -> Result<String, FeedError> {
    let target = build.target;
    let repository = target.repository_url.trim_end_matches('/');
    let releases_url = format!("{repository}{RELEASES_SUFFIX}");
    let issues_url = format!("{repository}{ISSUES_SUFFIX}");
    let channel_id = format!(
        "{}_{}",
        target.product_code,
        target.channel.code().to_uppercase()
    );
    let licensing = match target.channel {
        ChannelStatus::Eap => Licensing::Eap,
        _ => Licensing::Release,
    };

    let mut writer = Writer::new(Cursor::new(Vec::new()));

    write(&mut writer, Event::Start(BytesStart::new("products")))?;

    let mut product = BytesStart::new("product");
    product.push_attribute(("name", target.product_name));
    write(&mut writer, Event::Start(product))?;

    write(&mut writer, Event::Start(BytesStart::new("code")))?;
    write(&mut writer, Event::Text(BytesText::new(target.product_code)))?;
    write(&mut writer, Event::End(BytesEnd::new("code")))?;

    let mut channel = BytesStart::new("channel");
    channel.push_attribute(("id", channel_id.as_str()));
    channel.push_attribute(("status", target.channel.code()));
    channel.push_attribute(("licensing", licensing.code()));
    channel.push_attribute(("majorVersion", build.version));
    channel.push_attribute(("url", releases_url.as_str()));
    write(&mut writer, Event::Start(channel))?;

    let mut build_el = BytesStart::new("build");
    build_el.push_attribute(("number", build.version));
    build_el.push_attribute(("version", build.version));
    if let Some(date) = build.release_date {
        build_el.push_attribute(("releaseDate", date));
    }
    write(&mut writer, Event::Start(build_el))?;

    write(&mut writer, Event::Start(BytesStart::new("message")))?;
    write(&mut writer, Event::Text(BytesText::new(build.notes)))?;
    write(&mut writer, Event::End(BytesEnd::new("message")))?;

    if let Some(url) = build.blog_post {
        let mut blog_post = BytesStart::new("blogPost");
        blog_post.push_attribute(("url", url));
        write(&mut writer, Event::Empty(blog_post))?;
    }

    let mut download = BytesStart::new("button");
    download.push_attribute(("name", "Download"));
    download.push_attribute(("url", releases_url.as_str()));
    download.push_attribute(("download", "true"));
    write(&mut writer, Event::Empty(download))?;

    let mut issues = BytesStart::new("button");
    issues.push_attribute(("name", "Report an Issue"));
    issues.push_attribute(("url", issues_url.as_str()));
    write(&mut writer, Event::Empty(issues))?;

    write(&mut writer, Event::End(BytesEnd::new("build")))?;
    write(&mut writer, Event::End(BytesEnd::new("channel")))?;
    write(&mut writer, Event::End(BytesEnd::new("product")))?;
    write(&mut writer, Event::End(BytesEnd::new("products")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .map_err(|e| FeedError::malformed(format!("synthesized feed is not UTF-8: {e}")))
}

fn write(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), FeedError> {
    writer
        .write_event(event)
        .map_err(|e| FeedError::malformed(format!("failed to write synthesized feed: {e}")))
}
