use chrono::NaiveDate;

use super::dom::XmlNode;
use crate::model::FeedError;

/// Format of the `releaseDate` attribute (`yyyyMMdd`).
const RELEASE_DATE_FORMAT: &str = "%Y%m%d";

/// Returns the value of `name` or fails naming both the element and the
/// missing attribute.
pub fn mandatory_attribute<'a, N: XmlNode>(node: &'a N, name: &str) -> Result<&'a str, FeedError> {
    node.attribute(name).ok_or_else(|| {
        FeedError::malformed(format!(
            "<{}> is missing mandatory attribute `{}`",
            node.name(),
            name
        ))
    })
}

/// Returns `primary` if present, otherwise requires `fallback`.
///
/// When both are absent the error names `fallback`.
pub fn mandatory_attribute_or<'a, N: XmlNode>(
    node: &'a N,
    primary: &str,
    fallback: &str,
) -> Result<&'a str, FeedError> {
    match node.attribute(primary) {
        Some(value) => Ok(value),
        None => mandatory_attribute(node, fallback),
    }
}

/// Parses a `yyyyMMdd` release date.
///
/// Absent input yields `None` silently. Malformed input is logged and also
/// yields `None`: a bad date never invalidates the build it belongs to.
pub fn parse_release_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = value?;

    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        tracing::warn!(value = %raw, "Failed to parse release date: expected yyyyMMdd");
        return None;
    }

    match NaiveDate::parse_from_str(raw, RELEASE_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "Failed to parse release date");
            None
        }
    }
}
