//! Integration tests for the GitHub release bridge.
//!
//! A release object must resolve through the same rules as a hand-written
//! feed, so several tests compare both paths directly.

use pretty_assertions::assert_eq;
use serde_json::json;
use update_feed::feed::{
    from_release, from_release_str, from_release_with, parse_feed, CommonMarkRenderer,
    ReleaseTarget,
};
use update_feed::model::{ChannelStatus, FeedError, OsSuffix};

fn target() -> ReleaseTarget<'static> {
    ReleaseTarget {
        product_code: "ED",
        product_name: "Example Desktop",
        channel: ChannelStatus::Beta,
        repository_url: "https://github.com/example/desktop",
    }
}

#[test]
fn test_release_round_trip() {
    let product = from_release(
        &json!({ "tag_name": "2024.1", "body": "## Fixes\n- fixed bug" }),
        &target(),
    )
    .unwrap()
    .unwrap();

    assert_eq!(product.channels.len(), 1);
    let channel = &product.channels[0];
    assert_eq!(channel.status, ChannelStatus::Beta);
    assert_eq!(channel.builds.len(), 1);

    let build = &channel.builds[0];
    assert_eq!(build.version, "2024.1");
    assert!(build.message.contains("<h2>"), "{}", build.message);
    assert!(build.message.contains("<li>fixed bug</li>"), "{}", build.message);
}

#[test]
fn test_missing_tag_or_body_is_payload_error() {
    for (payload, field) in [
        (json!({ "body": "notes" }), "tag_name"),
        (json!({ "tag_name": "2024.1" }), "body"),
    ] {
        match from_release(&payload, &target()) {
            Err(FeedError::MalformedReleasePayload(missing)) => assert_eq!(missing, field),
            other => panic!("expected MalformedReleasePayload({field}), got {other:?}"),
        }
    }
}

#[test]
fn test_release_matches_equivalent_feed() {
    let from_json = from_release_with(
        &json!({ "tag_name": "1.4.2", "body": "Plain notes." }),
        &target(),
        &CommonMarkRenderer,
        OsSuffix::Unix,
    )
    .unwrap();

    let feed = r#"<products><product name="Example Desktop"><code>ED</code>
        <channel id="ED_BETA" status="beta" licensing="release" majorVersion="1.4.2"
                 url="https://github.com/example/desktop/releases">
          <build number="1.4.2" version="1.4.2">
            <message><![CDATA[<p>Plain notes.</p>
]]></message>
            <button name="Download" url="https://github.com/example/desktop/releases" download="true"/>
            <button name="Report an Issue" url="https://github.com/example/desktop/issues"/>
          </build>
        </channel>
    </product></products>"#;
    let from_xml = parse_feed(feed, "ED", OsSuffix::Unix).unwrap();

    assert_eq!(from_json, from_xml);
}

#[test]
fn test_release_from_text() {
    let product = from_release_str(
        r#"{"tag_name": "0.9.0", "body": "* one\r\n* two\r\n", "draft": false}"#,
        &target(),
    )
    .unwrap()
    .unwrap();
    let message = &product.channels[0].builds[0].message;
    assert!(message.contains("<li>one</li>"), "{message}");
    assert!(message.contains("<li>two</li>"), "{message}");
    assert!(!message.contains('\r'));
}
