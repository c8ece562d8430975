//! Update feed parsing and retrieval.
//!
//! This module turns the two supported feed formats into the canonical
//! [`crate::model::Product`] model:
//!
//! - **XML feeds**: `<products>` documents listing products, channels and builds
//! - **GitHub releases**: a single release object, rewritten as an XML feed
//!   and parsed by the same code path
//!
//! # Architecture
//!
//! - [`dom`] - Owned element tree and the [`XmlNode`] capability trait
//! - `attrs` - Mandatory/optional attribute access and release-date parsing
//! - `parser` - Product, channel, build and patch builders plus the resolver
//! - `markdown` - Markdown-to-HTML rendering for release notes
//! - `release` - GitHub release bridge
//! - `fetcher` - HTTP retrieval of feed documents (not used by the parsers)
//!
//! # Example
//!
//! ```
//! use update_feed::feed::parse_feed;
//! use update_feed::model::OsSuffix;
//!
//! let xml = r#"<products><product name="Demo"><code>DM</code></product></products>"#;
//! let product = parse_feed(xml, "DM", OsSuffix::current()).unwrap().unwrap();
//! assert_eq!(product.name, "Demo");
//! ```

mod attrs;
pub mod dom;
mod fetcher;
mod markdown;
mod parser;
mod release;

pub use attrs::{mandatory_attribute, mandatory_attribute_or, parse_release_date};
pub use dom::{parse_document, Element, XmlNode};
pub use fetcher::{fetch_feed, FetchError, FetchOptions};
pub use markdown::{CommonMarkRenderer, MarkdownRenderer};
pub use parser::{parse_build, parse_channel, parse_feed, parse_patch, parse_product, resolve};
pub use release::{from_release, from_release_str, from_release_with, ReleaseTarget};
