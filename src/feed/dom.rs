use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::FeedError;

/// SEC-003: Maximum element nesting accepted in a feed document.
/// Real feeds are five levels deep; anything far beyond that is hostile.
const MAX_DOCUMENT_DEPTH: usize = 64;

/// Read access to a tree-structured markup node.
///
/// The feed builders only need named attributes, named children and text
/// content, so they are written against this trait instead of a concrete
/// XML library type.
pub trait XmlNode {
    fn name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Direct element children called `name`, in document order.
    fn children_named(&self, name: &str) -> Vec<&Self>;

    /// Concatenated text and CDATA content of the node and all of its
    /// descendants, in document order.
    fn text(&self) -> Cow<'_, str>;

    fn child(&self, name: &str) -> Option<&Self> {
        self.children_named(name).into_iter().next()
    }
}

/// An owned element of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl XmlNode for Element {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn children_named(&self, name: &str) -> Vec<&Self> {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Element(e) if e.name == name => Some(e),
                _ => None,
            })
            .collect()
    }

    fn text(&self) -> Cow<'_, str> {
        match self.children.as_slice() {
            [] => Cow::Borrowed(""),
            [Node::Text(t)] => Cow::Borrowed(t.as_str()),
            _ => {
                let mut joined = String::new();
                self.collect_text(&mut joined);
                Cow::Owned(joined)
            }
        }
    }
}

impl Element {
    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Parses feed markup into an owned element tree and returns its root.
///
/// Text is kept verbatim (no trimming) so `message` bodies survive intact;
/// builders trim where the feed format calls for it.
///
/// # Errors
///
/// Returns [`FeedError::MalformedDocument`] for broken syntax, unknown
/// entities, unclosed or mismatched tags, a missing or duplicated root, and
/// nesting beyond the depth limit.
///
/// # Security
///
/// SEC-002: quick-xml (0.37) never expands `<!ENTITY>` declarations; custom
/// entity references fail in `unescape()` / `decode_and_unescape_value()`.
pub fn parse_document(content: &str) -> Result<Element, FeedError> {
    let mut reader = Reader::from_str(content);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                // SEC-003: Reject excessively nested documents
                if stack.len() >= MAX_DOCUMENT_DEPTH {
                    return Err(FeedError::malformed(format!(
                        "document nesting depth exceeds maximum of {MAX_DOCUMENT_DEPTH} levels"
                    )));
                }
                stack.push(start_element(&e, &reader)?);
            }
            Ok(Event::Empty(e)) => {
                let element = start_element(&e, &reader)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                // quick-xml rejects mismatched end tags itself
                let element = stack
                    .pop()
                    .ok_or_else(|| FeedError::malformed("unexpected closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text.into_owned())),
                    None if text.trim().is_empty() => {}
                    None => return Err(FeedError::malformed("text outside the root element")),
                }
            }
            Ok(Event::CData(e)) => {
                let Some(parent) = stack.last_mut() else {
                    return Err(FeedError::malformed("CDATA outside the root element"));
                };
                let text = reader.decoder().decode(&e).map_err(xml_error)?;
                parent.children.push(Node::Text(text.into_owned()));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::malformed(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| FeedError::malformed("document has no root element"))
}

fn start_element(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, FeedError> {
    let decoder = reader.decoder();
    let qname = e.name();
    let name = decoder.decode(qname.as_ref()).map_err(xml_error)?;

    let mut attributes = Vec::new();
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(xml_error)?;
        let key = decoder.decode(attr.key.as_ref()).map_err(xml_error)?;
        let value = attr.decode_and_unescape_value(decoder).map_err(xml_error)?;
        attributes.push((key.into_owned(), value.into_owned()));
    }

    Ok(Element {
        name: name.into_owned(),
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), FeedError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(FeedError::malformed(format!(
                "unexpected second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}

fn xml_error(e: impl std::fmt::Display) -> FeedError {
    FeedError::malformed(format!("XML parse error: {e}"))
}
