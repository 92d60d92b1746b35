//! Schema-agnostic XML loader.
//!
//! Turns raw markup into a generic attributed tree ([`XmlValue`]) and offers
//! path and tag lookups over it. Knows nothing about processes or schemas.
//!
//! Tree shape:
//! - attributes are stored under `@_<name>` keys
//! - text of an element that also has attributes or children lives under `#text`
//! - an element with neither attributes nor children collapses to [`XmlValue::Text`]
//! - a tag seen more than once under a parent, or declared repeatable, becomes [`XmlValue::List`]

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

/// Key prefix reserved for attributes.
pub const ATTRIBUTE_PREFIX: &str = "@_";

/// Key holding the text of a mixed element.
pub const TEXT_KEY: &str = "#text";

/// Tags that always load as lists, even with a single occurrence.
const REPEATABLE_TAGS: &[&str] = &["activity", "transition", "variable", "mapping", "element", "type"];

/// Errors raised while loading markup into a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Failed to parse XML at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("Failed to parse XML: element <{tag}> is never closed")]
    Unclosed { tag: String },

    #[error("Failed to parse XML: document has no root element")]
    Empty,
}

/// Strip a `prefix:` from a tag name.
///
/// This is the only place tag names are normalised; every namespace-insensitive
/// comparison goes through it.
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

fn is_attribute_key(key: &str) -> bool {
    key.starts_with(ATTRIBUTE_PREFIX)
}

fn is_repeatable(tag: &str) -> bool {
    let local = local_name(tag);
    REPEATABLE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(local))
}

/// One value in the generic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XmlValue {
    Text(String),
    Node(XmlNode),
    List(Vec<XmlValue>),
}

/// Ordered mapping from key (tag, `@_attribute` or `#text`) to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XmlNode {
    entries: IndexMap<String, XmlValue>,
}

impl XmlNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Attributes with the reserved prefix removed.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.entries()
            .filter_map(|(k, v)| k.strip_prefix(ATTRIBUTE_PREFIX).map(|name| (name, v)))
    }

    /// Child elements (no attributes, no text entry).
    pub fn children(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.entries()
            .filter(|(k, _)| !is_attribute_key(k) && *k != TEXT_KEY)
    }

    /// Insert a raw entry, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: XmlValue) {
        self.entries.insert(key.into(), value);
    }

    /// Insert a child element, folding repeated tags into a list.
    pub fn insert_child(&mut self, tag: String, value: XmlValue) {
        let repeatable = is_repeatable(&tag);
        match self.entries.get_mut(&tag) {
            Some(XmlValue::List(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::replace(existing, XmlValue::List(Vec::new()));
                *existing = XmlValue::List(vec![first, value]);
            }
            None if repeatable => {
                self.entries.insert(tag, XmlValue::List(vec![value]));
            }
            None => {
                self.entries.insert(tag, value);
            }
        }
    }
}

impl XmlValue {
    pub fn as_node(&self) -> Option<&XmlNode> {
        match self {
            XmlValue::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Text content: the scalar itself, the `#text` entry of a mixed node,
    /// or the text of the first item of a list.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text),
            XmlValue::Node(node) => node.get(TEXT_KEY).and_then(XmlValue::as_text),
            XmlValue::List(items) => items.first().and_then(XmlValue::as_text),
        }
    }

    /// The value itself, or the items of a list.
    pub fn items(&self) -> &[XmlValue] {
        match self {
            XmlValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Attribute value by unprefixed name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let node = self.as_node()?;
        node.get(&format!("{}{}", ATTRIBUTE_PREFIX, name))
            .and_then(XmlValue::as_text)
    }

    /// First direct child whose tag matches `tag`, namespace-insensitively.
    pub fn child(&self, tag: &str) -> Option<&XmlValue> {
        self.as_node()?
            .children()
            .find(|(key, _)| *key == tag || local_name(key) == tag)
            .map(|(_, value)| value)
    }

    /// Attribute-then-child lookup of a non-empty text value.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.child(name)
                    .and_then(XmlValue::as_text)
                    .filter(|s| !s.is_empty())
            })
    }

    /// Follow a dotted path of exact keys (`a.b.c`).
    pub fn value_at(&self, path: &str) -> Option<&XmlValue> {
        path.split('.').try_fold(self, |current, part| current.as_node()?.get(part))
    }

    /// Recursive, namespace-insensitive search for `tag`.
    ///
    /// Yields matches depth-first in document order. Repeated tags are
    /// flattened and a matched subtree is not searched any further.
    pub fn nodes_named<'a>(&'a self, tag: &'a str) -> NodesNamed<'a> {
        NodesNamed {
            tag,
            stack: vec![Frame::Search(self)],
        }
    }
}

enum Frame<'a> {
    Emit(&'a XmlValue),
    Search(&'a XmlValue),
}

/// Iterator returned by [`XmlValue::nodes_named`].
pub struct NodesNamed<'a> {
    tag: &'a str,
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for NodesNamed<'a> {
    type Item = &'a XmlValue;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Emit(XmlValue::List(items)) => {
                    self.stack.extend(items.iter().rev().map(Frame::Emit));
                }
                Frame::Emit(value) => return Some(value),
                Frame::Search(XmlValue::List(items)) => {
                    self.stack.extend(items.iter().rev().map(Frame::Search));
                }
                Frame::Search(XmlValue::Node(node)) => {
                    for (key, value) in node.children().collect::<Vec<_>>().into_iter().rev() {
                        if key == self.tag || local_name(key) == self.tag {
                            self.stack.push(Frame::Emit(value));
                        } else {
                            self.stack.push(Frame::Search(value));
                        }
                    }
                }
                Frame::Search(XmlValue::Text(_)) => {}
            }
        }
        None
    }
}

/// A loaded document. The document node holds the root element under its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlTree {
    document: XmlValue,
}

impl XmlTree {
    /// Parse markup into a tree.
    pub fn parse(text: &str) -> Result<Self, TreeError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut stack: Vec<PendingElement> = vec![PendingElement::document()];

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event().map_err(|e| TreeError::Malformed {
                position,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(start) => {
                    stack.push(PendingElement::open(&start, position)?);
                }
                Event::Empty(start) => {
                    let (tag, value) = PendingElement::open(&start, position)?.close();
                    current(&mut stack).node.insert_child(tag, value);
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(TreeError::Malformed {
                            position,
                            message: "closing tag without a matching opening tag".to_string(),
                        });
                    }
                    if let Some(element) = stack.pop() {
                        let (tag, value) = element.close();
                        current(&mut stack).node.insert_child(tag, value);
                    }
                }
                Event::Text(text) => {
                    let unescaped = text.unescape().map_err(|e| TreeError::Malformed {
                        position,
                        message: e.to_string(),
                    })?;
                    current(&mut stack).text.push_str(&unescaped);
                }
                Event::CData(data) => {
                    let raw = data.into_inner();
                    current(&mut stack).text.push_str(&String::from_utf8_lossy(&raw));
                }
                Event::Eof => break,
                // declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if stack.len() > 1 {
            let tag = stack.pop().map(|e| e.tag).unwrap_or_default();
            return Err(TreeError::Unclosed { tag });
        }

        let document = stack.pop().map(|e| e.node).unwrap_or_default();
        if document.children().next().is_none() {
            return Err(TreeError::Empty);
        }

        Ok(Self {
            document: XmlValue::Node(document),
        })
    }

    pub fn document(&self) -> &XmlValue {
        &self.document
    }

    pub fn into_document(self) -> XmlValue {
        self.document
    }

    pub fn value_at(&self, path: &str) -> Option<&XmlValue> {
        self.document.value_at(path)
    }

    pub fn nodes_named<'a>(&'a self, tag: &'a str) -> NodesNamed<'a> {
        self.document.nodes_named(tag)
    }
}

fn current(stack: &mut [PendingElement]) -> &mut PendingElement {
    let last = stack.len() - 1;
    &mut stack[last]
}

/// Element being assembled while its children stream in.
struct PendingElement {
    tag: String,
    node: XmlNode,
    text: String,
}

impl PendingElement {
    fn document() -> Self {
        Self {
            tag: String::new(),
            node: XmlNode::new(),
            text: String::new(),
        }
    }

    fn open(start: &BytesStart<'_>, position: usize) -> Result<Self, TreeError> {
        let malformed = |message: String| TreeError::Malformed { position, message };

        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut node = XmlNode::new();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| malformed(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| malformed(e.to_string()))?
                .into_owned();
            node.insert(format!("{}{}", ATTRIBUTE_PREFIX, key), XmlValue::Text(value));
        }

        Ok(Self {
            tag,
            node,
            text: String::new(),
        })
    }

    fn close(self) -> (String, XmlValue) {
        let text = self.text.trim().to_string();
        if self.node.is_empty() {
            return (self.tag, XmlValue::Text(text));
        }

        let mut node = self.node;
        if !text.is_empty() {
            node.insert(TEXT_KEY, XmlValue::Text(text));
        }
        (self.tag, XmlValue::Node(node))
    }
}

/// Result of the heuristic structure check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

struct TagPatterns {
    ignored: Regex,
    open: Regex,
    close: Regex,
    self_closing: Regex,
    namespace: Regex,
}

fn patterns() -> &'static TagPatterns {
    static PATTERNS: OnceLock<TagPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| TagPatterns {
        ignored: Regex::new(r"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>").expect("valid regex"),
        open: Regex::new(r"<[^/?!][^>]*>").expect("valid regex"),
        close: Regex::new(r"</[^>]*>").expect("valid regex"),
        self_closing: Regex::new(r"<[^>]*/>").expect("valid regex"),
        namespace: Regex::new(r#"xmlns:?([^=]*?)=["']([^"']*?)["']"#).expect("valid regex"),
    })
}

/// Cheap well-formedness heuristic run before any real parsing.
///
/// Checks the first and last characters and that tag counts balance
/// (`open == close + self_closing`). Not a grammar check.
pub fn structural_check(text: &str) -> StructureReport {
    let mut errors = Vec::new();
    let trimmed = text.trim();

    if !trimmed.starts_with('<') {
        errors.push("XML must start with an opening tag".to_string());
    }

    if !trimmed.ends_with('>') {
        errors.push("XML must end with a closing tag".to_string());
    }

    let patterns = patterns();
    let stripped = patterns.ignored.replace_all(trimmed, "");
    let open = patterns.open.find_iter(&stripped).count();
    let close = patterns.close.find_iter(&stripped).count();
    let self_closing = patterns.self_closing.find_iter(&stripped).count();

    if open != close + self_closing {
        errors.push("Unbalanced XML tags detected".to_string());
    }

    StructureReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Namespace declarations found anywhere in the text, keyed by prefix.
///
/// The unprefixed declaration is stored under `default`; later declarations
/// of the same prefix win.
pub fn namespaces(text: &str) -> IndexMap<String, String> {
    patterns()
        .namespace
        .captures_iter(text)
        .map(|caps| {
            let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let prefix = if prefix.is_empty() { "default" } else { prefix };
            (prefix.to_string(), caps[2].to_string())
        })
        .collect()
}
