//! Arena-backed XML element tree
//!
//! Provides [`Document`] and [`NodeId`]: a namespace-aware element tree in
//! which every element is addressed by a dense, copyable identifier.
//!
//! # Identity
//! - `NodeId` equality is node identity. Two structurally identical elements
//!   always carry different ids.
//! - Cloning a `Document` is a deep copy; every `NodeId` of the original
//!   designates the same element in the clone.
//! - Detached elements stay in the arena but are unreachable from the root,
//!   so traversal and serialization never see them.
//!
//! # Text model
//! Each element owns its leading `text` and the `tail` that follows its end
//! tag inside the parent. Whitespace-only text between elements is dropped
//! when parsing; comments, processing instructions and the doctype are not
//! kept.

use crate::error::DocumentError;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::borrow::Cow;
use std::fmt;

/// Dense element identifier
///
/// Index into the owning document's arena. Ids are never reused within a
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Namespace-qualified element name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementName {
    namespace: Option<String>,
    prefix: Option<String>,
    local: String,
}

impl ElementName {
    /// Resolved namespace URI (`None` for unqualified elements)
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Prefix as written in the source (or chosen at creation)
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Local part of the name
    #[inline]
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Check namespace URI and local name
    #[inline]
    #[must_use]
    pub fn matches(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }

    /// Name as it appears in tags (`prefix:local` or `local`)
    #[must_use]
    pub fn qualified(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{}", self.local)),
            None => Cow::Borrowed(&self.local),
        }
    }
}

/// One element in the arena
#[derive(Debug, Clone)]
pub struct Element {
    name: ElementName,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    tail: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(name: ElementName, attributes: Vec<(String, String)>, parent: Option<NodeId>) -> Self {
        Self {
            name,
            attributes,
            text: None,
            tail: None,
            parent,
            children: Vec::new(),
        }
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &ElementName {
        &self.name
    }

    /// Raw attributes in source order, namespace declarations included
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Text before the first child
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text after the end tag, inside the parent
    #[inline]
    #[must_use]
    pub fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    /// Parent element (`None` for the root and detached elements)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child elements in document order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
}

impl Document {
    /// Parse document bytes
    ///
    /// Lenient: mismatched end tags are tolerated and elements left open at
    /// end of input are closed. Content after the root element is ignored.
    ///
    /// Input is decoded from its byte order mark or declared encoding
    /// (UTF-8 when neither is present).
    ///
    /// # Errors
    /// - `DocumentError::Syntax` if the tokenizer cannot continue
    /// - `DocumentError::NoRoot` if the input holds no element
    /// - `DocumentError::UnsupportedEncoding` for an unknown encoding label
    /// - `DocumentError::Encoding` if the bytes are invalid in that encoding
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        let source = decode_input(bytes)?;
        let mut reader = NsReader::from_str(&source);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.expand_empty_elements = false;

        let mut builder = TreeBuilder::default();
        let mut buf = Vec::new();

        loop {
            let position = reader.buffer_position().try_into().unwrap_or(u64::MAX);
            let (resolved, event) = match reader.read_resolved_event_into(&mut buf) {
                Ok(pair) => pair,
                Err(e) => return Err(DocumentError::syntax(position, e.to_string())),
            };
            let namespace = match resolved {
                ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
                _ => None,
            };

            if builder.root_closed && matches!(event, Event::Start(_) | Event::Empty(_)) {
                tracing::warn!("ignoring content after the root element");
                break;
            }

            match event {
                Event::Start(start) => builder.open(&start, namespace, true),
                Event::Empty(start) => builder.open(&start, namespace, false),
                Event::End(end) => builder.close(end.name().as_ref()),
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    builder.text(value);
                }
                Event::CData(cdata) => builder.text(String::from_utf8_lossy(&cdata).into_owned()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        let root = builder.root.ok_or(DocumentError::NoRoot)?;
        Ok(Self {
            nodes: builder.nodes,
            root,
        })
    }

    /// Root element
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Element data
    ///
    /// # Panics
    /// Panics if `id` does not come from this document (or a clone of it).
    #[inline]
    #[must_use]
    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self, id: NodeId) -> &ElementName {
        &self.nodes[id.0].name
    }

    /// Leading text of an element
    #[inline]
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    /// Replace the leading text of an element, verbatim
    #[inline]
    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        self.nodes[id.0].text = Some(value.into());
    }

    /// Parent element
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Child elements
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Strict descendants of `id`, in document order
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.nodes[id.0].children.iter().rev().copied().collect(),
        }
    }

    /// Root followed by all its descendants, in document order
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.root).chain(self.descendants(self.root))
    }

    /// Check if `ancestor` is a strict ancestor of `node`
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Append a new empty element as the last child of `parent`
    ///
    /// The prefix bound to `namespace` at `parent` is reused; when none is in
    /// scope the namespace is declared on the new element.
    pub fn append_element(&mut self, parent: NodeId, namespace: Option<&str>, local: &str) -> NodeId {
        let mut attributes = Vec::new();
        let prefix = match namespace {
            Some(uri) => self.prefix_in_scope(parent, uri).unwrap_or_else(|| {
                attributes.push(("xmlns".to_string(), uri.to_string()));
                None
            }),
            None => {
                if self.default_namespace_in_scope(parent).is_some_and(|uri| !uri.is_empty()) {
                    attributes.push(("xmlns".to_string(), String::new()));
                }
                None
            }
        };

        let name = ElementName {
            namespace: namespace.map(str::to_owned),
            prefix,
            local: local.to_string(),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(name, attributes, Some(parent)));

        let parent_el = &mut self.nodes[parent.0];
        if parent_el.children.is_empty() && parent_el.text.as_deref().is_some_and(is_blank) {
            parent_el.text = None;
        }
        parent_el.children.push(id);
        id
    }

    /// Unlink an element (and its tail) from its parent
    ///
    /// Returns `false` for the root or an already detached element.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|child| *child != id);
        self.nodes[id.0].tail = None;
        true
    }

    /// Serialize as pretty-printed UTF-8 with an XML declaration
    #[must_use]
    pub fn to_xml_bytes(&self) -> Vec<u8> {
        self.to_xml_string().into_bytes()
    }

    /// Serialize as pretty-printed text with an XML declaration
    #[must_use]
    pub fn to_xml_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_element(&mut out, self.root, 0);
        out.push('\n');
        out
    }

    fn write_element(&self, out: &mut String, id: NodeId, depth: usize) {
        let el = &self.nodes[id.0];
        let name = el.name.qualified();

        out.push('<');
        out.push_str(&name);
        for (key, value) in &el.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }

        if el.children.is_empty() && el.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');

        if let Some(text) = &el.text {
            out.push_str(&partial_escape(text.as_str()));
        }

        if !el.children.is_empty() {
            // Only pure element content is re-indented; mixed content is kept inline.
            let indented =
                el.text.is_none() && el.children.iter().all(|child| self.nodes[child.0].tail.is_none());
            for &child in &el.children {
                if indented {
                    push_indent(out, depth + 1);
                }
                self.write_element(out, child, depth + 1);
                if let Some(tail) = &self.nodes[child.0].tail {
                    out.push_str(&partial_escape(tail.as_str()));
                }
            }
            if indented {
                push_indent(out, depth);
            }
        }

        out.push_str("</");
        out.push_str(&name);
        out.push('>');
    }

    fn prefix_in_scope(&self, from: NodeId, uri: &str) -> Option<Option<String>> {
        let mut shadowed: Vec<Option<&str>> = Vec::new();
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            for (key, value) in &self.nodes[id.0].attributes {
                let Some(prefix) = declared_prefix(key) else {
                    continue;
                };
                if shadowed.contains(&prefix) {
                    continue;
                }
                if value == uri {
                    return Some(prefix.map(str::to_owned));
                }
                shadowed.push(prefix);
            }
            cursor = self.nodes[id.0].parent;
        }
        None
    }

    fn default_namespace_in_scope(&self, from: NodeId) -> Option<&str> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let el = &self.nodes[id.0];
            if let Some((_, uri)) = el.attributes.iter().find(|(key, _)| key == "xmlns") {
                return Some(uri);
            }
            cursor = el.parent;
        }
        None
    }
}

/// Preorder iterator over strict descendants
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.nodes[id.0].children.iter().rev().copied());
        Some(id)
    }
}

/// Incremental tree construction from reader events
#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<Element>,
    open: Vec<(NodeId, Vec<u8>)>,
    root: Option<NodeId>,
    root_closed: bool,
}

impl TreeBuilder {
    fn open(&mut self, start: &BytesStart<'_>, namespace: Option<String>, has_content: bool) {
        let qname = start.name();
        let name = ElementName {
            namespace,
            prefix: qname.prefix().map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
            local: String::from_utf8_lossy(qname.local_name().as_ref()).into_owned(),
        };

        let mut attrs = start.attributes();
        attrs.with_checks(false);
        let attributes = attrs
            .filter_map(Result::ok)
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();

        let parent = self.open.last().map(|(id, _)| *id);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element::new(name, attributes, parent));

        match parent {
            Some(parent) => {
                let parent_el = &mut self.nodes[parent.0];
                if parent_el.children.is_empty() && parent_el.text.as_deref().is_some_and(is_blank) {
                    parent_el.text = None;
                }
                parent_el.children.push(id);
            }
            None => self.root = Some(id),
        }

        if has_content {
            self.open.push((id, qname.as_ref().to_vec()));
        } else if parent.is_none() {
            self.root_closed = true;
        }
    }

    fn close(&mut self, raw_name: &[u8]) {
        // Unwind to the nearest matching open tag; stray end tags are ignored.
        let Some(pos) = self.open.iter().rposition(|(_, name)| name == raw_name) else {
            return;
        };
        self.open.truncate(pos);
        if self.open.is_empty() {
            self.root_closed = true;
        }
    }

    fn text(&mut self, value: String) {
        let Some(&(current, _)) = self.open.last() else {
            return;
        };

        let blank = is_blank(&value);
        let last_child = self.nodes[current.0].children.last().copied();
        match last_child {
            None => {
                let el = &mut self.nodes[current.0];
                match &mut el.text {
                    Some(existing) => existing.push_str(&value),
                    None => el.text = Some(value),
                }
            }
            Some(_) if blank => {}
            Some(child) => {
                let el = &mut self.nodes[child.0];
                match &mut el.tail {
                    Some(existing) => existing.push_str(&value),
                    None => el.tail = Some(value),
                }
            }
        }
    }
}

/// Decode raw input to text using its BOM or declared encoding
fn decode_input(bytes: &[u8]) -> Result<Cow<'_, str>, DocumentError> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => {
            let encoding = match declared_encoding(bytes) {
                Some(label) => Encoding::for_label(label.as_bytes())
                    .ok_or_else(|| DocumentError::UnsupportedEncoding(label.to_string()))?,
                None => UTF_8,
            };
            // An ASCII-readable declaration rules out UTF-16 without a BOM.
            let encoding = if encoding == UTF_16LE || encoding == UTF_16BE { UTF_8 } else { encoding };
            (encoding, bytes)
        }
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(DocumentError::Encoding {
            encoding: encoding.name().to_string(),
        });
    }
    if encoding != UTF_8 {
        tracing::debug!(encoding = encoding.name(), "decoded document to UTF-8");
    }
    Ok(text)
}

/// `encoding` pseudo-attribute of a leading XML declaration
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let head = bytes.strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|close| &value[..close])
}

fn is_blank(value: &str) -> bool {
    value.chars().all(char::is_whitespace)
}

fn declared_prefix(key: &str) -> Option<Option<&str>> {
    if key == "xmlns" {
        Some(None)
    } else {
        key.strip_prefix("xmlns:").map(Some)
    }
}

fn push_indent(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
}
