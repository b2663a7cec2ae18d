//! Minimal HTML tree on top of `quick-xml` events.
//!
//! Converted manuals are mostly well-formed XHTML, but the reader is
//! configured leniently (no end-name checks, HTML attribute syntax) and the
//! tree builder repairs the usual HTML shortcuts: void elements without a
//! self-closing slash, mismatched or stray end tags, unclosed elements at EOF.

use super::error::DocumentError;
use quick_xml::{
    Reader, Writer,
    escape::{partial_escape, resolve_html5_entity, resolve_predefined_entity, unescape_with},
    events::{BytesEnd, BytesRef, BytesStart, BytesText, Event},
};
use std::io::{self, Cursor};

pub type HtmlWriter = Writer<Cursor<Vec<u8>>>;

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

#[inline]
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

// ============================================================================
// Tree Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Decoded text (entities resolved).
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name.
    pub name: String,
    /// Attributes in source order, values decoded.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Concatenated descendant text, like DOM `textContent`.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
            Self::Comment(_) => {}
        }
    }

    pub fn write_html(&self, writer: &mut HtmlWriter) -> io::Result<()> {
        match self {
            Self::Text(text) => {
                let escaped = partial_escape(text.as_str());
                writer.write_event(Event::Text(BytesText::from_escaped(escaped)))
            }
            Self::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
            }
            Self::Element(el) => el.write_html(writer),
        }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the attribute value, or append it if missing.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_owned(), value)),
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.children.iter().for_each(|c| c.collect_text(&mut out));
        out
    }

    pub fn outer_html(&self) -> String {
        render(|writer| self.write_html(writer))
    }

    fn write_html(&self, writer: &mut HtmlWriter) -> io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if is_void(&self.name) {
            return writer.write_event(Event::Empty(start));
        }
        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            child.write_html(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// Run `write` against a fresh in-memory writer and return the markup.
fn render(write: impl FnOnce(&mut HtmlWriter) -> io::Result<()>) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    // Writes into a `Vec` cannot fail
    let _ = write(&mut writer);
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Serialize a node sequence back to markup.
pub fn serialize(nodes: &[Node]) -> String {
    render(|writer| nodes.iter().try_for_each(|n| n.write_html(writer)))
}

/// Concatenated text of a node sequence.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    nodes.iter().for_each(|n| n.collect_text(&mut out));
    out
}

// ============================================================================
// Parsing
// ============================================================================

#[inline]
fn create_html_reader(content: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    // Bare `&` is common in HTML text ("R & D")
    reader.config_mut().allow_dangling_amp = true;
    reader
}

/// Open elements plus the finished top-level nodes.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    root: Vec<Node>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) {
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };
        // Entity references arrive as separate events, keep text contiguous
        if let Node::Text(text) = &node
            && let Some(Node::Text(prev)) = siblings.last_mut()
        {
            prev.push_str(text);
            return;
        }
        siblings.push(node);
    }

    fn open(&mut self, el: Element) {
        if is_void(&el.name) {
            self.attach(Node::Element(el));
        } else {
            self.stack.push(el);
        }
    }

    /// Close the nearest open element with this name; stray end tags are ignored.
    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().rposition(|el| el.name == name) else {
            return;
        };
        while self.stack.len() > pos {
            let Some(el) = self.stack.pop() else { break };
            self.attach(Node::Element(el));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(el) = self.stack.pop() {
            self.attach(Node::Element(el));
        }
        self.root
    }
}

/// Parse an HTML document or fragment into a node sequence.
pub fn parse_fragment(content: &str) -> Result<Vec<Node>, DocumentError> {
    let mut reader = create_html_reader(content);
    let mut builder = TreeBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => builder.open(element_from(&elem)),
            Ok(Event::Empty(elem)) => builder.attach(Node::Element(element_from(&elem))),
            Ok(Event::End(elem)) => {
                let name = lossy(elem.name().as_ref()).to_ascii_lowercase();
                builder.close(&name);
            }
            // References arrive as `GeneralRef`; a dangling `&` stays in the text
            Ok(Event::Text(text)) => builder.attach(Node::Text(lossy(&text))),
            Ok(Event::GeneralRef(entity)) => builder.attach(Node::Text(resolve_reference(&entity))),
            Ok(Event::CData(data)) => builder.attach(Node::Text(lossy(&data))),
            Ok(Event::Comment(text)) => builder.attach(Node::Comment(lossy(&text))),
            Ok(Event::Eof) => break,
            // Doctype, XML declaration, processing instructions
            Ok(_) => {}
            Err(e) => {
                return Err(DocumentError::Parse {
                    position: reader.error_position(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(builder.finish())
}

fn element_from(elem: &BytesStart<'_>) -> Element {
    let name = lossy(elem.name().as_ref()).to_ascii_lowercase();
    let attrs = elem
        .html_attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = unescape_value(&lossy(attr.value.as_ref()));
            (key, value)
        })
        .collect();
    Element {
        name,
        attrs,
        children: Vec::new(),
    }
}

#[inline]
fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Take the children of the first `<body>` element, or return the fragment as is.
pub fn into_body(mut nodes: Vec<Node>) -> Vec<Node> {
    take_body(&mut nodes).unwrap_or(nodes)
}

fn take_body(nodes: &mut [Node]) -> Option<Vec<Node>> {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            if el.name == "body" {
                return Some(std::mem::take(&mut el.children));
            }
            if let Some(children) = take_body(&mut el.children) {
                return Some(children);
            }
        }
    }
    None
}

/// Index path to the first element with this name, depth-first in document order.
pub fn find_first(nodes: &[Node], name: &str) -> Option<Vec<usize>> {
    for (i, node) in nodes.iter().enumerate() {
        if let Node::Element(el) = node {
            if el.name == name {
                return Some(vec![i]);
            }
            if let Some(mut path) = find_first(&el.children, name) {
                path.insert(0, i);
                return Some(path);
            }
        }
    }
    None
}

/// Sibling list that contains the node at `path` (the path's parent).
pub fn siblings_mut<'a>(nodes: &'a mut Vec<Node>, path: &[usize]) -> Option<&'a mut Vec<Node>> {
    let Some((_, parents)) = path.split_last() else {
        return None;
    };
    let mut current = nodes;
    for &i in parents {
        current = match current.get_mut(i)? {
            Node::Element(el) => &mut el.children,
            _ => return None,
        };
    }
    Some(current)
}

// ============================================================================
// Entities
// ============================================================================

fn resolve_entity(name: &str) -> Option<&'static str> {
    resolve_predefined_entity(name).or_else(|| resolve_html5_entity(name))
}

/// Text for one `&...;` reference; unknown references stay literal.
fn resolve_reference(entity: &BytesRef<'_>) -> String {
    if let Ok(Some(ch)) = entity.resolve_char_ref() {
        return ch.to_string();
    }
    let name = lossy(entity);
    resolve_entity(&name)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("&{name};"))
}

/// Decode references in an attribute value. A value with a dangling `&` or
/// an unknown reference is kept as written.
pub fn unescape_value(raw: &str) -> String {
    unescape_with(raw, resolve_entity)
        .map(|value| value.into_owned())
        .unwrap_or_else(|_| raw.to_owned())
}

// ============================================================================
// Tests
// ============================================================================
