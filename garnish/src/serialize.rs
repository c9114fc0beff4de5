//! HTML serializer for the arena DOM.
//!
//! Follows the HTML fragment serialization algorithm closely enough that
//! `outer_html` reads the way a browser's `outerHTML` does:
//!
//! - Void elements never get end tags
//! - Text is escaped (`&`, `<`, `>`, NBSP)
//! - Attribute values are double-quoted and escaped (`&`, `"`, NBSP, `<`, `>`)
//! - Raw text elements (script, style, ...) are written verbatim
//! - Foreign content (SVG/MathML) without children uses self-closing syntax

use crate::dom::{Document, Namespace, NodeKind};
use indextree::NodeId;
use std::fmt::Write;

/// HTML5 void elements - these never have end tags.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text children are serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Check if a tag is a void element.
pub(crate) fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Serialize the children of `node`, like `Element.innerHTML`.
pub fn serialize_children(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    let mut ser = Serializer::new(&mut out, doc);
    ser.write_children(node);
    out
}

/// Serialize `node` itself, like `Element.outerHTML`.
pub fn serialize_node(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    let mut ser = Serializer::new(&mut out, doc);
    ser.write_node(node);
    out
}

struct Serializer<'a, W: Write> {
    out: &'a mut W,
    doc: &'a Document,
}

impl<'a, W: Write> Serializer<'a, W> {
    fn new(out: &'a mut W, doc: &'a Document) -> Self {
        Self { out, doc }
    }

    fn write_escaped(&mut self, text: &str, attr_mode: bool) {
        for c in text.chars() {
            let _ = match c {
                '&' => self.out.write_str("&amp;"),
                '\u{a0}' => self.out.write_str("&nbsp;"),
                '<' => self.out.write_str("&lt;"),
                '>' => self.out.write_str("&gt;"),
                '"' if attr_mode => self.out.write_str("&quot;"),
                _ => self.out.write_char(c),
            };
        }
    }

    fn write_attr(&mut self, name: &str, value: &str) {
        let _ = write!(self.out, " {}=\"", name);
        self.write_escaped(value, true);
        let _ = self.out.write_char('"');
    }

    fn write_children(&mut self, node: NodeId) {
        let children: Vec<NodeId> = self.doc.children(node).collect();
        for child in children {
            self.write_node(child);
        }
    }

    fn write_node(&mut self, node: NodeId) {
        let doc = self.doc;
        match &doc.get(node).kind {
            NodeKind::Document => self.write_children(node),
            NodeKind::Element(_) => self.write_element(node),
            NodeKind::Text(text) => {
                let raw = doc
                    .parent(node)
                    .and_then(|parent| doc.tag_name(parent))
                    .is_some_and(is_raw_text_element);
                if raw {
                    let _ = self.out.write_str(text);
                } else {
                    self.write_escaped(text, false);
                }
            }
            NodeKind::Comment(text) => {
                let _ = write!(self.out, "<!--{}-->", text);
            }
        }
    }

    fn write_element(&mut self, node: NodeId) {
        let doc = self.doc;
        let Some(elem) = doc.element(node) else {
            return;
        };
        let tag: &str = &elem.tag;

        let _ = write!(self.out, "<{}", tag);
        for (name, value) in &elem.attrs {
            self.write_attr(name, value);
        }

        let ns = doc.get(node).ns;
        if ns == Namespace::Html && is_void_element(tag) {
            let _ = self.out.write_char('>');
            return;
        }

        if ns != Namespace::Html && doc.children(node).next().is_none() {
            let _ = self.out.write_str("/>");
            return;
        }

        let _ = self.out.write_char('>');
        self.write_children(node);
        let _ = write!(self.out, "</{}>", tag);
    }
}

// =============================================================================
// Convenience methods on Document
// =============================================================================

impl Document {
    /// Serialized children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        serialize_children(self, node)
    }

    /// Serialized `node`, including its own tag.
    pub fn outer_html(&self, node: NodeId) -> String {
        serialize_node(self, node)
    }

    /// Serialized content of `<body>`, or of the root when there is no body.
    pub fn to_html(&self) -> String {
        self.inner_html(self.body().unwrap_or(self.root))
    }
}
