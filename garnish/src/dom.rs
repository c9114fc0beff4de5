//! Arena-based DOM built by html5ever.
//!
//! Every node of a [`Document`] lives in one `indextree` arena, including nodes
//! that are not attached anywhere (freshly created, replaced, or removed ones).
//! A [`NodeId`] therefore stays valid after a node is detached, the same way a
//! browser keeps a removed element alive while something still references it.

use html5ever::driver::parse_fragment_for_element;
use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeError, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

use crate::trace;

/// Errors raised by structural DOM operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node would become its own ancestor.
    #[error("hierarchy request error: a node cannot be inserted into itself or its descendants")]
    HierarchyRequest,

    /// The node id refers to a node that was removed from the arena.
    #[error("node has been removed from the document arena")]
    Removed,
}

impl From<NodeError> for DomError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Removed => DomError::Removed,
            _ => DomError::HierarchyRequest,
        }
    }
}

/// Document = arena + root element
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here, attached or not
    pub arena: Arena<NodeData>,

    /// Root node (usually `<html>` element)
    pub root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `<html><head></head><body></body></html>` document.
    pub fn new() -> Self {
        parse("")
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        id.parent(&self.arena)
    }

    /// The invisible document node that owns `root`.
    pub fn document_node(&self) -> Option<NodeId> {
        self.root
            .ancestors(&self.arena)
            .find(|&id| matches!(self.get(id).kind, NodeKind::Document))
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        self.find_root_child("body")
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        self.find_root_child("head")
    }

    fn find_root_child(&self, tag: &str) -> Option<NodeId> {
        self.root
            .children(&self.arena)
            .find(|&id| self.tag_name(id) == Some(tag))
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.get(id).kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.get_mut(id).kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// Lowercase tag name for elements, `None` for every other node kind.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|elem| elem.tag.as_ref())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, NodeKind::Text(_))
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, NodeKind::Comment(_))
    }

    /// Concatenated text of the node and its descendants, like `Node.textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.get(id).kind {
            NodeKind::Text(text) | NodeKind::Comment(text) => text.to_string(),
            NodeKind::Element(_) | NodeKind::Document => id
                .descendants(&self.arena)
                .filter_map(|d| match &self.get(d).kind {
                    NodeKind::Text(text) => Some(text.as_ref()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Replace the node's content by a single text node (or its data, for
    /// text and comment nodes).
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Text(data) | NodeKind::Comment(data) = &mut self.get_mut(id).kind {
            *data = StrTendril::from(text);
            return;
        }

        self.clear_children(id);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            id.append(text_node, &mut self.arena);
        }
    }

    /// Create a detached element. The tag is lowercased.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData {
                tag: StrTendril::from(tag.to_ascii_lowercase()),
                attrs: IndexMap::new(),
            }),
            ns: Namespace::Html,
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Text(StrTendril::from(text)),
            ns: Namespace::Html,
        })
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Comment(StrTendril::from(text)),
            ns: Namespace::Html,
        })
    }

    /// Append `child` as the last child of `parent`, moving it if it is
    /// attached somewhere else.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        parent.checked_append(child, &mut self.arena)?;
        Ok(())
    }

    /// Insert `node` right before `sibling`, moving it if it is attached
    /// somewhere else.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) -> Result<(), DomError> {
        sibling.checked_insert_before(node, &mut self.arena)?;
        Ok(())
    }

    /// Detach a node (and its subtree) from its parent. The node stays in the
    /// arena and can be re-inserted.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            child.detach(&mut self.arena);
        }
    }

    /// First element in tree order whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let start = self.document_node().unwrap_or(self.root);
        start.descendants(&self.arena).find(|&node| {
            self.element(node)
                .and_then(|elem| elem.attr("id"))
                .is_some_and(|value| value == id)
        })
    }

    /// Parse an HTML fragment (in a `<body>` context) into this document's
    /// arena and return its top-level nodes, detached.
    pub fn parse_fragment(&mut self, html: &str) -> Vec<NodeId> {
        let mut arena = std::mem::take(&mut self.arena);
        let context = arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData {
                tag: StrTendril::from("body"),
                attrs: IndexMap::new(),
            }),
            ns: Namespace::Html,
        });

        let sink = ArenaSink::with_arena(arena);
        let output = parse_fragment_for_element(sink, Default::default(), context, false, None)
            .one(StrTendril::from(html));
        self.arena = output.arena;

        // html5ever puts the fragment under an `<html>` root appended to its
        // own scratch document node.
        let scratch_root = output.document.children(&self.arena).next();
        let nodes: Vec<NodeId> = scratch_root
            .map(|root| root.children(&self.arena).collect())
            .unwrap_or_default();
        for &node in &nodes {
            node.detach(&mut self.arena);
        }
        output.document.remove_subtree(&mut self.arena);
        context.remove_subtree(&mut self.arena);

        trace!(len = html.len(), nodes = nodes.len(), "parsed fragment");
        nodes
    }

    /// Replace the node's children by the parsed `html`.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.clear_children(id);
        for node in self.parse_fragment(html) {
            id.append(node, &mut self.arena);
        }
    }
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content (StrTendril is refcounted - cheap to clone)
    Text(StrTendril),
    /// HTML comment
    Comment(StrTendril),
}

/// Element data (tag + attributes)
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name, lowercase for HTML elements
    pub tag: StrTendril,

    /// Attributes in document order
    pub attrs: IndexMap<String, StrTendril>,
}

impl ElementData {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|value| value.as_ref())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs
            .insert(name.to_string(), StrTendril::from(value));
    }

    /// Remove an attribute, keeping the order of the others.
    pub fn remove_attr(&mut self, name: &str) -> Option<StrTendril> {
        self.attrs.shift_remove(name)
    }
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

/// Parse HTML into arena-based Document
pub fn parse(html: &str) -> Document {
    let output = parse_document(ArenaSink::new(), Default::default()).one(StrTendril::from(html));

    // Find the root element (usually <html>)
    let root = output
        .document
        .children(&output.arena)
        .find(|&id| matches!(output.arena[id].get().kind, NodeKind::Element(_)))
        .unwrap_or(output.document);

    Document {
        arena: output.arena,
        root,
    }
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// What the sink hands back once html5ever is done.
struct SinkOutput {
    arena: Arena<NodeData>,
    document: NodeId,
}

/// TreeSink implementation building straight into an arena
struct ArenaSink {
    /// Wrapped in RefCell: html5ever only hands out `&self`
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,
}

impl ArenaSink {
    fn new() -> Self {
        Self::with_arena(Arena::new())
    }

    /// Build into an existing arena (fragment parsing reuses the document's).
    fn with_arena(mut arena: Arena<NodeData>) -> Self {
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
        }
    }

    fn text_node(arena: &mut Arena<NodeData>, text: StrTendril) -> NodeId {
        arena.new_node(NodeData {
            kind: NodeKind::Text(text),
            ns: Namespace::Html,
        })
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = SinkOutput;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        SinkOutput {
            arena: self.arena.into_inner(),
            document: self.document,
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        let local = match &node.kind {
            NodeKind::Element(elem) => LocalName::from(elem.tag.as_ref()),
            _ => LocalName::from(""),
        };

        OwnedElemName(QualName::new(
            None,
            html5ever::Namespace::from(node.ns.url()),
            local,
        ))
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let tag = StrTendril::from(name.local.as_ref());
        let ns = Namespace::from_url(name.ns.as_ref());

        let attr_map: IndexMap<_, _> = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value))
            .collect();

        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(ElementData {
                tag,
                attrs: attr_map,
            }),
            ns,
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(text),
            ns: Namespace::Html,
        })
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions only exist in XML; keep an empty comment
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(StrTendril::new()),
            ns: Namespace::Html,
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with a previous text node, as browsers do
                if let Some(last_child) = parent.last_child(&arena)
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = Self::text_node(&mut arena, text);
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                let text_node = Self::text_node(&mut arena, text);
                sibling.insert_before(text_node, &mut arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        _prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(element, child);
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // Serialization only covers element content
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents stay inside the <template> element itself
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                elem.attrs
                    .entry(attr.name.local.to_string())
                    .or_insert(attr.value);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            new_parent.append(child, &mut arena);
        }
    }
}
