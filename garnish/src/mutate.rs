//! Structural helpers: template parsing, replacement, filtered removal and
//! style normalization.

use crate::attrs::{attribute_name, get_attribute, has_any_tag_name, set_attribute};
use crate::dom::{Document, DomError};
use crate::escape::escape;
use crate::serialize::is_void_element;
use crate::trace;
use indextree::NodeId;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// First top-level element of the parsed template, if any.
///
/// The other top-level nodes are dropped from the arena.
pub fn create_from_template(doc: &mut Document, template: &str) -> Option<NodeId> {
    let nodes = doc.parse_fragment(template);
    let found = nodes.iter().copied().find(|&id| doc.is_element(id));
    for node in nodes {
        if Some(node) != found {
            node.remove_subtree(&mut doc.arena);
        }
    }
    found
}

/// Every top-level node of the parsed template, detached, in order.
pub fn create_fragment_from_template(doc: &mut Document, template: &str) -> Vec<NodeId> {
    doc.parse_fragment(template)
}

/// Options for [`create_node_with`].
#[derive(Clone, Debug, Default)]
pub struct NodeOptions {
    /// Parsed and used as content; wins over `text_content`
    pub inner_html: Option<String>,
    pub text_content: Option<String>,
    /// Attributes, set in order
    pub attributes: Vec<(String, String)>,
}

impl NodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner_html(mut self, html: impl Into<String>) -> Self {
        self.inner_html = Some(html.into());
        self
    }

    pub fn text_content(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// Create a detached element configured by `options`.
pub fn create_node_with(doc: &mut Document, tag: &str, options: &NodeOptions) -> NodeId {
    let node = doc.create_element(tag);
    for (name, value) in &options.attributes {
        set_attribute(doc, node, name, Some(value.as_str()));
    }

    if let Some(html) = &options.inner_html {
        doc.set_inner_html(node, html);
    } else if let Some(text) = &options.text_content {
        doc.set_text_content(node, text);
    }
    node
}

/// Put `replacement` where `node` was. `replacement` is known not to be an
/// ancestor of `node`.
fn swap_in(doc: &mut Document, node: NodeId, replacement: NodeId) {
    if doc.parent(node).is_some() {
        node.insert_before(replacement, &mut doc.arena);
        node.detach(&mut doc.arena);
    }
}

/// Replace `node` by `replacement`, like `ChildNode.replaceWith`.
///
/// A node without a parent is left as is. Fails when `replacement` contains
/// `node`.
pub fn replace_node_with(
    doc: &mut Document,
    node: NodeId,
    replacement: NodeId,
) -> Result<NodeId, DomError> {
    if node == replacement || doc.parent(node).is_none() {
        return Ok(replacement);
    }
    doc.insert_before(node, replacement)?;
    doc.detach(node);
    Ok(replacement)
}

/// Replace `node` by its children and return them.
pub fn unwrap_node(doc: &mut Document, node: NodeId) -> Vec<NodeId> {
    let children: Vec<NodeId> = doc.children(node).collect();
    if doc.parent(node).is_some() {
        for &child in &children {
            node.insert_before(child, &mut doc.arena);
        }
        doc.detach(node);
    }
    children
}

/// Replace `node` by a text node holding its text content.
pub fn textify_node(doc: &mut Document, node: NodeId) -> NodeId {
    let text = doc.text_content(node);
    let text_node = doc.create_text(&text);
    swap_in(doc, node, text_node);
    text_node
}

/// HTML void element check, ASCII case-insensitive.
pub fn is_self_closing(tag: &str) -> bool {
    is_void_element(tag)
}

/// Detach the direct children of `node` matching `predicate`.
pub fn remove_nodes<F>(doc: &mut Document, node: NodeId, mut predicate: F)
where
    F: FnMut(&Document, NodeId) -> bool,
{
    let children: Vec<NodeId> = doc.children(node).collect();
    for child in children {
        if predicate(&*doc, child) {
            doc.detach(child);
        }
    }
}

/// Detach `node` if it matches, else recurse into its children.
///
/// A detached node is not descended into.
pub fn remove_nodes_recursively<F>(doc: &mut Document, node: NodeId, mut predicate: F)
where
    F: FnMut(&Document, NodeId) -> bool,
{
    remove_recursively(doc, node, &mut predicate);
}

fn remove_recursively<F>(doc: &mut Document, node: NodeId, predicate: &mut F)
where
    F: FnMut(&Document, NodeId) -> bool,
{
    if predicate(&*doc, node) {
        doc.detach(node);
        return;
    }

    let children: Vec<NodeId> = doc.children(node).collect();
    for child in children {
        remove_recursively(doc, child, predicate);
    }
}

/// Detach whitespace-only text children.
pub fn remove_empty_text_nodes(doc: &mut Document, node: NodeId) {
    remove_nodes(doc, node, |doc, child| {
        doc.is_text(child) && doc.text_content(child).trim().is_empty()
    });
}

/// Detach comment children.
pub fn remove_comment_nodes(doc: &mut Document, node: NodeId) {
    remove_nodes(doc, node, |doc, child| doc.is_comment(child));
}

/// Make `attributes` the exact attribute set of `node`.
pub fn reset_attributes_to(doc: &mut Document, node: NodeId, attributes: &[(&str, &str)]) {
    let attributes: Vec<(String, &str)> = attributes
        .iter()
        .map(|&(name, value)| (attribute_name(doc, node, name).into_owned(), value))
        .collect();
    let Some(elem) = doc.element_mut(node) else {
        return;
    };
    elem.attrs
        .retain(|name, _| attributes.iter().any(|(keep, _)| keep == name));
    for (name, value) in &attributes {
        elem.set_attr(name, value);
    }
}

// =============================================================================
// Style normalization
// =============================================================================

/// A tag whose meaning an inline style cancels.
struct Demotion {
    tags: &'static [&'static str],
    pattern: Regex,
}

/// A tag an inline style stands for.
struct Promotion {
    tag: &'static str,
    pattern: Regex,
}

fn style_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("style rule patterns are valid")
}

static DEMOTIONS: LazyLock<[Demotion; 3]> = LazyLock::new(|| {
    [
        Demotion {
            tags: &["b"],
            pattern: style_regex(r"font-weight\s*:\s*(normal|400);"),
        },
        Demotion {
            tags: &["i"],
            pattern: style_regex(r"font-style\s*:\s*normal;"),
        },
        Demotion {
            tags: &["u", "s"],
            pattern: style_regex(r"text-decoration\s*:\s*none;"),
        },
    ]
});

// Order matters: only the first match applies.
static PROMOTIONS: LazyLock<[Promotion; 4]> = LazyLock::new(|| {
    [
        Promotion {
            tag: "b",
            pattern: style_regex(r"font-weight\s*:\s*(bold|700|800|900);"),
        },
        Promotion {
            tag: "i",
            pattern: style_regex(r"font-style\s*:\s*italic;"),
        },
        Promotion {
            tag: "u",
            pattern: style_regex(r"text-decoration\s*:\s*underline;"),
        },
        Promotion {
            tag: "s",
            pattern: style_regex(r"text-decoration\s*:\s*line-through;"),
        },
    ]
});

/// Move every child of `from` to the end of `to`.
fn move_children(doc: &mut Document, from: NodeId, to: NodeId) {
    let children: Vec<NodeId> = doc.children(from).collect();
    for child in children {
        to.append(child, &mut doc.arena);
    }
}

/// Turn inline styles into `<b>`, `<i>`, `<u>` or `<s>` and back.
///
/// A `<b>`, `<i>`, `<u>` or `<s>` whose style cancels it first becomes a
/// `<span>` with the same style. Then, if the style carries a bold, italic,
/// underline or line-through declaration (checked in that order), the node
/// becomes `<tag><span style="rest">content</span></tag>`, where `rest` is
/// the style without that declaration. Returns the node now in place.
pub fn replace_node_style_by_tag(doc: &mut Document, node: NodeId) -> NodeId {
    let Some(style) = get_attribute(doc, node, "style").map(str::to_string) else {
        return node;
    };
    let mut current = node;

    if DEMOTIONS
        .iter()
        .any(|rule| has_any_tag_name(doc, current, rule.tags) && rule.pattern.is_match(&style))
    {
        let span = doc.create_element("span");
        set_attribute(doc, span, "style", Some(style.as_str()));
        move_children(doc, current, span);
        swap_in(doc, current, span);
        current = span;
    }

    if let Some(rule) = PROMOTIONS.iter().find(|rule| rule.pattern.is_match(&style)) {
        let residual = rule.pattern.replace(&style, "");
        let wrapper = doc.create_element(rule.tag);
        let span = doc.create_element("span");
        set_attribute(doc, span, "style", Some(&*residual));
        move_children(doc, current, span);
        wrapper.append(span, &mut doc.arena);
        swap_in(doc, current, wrapper);
        trace!(tag = rule.tag, "promoted inline style");
        current = wrapper;
    }

    current
}

/// Detach leading, then trailing, children with the given tag.
pub fn trim_tag(doc: &mut Document, node: NodeId, tag: &str) {
    let is_tag = |doc: &Document, id: NodeId| {
        doc.tag_name(id)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    };

    while let Some(first) = node.first_child(&doc.arena).filter(|&id| is_tag(doc, id)) {
        doc.detach(first);
    }
    while let Some(last) = node.last_child(&doc.arena).filter(|&id| is_tag(doc, id)) {
        doc.detach(last);
    }
}

// =============================================================================
// Text replacement
// =============================================================================

/// Something [`replace_all_text`] can search for.
pub trait TextPattern {
    /// Byte ranges of every match, in order and non-overlapping.
    fn find_all(&self, haystack: &str) -> Vec<Range<usize>>;
}

impl TextPattern for str {
    fn find_all(&self, haystack: &str) -> Vec<Range<usize>> {
        if self.is_empty() {
            return Vec::new();
        }
        haystack
            .match_indices(self)
            .map(|(start, matched)| start..start + matched.len())
            .collect()
    }
}

impl TextPattern for Regex {
    fn find_all(&self, haystack: &str) -> Vec<Range<usize>> {
        self.find_iter(haystack).map(|m| m.range()).collect()
    }
}

/// Replace every match of `pattern` in the text under `node` by
/// `replacement`, which is parsed as HTML.
///
/// Only text nodes are searched: markup and attribute values are left alone.
pub fn replace_all_text<P>(doc: &mut Document, node: NodeId, pattern: &P, replacement: &str)
where
    P: TextPattern + ?Sized,
{
    let text_nodes: Vec<NodeId> = node
        .descendants(&doc.arena)
        .filter(|&id| doc.is_text(id))
        .collect();

    for text_node in text_nodes {
        let text = doc.text_content(text_node);
        let ranges = pattern.find_all(&text);
        if ranges.is_empty() {
            continue;
        }

        let mut html = String::with_capacity(text.len() + ranges.len() * replacement.len());
        let mut last = 0;
        for range in ranges {
            html.push_str(&escape(&text[last..range.start]));
            html.push_str(replacement);
            last = range.end;
        }
        html.push_str(&escape(&text[last..]));

        for new_node in doc.parse_fragment(&html) {
            text_node.insert_before(new_node, &mut doc.arena);
        }
        doc.detach(text_node);
    }
}
