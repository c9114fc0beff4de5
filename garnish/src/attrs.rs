//! Attribute, class and inline-style helpers.
//!
//! Node-addressed helpers silently do nothing on non-element nodes.
//! Id-addressed helpers (`*_element`) do nothing when no element has the id.
//! Selector-addressed helpers (`*_elements`) fail only on malformed selectors.

use crate::dom::{Document, Namespace};
use crate::selector::SelectorError;
use indextree::NodeId;
use std::borrow::Cow;

// =============================================================================
// Attributes and tags
// =============================================================================

/// Attribute names of HTML elements are ASCII-lowercased, as `setAttribute`
/// and `getAttribute` do. Foreign (SVG/MathML) names are kept as given.
pub(crate) fn attribute_name<'n>(doc: &Document, node: NodeId, name: &'n str) -> Cow<'n, str> {
    if doc.get(node).ns == Namespace::Html && name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

pub fn has_attribute(doc: &Document, node: NodeId, name: &str) -> bool {
    let name = attribute_name(doc, node, name);
    doc.element(node)
        .is_some_and(|elem| elem.attrs.contains_key(&*name))
}

pub fn get_attribute<'a>(doc: &'a Document, node: NodeId, name: &str) -> Option<&'a str> {
    let name = attribute_name(doc, node, name);
    doc.element(node).and_then(|elem| elem.attr(&name))
}

/// Set an attribute, or remove it when `value` is `None`.
pub fn set_attribute(doc: &mut Document, node: NodeId, name: &str, value: Option<&str>) -> NodeId {
    let name = attribute_name(doc, node, name);
    if let Some(elem) = doc.element_mut(node) {
        match value {
            Some(value) => elem.set_attr(&name, value),
            None => {
                elem.remove_attr(&name);
            }
        }
    }
    node
}

/// ASCII case-insensitive tag check.
pub fn has_tag_name(doc: &Document, node: NodeId, tag: &str) -> bool {
    doc.tag_name(node)
        .is_some_and(|name| name.eq_ignore_ascii_case(tag))
}

pub fn has_any_tag_name(doc: &Document, node: NodeId, tags: &[&str]) -> bool {
    tags.iter().any(|tag| has_tag_name(doc, node, tag))
}

/// Does `node` match `selector`?
pub fn is(doc: &Document, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
    doc.matches(node, selector)
}

// =============================================================================
// Classes
// =============================================================================

/// Class tokens in first-seen order, without duplicates.
fn class_list(doc: &Document, node: NodeId) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    if let Some(value) = get_attribute(doc, node, "class") {
        for class in value.split_ascii_whitespace() {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
    }
    classes
}

pub fn has_class(doc: &Document, node: NodeId, class: &str) -> bool {
    get_attribute(doc, node, "class")
        .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
}

pub fn add_class(doc: &mut Document, node: NodeId, class: &str) -> NodeId {
    add_classes(doc, node, &[class])
}

pub fn add_classes(doc: &mut Document, node: NodeId, classes: &[&str]) -> NodeId {
    if !doc.is_element(node) {
        return node;
    }

    let mut list = class_list(doc, node);
    for class in classes {
        if !class.is_empty() && !list.iter().any(|c| c == class) {
            list.push(class.to_string());
        }
    }
    set_attribute(doc, node, "class", Some(list.join(" ").as_str()))
}

pub fn remove_class(doc: &mut Document, node: NodeId, class: &str) -> NodeId {
    remove_classes(doc, node, &[class])
}

pub fn remove_classes(doc: &mut Document, node: NodeId, classes: &[&str]) -> NodeId {
    // Like DOMTokenList: no attribute, nothing to rewrite
    if !has_attribute(doc, node, "class") {
        return node;
    }

    let list: Vec<String> = class_list(doc, node)
        .into_iter()
        .filter(|c| !classes.contains(&c.as_str()))
        .collect();
    set_attribute(doc, node, "class", Some(list.join(" ").as_str()))
}

pub fn add_class_to_element(doc: &mut Document, id: &str, class: &str) {
    add_classes_to_element(doc, id, &[class]);
}

pub fn add_classes_to_element(doc: &mut Document, id: &str, classes: &[&str]) {
    if let Some(node) = doc.element_by_id(id) {
        add_classes(doc, node, classes);
    }
}

pub fn add_class_to_elements(
    doc: &mut Document,
    selector: &str,
    class: &str,
) -> Result<(), SelectorError> {
    add_classes_to_elements(doc, selector, &[class])
}

pub fn add_classes_to_elements(
    doc: &mut Document,
    selector: &str,
    classes: &[&str],
) -> Result<(), SelectorError> {
    for node in doc.query_selector_all(selector)? {
        add_classes(doc, node, classes);
    }
    Ok(())
}

pub fn remove_class_from_element(doc: &mut Document, id: &str, class: &str) {
    remove_classes_from_element(doc, id, &[class]);
}

pub fn remove_classes_from_element(doc: &mut Document, id: &str, classes: &[&str]) {
    if let Some(node) = doc.element_by_id(id) {
        remove_classes(doc, node, classes);
    }
}

pub fn remove_class_from_elements(
    doc: &mut Document,
    selector: &str,
    class: &str,
) -> Result<(), SelectorError> {
    remove_classes_from_elements(doc, selector, &[class])
}

pub fn remove_classes_from_elements(
    doc: &mut Document,
    selector: &str,
    classes: &[&str],
) -> Result<(), SelectorError> {
    for node in doc.query_selector_all(selector)? {
        remove_classes(doc, node, classes);
    }
    Ok(())
}

// =============================================================================
// Inline style
// =============================================================================

/// Split a `style` attribute into `(property, value)` declarations.
///
/// Semicolons inside quotes or parentheses do not end a declaration.
fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                chunks.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    chunks.push(&style[start..]);

    chunks
        .into_iter()
        .filter_map(|chunk| {
            let (property, value) = chunk.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            (!property.is_empty() && !value.is_empty()).then(|| (property, value.to_string()))
        })
        .collect()
}

fn write_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Value of an inline style property, or `""` when it is not set.
pub fn style_property(doc: &Document, node: NodeId, property: &str) -> String {
    let Some(style) = get_attribute(doc, node, "style") else {
        return String::new();
    };
    let property = property.trim().to_ascii_lowercase();
    parse_declarations(style)
        .into_iter()
        .rev()
        .find(|(name, _)| *name == property)
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// Set one inline style property; `None` (or an empty value) removes it.
pub fn update_css(doc: &mut Document, node: NodeId, property: &str, value: Option<&str>) -> NodeId {
    update_css_many(doc, node, &[(property, value)])
}

/// Apply several property updates in order.
pub fn update_css_many(
    doc: &mut Document,
    node: NodeId,
    properties: &[(&str, Option<&str>)],
) -> NodeId {
    if !doc.is_element(node) {
        return node;
    }

    let mut declarations =
        parse_declarations(get_attribute(doc, node, "style").unwrap_or_default());
    let mut touched = false;
    for &(property, value) in properties {
        let property = property.trim().to_ascii_lowercase();
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        match (declarations.iter().position(|(name, _)| *name == property), value) {
            (Some(index), Some(value)) => declarations[index].1 = value.to_string(),
            (None, Some(value)) => declarations.push((property, value.to_string())),
            (Some(index), None) => {
                declarations.remove(index);
            }
            (None, None) => continue,
        }
        touched = true;
    }

    // Removing properties that are not there leaves the attribute alone
    if !touched {
        return node;
    }

    let style = write_declarations(&declarations);
    set_attribute(doc, node, "style", Some(style.as_str()))
}

pub fn update_css_of_element(doc: &mut Document, id: &str, property: &str, value: Option<&str>) {
    update_css_many_of_element(doc, id, &[(property, value)]);
}

pub fn update_css_many_of_element(
    doc: &mut Document,
    id: &str,
    properties: &[(&str, Option<&str>)],
) {
    if let Some(node) = doc.element_by_id(id) {
        update_css_many(doc, node, properties);
    }
}

pub fn update_css_of_elements(
    doc: &mut Document,
    selector: &str,
    property: &str,
    value: Option<&str>,
) -> Result<(), SelectorError> {
    update_css_many_of_elements(doc, selector, &[(property, value)])
}

pub fn update_css_many_of_elements(
    doc: &mut Document,
    selector: &str,
    properties: &[(&str, Option<&str>)],
) -> Result<(), SelectorError> {
    for node in doc.query_selector_all(selector)? {
        update_css_many(doc, node, properties);
    }
    Ok(())
}
