//! Per-node data cache seeded from `data-*` attributes.
//!
//! The cache is read from the DOM once per node (on the first read) and never
//! written back: after that, `set_data` and the attributes are free to diverge.

use crate::dom::Document;
use indexmap::IndexMap;
use indextree::NodeId;
use std::collections::HashMap;

/// A value stored in the data cache.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Object(IndexMap<String, DataValue>),
    String(String),
    Number(f64),
    Bool(bool),
}

impl DataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Number(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<IndexMap<String, DataValue>> for DataValue {
    fn from(value: IndexMap<String, DataValue>) -> Self {
        DataValue::Object(value)
    }
}

/// `dashed-key` -> `dashedKey`: a dash followed by a lowercase ASCII letter
/// becomes the uppercase letter. Other dashes are kept.
pub fn dashed_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('-', Some(next)) if next.is_ascii_lowercase() => {
                out.push(next.to_ascii_uppercase());
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

type NodeData = IndexMap<String, DataValue>;

/// Data attached to nodes, keyed by `NodeId`.
#[derive(Debug, Default, Clone)]
pub struct DataCache {
    nodes: HashMap<NodeId, NodeData>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn materialize(&mut self, doc: &Document, node: NodeId) -> &mut NodeData {
        self.nodes.entry(node).or_insert_with(|| {
            let mut data = NodeData::new();
            if let Some(elem) = doc.element(node) {
                for (name, value) in &elem.attrs {
                    if let Some(key) = name.strip_prefix("data-") {
                        data.insert(dashed_to_camel(key), DataValue::from(value.as_ref()));
                    }
                }
            }
            data
        })
    }

    /// Read one value. The first read of a node copies its `data-*` attributes.
    pub fn get_data(&mut self, doc: &Document, node: NodeId, key: &str) -> Option<&DataValue> {
        self.materialize(doc, node).get(&dashed_to_camel(key))
    }

    /// Every value of the node, in insertion order.
    pub fn all_data(&mut self, doc: &Document, node: NodeId) -> &IndexMap<String, DataValue> {
        self.materialize(doc, node)
    }

    /// Store a value, or drop it when `value` is `None`.
    ///
    /// A node without a cache yet starts from an empty one: its `data-*`
    /// attributes are not copied in, even by a later read.
    pub fn set_data(&mut self, node: NodeId, key: &str, value: Option<DataValue>) {
        let data = self.nodes.entry(node).or_default();
        let key = dashed_to_camel(key);
        match value {
            Some(value) => {
                data.insert(key, value);
            }
            None => {
                data.shift_remove(&key);
            }
        }
    }

    /// Drop the cache of a node (for instance once it is removed for good).
    pub fn forget(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;

    fn first_p(doc: &Document) -> NodeId {
        doc.query_selector("p")
            .expect("valid selector")
            .expect("a paragraph")
    }

    #[test]
    fn test_dashed_to_camel() {
        assert_eq!(dashed_to_camel("dashed-key"), "dashedKey");
        assert_eq!(dashed_to_camel("a-b-c"), "aBC");
        assert_eq!(dashed_to_camel("x-1"), "x-1");
        assert_eq!(dashed_to_camel("trailing-"), "trailing-");
        assert_eq!(dashed_to_camel("plain"), "plain");
    }

    #[test]
    fn test_get_data_reads_attributes_once() {
        let mut doc = parse(r#"<p class="bar" data-key="value" data-dashed-key="dashed">Hi</p>"#);
        let p = first_p(&doc);
        let mut cache = DataCache::new();

        let all = cache.all_data(&doc, p);
        assert_eq!(all.get("key"), Some(&DataValue::from("value")));
        assert_eq!(all.get("dashedKey"), Some(&DataValue::from("dashed")));
        assert_eq!(
            cache.get_data(&doc, p, "dashed-key"),
            Some(&DataValue::from("dashed"))
        );

        // Later attribute changes are not seen
        doc.element_mut(p)
            .expect("element")
            .set_attr("data-key", "changed");
        assert_eq!(
            cache.get_data(&doc, p, "key"),
            Some(&DataValue::from("value"))
        );
    }

    #[test]
    fn test_set_data_overrides_and_removes() {
        let doc = parse(r#"<p data-key="value">Hi</p>"#);
        let p = first_p(&doc);
        let mut cache = DataCache::new();

        assert!(cache.get_data(&doc, p, "key").is_some());
        cache.set_data(p, "key", Some("bar".into()));
        cache.set_data(p, "foo", Some(DataValue::Number(3.0)));

        assert_eq!(cache.get_data(&doc, p, "key"), Some(&DataValue::from("bar")));
        assert_eq!(cache.get_data(&doc, p, "foo"), Some(&DataValue::Number(3.0)));

        cache.set_data(p, "foo", None);
        assert_eq!(cache.get_data(&doc, p, "foo"), None);
    }

    #[test]
    fn test_set_data_before_read_skips_attributes() {
        let doc = parse(r#"<p data-key="value">Hi</p>"#);
        let p = first_p(&doc);
        let mut cache = DataCache::new();

        cache.set_data(p, "foo", Some(true.into()));

        assert_eq!(cache.get_data(&doc, p, "key"), None);
        assert_eq!(cache.get_data(&doc, p, "foo"), Some(&DataValue::Bool(true)));
    }

    #[test]
    fn test_forget_rereads_attributes() {
        let doc = parse(r#"<p data-key="value">Hi</p>"#);
        let p = first_p(&doc);
        let mut cache = DataCache::new();

        cache.set_data(p, "key", Some("override".into()));
        cache.forget(p);

        assert_eq!(
            cache.get_data(&doc, p, "key"),
            Some(&DataValue::from("value"))
        );
    }
}
