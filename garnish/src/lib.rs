//! DOM helpers over an arena HTML tree.
//!
//! garnish provides:
//! - **Arena DOM**: html5ever-built documents where every node lives in one
//!   `indextree` arena, addressable by `NodeId` whether attached or not
//! - **Selectors**: `query_selector_all`, `matches` and friends
//! - **Helpers**: attributes, classes, inline styles, a per-node data cache,
//!   and structural mutations (unwrap, trim, style-to-tag normalization, ...)
//! - **Events**: namespaced listener registration with synchronous dispatch
//! - **Stores**: a key-value store on native storage with a cookie fallback
//!
//! # Example
//!
//! ```rust
//! use garnish::{add_class, parse, replace_node_style_by_tag};
//!
//! let mut doc = parse(r#"<p><span style="font-weight: bold;">Hi</span></p>"#);
//! let span = doc.query_selector("span").unwrap().unwrap();
//!
//! let b = replace_node_style_by_tag(&mut doc, span);
//! add_class(&mut doc, b, "strong");
//!
//! assert_eq!(
//!     doc.to_html(),
//!     r#"<p><b class="strong"><span style="">Hi</span></b></p>"#
//! );
//! ```

mod tracing_macros;
pub(crate) use tracing_macros::{debug, trace};

pub mod attrs;
pub mod data;
pub mod dom;
pub mod escape;
pub mod events;
pub mod mutate;
pub mod selector;
pub mod serialize;
pub mod store;

pub use dom::{Document, DomError, ElementData, Namespace, NodeData, NodeKind, parse};
pub use indextree::NodeId;
pub use regex::Regex;
pub use selector::{SelectorError, SelectorList};

pub use escape::escape;

pub use attrs::{
    add_class, add_class_to_element, add_class_to_elements, add_classes, add_classes_to_element,
    add_classes_to_elements, get_attribute, has_any_tag_name, has_attribute, has_class,
    has_tag_name, is, remove_class, remove_class_from_element, remove_class_from_elements,
    remove_classes, remove_classes_from_element, remove_classes_from_elements, set_attribute,
    style_property, update_css, update_css_many, update_css_many_of_element,
    update_css_many_of_elements, update_css_of_element, update_css_of_elements,
};
pub use data::{DataCache, DataValue};
pub use events::{
    Event, EventRegistry, Handler, ListenerId, Registration, Target, is_touch_event,
};
pub use mutate::{
    NodeOptions, TextPattern, create_fragment_from_template, create_from_template,
    create_node_with, is_self_closing, remove_comment_nodes, remove_empty_text_nodes,
    remove_nodes, remove_nodes_recursively, replace_all_text, replace_node_style_by_tag,
    replace_node_with, reset_attributes_to, textify_node, trim_tag, unwrap_node,
};
pub use store::{
    CookieJar, CookiesKeyValueStore, KeyValueStore, LocalStorageKeyValueStore, StorageBackend,
    StorageEnvironment, StorageType, StoreConfig, StoreError, default_key_value_store,
    is_local_storage_available, select_key_value_store,
};
