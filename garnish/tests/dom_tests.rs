//! Helper behavior on realistic documents.

mod common;

use garnish::*;

/// A blank document whose body holds `html`, like `document.body.innerHTML = html`.
fn body_with(html: &str) -> (Document, NodeId) {
    common::setup();
    let mut doc = Document::new();
    let body = doc.body().expect("blank document has a body");
    doc.set_inner_html(body, html);
    (doc, body)
}

fn select(doc: &Document, selector: &str) -> NodeId {
    doc.query_selector(selector)
        .expect("valid selector")
        .unwrap_or_else(|| panic!("nothing matches {selector}"))
}

#[test]
fn node_kinds_of_template_children() {
    let mut doc = Document::new();
    let node = create_from_template(
        &mut doc,
        "<div><!--Comment Node-->Text Node<p>HTML Element</p></div>",
    )
    .expect("template has an element");

    let children: Vec<NodeId> = doc.children(node).collect();
    assert!(doc.is_comment(children[0]));
    assert!(doc.is_text(children[1]));
    assert!(doc.is_element(children[2]));
}

#[test]
fn fragment_from_template_keeps_every_node() {
    let mut doc = Document::new();
    let nodes = create_fragment_from_template(
        &mut doc,
        r#"<p class="bar" foo="bar">Hello world</p><br /><p class="foo">Bar</p>"#,
    );

    let html: Vec<String> = nodes.iter().map(|&n| doc.outer_html(n)).collect();
    assert_eq!(
        html,
        [
            r#"<p class="bar" foo="bar">Hello world</p>"#,
            "<br>",
            r#"<p class="foo">Bar</p>"#,
        ]
    );
}

#[test]
fn template_round_trips() {
    let mut doc = Document::new();
    let template = r#"<p class="bar" foo="bar">Hello world</p>"#;
    let node = create_from_template(&mut doc, template).expect("element");
    assert_eq!(doc.outer_html(node), template);
}

#[test]
fn update_css_sets_replaces_and_clears() {
    let (mut doc, _) = body_with("<div></div>");
    let div = select(&doc, "div");

    update_css(&mut doc, div, "color", Some("red"));
    update_css(&mut doc, div, "font-size", Some("20px"));
    update_css_many(
        &mut doc,
        div,
        &[
            ("top", Some("10px")),
            ("background-color", Some("blue")),
            ("text-align", Some("center")),
        ],
    );
    assert_eq!(style_property(&doc, div, "color"), "red");
    assert_eq!(style_property(&doc, div, "font-size"), "20px");
    assert_eq!(style_property(&doc, div, "top"), "10px");
    assert_eq!(style_property(&doc, div, "background-color"), "blue");
    assert_eq!(style_property(&doc, div, "text-align"), "center");

    update_css(&mut doc, div, "color", Some("blue"));
    update_css_many(&mut doc, div, &[("top", Some("20px")), ("text-align", Some("left"))]);
    assert_eq!(style_property(&doc, div, "color"), "blue");
    assert_eq!(style_property(&doc, div, "top"), "20px");
    assert_eq!(style_property(&doc, div, "text-align"), "left");

    update_css(&mut doc, div, "color", None);
    update_css(&mut doc, div, "font-size", None);
    update_css_many(
        &mut doc,
        div,
        &[("top", None), ("background-color", None), ("text-align", None)],
    );
    for property in ["color", "font-size", "top", "background-color", "text-align"] {
        assert_eq!(style_property(&doc, div, property), "", "{property}");
    }
}

#[test]
fn update_css_by_id_and_selector() {
    let (mut doc, _) = body_with(r#"<div id="foo"></div><div class="foo"></div>"#);
    let by_id = select(&doc, "#foo");
    let by_class = select(&doc, ".foo");

    update_css_of_element(&mut doc, "foo", "color", Some("red"));
    update_css_many_of_element(&mut doc, "foo", &[("top", Some("10px"))]);
    update_css_of_elements(&mut doc, ".foo", "color", Some("blue")).expect("valid selector");
    update_css_many_of_elements(&mut doc, "div.foo", &[("top", Some("20px"))])
        .expect("valid selector");

    assert_eq!(style_property(&doc, by_id, "color"), "red");
    assert_eq!(style_property(&doc, by_id, "top"), "10px");
    assert_eq!(style_property(&doc, by_class, "color"), "blue");
    assert_eq!(style_property(&doc, by_class, "top"), "20px");

    update_css_of_element(&mut doc, "foo", "color", None);
    assert_eq!(style_property(&doc, by_id, "color"), "");

    // No match is not an error
    update_css_of_element(&mut doc, "missing", "color", Some("red"));
    update_css_of_elements(&mut doc, ".missing", "color", Some("red")).expect("valid selector");
}

#[test]
fn malformed_selectors_are_errors() {
    let (mut doc, _) = body_with(r#"<p class="bar">x</p>"#);

    assert!(matches!(
        add_class_to_elements(&mut doc, "p:hover", "foo"),
        Err(SelectorError::Unsupported { .. })
    ));
    assert!(update_css_of_elements(&mut doc, "p >", "color", Some("red")).is_err());
    assert!(is(&doc, select(&doc, "p"), "").is_err());
}

#[test]
fn attributes() {
    let (mut doc, _) = body_with(r#"<p class="bar" foo="bar">Hello world</p>"#);
    let p = select(&doc, "p");

    assert!(has_attribute(&doc, p, "foo"));
    assert_eq!(get_attribute(&doc, p, "foo"), Some("bar"));

    set_attribute(&mut doc, p, "foo", None);
    set_attribute(&mut doc, p, "bar", Some("foo"));
    assert_eq!(get_attribute(&doc, p, "foo"), None);
    assert_eq!(get_attribute(&doc, p, "bar"), Some("foo"));
}

#[test]
fn data_cache() {
    let (doc, _) =
        body_with(r#"<p class="bar" data-key="value" data-dashed-key="dashed">Hello world</p>"#);
    let p = select(&doc, "p");
    let mut cache = DataCache::new();

    let all = cache.all_data(&doc, p);
    assert_eq!(all.get("key").and_then(DataValue::as_str), Some("value"));
    assert_eq!(all.get("dashedKey").and_then(DataValue::as_str), Some("dashed"));
    assert_eq!(
        cache.get_data(&doc, p, "dashedKey").and_then(DataValue::as_str),
        Some("dashed")
    );

    cache.set_data(p, "key", Some("bar".into()));
    cache.set_data(p, "foo", Some("bar".into()));
    assert_eq!(cache.get_data(&doc, p, "key").and_then(DataValue::as_str), Some("bar"));
    assert_eq!(cache.get_data(&doc, p, "foo").and_then(DataValue::as_str), Some("bar"));

    // The DOM is never written to
    assert_eq!(get_attribute(&doc, p, "data-key"), Some("value"));
    assert!(!has_attribute(&doc, p, "data-foo"));
}

#[test]
fn tag_names() {
    let (doc, _) = body_with("<p>Hello world</p>");
    let p = select(&doc, "p");

    assert!(!has_tag_name(&doc, p, "i"));
    assert!(!has_any_tag_name(&doc, p, &["i", "u"]));
    assert!(has_tag_name(&doc, p, "p"));
    assert!(has_any_tag_name(&doc, p, &["i", "u", "p"]));
}

#[test]
fn classes_on_a_node() {
    let (mut doc, _) = body_with(r#"<p class="bar">Hello world</p>"#);
    let p = select(&doc, "p");

    assert!(!has_class(&doc, p, "foo"));
    assert!(has_class(&doc, p, "bar"));

    add_class(&mut doc, p, "foo");
    add_classes(&mut doc, p, &["abc", "def"]);
    assert!(["bar", "foo", "abc", "def"].iter().all(|c| has_class(&doc, p, c)));

    remove_class(&mut doc, p, "foo");
    remove_classes(&mut doc, p, &["abc", "def"]);
    assert!(!["foo", "abc", "def"].iter().any(|c| has_class(&doc, p, c)));
    assert!(has_class(&doc, p, "bar"));
}

#[test]
fn classes_by_id_and_selector() {
    let (mut doc, _) = body_with(r#"<p id="id" class="bar">Hello world</p><p class="bar">Bye</p>"#);
    let first = select(&doc, "#id");
    let second = select(&doc, "#id ~ p");

    add_class_to_element(&mut doc, "id", "foo");
    add_classes_to_element(&mut doc, "id", &["abc", "def"]);
    assert!(["bar", "foo", "abc", "def"].iter().all(|c| has_class(&doc, first, c)));
    assert!(!has_class(&doc, second, "foo"));

    add_class_to_elements(&mut doc, ".bar", "all").expect("valid selector");
    add_classes_to_elements(&mut doc, ".bar", &["x", "y"]).expect("valid selector");
    for node in [first, second] {
        assert!(["all", "x", "y"].iter().all(|c| has_class(&doc, node, c)));
    }

    remove_class_from_element(&mut doc, "id", "foo");
    remove_classes_from_element(&mut doc, "id", &["abc", "def"]);
    assert!(!["foo", "abc", "def"].iter().any(|c| has_class(&doc, first, c)));

    remove_class_from_elements(&mut doc, ".bar", "all").expect("valid selector");
    remove_classes_from_elements(&mut doc, ".bar", &["x", "y"]).expect("valid selector");
    for node in [first, second] {
        assert_eq!(get_attribute(&doc, node, "class"), Some("bar"));
    }
}

#[test]
fn is_matches_selector() {
    let (doc, _) = body_with(r#"<p class="bar">Hello world</p>"#);
    let p = select(&doc, "p");

    assert!(is(&doc, p, "p.bar").expect("valid selector"));
    assert!(!is(&doc, p, "p.foo").expect("valid selector"));
}

#[test]
fn node_creation() {
    let mut doc = Document::new();

    let with_html = create_node_with(
        &mut doc,
        "span",
        &NodeOptions::new()
            .inner_html("<b>Bold text</b>")
            .attribute("attr1", "value1")
            .attribute("attr2", "value2"),
    );
    assert_eq!(
        doc.outer_html(with_html),
        r#"<span attr1="value1" attr2="value2"><b>Bold text</b></span>"#
    );

    let with_text = create_node_with(
        &mut doc,
        "span",
        &NodeOptions::new()
            .text_content("Simple <text>")
            .attribute("attr1", "value1")
            .attribute("attr2", "value2"),
    );
    assert_eq!(
        doc.outer_html(with_text),
        r#"<span attr1="value1" attr2="value2">Simple &lt;text&gt;</span>"#
    );

    let html_wins = create_node_with(
        &mut doc,
        "div",
        &NodeOptions::new().inner_html("<i>x</i>").text_content("ignored"),
    );
    assert_eq!(doc.inner_html(html_wins), "<i>x</i>");
}

#[test]
fn replace_node() {
    let (mut doc, body) = body_with("<p>Hello world</p>");
    let span = doc.create_element("span");
    doc.set_text_content(span, "Simple text");

    let p = select(&doc, "p");
    let placed = replace_node_with(&mut doc, p, span).expect("span is not an ancestor");

    assert_eq!(placed, span);
    assert_eq!(doc.inner_html(body), "<span>Simple text</span>");
    assert_eq!(doc.parent(p), None);
}

#[test]
fn unwrap() {
    let (mut doc, body) = body_with("<div><b>Hello world</b>, this is a simple text</div>");
    let div = select(&doc, "div");

    let nodes = unwrap_node(&mut doc, div);
    assert_eq!(doc.inner_html(body), "<b>Hello world</b>, this is a simple text");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0], select(&doc, "b"));
    assert!(doc.is_text(nodes[1]));
    assert_eq!(doc.text_content(nodes[1]), ", this is a simple text");
}

#[test]
fn textify() {
    let (mut doc, body) = body_with("<div><b>Hello world</b>, this is a simple text</div>");
    let div = select(&doc, "div");

    let text = textify_node(&mut doc, div);
    assert!(doc.is_text(text));
    assert_eq!(doc.inner_html(body), "Hello world, this is a simple text");
}

#[test]
fn self_closing_tags() {
    assert!(!is_self_closing("I"));
    assert!(!is_self_closing("B"));
    assert!(!is_self_closing("P"));
    assert!(is_self_closing("BR"));
    assert!(is_self_closing("HR"));
    assert!(is_self_closing("IMG"));
}

#[test]
fn remove_matching_children() {
    let (mut doc, body) = body_with("<div></div><p>Hello world</p><span></span>");

    remove_nodes(&mut doc, body, |doc, node| {
        doc.is_element(node) && !has_tag_name(doc, node, "p")
    });
    assert_eq!(doc.inner_html(body), "<p>Hello world</p>");
}

#[test]
fn remove_matching_descendants() {
    let (mut doc, body) = body_with(
        "<div><span></span></div><p>This is a simple text with <i>italic text<span></span></i> and empty tags<b></b></p><span></span>",
    );

    let mut visited = Vec::new();
    remove_nodes_recursively(&mut doc, body, |doc, node| {
        visited.push(node);
        doc.is_element(node) && doc.text_content(node).is_empty()
    });

    assert_eq!(
        doc.inner_html(body),
        "<p>This is a simple text with <i>italic text</i> and empty tags</p>"
    );

    // The removed <div> was not descended into
    let inner_span = visited
        .iter()
        .filter(|&&node| has_tag_name(&doc, node, "span"))
        .count();
    assert_eq!(inner_span, 2);
}

#[test]
fn remove_whitespace_text() {
    let (mut doc, body) = body_with("<p>Hello world <b> </b></p> <!-- Comments --> <div> </div>");

    remove_empty_text_nodes(&mut doc, body);
    assert_eq!(
        doc.inner_html(body),
        "<p>Hello world <b> </b></p><!-- Comments --><div> </div>"
    );
}

#[test]
fn remove_comments() {
    let (mut doc, body) = body_with("<p>Hello world <b> </b></p> <!-- Comments --> <div> </div>");

    remove_comment_nodes(&mut doc, body);
    assert_eq!(doc.inner_html(body), "<p>Hello world <b> </b></p>  <div> </div>");
}

#[test]
fn reset_attributes() {
    let mut doc = Document::new();
    let span = create_node_with(
        &mut doc,
        "span",
        &NodeOptions::new()
            .attribute("attr1", "value1")
            .attribute("attr2", "value2")
            .attribute("attr3", "value3")
            .text_content("Simple text"),
    );

    reset_attributes_to(&mut doc, span, &[("foo", "bar")]);
    assert_eq!(doc.outer_html(span), r#"<span foo="bar">Simple text</span>"#);

    reset_attributes_to(&mut doc, span, &[]);
    assert_eq!(doc.outer_html(span), "<span>Simple text</span>");
}

#[test]
fn style_to_tag_on_detached_nodes() {
    let mut doc = Document::new();
    let styled = |doc: &mut Document, tag: &str, style: &str| {
        create_node_with(
            doc,
            tag,
            &NodeOptions::new()
                .attribute("style", style)
                .text_content("Simple text"),
        )
    };

    let b = styled(&mut doc, "b", "font-weight: normal;");
    let node = replace_node_style_by_tag(&mut doc, b);
    assert_eq!(
        doc.outer_html(node),
        r#"<span style="font-weight: normal;">Simple text</span>"#
    );

    let span = styled(&mut doc, "span", "font-weight: 900;");
    let node = replace_node_style_by_tag(&mut doc, span);
    assert_eq!(doc.outer_html(node), r#"<b><span style="">Simple text</span></b>"#);

    let span = styled(&mut doc, "span", "font-style: italic;");
    let node = replace_node_style_by_tag(&mut doc, span);
    assert_eq!(doc.outer_html(node), r#"<i><span style="">Simple text</span></i>"#);
}

#[test]
fn style_to_tag_in_place() {
    let (mut doc, body) =
        body_with(r#"<p>a <span style="color: red; font-weight: bold;">b</span> c</p>"#);
    let span = select(&doc, "span");

    let b = replace_node_style_by_tag(&mut doc, span);
    assert!(has_tag_name(&doc, b, "b"));
    assert_eq!(
        doc.inner_html(body),
        r#"<p>a <b><span style="color: red; ">b</span></b> c</p>"#
    );
}

#[test]
fn style_without_rule_is_untouched() {
    let (mut doc, body) = body_with(r#"<span style="color: red;">x</span>"#);
    let span = select(&doc, "span");

    assert_eq!(replace_node_style_by_tag(&mut doc, span), span);
    assert_eq!(doc.inner_html(body), r#"<span style="color: red;">x</span>"#);
}

#[test]
fn trim_leading_and_trailing_tags() {
    let (mut doc, body) = body_with(
        "<div></div><div></div><p>Hello world</p><div></div><span>Simple text</span><div></div>",
    );

    trim_tag(&mut doc, body, "DIV");
    assert_eq!(
        doc.inner_html(body),
        "<p>Hello world</p><div></div><span>Simple text</span>"
    );
}

#[test]
fn replace_text_everywhere() {
    let mut doc = Document::new();
    let template = r##"<p>Lorem ipsum dolor sit amet sea est imperdiet vel amet dolores amet elitr. <i class="test">Et eirmod dolore aliquyam eirmod ipsum rebum at labore clita dolores at ut.</i> Invidunt voluptua diam dolor <b>clita et aliquyam <a href="#" title="title">lorem et justo</a> ut no amet ipsum</b> ut rebum nostrud et.</p>"##;
    let node = create_from_template(&mut doc, template).expect("element");

    replace_all_text(&mut doc, node, "dolor", "lorem");
    assert_eq!(
        doc.outer_html(node),
        r##"<p>Lorem ipsum lorem sit amet sea est imperdiet vel amet loremes amet elitr. <i class="test">Et eirmod loreme aliquyam eirmod ipsum rebum at labore clita loremes at ut.</i> Invidunt voluptua diam lorem <b>clita et aliquyam <a href="#" title="title">lorem et justo</a> ut no amet ipsum</b> ut rebum nostrud et.</p>"##
    );

    let lorem = Regex::new("(?i)lorem").expect("valid regex");
    replace_all_text(&mut doc, node, &lorem, r#"<span class="foo">lorem</span>"#);
    assert_eq!(
        doc.outer_html(node),
        r##"<p><span class="foo">lorem</span> ipsum <span class="foo">lorem</span> sit amet sea est imperdiet vel amet <span class="foo">lorem</span>es amet elitr. <i class="test">Et eirmod <span class="foo">lorem</span>e aliquyam eirmod ipsum rebum at labore clita <span class="foo">lorem</span>es at ut.</i> Invidunt voluptua diam <span class="foo">lorem</span> <b>clita et aliquyam <a href="#" title="title"><span class="foo">lorem</span> et justo</a> ut no amet ipsum</b> ut rebum nostrud et.</p>"##
    );
}

#[test]
fn replace_text_keeps_surrounding_text_escaped() {
    let (mut doc, body) = body_with("<p>a &lt; b &amp; c</p>");

    replace_all_text(&mut doc, body, "b", "<em>b</em>");
    assert_eq!(doc.inner_html(body), "<p>a &lt; <em>b</em> &amp; c</p>");
}

#[test]
fn escape_helper() {
    assert_eq!(
        escape("<This \"' is the string to &escape !>"),
        "&lt;This &quot;&#39; is the string to &amp;escape !&gt;"
    );
}

#[test]
fn mixed_case_attribute_names() {
    let (mut doc, _) = body_with("<p>x</p>");
    let p = select(&doc, "p");

    set_attribute(&mut doc, p, "Title", Some("t"));
    set_attribute(&mut doc, p, "Data-Key", Some("v"));

    assert_eq!(doc.outer_html(p), r#"<p title="t" data-key="v">x</p>"#);
    assert_eq!(get_attribute(&doc, p, "title"), Some("t"));
    assert!(has_attribute(&doc, p, "TITLE"));
    assert!(is(&doc, p, "[title]").expect("valid selector"));

    let mut cache = DataCache::new();
    assert_eq!(cache.get_data(&doc, p, "key").and_then(DataValue::as_str), Some("v"));

    reset_attributes_to(&mut doc, p, &[("TITLE", "u")]);
    assert_eq!(doc.outer_html(p), r#"<p title="u">x</p>"#);
}

#[test]
fn clearing_unset_style_writes_nothing() {
    let (mut doc, body) = body_with(r#"<p>x</p><div id="d"></div>"#);
    let p = select(&doc, "p");

    update_css(&mut doc, p, "top", None);
    update_css_of_element(&mut doc, "d", "color", None);
    update_css_of_elements(&mut doc, "p", "left", None).expect("valid selector");

    assert_eq!(doc.inner_html(body), r#"<p>x</p><div id="d"></div>"#);
}
