use divan::{Bencher, black_box};
use garnish::{
    Document, EventRegistry, Handler, Regex, add_class_to_elements, escape, parse,
    replace_all_text, replace_node_style_by_tag,
};

fn main() {
    divan::main();
}

const PARAGRAPH: &str = r#"<p class="lead">Lorem ipsum <span style="font-weight: bold;">dolor</span> sit amet, <i>consectetur</i> adipiscing <a href="/x?a=1&amp;b=2">elit</a>.</p>"#;

/// A body with `paragraphs` copies of the same paragraph.
fn article(paragraphs: usize) -> String {
    let mut html = String::from("<!DOCTYPE html><html><body><article>");
    for _ in 0..paragraphs {
        html.push_str(PARAGRAPH);
    }
    html.push_str("</article></body></html>");
    html
}

#[divan::bench]
fn escape_clean(bencher: Bencher) {
    let text = "plain text without anything to escape ".repeat(64);
    bencher.bench_local(|| black_box(escape(black_box(&text))).len());
}

#[divan::bench]
fn escape_dirty(bencher: Bencher) {
    let text = r#"<a href="x">Tom & 'Jerry'</a> "#.repeat(64);
    bencher.bench_local(|| black_box(escape(black_box(&text))).len());
}

#[divan::bench(args = [10, 100])]
fn select_and_add_class(bencher: Bencher, paragraphs: usize) {
    let html = article(paragraphs);
    bencher.bench_local(|| {
        let mut doc = parse(black_box(&html));
        add_class_to_elements(&mut doc, "article > p.lead span[style]", "styled")
            .expect("valid selector");
        black_box(doc);
    });
}

#[divan::bench(args = [10, 100])]
fn normalize_styles(bencher: Bencher, paragraphs: usize) {
    let html = article(paragraphs);
    bencher.bench_local(|| {
        let mut doc = parse(black_box(&html));
        let styled = doc.query_selector_all("[style]").expect("valid selector");
        for node in styled {
            replace_node_style_by_tag(&mut doc, node);
        }
        black_box(doc);
    });
}

#[divan::bench(args = [10, 100])]
fn highlight_text(bencher: Bencher, paragraphs: usize) {
    let html = article(paragraphs);
    let pattern = Regex::new("(?i)lorem|dolor").expect("valid regex");
    bencher.bench_local(|| {
        let mut doc = parse(black_box(&html));
        let article = doc
            .query_selector("article")
            .expect("valid selector")
            .expect("article");
        replace_all_text(&mut doc, article, &pattern, "<mark>match</mark>");
        black_box(doc);
    });
}

#[divan::bench]
fn dispatch_bubbling(bencher: Bencher) {
    let mut doc = Document::new();
    let body = doc.body().expect("body");
    doc.set_inner_html(body, &"<div>".repeat(32));
    let deepest = doc
        .query_selector_all("div")
        .expect("valid selector")
        .last()
        .copied()
        .expect("div");

    let mut registry = EventRegistry::new();
    let handler = Handler::new(|event| {
        black_box(event.event_type());
    });
    registry.on(deepest.into(), "click.a click.b", &handler);
    registry.on(body.into(), "click", &handler);
    registry.on(garnish::Target::Window, "click", &handler);

    bencher.bench_local(|| {
        let event = garnish::Event::new("click").bubbles(true);
        black_box(registry.trigger(&doc, deepest.into(), event));
    });
}
