//! Page conversion through the public API.

use std::fs;

use bss_django::convert::{LOAD_STATIC, convert_tree};
use bss_django::{ConvertOptions, Converter, Document, Error, MalformedPathPolicy};

fn convert(html: &str) -> String {
    Converter::default().convert_str(html).unwrap().html
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in:\n{haystack}"))
}

#[test]
fn test_output_starts_with_load_static() {
    let out = convert("<p>hi</p>");
    assert!(out.starts_with("{% load static %}\n<p>"));
}

#[test]
fn test_for_basic() {
    let out = convert(r#"<div class="row"><div class="col" dj-for="post in posts">Post</div></div>"#);
    let open = position(&out, "{% for post in posts %}");
    let element = position(&out, r#"<div class="col">"#);
    let close = position(&out, "{% endfor %}");
    assert!(open < element && element < close);
    assert!(!out.contains("dj-for"));
}

#[test]
fn test_for_multiple_siblings() {
    let out = convert(r#"<ul><li dj-for="a in as">A</li><li dj-for="b in bs">B</li></ul>"#);
    assert_eq!(out.matches("{% endfor %}").count(), 2);
    assert!(position(&out, "{% for a in as %}") < position(&out, "{% for b in bs %}"));
}

#[test]
fn test_for_nested() {
    let out = convert(
        r#"<ul><li dj-for="group in groups"><ul><li dj-for="item in group.items">x</li></ul></li></ul>"#,
    );
    let outer_open = position(&out, "{% for group in groups %}");
    let inner_open = position(&out, "{% for item in group.items %}");
    let inner_close = position(&out, "{% endfor %}");
    let outer_close = out.rfind("{% endfor %}").unwrap();
    assert!(outer_open < inner_open);
    assert!(inner_open < inner_close);
    assert!(inner_close < outer_close);
}

#[test]
fn test_if_outside_for_never_interleaves() {
    let out = convert(r#"<div dj-if="posts"><p dj-for="post in posts">t</p></div>"#);
    let if_open = position(&out, "{% if posts %}");
    let for_open = position(&out, "{% for post in posts %}");
    let for_close = position(&out, "{% endfor %}");
    let if_close = position(&out, "{% endif %}");
    assert!(if_open < for_open && for_open < for_close && for_close < if_close);
}

#[test]
fn test_block_wraps_element() {
    let out = convert(r#"<main dj-block="content"><p>t</p></main>"#);
    assert!(position(&out, "{% block content %}") < position(&out, "<main>"));
    assert!(position(&out, "</main>") < position(&out, "{% endblock %}"));
}

#[test]
fn test_load_without_closing_marker() {
    let out = convert(r#"<div dj-load="humanize"><p>t</p></div>"#);
    assert!(position(&out, "{% load humanize %}") < position(&out, "<div>"));
    assert!(!out.contains("{% endload %}"));
}

#[test]
fn test_directive_attributes_are_consumed() {
    let out = convert(
        r#"<div dj-for="a in b" dj-if="c" dj-block="d" dj-load="e"><span dj-ref="f">x</span></div><p dj-for-data>preview</p>"#,
    );
    assert!(!out.contains("dj-"), "{out}");
    assert!(!out.contains("preview"));
}

#[test]
fn test_expression_copied_verbatim() {
    let out = convert(r#"<p dj-if="a &lt; b and c|length &gt; 2">t</p>"#);
    assert!(out.contains("{% if a < b and c|length > 2 %}"), "{out}");
}

#[test]
fn test_ref_inserted_inside_element() {
    let out = convert(r#"<h1 dj-ref="page.title">Placeholder</h1>"#);
    let open = position(&out, "<h1>");
    let reference = position(&out, "{ page.title }");
    let text = position(&out, "Placeholder");
    assert!(open < reference && reference < text);
}

#[test]
fn test_static_links() {
    let out = convert(
        r#"<html><head><link rel="stylesheet" href="assets/css/home/styles.css"><script src="/assets/js/shop/cart/cart.js"></script></head><body><img src="assets/img/home/logo.png"></body></html>"#,
    );
    assert!(out.contains(r#"href='{% static "home/css/styles.css" %}'"#), "{out}");
    assert!(out.contains(r#"src='{% static "shop/js/cart/cart.js" %}'"#));
    assert!(out.contains(r#"src='{% static "home/img/logo.png" %}'"#));
}

#[test]
fn test_noscript_links_are_rewritten() {
    let out = convert(
        r#"<html><body><noscript><img src="assets/img/home/px.png"></noscript><p>x</p></body></html>"#,
    );
    assert!(!out.contains("&lt;img"), "{out}");
    assert!(out.contains(r#"<img src='{% static "home/img/px.png" %}'/>"#), "{out}");
    assert!(position(&out, "<noscript>") < position(&out, "<img"));
    assert!(position(&out, "<img") < position(&out, "</noscript>"));
}

#[test]
fn test_static_path_is_not_entity_escaped() {
    let out = convert(r#"<img src="assets/img/home/a&amp;b.png">"#);
    assert!(out.contains(r#"src='{% static "home/img/a&b.png" %}'"#), "{out}");
}

#[test]
fn test_external_links_unchanged() {
    let out = convert(
        r#"<link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Lato"><script src="http://cdn.example.com/a/b/c.js"></script>"#,
    );
    assert!(out.contains(r#"href="https://fonts.googleapis.com/css?family=Lato""#));
    assert!(out.contains(r#"src="http://cdn.example.com/a/b/c.js""#));
}

#[test]
fn test_background_image_url() {
    let out = convert(
        r#"<section style="background-image:url(&quot;assets/img/home/bg.jpg&quot;);background-size:cover;">x</section>"#,
    );
    assert!(
        out.contains(r#"url({% static "home/img/bg.jpg" %})"#),
        "{out}"
    );
}

#[test]
fn test_url_text_outside_styles_untouched() {
    let out = convert("<p>call url(assets/img/home/x.png) in docs</p>");
    assert!(out.contains("url(assets/img/home/x.png)"));
}

#[test]
fn test_document_without_directives_only_gains_prefix() {
    let html = r#"<!DOCTYPE html><html><head><title>T</title></head><body><p class="lead">Hi &amp; bye</p></body></html>"#;
    let out = convert(html);
    let expected = format!("{LOAD_STATIC}\n{}", Document::parse(html).to_pretty_string(1));
    assert_eq!(out, expected);
}

#[test]
fn test_rerun_is_noop() {
    let first = Converter::default()
        .convert_str(
            r#"<div dj-block="content"><a dj-if="u" href="/x"><img src="assets/img/home/a.png" dj-ref="u.name"></a></div>"#,
        )
        .unwrap();
    let second = Converter::default().convert_str(&first.html).unwrap();
    assert!(second.stats.is_noop(), "{:?}", second.stats);
}

#[test]
fn test_convert_file_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("index.html");
    fs::write(&page, r#"<p dj-if="user">hi</p>"#).unwrap();

    let stats = Converter::default().convert_file(&page, &page).unwrap();
    assert_eq!(stats.enclosing, 1);

    let written = fs::read_to_string(&page).unwrap();
    assert!(written.starts_with(LOAD_STATIC));
    assert!(written.contains("{% if user %}"));
}

#[test]
fn test_convert_file_twice_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("index.html");
    fs::write(&page, "<p>hi</p>").unwrap();

    let converter = Converter::default();
    converter.convert_file(&page, &page).unwrap();
    assert!(matches!(
        converter.convert_file(&page, &page),
        Err(Error::AlreadyConverted { .. })
    ));
}

#[test]
fn test_convert_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("missing.html");
    let dest = dir.path().join("out.html");

    let result = Converter::default().convert_file(&src, &dest);
    assert!(matches!(result, Err(Error::SourceNotFound { path }) if path == src));
    assert!(!dest.exists());
}

#[test]
fn test_strict_mode_leaves_destination_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("index.html");
    let dest = dir.path().join("out.html");
    fs::write(&src, r#"<img src="img/logo.png">"#).unwrap();
    fs::write(&dest, "previous").unwrap();

    let strict = Converter::new(
        ConvertOptions::default().with_malformed_paths(MalformedPathPolicy::Fail),
    );
    assert!(matches!(
        strict.convert_file(&src, &dest),
        Err(Error::MalformedAssetPath { .. })
    ));
    assert_eq!(fs::read_to_string(&dest).unwrap(), "previous");

    let stats = Converter::default().convert_file(&src, &dest).unwrap();
    assert_eq!(stats.skipped, ["img/logo.png"]);
    assert!(fs::read_to_string(&dest).unwrap().contains(r#"src="img/logo.png""#));
}

#[test]
fn test_latin1_page() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("index.html");
    fs::write(&page, b"<p dj-ref=\"x\">caf\xe9</p>").unwrap();

    Converter::default().convert_file(&page, &page).unwrap();
    assert!(fs::read_to_string(&page).unwrap().contains("café"));
}

#[test]
fn test_convert_tree_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("home")).unwrap();
    fs::write(root.join("index.html"), r#"<p dj-if="a">t</p>"#).unwrap();
    fs::write(root.join("home/about.html"), r#"<img src="bad.png">"#).unwrap();
    fs::write(root.join("home/done.html"), "{% load static %}\n<p>t</p>").unwrap();

    let options = ConvertOptions::default().with_malformed_paths(MalformedPathPolicy::Fail);
    let report = convert_tree(root, &options).unwrap();

    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.converted[0].path, root.join("index.html"));
    assert_eq!(report.already_converted, [root.join("home/done.html")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, root.join("home/about.html"));
    assert!(!report.is_success());

    assert!(fs::read_to_string(root.join("index.html")).unwrap().contains("{% if a %}"));
    assert_eq!(
        fs::read_to_string(root.join("home/about.html")).unwrap(),
        r#"<img src="bad.png">"#
    );
}
