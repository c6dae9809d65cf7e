//! Benchmarks for the page conversion pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use bss_django::{Converter, Document};

/// A builder-style page: a navbar, a looped card grid with preview cards,
/// inline backgrounds and a handful of assets.
fn sample_page() -> String {
    let mut cards = String::new();
    for i in 0..40 {
        cards.push_str(&format!(
            r#"<div class="col-md-4" dj-for-data><div class="card" style="background-image: url(&quot;assets/img/home/card{i}.jpg&quot;);"><h4>Sample {i}</h4></div></div>"#
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Home</title>
  <link rel="stylesheet" href="assets/css/home/styles.css">
  <link rel="stylesheet" href="https://cdn.example.com/bootstrap.min.css">
  <style>.hero {{ background: url('assets/img/home/hero.jpg') center; }}</style>
</head>
<body>
  <nav class="navbar" dj-block="navigation">
    <a class="navbar-brand" href="/"><img src="/assets/img/common/logo.svg"></a>
    <ul class="navbar-nav">
      <li class="nav-item" dj-for="item in menu"><a class="nav-link" href="#" dj-ref="item.title">Link</a></li>
    </ul>
  </nav>
  <section class="hero" dj-if="show_hero" dj-load="humanize">
    <div class="row">
      <div class="col-md-4" dj-for="post in posts"><div class="card"><h4 dj-ref="post.title">Title</h4></div></div>
      {cards}
    </div>
  </section>
  <script src="assets/js/home/main.js"></script>
  <script src="https://cdn.example.com/bootstrap.bundle.min.js"></script>
</body>
</html>"#
    )
}

fn bench_parse(c: &mut Criterion) {
    let page = sample_page();

    c.bench_function("parse", |b| {
        b.iter(|| Document::parse(&page));
    });
}

fn bench_convert_str(c: &mut Criterion) {
    let page = sample_page();
    let converter = Converter::default();

    c.bench_function("convert_str", |b| {
        b.iter(|| converter.convert_str(&page).unwrap());
    });
}

fn bench_reconvert_noop(c: &mut Criterion) {
    let converter = Converter::default();
    let converted = converter.convert_str(&sample_page()).unwrap().html;

    c.bench_function("reconvert_noop", |b| {
        b.iter(|| converter.convert_str(&converted).unwrap());
    });
}

criterion_group!(benches, bench_parse, bench_convert_str, bench_reconvert_noop);
criterion_main!(benches);
