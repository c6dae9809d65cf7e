//! Builder markup to template conversion.
//!
//! A page exported by the builder carries its template logic in reserved
//! attributes (`dj-for`, `dj-if`, ...) and links to assets in the export's
//! flat `assets/{category}/{app}` layout. [`Converter::transform`] rewrites a
//! parsed page in place by applying a fixed rule table, in this order:
//!
//! 1. drop preview-only elements (`dj-for-data`)
//! 2. wrap elements in `{% for %}`, `{% if %}`, `{% block %}` markers
//! 3. put `{% load %}` markers before elements
//! 4. turn `src`/`href` of `script`, `img` and `link` into static-file tags
//! 5. inject `{ expr }` references as first child (`dj-ref`)
//! 6. rewrite `url(...)` in inline styles and `<style>` blocks
//!
//! Rendering then prefixes the pretty-printed page with `{% load static %}`.
//!
//! ```
//! use bss_django::convert::Converter;
//!
//! let html = r#"<ul><li dj-for="item in items" dj-ref="item">x</li></ul>"#;
//! let converted = Converter::default().convert_str(html).unwrap();
//!
//! assert!(converted.html.starts_with("{% load static %}\n"));
//! assert!(converted.html.contains("{% for item in items %}"));
//! assert!(converted.html.contains("{ item }"));
//! ```

mod batch;
pub mod directive;
pub mod links;

pub use batch::{BatchReport, FileFailure, FileOutcome, convert_tree, discover_markup_files};
pub use directive::{DEFAULT_PREFIX, Keyword, LOAD_STATIC};

use std::path::Path;

use tracing::{debug, warn};

use crate::dom::{Arena, Document, NodeId};
use crate::error::{Error, Result};

/// What to do with a link whose path is too short to remap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPathPolicy {
    /// Keep the original value and record it in [`TransformStats::skipped`].
    #[default]
    Skip,
    /// Abort the whole page with [`Error::MalformedAssetPath`].
    Fail,
}

/// Conversion settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Attribute prefix, `dj` for `dj-for`.
    pub prefix: String,
    /// Spaces per nesting level in the output.
    pub indent: usize,
    pub malformed_paths: MalformedPathPolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            indent: 1,
            malformed_paths: MalformedPathPolicy::Skip,
        }
    }
}

impl ConvertOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_malformed_paths(mut self, policy: MalformedPathPolicy) -> Self {
        self.malformed_paths = policy;
        self
    }
}

/// Counters of what a conversion rewrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct TransformStats {
    /// Preview-only elements removed.
    pub removed_markers: usize,
    /// `for`/`if`/`block` directives turned into marker pairs.
    pub enclosing: usize,
    /// `load` directives turned into opening markers.
    pub opening: usize,
    /// `src`/`href` values turned into static-file tags.
    pub links: usize,
    /// `ref` directives turned into inline references.
    pub references: usize,
    /// `url(...)` values turned into static-file tags.
    pub css_urls: usize,
    /// Link values left untouched because they could not be remapped.
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Vec::is_empty"))]
    pub skipped: Vec<String>,
}

impl TransformStats {
    /// True when nothing was rewritten.
    pub fn is_noop(&self) -> bool {
        self.rewrites() == 0
    }

    /// Total number of rewrites.
    pub fn rewrites(&self) -> usize {
        self.removed_markers
            + self.enclosing
            + self.opening
            + self.links
            + self.references
            + self.css_urls
    }
}

/// A rendered page and what it took to produce it.
#[derive(Debug, Clone)]
pub struct Converted {
    pub html: String,
    pub stats: TransformStats,
}

/// Applies the conversion rule table.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Rewrite a parsed page in place.
    pub fn transform(&self, doc: &mut Document) -> Result<TransformStats> {
        let mut stats = TransformStats::default();

        self.strip_marker_elements(doc, &mut stats)?;
        for keyword in directive::ENCLOSING {
            stats.enclosing += self.expand_directive(doc, keyword, true)?;
        }
        for keyword in directive::OPENING {
            stats.opening += self.expand_directive(doc, keyword, false)?;
        }
        for tag in links::LINK_TAGS {
            self.rewrite_links(doc, tag, &mut stats)?;
        }
        self.insert_references(doc, &mut stats)?;
        self.rewrite_background_urls(doc, &mut stats)?;

        debug!(rewrites = stats.rewrites(), skipped = stats.skipped.len(), "page transformed");
        Ok(stats)
    }

    /// Serialize a transformed page.
    pub fn render(&self, doc: &Document) -> String {
        format!("{LOAD_STATIC}\n{}", doc.to_pretty_string(self.options.indent))
    }

    /// Parse, transform and render a page.
    pub fn convert_str(&self, html: &str) -> Result<Converted> {
        let mut doc = Document::parse(html);
        let stats = self.transform(&mut doc)?;
        Ok(Converted {
            html: self.render(&doc),
            stats,
        })
    }

    /// Convert the page at `src` and write it to `dest`.
    ///
    /// `dest` may equal `src`. Nothing is written unless the whole page
    /// converted.
    pub fn convert_file(&self, src: &Path, dest: &Path) -> Result<TransformStats> {
        let bytes = crate::io::read_source(src)?;
        let text = crate::util::decode_text(&bytes);

        if is_converted(&text) {
            return Err(Error::AlreadyConverted {
                path: src.to_path_buf(),
            });
        }

        let converted = self.convert_str(&text)?;
        crate::io::write_atomic(dest, converted.html.as_bytes())?;

        debug!(src = %src.display(), dest = %dest.display(), "page written");
        Ok(converted.stats)
    }

    /// Rule 1: remove preview-only elements with their subtree.
    fn strip_marker_elements(&self, doc: &mut Document, stats: &mut TransformStats) -> Result<()> {
        let selector = Keyword::ForData.selector(&self.options.prefix);
        for element in doc.select(&selector)? {
            doc.arena_mut().detach(element);
            stats.removed_markers += 1;
        }
        Ok(())
    }

    /// Rules 2 and 3: pop the directive attribute and place markers around
    /// the element. Returns the number of elements rewritten.
    fn expand_directive(&self, doc: &mut Document, keyword: Keyword, close: bool) -> Result<usize> {
        let matches = doc.select(&keyword.selector(&self.options.prefix))?;
        let expanded = self.wrap_elements(doc.arena_mut(), &matches, keyword, close);

        if expanded > 0 {
            debug!(%keyword, count = expanded, "directive expanded");
        }
        Ok(expanded)
    }

    /// Pop `keyword`'s attribute from each element and insert its markers.
    /// Elements without the attribute are left alone and not counted.
    fn wrap_elements(&self, arena: &mut Arena, elements: &[NodeId], keyword: Keyword, close: bool) -> usize {
        let attribute = keyword.attribute(&self.options.prefix);
        let mut expanded = 0;

        for &element in elements {
            let Some(expr) = arena.take_attr(element, &attribute) else {
                continue;
            };

            let open = arena.create_template(keyword.open_marker(&expr));
            arena.insert_before(element, open);
            if close {
                let end = arena.create_template(keyword.close_marker());
                arena.insert_after(element, end);
            }
            expanded += 1;
        }
        expanded
    }

    /// Rule 4: point `src`/`href` of `tag` elements at static files.
    fn rewrite_links(&self, doc: &mut Document, tag: &str, stats: &mut TransformStats) -> Result<()> {
        for element in doc.select(tag)? {
            for attribute in links::LINK_ATTRIBUTES {
                let Some(value) = doc.arena().get_attr(element, attribute) else {
                    continue;
                };
                let value = value.to_string();

                if let Some(path) = self.remap_link(&value, stats)? {
                    doc.arena_mut()
                        .set_attr(element, attribute, links::static_reference(&path));
                    stats.links += 1;
                }
            }
        }
        Ok(())
    }

    /// Rule 5: inject `{ expr }` as first child.
    fn insert_references(&self, doc: &mut Document, stats: &mut TransformStats) -> Result<()> {
        let attribute = Keyword::Ref.attribute(&self.options.prefix);
        let matches = doc.select(&Keyword::Ref.selector(&self.options.prefix))?;

        let arena = doc.arena_mut();
        for element in matches {
            if let Some(expr) = arena.take_attr(element, &attribute) {
                let reference = arena.create_template(directive::reference(&expr));
                arena.prepend(element, reference);
                stats.references += 1;
            }
        }
        Ok(())
    }

    /// Rule 6: rewrite `url(...)` in `style` attributes and `<style>` text.
    fn rewrite_background_urls(&self, doc: &mut Document, stats: &mut TransformStats) -> Result<()> {
        for element in doc.select("[style]")? {
            let Some(css) = doc.arena().get_attr(element, "style") else {
                continue;
            };
            let css = css.to_string();
            // Keep one quote style in the attribute so the serializer never
            // has to entity-escape the static tag.
            let quote = if css.contains('\'') { '\'' } else { '"' };

            if let Some(rewritten) = self.rewrite_css(&css, quote, stats)? {
                doc.arena_mut().set_attr(element, "style", rewritten);
            }
        }

        for element in doc.select("style")? {
            let texts: Vec<NodeId> = doc
                .arena()
                .children(element)
                .filter(|&child| doc.arena().is_text(child))
                .collect();

            for text in texts {
                let Some(css) = doc.arena().text_content(text) else {
                    continue;
                };
                let css = css.to_string();
                if let Some(rewritten) = self.rewrite_css(&css, '"', stats)?
                    && let Some(slot) = doc.arena_mut().text_content_mut(text)
                {
                    *slot = rewritten;
                }
            }
        }
        Ok(())
    }

    fn rewrite_css(&self, css: &str, quote: char, stats: &mut TransformStats) -> Result<Option<String>> {
        links::rewrite_css_urls(css, |url| {
            let rewritten = self
                .remap_link(url, stats)?
                .map(|path| links::static_reference_quoted(&path, quote));
            if rewritten.is_some() {
                stats.css_urls += 1;
            }
            Ok(rewritten)
        })
    }

    /// Remap a link value, applying the malformed-path policy.
    fn remap_link(&self, value: &str, stats: &mut TransformStats) -> Result<Option<String>> {
        match links::remap_link(value) {
            Err(Error::MalformedAssetPath { .. })
                if self.options.malformed_paths == MalformedPathPolicy::Skip =>
            {
                warn!(path = value, "asset path too short to remap, left unchanged");
                stats.skipped.push(value.to_string());
                Ok(None)
            }
            other => other,
        }
    }
}

/// Whether `text` already starts with the library-import line.
pub fn is_converted(text: &str) -> bool {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.trim() == LOAD_STATIC)
}
