//! HTML document model.
//!
//! Exported pages are parsed with html5ever into an arena tree. Rules find
//! elements with CSS selectors, mutate the tree through [`Arena`], and the
//! result is written back with the pretty printer.
//!
//! ```
//! use bss_django::dom::Document;
//!
//! let doc = Document::parse(r#"<p dj-ref="user.name">Jane</p>"#);
//! let hits = doc.select("[dj-ref]").unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

mod arena;
mod pretty;
mod selector;
mod tree_sink;

pub use arena::{Arena, Attribute, Children, Node, NodeData, NodeId};
pub use pretty::PrettyPrinter;
pub use selector::{ElementRef, MarkupSelectors};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;

use crate::error::{Error, Result};
use tree_sink::ArenaSink;

/// A parsed HTML document.
#[derive(Debug)]
pub struct Document {
    arena: Arena,
    fragment: bool,
}

impl Document {
    /// Parse HTML text.
    ///
    /// Sources without an `<html>` tag or doctype (template partials) are
    /// flagged as fragments: the `html`/`head`/`body` wrappers the parser
    /// implies are left out when serializing.
    pub fn parse(html: &str) -> Self {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                drop_doctype: false,
                // Keep <noscript> children as elements so their links get rewritten.
                scripting_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };

        let arena = parse_document(ArenaSink::new(), opts)
            .from_utf8()
            .one(html.as_bytes())
            .into_arena();

        let lowered = html.to_ascii_lowercase();
        let fragment = !lowered.contains("<html") && !lowered.contains("<!doctype");

        Self { arena, fragment }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Whether the source had no document shell of its own.
    pub fn is_fragment(&self) -> bool {
        self.fragment
    }

    /// Elements matching a CSS selector, in document order.
    ///
    /// The result is a snapshot: mutating the tree afterwards does not
    /// change it.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = selector::parse_selector(selector).map_err(|_| Error::InvalidSelector {
            selector: selector.to_string(),
        })?;
        Ok(selector::select_all(&self.arena, &list))
    }

    /// Nodes written at the top level when serializing.
    pub fn top_level_nodes(&self) -> Vec<NodeId> {
        let document = self.arena.document();
        if !self.fragment {
            return self.arena.children(document).collect();
        }

        let mut nodes = Vec::new();
        for child in self.arena.children(document) {
            if self.is_element_named(child, "html") {
                for part in self.arena.children(child) {
                    if self.is_element_named(part, "head") || self.is_element_named(part, "body") {
                        nodes.extend(self.arena.children(part));
                    } else {
                        nodes.push(part);
                    }
                }
            } else {
                nodes.push(child);
            }
        }
        nodes
    }

    /// Pretty-print the document with `indent` spaces per level.
    pub fn to_pretty_string(&self, indent: usize) -> String {
        PrettyPrinter::new(&self.arena, indent).print(&self.top_level_nodes())
    }

    fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.arena
            .element_name(id)
            .is_some_and(|n| n.as_ref() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_detection() {
        assert!(Document::parse("<div>x</div>").is_fragment());
        assert!(!Document::parse("<html><body>x</body></html>").is_fragment());
        assert!(!Document::parse("<!doctype html><p>x</p>").is_fragment());
    }

    #[test]
    fn test_fragment_drops_implied_wrappers() {
        let doc = Document::parse(r#"<link href="a.css"><div>x</div>"#);
        assert_eq!(
            doc.to_pretty_string(1),
            "<link href=\"a.css\"/>\n<div>\n x\n</div>\n"
        );
    }

    #[test]
    fn test_noscript_children_are_elements() {
        let doc = Document::parse(r#"<div>x</div><noscript><img src="a.png"></noscript>"#);
        assert_eq!(doc.select("noscript img").unwrap().len(), 1);
        assert_eq!(
            doc.to_pretty_string(1),
            "<div>\n x\n</div>\n<noscript>\n <img src=\"a.png\"/>\n</noscript>\n"
        );
    }

    #[test]
    fn test_select_snapshot() {
        let mut doc = Document::parse(r#"<p dj-if="a">1</p><p dj-if="b">2</p>"#);
        let hits = doc.select("[dj-if]").unwrap();
        for &id in &hits {
            doc.arena_mut().take_attr(id, "dj-if");
        }
        assert_eq!(hits.len(), 2);
        assert!(doc.select("[dj-if]").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse("<p></p>");
        assert!(matches!(
            doc.select("[[nope"),
            Err(Error::InvalidSelector { .. })
        ));
    }
}
