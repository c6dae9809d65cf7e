//! Pretty-printing serializer.
//!
//! One node per line, children indented one level deeper than their parent.
//! Whitespace-only text is dropped and other text is trimmed, except inside
//! whitespace-sensitive elements (`pre`, `textarea`) which are written
//! verbatim on a single logical line. Template nodes are written as-is.

use std::fmt::Write;

use super::arena::{Arena, Attribute, NodeData, NodeId};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text content is not HTML-escaped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Elements whose whitespace is significant.
const PRESERVE_WHITESPACE: &[&str] = &["pre", "textarea"];

/// Serializes a set of top-level nodes with a fixed indent width.
pub struct PrettyPrinter<'a> {
    arena: &'a Arena,
    indent: usize,
    out: String,
}

impl<'a> PrettyPrinter<'a> {
    pub fn new(arena: &'a Arena, indent: usize) -> Self {
        Self {
            arena,
            indent,
            out: String::new(),
        }
    }

    /// Serialize `roots` (and their subtrees) in order.
    pub fn print(mut self, roots: &[NodeId]) -> String {
        for &root in roots {
            self.write_node(root, 0, false);
        }
        self.out
    }

    fn pad(&mut self, depth: usize) {
        for _ in 0..depth * self.indent {
            self.out.push(' ');
        }
    }

    fn write_node(&mut self, id: NodeId, depth: usize, raw_text: bool) {
        let Some(node) = self.arena.get(id) else {
            return;
        };

        match &node.data {
            NodeData::Document => {
                for child in self.arena.children(id) {
                    self.write_node(child, depth, false);
                }
            }
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => {
                self.pad(depth);
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(name);
                if !public_id.is_empty() {
                    let _ = write!(self.out, " PUBLIC \"{public_id}\"");
                    if !system_id.is_empty() {
                        let _ = write!(self.out, " \"{system_id}\"");
                    }
                } else if !system_id.is_empty() {
                    let _ = write!(self.out, " SYSTEM \"{system_id}\"");
                }
                self.out.push_str(">\n");
            }
            NodeData::Comment(text) => {
                self.pad(depth);
                let _ = writeln!(self.out, "<!--{text}-->");
            }
            NodeData::Template(markup) => {
                self.pad(depth);
                self.out.push_str(markup);
                self.out.push('\n');
            }
            NodeData::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return;
                }
                self.pad(depth);
                if raw_text {
                    self.out.push_str(trimmed);
                } else {
                    escape_text(trimmed, &mut self.out);
                }
                self.out.push('\n');
            }
            NodeData::Element { name, attrs } => {
                let tag = name.local.as_ref();
                let has_children = self.arena.children(id).next().is_some();

                self.pad(depth);
                if PRESERVE_WHITESPACE.contains(&tag) {
                    self.write_compact(id);
                    self.out.push('\n');
                    return;
                }

                write_start_tag(tag, attrs, &mut self.out);
                if VOID_ELEMENTS.contains(&tag) && !has_children {
                    // `<img/>` style, the way the builder's own exporter writes void tags.
                    self.out.insert(self.out.len() - 1, '/');
                    self.out.push('\n');
                    return;
                }
                self.out.push('\n');

                let raw = RAW_TEXT_ELEMENTS.contains(&tag);
                for child in self.arena.children(id) {
                    self.write_node(child, depth + 1, raw);
                }

                self.pad(depth);
                let _ = writeln!(self.out, "</{tag}>");
            }
        }
    }

    /// Serialize a subtree without any formatting.
    fn write_compact(&mut self, id: NodeId) {
        let Some(node) = self.arena.get(id) else {
            return;
        };

        match &node.data {
            NodeData::Element { name, attrs } => {
                let tag = name.local.as_ref();
                write_start_tag(tag, attrs, &mut self.out);
                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }
                for child in self.arena.children(id) {
                    self.write_compact(child);
                }
                let _ = write!(self.out, "</{tag}>");
            }
            NodeData::Text(text) => escape_text(text, &mut self.out),
            NodeData::Template(markup) => self.out.push_str(markup),
            NodeData::Comment(text) => {
                let _ = write!(self.out, "<!--{text}-->");
            }
            NodeData::Document | NodeData::Doctype { .. } => {}
        }
    }
}

fn write_start_tag(tag: &str, attrs: &[Attribute], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for attr in attrs {
        out.push(' ');
        if let Some(prefix) = &attr.name.prefix {
            out.push_str(prefix.as_ref());
            out.push(':');
        }
        out.push_str(attr.name.local.as_ref());
        out.push('=');
        write_attr_value(&attr.value, out);
    }
    out.push('>');
}

/// Quote an attribute value.
///
/// Template tags (`{% ... %}`) are copied without entity escaping so their
/// arguments reach the template engine unchanged. Tags holding only double
/// quotes get a single-quoted value, tags holding single quotes a
/// double-quoted one; only a tag with both kinds gets its delimiter escaped.
/// Plain values use double quotes unless they contain a double quote but no
/// single quote.
fn write_attr_value(value: &str, out: &mut String) {
    let spans = template_spans(value);
    let in_tags = |c: char| spans.iter().any(|&(start, end)| value[start..end].contains(c));

    let quote = if in_tags('"') && !in_tags('\'') {
        '\''
    } else if in_tags('\'') {
        '"'
    } else if value.contains('"') && !value.contains('\'') {
        '\''
    } else {
        '"'
    };

    out.push(quote);
    let mut pos = 0;
    for &(start, end) in &spans {
        escape_attr(&value[pos..start], quote, out);
        let tag = &value[start..end];
        if tag.contains(quote) {
            // Both quote kinds inside one tag: the delimiter has to be escaped.
            escape_quote(tag, quote, out);
        } else {
            out.push_str(tag);
        }
        pos = end;
    }
    escape_attr(&value[pos..], quote, out);
    out.push(quote);
}

/// Byte ranges of `{% ... %}` tags in `value`.
fn template_spans(value: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(open) = value[pos..].find("{%") {
        let start = pos + open;
        let Some(close) = value[start + 2..].find("%}") else {
            break;
        };
        let end = start + 2 + close + 2;
        spans.push((start, end));
        pos = end;
    }
    spans
}

fn escape_attr(text: &str, quote: char, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if c == quote => push_quote_entity(c, out),
            c => out.push(c),
        }
    }
}

fn escape_quote(text: &str, quote: char, out: &mut String) {
    for c in text.chars() {
        if c == quote {
            push_quote_entity(c, out);
        } else {
            out.push(c);
        }
    }
}

fn push_quote_entity(quote: char, out: &mut String) {
    out.push_str(if quote == '"' { "&quot;" } else { "&#39;" });
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::Document;

    fn pretty(html: &str) -> String {
        Document::parse(html).to_pretty_string(1)
    }

    #[test]
    fn test_nested_indentation() {
        let out = pretty("<div><p>Hello <b>you</b></p></div>");
        assert_eq!(
            out,
            "<div>\n <p>\n  Hello\n  <b>\n   you\n  </b>\n </p>\n</div>\n"
        );
    }

    #[test]
    fn test_void_elements_self_close() {
        let out = pretty(r#"<p><img src="a.png" alt=""><br></p>"#);
        assert_eq!(out, "<p>\n <img src=\"a.png\" alt=\"\"/>\n <br/>\n</p>\n");
    }

    #[test]
    fn test_attribute_quoting() {
        let out = pretty(r#"<a href='{% static "x.css" %}' title="a &amp; b">t</a>"#);
        assert!(out.contains(r#"href='{% static "x.css" %}'"#), "{out}");
        assert!(out.contains(r#"title="a &amp; b""#), "{out}");

        let both = pretty(r#"<a title="it's &quot;here&quot;">t</a>"#);
        assert!(both.contains(r#"title="it's &quot;here&quot;""#), "{both}");
    }

    #[test]
    fn test_template_tags_in_attributes_are_not_escaped() {
        let out = pretty(r#"<img src='{% static "a&b.png" %}' alt="x &amp; y">"#);
        assert_eq!(out, "<img src='{% static \"a&b.png\" %}' alt=\"x &amp; y\"/>\n");

        let css = pretty(
            r#"<div style="font: 'A'; background: url({% static 'a&b.png' %})">t</div>"#,
        );
        assert!(
            css.contains(r#"style="font: 'A'; background: url({% static 'a&b.png' %})""#),
            "{css}"
        );

        let mixed = pretty(r#"<p title='{% static &quot;x&#39;y.png&quot; %}'>t</p>"#);
        assert!(
            mixed.contains(r#"title="{% static &quot;x'y.png&quot; %}""#),
            "{mixed}"
        );
    }

    #[test]
    fn test_script_text_is_not_escaped() {
        let out = pretty("<script>if (a < b && c) {}</script>");
        assert!(out.contains(" if (a < b && c) {}\n"), "{out}");
    }

    #[test]
    fn test_pre_is_kept_verbatim() {
        let out = pretty("<pre>  a\n   b</pre>");
        assert_eq!(out, "<pre>  a\n   b</pre>\n");
    }

    #[test]
    fn test_full_document_keeps_doctype_and_wrappers() {
        let out = pretty("<!DOCTYPE html><html><head><title>T</title></head><body></body></html>");
        assert_eq!(
            out,
            "<!DOCTYPE html>\n<html>\n <head>\n  <title>\n   T\n  </title>\n </head>\n <body>\n </body>\n</html>\n"
        );
    }
}
