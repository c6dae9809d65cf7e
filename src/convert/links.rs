//! Asset link remapping.
//!
//! The builder exports assets as `assets/{category}/{app}/...`, the target
//! project serves them from each application's static directory as
//! `{app}/{category}/...`. Links are rewritten to static-file tags pointing at
//! the remapped path.

use memchr::{memchr, memmem};

use crate::error::{Error, Result};

/// Elements whose `src`/`href` point at static assets.
pub const LINK_TAGS: [&str; 3] = ["script", "img", "link"];

/// Link attributes, in rewrite order.
pub const LINK_ATTRIBUTES: [&str; 2] = ["src", "href"];

/// Prefix marking external URLs.
pub const EXTERNAL_PREFIX: &str = "http";

/// Whether a link points outside the export and must be left alone.
///
/// Protocol-relative (`//cdn...`) and inline `data:` URLs are treated like
/// `http(s)` ones.
pub fn is_external(value: &str) -> bool {
    value.starts_with(EXTERNAL_PREFIX) || value.starts_with("//") || value.starts_with("data:")
}

/// Whether a value already is template markup (e.g. from a previous run).
pub fn is_template(value: &str) -> bool {
    value.starts_with("{%") || value.starts_with("{{")
}

/// Reorder `root/category/app/rest...` into `app/category/rest...`.
///
/// Empty and `.` segments are ignored. `rest` may be empty, in which case the
/// result is `app/category`.
pub fn remap(path: &str) -> Result<String> {
    let parts: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    let [_root, category, app, rest @ ..] = parts.as_slice() else {
        return Err(Error::MalformedAssetPath {
            path: path.to_string(),
        });
    };

    let mut out = format!("{app}/{category}");
    for segment in rest {
        out.push('/');
        out.push_str(segment);
    }
    Ok(out)
}

/// Static-file tag for a remapped path: `{% static "<path>" %}`.
pub fn static_reference(path: &str) -> String {
    static_reference_quoted(path, '"')
}

/// Static-file tag using `quote` around the path.
pub fn static_reference_quoted(path: &str, quote: char) -> String {
    format!("{{% static {quote}{path}{quote} %}}")
}

/// Remap a link value.
///
/// Returns `Ok(None)` when the value is left untouched (empty, external or
/// already template markup). A leading `/` is dropped before remapping.
pub fn remap_link(value: &str) -> Result<Option<String>> {
    if value.is_empty() || is_external(value) || is_template(value) {
        return Ok(None);
    }
    let relative = value.strip_prefix('/').unwrap_or(value);
    remap(relative).map(Some)
}

/// Rewrite every `url(...)` in `css` with `rewrite`.
///
/// The closure receives the URL with surrounding quotes and whitespace
/// removed and returns the replacement for the whole parenthesised value, or
/// `None` to keep the original text. Returns `Ok(None)` when nothing changed.
pub fn rewrite_css_urls<F>(css: &str, mut rewrite: F) -> Result<Option<String>>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    let bytes = css.as_bytes();
    let finder = memmem::Finder::new(b"url(");
    let mut output = String::with_capacity(css.len());
    let mut pos = 0;
    let mut changed = false;

    while let Some(found) = finder.find(&bytes[pos..]) {
        let content_start = pos + found + 4;
        let Some(paren) = memchr(b')', &bytes[content_start..]) else {
            break;
        };
        let content_end = content_start + paren;

        // Both offsets sit on ASCII bytes, so they are char boundaries.
        output.push_str(&css[pos..content_start]);
        let raw = &css[content_start..content_end];
        let url = raw.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace());

        match rewrite(url)? {
            Some(replacement) => {
                output.push_str(&replacement);
                changed = true;
            }
            None => output.push_str(raw),
        }
        output.push(')');
        pos = content_end + 1;
    }

    if !changed {
        return Ok(None);
    }
    output.push_str(&css[pos..]);
    Ok(Some(output))
}
