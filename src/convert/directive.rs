//! Builder directive attributes and the template markers they become.

use std::fmt;

/// Library-import line written at the top of every converted page.
pub const LOAD_STATIC: &str = "{% load static %}";

/// Default attribute prefix used by the builder export (`dj-for`, ...).
pub const DEFAULT_PREFIX: &str = "dj";

/// Directive keywords recognised on exported elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    For,
    If,
    Block,
    Load,
    Ref,
    /// Preview-only loop content, dropped from the output.
    ForData,
}

/// Keywords wrapped by an opening and a closing marker, in application order.
pub const ENCLOSING: [Keyword; 3] = [Keyword::For, Keyword::If, Keyword::Block];

/// Keywords that only get an opening marker.
pub const OPENING: [Keyword; 1] = [Keyword::Load];

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::For => "for",
            Self::If => "if",
            Self::Block => "block",
            Self::Load => "load",
            Self::Ref => "ref",
            Self::ForData => "for-data",
        }
    }

    /// Attribute name carrying this keyword, e.g. `dj-for`.
    pub fn attribute(self, prefix: &str) -> String {
        format!("{prefix}-{}", self.as_str())
    }

    /// Selector matching every element carrying this keyword's attribute.
    pub fn selector(self, prefix: &str) -> String {
        format!("[{}]", self.attribute(prefix))
    }

    /// `{% for <expr> %}`. The expression is copied verbatim.
    pub fn open_marker(self, expr: &str) -> String {
        format!("{{% {} {} %}}", self.as_str(), expr)
    }

    /// `{% endfor %}`.
    pub fn close_marker(self) -> String {
        format!("{{% end{} %}}", self.as_str())
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline interpolation inserted by `ref`: `{ <expr> }`.
pub fn reference(expr: &str) -> String {
    format!("{{ {expr} }}")
}
