//! Defines the flat token stream produced by Markdown tokenizers.
//!
//! The shape follows the markdown-it convention: block structure is a flat list of
//! `*_open` / `*_close` tokens with a nesting `level`, and every run of inline text is a
//! single `inline` token whose `children` hold the inline tokens (`text`, `em_open`,
//! `link_open`, `code`, ...). Token kinds are plain strings so that tokenizer plugins can
//! introduce kinds of their own (a `mention_open`, say) and register builders for them.

use std::collections::BTreeMap;

/// Whether a token opens, closes or stands alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Open,
    Close,
    SelfClosing,
}

/// A single token in the stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Token {
    /// Token kind, e.g. `paragraph_open`, `inline`, `strong_close`, `fence`.
    pub kind: String,
    /// Block nesting level; 0 for top-level block tokens.
    pub level: usize,
    /// Literal payload (code content, inline source, html source).
    pub content: String,
    /// Named attributes (`href`, `src`, `level`, `params`, ...).
    pub attrs: BTreeMap<String, String>,
    /// Inline children of an `inline` token.
    pub children: Vec<Token>,
    /// 1-based source line span `(start, end)`, inclusive, when known.
    pub lines: Option<(usize, usize)>,
}

impl Token {
    pub fn new(kind: impl Into<String>, level: usize) -> Self {
        Token {
            kind: kind.into(),
            level,
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Token>) -> Self {
        self.children = children;
        self
    }

    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.lines = Some((start, end));
        self
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn nesting(&self) -> Nesting {
        if self.kind.ends_with("_open") {
            Nesting::Open
        } else if self.kind.ends_with("_close") {
            Nesting::Close
        } else {
            Nesting::SelfClosing
        }
    }

    /// The `_open` kind matching a `_close` token (`strong_close` → `strong_open`).
    pub fn opening_kind(&self) -> Option<String> {
        self.kind
            .strip_suffix("_close")
            .map(|base| format!("{base}_open"))
    }
}

/// Convenience constructor for `text` children.
pub fn text(content: impl Into<String>) -> Token {
    Token::new("text", 0).with_content(content)
}
