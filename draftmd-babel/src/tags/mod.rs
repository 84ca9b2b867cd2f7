//! Open/close handlers used when rendering a document to Markdown.
//!
//! Every block type, inline style and entity type that produces Markdown syntax has a
//! [`TagHandler`]. A handler returns the text emitted when the block or range opens and
//! when it closes, and declares a few rendering properties:
//!
//! - verbatim: nothing inside is escaped (inline code, fenced code);
//! - atomic: the covered text is replaced by the handler output (images);
//! - line prefix: re-emitted after every newline inside the block (blockquotes).
//!
//! Built-in handlers are variants of [`Tag`]. Callers can plug in their own with
//! [`FnTag`] (closures) or by implementing the trait; they are registered by name in a
//! [`TagRegistry`](registry::TagRegistry).

pub mod registry;

use crate::ir::nodes::{Block, Entity};
use std::borrow::Cow;
use std::fmt;

pub use registry::TagRegistry;

/// Which table a handler is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Block,
    Style,
    Entity,
}

/// What a handler gets to look at when producing its output.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    /// The block being rendered.
    pub block: &'a Block,
    /// The entity behind an entity range; `None` for block and style handlers.
    pub entity: Option<&'a Entity>,
    /// Running number of an ordered list item (1-based); 0 outside ordered lists.
    pub ordinal: usize,
}

impl<'a> TagContext<'a> {
    pub fn for_block(block: &'a Block, ordinal: usize) -> Self {
        TagContext {
            block,
            entity: None,
            ordinal,
        }
    }

    pub fn for_entity(block: &'a Block, entity: &'a Entity) -> Self {
        TagContext {
            block,
            entity: Some(entity),
            ordinal: 0,
        }
    }

    fn entity_str(&self, key: &str) -> Option<&'a str> {
        self.entity.and_then(|entity| entity.data_str(key))
    }
}

/// Produces Markdown syntax around a block or an inline range.
pub trait TagHandler: Send + Sync {
    fn open(&self, ctx: &TagContext<'_>) -> String;

    fn close(&self, ctx: &TagContext<'_>) -> String;

    /// Content inside is emitted without escaping.
    fn is_verbatim(&self) -> bool {
        false
    }

    /// The covered characters are not emitted; the open/close output replaces them.
    fn is_atomic(&self) -> bool {
        false
    }

    /// Text re-emitted after each newline inside a block.
    fn line_prefix(&self) -> Option<&str> {
        None
    }
}

/// Built-in handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// Symmetric or asymmetric delimiters around a range (`**`, `_`, `` ` ``).
    Wrap {
        open: Cow<'static, str>,
        close: Cow<'static, str>,
        verbatim: bool,
    },
    /// A fixed block prefix (`# `, `- `).
    Prefix(Cow<'static, str>),
    /// `N. ` using the composer's running number.
    OrderedItem,
    /// `> ` at the start of the block and after every newline in it.
    Blockquote,
    /// Fenced code with the info string taken from `data.language`.
    CodeFence,
    /// `[text](url "title")`
    Link,
    /// `![alt](src "title")`, replacing the placeholder text.
    Image,
}

impl Tag {
    pub fn wrap(delimiter: &'static str) -> Self {
        Tag::Wrap {
            open: Cow::Borrowed(delimiter),
            close: Cow::Borrowed(delimiter),
            verbatim: false,
        }
    }

    pub fn verbatim(delimiter: &'static str) -> Self {
        Tag::Wrap {
            open: Cow::Borrowed(delimiter),
            close: Cow::Borrowed(delimiter),
            verbatim: true,
        }
    }

    pub fn prefix(prefix: &'static str) -> Self {
        Tag::Prefix(Cow::Borrowed(prefix))
    }
}

/// Formats the `(destination "title")` part of links and images.
fn destination(url: &str, title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => {
            format!("({url} \"{}\")", title.replace('"', "\\\""))
        }
        _ => format!("({url})"),
    }
}

impl TagHandler for Tag {
    fn open(&self, ctx: &TagContext<'_>) -> String {
        match self {
            Tag::Wrap { open, .. } => open.to_string(),
            Tag::Prefix(prefix) => prefix.to_string(),
            Tag::OrderedItem => format!("{}. ", ctx.ordinal.max(1)),
            Tag::Blockquote => "> ".to_string(),
            Tag::CodeFence => {
                let language = ctx.block.data_str("language").unwrap_or("");
                format!("```{language}\n")
            }
            Tag::Link => "[".to_string(),
            Tag::Image => {
                let src = ctx
                    .entity_str("src")
                    .or_else(|| ctx.entity_str("url"))
                    .or_else(|| ctx.block.data_str("src"))
                    .unwrap_or("");
                let alt = ctx.entity_str("alt").unwrap_or("");
                format!("![{alt}]{}", destination(src, ctx.entity_str("title")))
            }
        }
    }

    fn close(&self, ctx: &TagContext<'_>) -> String {
        match self {
            Tag::Wrap { close, .. } => close.to_string(),
            Tag::CodeFence => "\n```".to_string(),
            Tag::Link => {
                let url = ctx
                    .entity_str("url")
                    .or_else(|| ctx.entity_str("href"))
                    .unwrap_or("");
                format!("]{}", destination(url, ctx.entity_str("title")))
            }
            Tag::Prefix(_) | Tag::OrderedItem | Tag::Blockquote | Tag::Image => String::new(),
        }
    }

    fn is_verbatim(&self) -> bool {
        matches!(self, Tag::Wrap { verbatim: true, .. } | Tag::CodeFence)
    }

    fn is_atomic(&self) -> bool {
        matches!(self, Tag::Image)
    }

    fn line_prefix(&self) -> Option<&str> {
        match self {
            Tag::Blockquote => Some("> "),
            _ => None,
        }
    }
}

type RenderFn = Box<dyn Fn(&TagContext<'_>) -> String + Send + Sync>;

/// A handler backed by two closures.
///
/// ```ignore
/// let mention = FnTag::new(
///     |_| "[".to_string(),
///     |ctx| format!("](@{})", ctx.entity.and_then(|e| e.data_str("id")).unwrap_or("")),
/// );
/// registry.register(TagKind::Entity, "MENTION", mention);
/// ```
pub struct FnTag {
    open: RenderFn,
    close: RenderFn,
    verbatim: bool,
    atomic: bool,
    line_prefix: Option<String>,
}

impl FnTag {
    pub fn new<O, C>(open: O, close: C) -> Self
    where
        O: Fn(&TagContext<'_>) -> String + Send + Sync + 'static,
        C: Fn(&TagContext<'_>) -> String + Send + Sync + 'static,
    {
        FnTag {
            open: Box::new(open),
            close: Box::new(close),
            verbatim: false,
            atomic: false,
            line_prefix: None,
        }
    }

    /// Fixed open and close strings.
    pub fn fixed(open: impl Into<String>, close: impl Into<String>) -> Self {
        let (open, close) = (open.into(), close.into());
        FnTag::new(move |_| open.clone(), move |_| close.clone())
    }

    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    pub fn atomic(mut self) -> Self {
        self.atomic = true;
        self
    }

    pub fn with_line_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.line_prefix = Some(prefix.into());
        self
    }
}

impl fmt::Debug for FnTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTag")
            .field("verbatim", &self.verbatim)
            .field("atomic", &self.atomic)
            .field("line_prefix", &self.line_prefix)
            .finish_non_exhaustive()
    }
}

impl TagHandler for FnTag {
    fn open(&self, ctx: &TagContext<'_>) -> String {
        (self.open)(ctx)
    }

    fn close(&self, ctx: &TagContext<'_>) -> String {
        (self.close)(ctx)
    }

    fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    fn is_atomic(&self) -> bool {
        self.atomic
    }

    fn line_prefix(&self) -> Option<&str> {
        self.line_prefix.as_deref()
    }
}
