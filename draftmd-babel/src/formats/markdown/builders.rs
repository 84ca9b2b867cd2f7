//! Builders that turn tokens into blocks and entities during Markdown import.
//!
//! Builders are looked up by token kind. The defaults below cover CommonMark plus the
//! strikethrough and superscript extensions; callers add or replace entries through
//! [`ToDocumentOptions`](crate::options::ToDocumentOptions). Any closure with the right
//! signature is a builder.

use crate::ir::nodes::{
    Block, Entity, ListKind, Mutability, ATOMIC, BLOCKQUOTE, CODE_BLOCK, HEADINGS, UNSTYLED,
};
use crate::ir::tokens::Token;
use std::collections::HashMap;
use std::sync::Arc;

pub type SharedBlockBuilder = Arc<dyn BlockBuilder>;
pub type SharedEntityBuilder = Arc<dyn EntityBuilder>;

/// Creates a block from a block-level token (or from the only child of an `inline`).
pub trait BlockBuilder: Send + Sync {
    fn build(&self, token: &Token) -> Block;
}

impl<F> BlockBuilder for F
where
    F: Fn(&Token) -> Block + Send + Sync,
{
    fn build(&self, token: &Token) -> Block {
        self(token)
    }
}

/// Creates the entity behind an inline token such as `link_open` or `image`.
pub trait EntityBuilder: Send + Sync {
    fn build(&self, token: &Token) -> Entity;
}

impl<F> EntityBuilder for F
where
    F: Fn(&Token) -> Entity + Send + Sync,
{
    fn build(&self, token: &Token) -> Entity {
        self(token)
    }
}

/// Built-in block builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultBlock {
    Paragraph,
    /// `header-one` .. `header-six` from the `level` attribute.
    Heading,
    Blockquote,
    ListItem(ListKind),
    /// Fenced or indented code; `data.language` from the fence info string.
    Code,
    /// A standalone image: an `atomic` block holding a single placeholder space.
    Atomic,
}

impl BlockBuilder for DefaultBlock {
    fn build(&self, token: &Token) -> Block {
        match self {
            DefaultBlock::Paragraph => Block::new(UNSTYLED, ""),
            DefaultBlock::Heading => {
                let level = token
                    .attr("level")
                    .and_then(|level| level.parse::<usize>().ok())
                    .unwrap_or(1)
                    .clamp(1, HEADINGS.len());
                Block::new(HEADINGS[level - 1], "")
            }
            DefaultBlock::Blockquote => Block::new(BLOCKQUOTE, ""),
            DefaultBlock::ListItem(kind) => Block::new(kind.block_type(), ""),
            DefaultBlock::Code => {
                let text = token.content.strip_suffix('\n').unwrap_or(&token.content);
                let block = Block::new(CODE_BLOCK, text);
                match token.attr("params").and_then(|info| info.split_whitespace().next()) {
                    Some(language) => block.with_data("language", language),
                    None => block,
                }
            }
            DefaultBlock::Atomic => Block::new(ATOMIC, " "),
        }
    }
}

/// Built-in entity builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultEntity {
    /// `LINK` with `url` and optional `title`.
    Link,
    /// `image` with `src` and optional `alt` and `title`.
    Image,
}

impl EntityBuilder for DefaultEntity {
    fn build(&self, token: &Token) -> Entity {
        let (entity, target) = match self {
            DefaultEntity::Link => (Entity::new("LINK", Mutability::Mutable), ("url", "href")),
            DefaultEntity::Image => (Entity::new("image", Mutability::Immutable), ("src", "src")),
        };
        let mut entity = entity.with_data(target.0, token.attr(target.1).unwrap_or(""));
        for optional in ["alt", "title"] {
            if let Some(value) = token.attr(optional).filter(|value| !value.is_empty()) {
                entity = entity.with_data(optional, value);
            }
        }
        entity
    }
}

pub fn default_block_builders() -> HashMap<String, SharedBlockBuilder> {
    let builders: [(&str, DefaultBlock); 8] = [
        ("paragraph_open", DefaultBlock::Paragraph),
        ("heading_open", DefaultBlock::Heading),
        ("blockquote_open", DefaultBlock::Blockquote),
        ("unordered_list_item_open", DefaultBlock::ListItem(ListKind::Unordered)),
        ("ordered_list_item_open", DefaultBlock::ListItem(ListKind::Ordered)),
        ("fence", DefaultBlock::Code),
        ("code_block", DefaultBlock::Code),
        ("image", DefaultBlock::Atomic),
    ];
    builders
        .into_iter()
        .map(|(kind, builder)| (kind.to_string(), Arc::new(builder) as SharedBlockBuilder))
        .collect()
}

pub fn default_entity_builders() -> HashMap<String, SharedEntityBuilder> {
    HashMap::from([
        ("link_open".to_string(), Arc::new(DefaultEntity::Link) as SharedEntityBuilder),
        ("image".to_string(), Arc::new(DefaultEntity::Image) as SharedEntityBuilder),
    ])
}

/// Token kind → inline style name.
pub fn default_styles() -> HashMap<String, String> {
    [
        ("strong_open", "BOLD"),
        ("em_open", "ITALIC"),
        ("del_open", "STRIKETHROUGH"),
        ("code", "CODE"),
        ("sup_open", "SUPERSCRIPT"),
        ("sub_open", "SUBSCRIPT"),
        ("ins_open", "UNDERLINE"),
    ]
    .into_iter()
    .map(|(kind, style)| (kind.to_string(), style.to_string()))
    .collect()
}
