//! Core data structures for the flat annotated document.
//!
//! A [`Document`] is an ordered list of [`Block`]s plus an [`EntityMap`]. Each block
//! holds plain text and inline annotations addressed by character offset. Offsets and
//! lengths count Unicode scalar values (Rust `char`s), never bytes.
//!
//! The serde representation matches the raw draft JSON schema (`inlineStyleRanges`,
//! `entityRanges`, `entityMap`, ...), so documents can be exchanged with editors that
//! speak that format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of an entry in the [`EntityMap`].
pub type EntityKey = u64;

/// Entities referenced by entity ranges, keyed by their numeric key.
pub type EntityMap = BTreeMap<EntityKey, Entity>;

/// Open key/value metadata attached to blocks and entities.
pub type Data = Map<String, Value>;

/// Block type of a plain paragraph.
pub const UNSTYLED: &str = "unstyled";
pub const UNORDERED_LIST_ITEM: &str = "unordered-list-item";
pub const ORDERED_LIST_ITEM: &str = "ordered-list-item";
pub const BLOCKQUOTE: &str = "blockquote";
pub const CODE_BLOCK: &str = "code-block";
pub const ATOMIC: &str = "atomic";

/// Deepest list nesting rendered; deeper items are drawn at this depth.
pub const MAX_LIST_DEPTH: usize = 16;

/// Block types for heading levels 1 through 6.
pub const HEADINGS: [&str; 6] = [
    "header-one",
    "header-two",
    "header-three",
    "header-four",
    "header-five",
    "header-six",
];

/// The root of a flat annotated document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub entity_map: EntityMap,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Document {
            blocks,
            entity_map: EntityMap::new(),
        }
    }

    /// Builder-style helper used mostly by tests and callers assembling documents by hand.
    pub fn with_entity(mut self, key: EntityKey, entity: Entity) -> Self {
        self.entity_map.insert(key, entity);
        self
    }
}

/// One line-level unit of the document (paragraph, heading, list item, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default = "default_block_type")]
    pub block_type: String,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub inline_style_ranges: Vec<StyleRange>,
    #[serde(default)]
    pub entity_ranges: Vec<EntityRange>,
    #[serde(default)]
    pub data: Data,
}

fn default_block_type() -> String {
    UNSTYLED.to_string()
}

impl Default for Block {
    fn default() -> Self {
        Block::new(UNSTYLED, "")
    }
}

impl Block {
    pub fn new(block_type: impl Into<String>, text: impl Into<String>) -> Self {
        Block {
            key: String::new(),
            text: text.into(),
            block_type: block_type.into(),
            depth: 0,
            inline_style_ranges: Vec::new(),
            entity_ranges: Vec::new(),
            data: Data::new(),
        }
    }

    pub fn unstyled(text: impl Into<String>) -> Self {
        Block::new(UNSTYLED, text)
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_style(mut self, offset: usize, length: usize, style: impl Into<String>) -> Self {
        self.inline_style_ranges
            .push(StyleRange::new(offset, length, style));
        self
    }

    pub fn with_entity(mut self, offset: usize, length: usize, key: EntityKey) -> Self {
        self.entity_ranges.push(EntityRange {
            offset,
            length,
            key,
        });
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Length of the text in characters, the unit every range is expressed in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// A block with nothing to show: no text, no entities and no metadata.
    ///
    /// Editors routinely emit these for blank lines; they are dropped on export unless
    /// newlines are preserved.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.entity_ranges.is_empty() && self.data.is_empty()
    }

    /// `depth` clamped to [`MAX_LIST_DEPTH`].
    pub fn list_depth(&self) -> usize {
        self.depth.min(MAX_LIST_DEPTH)
    }

    /// The list flavor of this block, if it is a list item.
    pub fn list_kind(&self) -> Option<ListKind> {
        ListKind::from_block_type(&self.block_type)
    }

    /// String value of a `data` entry, if present.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Inline style annotation over `[offset, offset + length)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRange {
    pub offset: usize,
    pub length: usize,
    pub style: String,
}

impl StyleRange {
    pub fn new(offset: usize, length: usize, style: impl Into<String>) -> Self {
        StyleRange {
            offset,
            length,
            style: style.into(),
        }
    }
}

/// Entity annotation over `[offset, offset + length)` pointing into the entity map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRange {
    pub offset: usize,
    pub length: usize,
    pub key: EntityKey,
}

/// A rich object (link, image, mention) referenced by entity ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub mutability: Mutability,
    #[serde(default)]
    pub data: Data,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, mutability: Mutability) -> Self {
        Entity {
            entity_type: entity_type.into(),
            mutability,
            data: Data::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// String value of a `data` entry, if present.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// How an editor may modify the text covered by an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mutability {
    #[default]
    Mutable,
    Immutable,
    Segmented,
}

/// The two list flavors Markdown distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub fn from_block_type(block_type: &str) -> Option<Self> {
        match block_type {
            UNORDERED_LIST_ITEM => Some(ListKind::Unordered),
            ORDERED_LIST_ITEM => Some(ListKind::Ordered),
            _ => None,
        }
    }

    pub fn block_type(self) -> &'static str {
        match self {
            ListKind::Unordered => UNORDERED_LIST_ITEM,
            ListKind::Ordered => ORDERED_LIST_ITEM,
        }
    }
}
