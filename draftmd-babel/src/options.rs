//! Per-call options for both conversion directions.
//!
//! Options only carry the caller's additions. Built-in handlers and builders are merged
//! underneath them at call time, so an options value can be built once, shared between
//! threads and reused for any number of conversions.

use crate::formats::markdown::builders::{
    BlockBuilder, EntityBuilder, SharedBlockBuilder, SharedEntityBuilder,
};
use crate::formats::markdown::html::{
    HtmlBlockPlugin, HtmlStylePlugin, SharedHtmlBlockPlugin, SharedHtmlStylePlugin,
};
use crate::formats::markdown::tokenizer::{
    SharedTokenizer, SharedTokenizerPlugin, Tokenizer, TokenizerPlugin,
};
use crate::tags::TagRegistry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Options for [`to_markdown`](crate::to_markdown).
#[derive(Debug, Clone)]
pub struct ToMarkdownOptions {
    /// Handlers layered over the built-in ones.
    pub tags: TagRegistry,
    /// Render empty blocks and separate non-list blocks with a single newline.
    pub preserve_newlines: bool,
    /// Backslash-escape text that would otherwise read as Markdown syntax.
    pub escape_markdown_characters: bool,
}

impl Default for ToMarkdownOptions {
    fn default() -> Self {
        ToMarkdownOptions {
            tags: TagRegistry::new(),
            preserve_newlines: false,
            escape_markdown_characters: true,
        }
    }
}

impl ToMarkdownOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, tags: TagRegistry) -> Self {
        self.tags = tags;
        self
    }

    pub fn preserve_newlines(mut self, preserve: bool) -> Self {
        self.preserve_newlines = preserve;
        self
    }

    pub fn escape_markdown_characters(mut self, escape: bool) -> Self {
        self.escape_markdown_characters = escape;
        self
    }
}

/// Options for [`to_document`](crate::to_document).
///
/// Map keys are token kinds (`paragraph_open`, `fence`, `link_open`, ...) for `blocks`,
/// `entities` and `styles`, and HTML tag names for the two HTML plugin maps.
#[derive(Clone, Default)]
pub struct ToDocumentOptions {
    pub blocks: HashMap<String, SharedBlockBuilder>,
    pub entities: HashMap<String, SharedEntityBuilder>,
    /// Token kind to inline style name.
    pub styles: HashMap<String, String>,
    pub plugins: Vec<SharedTokenizerPlugin>,
    pub html_block_plugins: HashMap<String, SharedHtmlBlockPlugin>,
    pub html_style_plugins: HashMap<String, SharedHtmlStylePlugin>,
    /// Replaces the default comrak tokenizer.
    pub tokenizer: Option<SharedTokenizer>,
    /// Turn runs of blank lines into empty blocks.
    pub preserve_newlines: bool,
}

impl ToDocumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block<B: BlockBuilder + 'static>(mut self, kind: &str, builder: B) -> Self {
        self.blocks.insert(kind.to_string(), Arc::new(builder));
        self
    }

    pub fn with_entity<E: EntityBuilder + 'static>(mut self, kind: &str, builder: E) -> Self {
        self.entities.insert(kind.to_string(), Arc::new(builder));
        self
    }

    pub fn with_style(mut self, kind: &str, style: &str) -> Self {
        self.styles.insert(kind.to_string(), style.to_string());
        self
    }

    pub fn with_plugin<P: TokenizerPlugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn with_html_block_plugin<P: HtmlBlockPlugin + 'static>(mut self, tag: &str, plugin: P) -> Self {
        self.html_block_plugins.insert(tag.to_string(), Arc::new(plugin));
        self
    }

    pub fn with_html_style_plugin<P: HtmlStylePlugin + 'static>(mut self, tag: &str, plugin: P) -> Self {
        self.html_style_plugins.insert(tag.to_string(), Arc::new(plugin));
        self
    }

    pub fn with_tokenizer<T: Tokenizer + 'static>(mut self, tokenizer: T) -> Self {
        self.tokenizer = Some(Arc::new(tokenizer));
        self
    }

    pub fn preserve_newlines(mut self, preserve: bool) -> Self {
        self.preserve_newlines = preserve;
        self
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

impl fmt::Debug for ToDocumentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("ToDocumentOptions")
            .field("blocks", &sorted_keys(&self.blocks))
            .field("entities", &sorted_keys(&self.entities))
            .field("styles", &self.styles)
            .field("plugins", &plugins)
            .field("html_block_plugins", &sorted_keys(&self.html_block_plugins))
            .field("html_style_plugins", &sorted_keys(&self.html_style_plugins))
            .field("tokenizer", &self.tokenizer.as_ref().map(|t| t.name()))
            .field("preserve_newlines", &self.preserve_newlines)
            .finish()
    }
}
