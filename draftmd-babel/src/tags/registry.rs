//! Registry of tag handlers keyed by block type, style name and entity type.
//!
//! Callers hold a [`TagRegistry`] with their own handlers in
//! [`ToMarkdownOptions`](crate::options::ToMarkdownOptions). At render time it is layered
//! over the built-in defaults ([`TagRegistry::with_defaults`]): a user handler for a name
//! replaces the default for that name, names without any handler fall through to the
//! optional resolver, and anything still unresolved renders as plain text.

use super::{Tag, TagHandler, TagKind};
use crate::ir::nodes::{
    BLOCKQUOTE, CODE_BLOCK, HEADINGS, ORDERED_LIST_ITEM, UNORDERED_LIST_ITEM,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared handler reference stored in the registry.
pub type SharedTag = Arc<dyn TagHandler>;

/// Catch-all consulted for names without a registered handler.
pub type TagResolver = dyn Fn(TagKind, &str) -> Option<SharedTag> + Send + Sync;

static DEFAULT_TAGS: Lazy<TagRegistry> = Lazy::new(TagRegistry::build_defaults);

/// Handler tables for the three tag kinds plus an optional resolver.
#[derive(Clone, Default)]
pub struct TagRegistry {
    blocks: HashMap<String, SharedTag>,
    styles: HashMap<String, SharedTag>,
    entities: HashMap<String, SharedTag>,
    resolver: Option<Arc<TagResolver>>,
}

impl TagRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Markdown handlers.
    pub fn with_defaults() -> Self {
        DEFAULT_TAGS.clone()
    }

    fn build_defaults() -> Self {
        let mut registry = TagRegistry::new();

        registry.register(TagKind::Block, UNORDERED_LIST_ITEM, Tag::prefix("- "));
        registry.register(TagKind::Block, ORDERED_LIST_ITEM, Tag::OrderedItem);
        registry.register(TagKind::Block, BLOCKQUOTE, Tag::Blockquote);
        registry.register(TagKind::Block, CODE_BLOCK, Tag::CodeFence);
        let prefixes = ["# ", "## ", "### ", "#### ", "##### ", "###### "];
        for (name, prefix) in HEADINGS.into_iter().zip(prefixes) {
            registry.register(TagKind::Block, name, Tag::prefix(prefix));
        }

        registry.register(TagKind::Style, "BOLD", Tag::wrap("**"));
        registry.register(TagKind::Style, "ITALIC", Tag::wrap("_"));
        registry.register(TagKind::Style, "STRIKETHROUGH", Tag::wrap("~~"));
        registry.register(TagKind::Style, "CODE", Tag::verbatim("`"));
        registry.register(TagKind::Style, "SUPERSCRIPT", Tag::wrap("^"));
        registry.register(TagKind::Style, "SUBSCRIPT", Tag::wrap("~"));
        registry.register(TagKind::Style, "UNDERLINE", Tag::wrap("++"));

        registry.register(TagKind::Entity, "LINK", Tag::Link);
        registry.register(TagKind::Entity, "IMAGE", Tag::Image);
        registry.register(TagKind::Entity, "image", Tag::Image);

        registry
    }

    fn table(&self, kind: TagKind) -> &HashMap<String, SharedTag> {
        match kind {
            TagKind::Block => &self.blocks,
            TagKind::Style => &self.styles,
            TagKind::Entity => &self.entities,
        }
    }

    fn table_mut(&mut self, kind: TagKind) -> &mut HashMap<String, SharedTag> {
        match kind {
            TagKind::Block => &mut self.blocks,
            TagKind::Style => &mut self.styles,
            TagKind::Entity => &mut self.entities,
        }
    }

    /// Register a handler
    ///
    /// If a handler with the same kind and name already exists, it will be replaced.
    pub fn register<H: TagHandler + 'static>(&mut self, kind: TagKind, name: &str, handler: H) {
        self.register_shared(kind, name, Arc::new(handler));
    }

    pub fn register_shared(&mut self, kind: TagKind, name: &str, handler: SharedTag) {
        self.table_mut(kind).insert(name.to_string(), handler);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<H: TagHandler + 'static>(mut self, kind: TagKind, name: &str, handler: H) -> Self {
        self.register(kind, name, handler);
        self
    }

    /// Install the catch-all resolver, replacing any previous one.
    pub fn set_resolver<F>(&mut self, resolver: F)
    where
        F: Fn(TagKind, &str) -> Option<SharedTag> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
    }

    pub fn with_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(TagKind, &str) -> Option<SharedTag> + Send + Sync + 'static,
    {
        self.set_resolver(resolver);
        self
    }

    /// Name-keyed lookup (the resolver is not consulted).
    pub fn get(&self, kind: TagKind, name: &str) -> Option<&SharedTag> {
        self.table(kind).get(name)
    }

    pub fn has(&self, kind: TagKind, name: &str) -> bool {
        self.table(kind).contains_key(name)
    }

    /// Registered names of one kind (sorted)
    pub fn names(&self, kind: TagKind) -> Vec<String> {
        let mut names: Vec<_> = self.table(kind).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resolver(&self) -> Option<&Arc<TagResolver>> {
        self.resolver.as_ref()
    }

    /// A new registry with `overrides` layered on top of `self`.
    ///
    /// Handlers in `overrides` replace same-named ones here; its resolver, if any,
    /// replaces this one.
    pub fn merged_with(&self, overrides: &TagRegistry) -> TagRegistry {
        let mut merged = self.clone();
        for kind in [TagKind::Block, TagKind::Style, TagKind::Entity] {
            let table = merged.table_mut(kind);
            for (name, handler) in overrides.table(kind) {
                table.insert(name.clone(), Arc::clone(handler));
            }
        }
        if let Some(resolver) = &overrides.resolver {
            merged.resolver = Some(Arc::clone(resolver));
        }
        merged
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("blocks", &self.names(TagKind::Block))
            .field("styles", &self.names(TagKind::Style))
            .field("entities", &self.names(TagKind::Entity))
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Per-render view over a merged registry that memoizes resolver answers.
///
/// The resolver runs at most once per `(kind, name)` for the lifetime of the lookup,
/// including when it answers `None`.
pub(crate) struct TagLookup<'a> {
    registry: &'a TagRegistry,
    resolved: HashMap<(TagKind, String), Option<SharedTag>>,
}

impl<'a> TagLookup<'a> {
    pub(crate) fn new(registry: &'a TagRegistry) -> Self {
        TagLookup {
            registry,
            resolved: HashMap::new(),
        }
    }

    pub(crate) fn get(&mut self, kind: TagKind, name: &str) -> Option<SharedTag> {
        if let Some(handler) = self.registry.get(kind, name) {
            return Some(Arc::clone(handler));
        }
        let resolver = self.registry.resolver()?;
        self.resolved
            .entry((kind, name.to_string()))
            .or_insert_with(|| {
                let handler = resolver(kind, name);
                tracing::trace!(?kind, tag = name, found = handler.is_some(), "tag resolver");
                handler
            })
            .clone()
    }
}
