//! Markdown import (Markdown → flat document)
//!
//! Pipeline: Markdown string → tokenizer → token stream → blocks with flat ranges.
//!
//! # The Algorithm
//!
//! The token stream is walked once, front to back:
//!
//! 1. **List context.** `bullet_list_open` / `ordered_list_open` push their kind on a
//!    stack and `_close` pops it. A generic `list_item_open` is renamed after the
//!    innermost kind (`unordered_list_item_open` / `ordered_list_item_open`) and its
//!    depth is the stack height minus one.
//! 2. **Blocks.** Tokens at level 0, and list items at any level, create a block when a
//!    block builder is registered for their kind. Everything else that is not an
//!    `inline` token is dropped.
//! 3. **Inline content.** An `inline` token is resolved into text plus ranges (see
//!    [`resolve_inline`]) and attached to the most recent block. A second attachment to
//!    the same block (e.g. the second paragraph of a blockquote) is appended after a
//!    newline. An inline made of a single child with a block builder (a lone image)
//!    also replaces the block's type and text.
//! 4. **Blank lines.** With `preserve_newlines`, each run of blank lines between
//!    top-level blocks becomes that many empty `unstyled` blocks, minus the one blank
//!    line the Markdown serializer always puts after a list.
//!
//! Inline resolution keeps a history of open ranges keyed by their opening token kind.
//! `X_close` finalizes the most recent entry opened by `X_open`; unmatched closes are
//! ignored and entries still open at the end run to the end of the content.

use super::builders::{
    default_block_builders, default_entity_builders, default_styles, SharedBlockBuilder,
    SharedEntityBuilder,
};
use super::html::{self, default_html_style_plugins, SharedHtmlBlockPlugin, SharedHtmlStylePlugin};
use super::tokenizer::{ComrakTokenizer, Tokenizer};
use crate::ir::nodes::{
    Block, Document, Entity, EntityKey, EntityMap, EntityRange, ListKind, StyleRange,
};
use crate::ir::tokens::{Nesting, Token};
use crate::options::ToDocumentOptions;
use std::collections::HashMap;

/// Parse Markdown into a flat document.
///
/// Never fails: unknown tokens are dropped and empty input yields a single empty
/// `unstyled` block.
pub fn to_document(source: &str, options: &ToDocumentOptions) -> Document {
    let default_tokenizer = ComrakTokenizer::default();
    let tokenizer: &dyn Tokenizer = options.tokenizer.as_deref().unwrap_or(&default_tokenizer);

    let mut tokens = tokenizer.tokenize(source, &options.plugins);
    for plugin in &options.plugins {
        tracing::trace!(plugin = plugin.name(), "rewriting token stream");
        plugin.rewrite(&mut tokens);
    }

    let handlers = Handlers::merged(options);
    let mut state = ParseState::default();
    let blocks = build_blocks(&tokens, &handlers, &mut state, options.preserve_newlines);

    Document {
        blocks,
        entity_map: state.entity_map,
    }
}

/// Builders and plugins for one call: the caller's entries over the defaults.
struct Handlers {
    blocks: HashMap<String, SharedBlockBuilder>,
    entities: HashMap<String, SharedEntityBuilder>,
    styles: HashMap<String, String>,
    html_blocks: HashMap<String, SharedHtmlBlockPlugin>,
    html_styles: HashMap<String, SharedHtmlStylePlugin>,
}

impl Handlers {
    fn merged(options: &ToDocumentOptions) -> Self {
        fn layer<V: Clone>(
            mut base: HashMap<String, V>,
            overrides: &HashMap<String, V>,
        ) -> HashMap<String, V> {
            base.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
            base
        }

        Handlers {
            blocks: layer(default_block_builders(), &options.blocks),
            entities: layer(default_entity_builders(), &options.entities),
            styles: layer(default_styles(), &options.styles),
            html_blocks: options.html_block_plugins.clone(),
            html_styles: layer(default_html_style_plugins(), &options.html_style_plugins),
        }
    }
}

/// Mutable state owned by a single parse call.
#[derive(Debug, Default)]
struct ParseState {
    next_entity_key: EntityKey,
    entity_map: EntityMap,
}

impl ParseState {
    fn register(&mut self, entity: Entity) -> EntityKey {
        let key = self.next_entity_key;
        self.next_entity_key += 1;
        self.entity_map.insert(key, entity);
        key
    }
}

fn build_blocks(
    tokens: &[Token],
    handlers: &Handlers,
    state: &mut ParseState,
    preserve_newlines: bool,
) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut lists: Vec<ListKind> = Vec::new();
    let mut blank_lines = BlankLines::default();
    // whether the last block already received inline content
    let mut attached = false;

    for token in tokens {
        match token.kind.as_str() {
            "bullet_list_open" => lists.push(ListKind::Unordered),
            "ordered_list_open" => lists.push(ListKind::Ordered),
            "bullet_list_close" | "ordered_list_close" => {
                lists.pop();
            }
            _ => {}
        }

        if preserve_newlines && token.level == 0 && token.nesting() != Nesting::Close {
            for _ in 0..blank_lines.empty_blocks_before(token) {
                blocks.push(Block::unstyled(""));
                attached = false;
            }
        }
        blank_lines.track(token);

        if token.kind == "inline" {
            let resolved = resolve_inline(&token.children, handlers, state);
            match blocks.last_mut() {
                Some(block) => {
                    attach(block, resolved, attached, &token.children, handlers);
                    attached = true;
                }
                None => tracing::debug!("inline content before any block, dropping"),
            }
            continue;
        }

        let list_item = token.kind == "list_item_open";
        let kind = match (list_item, lists.last()) {
            (true, Some(ListKind::Ordered)) => "ordered_list_item_open",
            (true, _) => "unordered_list_item_open",
            (false, _) => token.kind.as_str(),
        };

        if token.nesting() == Nesting::Close || (token.level != 0 && !list_item) {
            continue;
        }
        match handlers.blocks.get(kind) {
            Some(builder) => {
                let mut block = builder.build(token);
                if list_item {
                    block.depth = lists.len().saturating_sub(1);
                }
                blocks.push(block);
                attached = false;
            }
            None => tracing::trace!(kind, "no block builder, dropping token"),
        }
    }

    if blocks.is_empty() {
        blocks.push(Block::unstyled(""));
    }
    for (index, block) in blocks.iter_mut().enumerate() {
        if block.key.is_empty() {
            block.key = format!("b{index}");
        }
    }
    blocks
}

/// Text and ranges of one `inline` token.
#[derive(Debug, Default)]
struct Resolved {
    text: String,
    len: usize,
    styles: Vec<StyleRange>,
    entities: Vec<EntityRange>,
}

impl Resolved {
    fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
        self.len += text.chars().count();
    }
}

/// Ranges opened by one token, waiting for their close.
struct OpenEntry {
    tag: String,
    styles: Vec<usize>,
    entities: Vec<usize>,
}

fn resolve_inline(children: &[Token], handlers: &Handlers, state: &mut ParseState) -> Resolved {
    let mut out = Resolved::default();
    let mut history: Vec<OpenEntry> = Vec::new();

    for child in children {
        let kind = child.kind.as_str();
        let self_closing = child.nesting() == Nesting::SelfClosing;

        if kind == "text" {
            out.push_str(&child.content);
        } else if kind == "softbreak" || kind == "hardbreak" {
            out.push_str("\n");
        } else if let Some(style) = handlers.styles.get(kind) {
            let offset = out.len;
            if self_closing {
                out.push_str(&child.content);
                out.styles.push(StyleRange::new(offset, out.len - offset, style.clone()));
            } else {
                out.styles.push(StyleRange::new(offset, 0, style.clone()));
                history.push(OpenEntry {
                    tag: kind.to_string(),
                    styles: vec![out.styles.len() - 1],
                    entities: Vec::new(),
                });
            }
        } else if let Some(builder) = handlers.entities.get(kind) {
            let key = state.register(builder.build(child));
            let offset = out.len;
            out.entities.push(EntityRange {
                offset,
                length: 1,
                key,
            });
            if self_closing {
                out.push_str(" ");
            } else {
                history.push(OpenEntry {
                    tag: kind.to_string(),
                    styles: Vec::new(),
                    entities: vec![out.entities.len() - 1],
                });
            }
        } else if kind == "htmltag" {
            resolve_html(child, handlers, state, &mut out, &mut history);
        } else if let Some(open_kind) = child.opening_kind() {
            close_entry(&open_kind, &mut out, &mut history);
        } else {
            tracing::trace!(kind, "no inline handler, dropping token");
        }
    }

    let end = out.len;
    for entry in history {
        finalize(&entry, end, &mut out);
    }
    out
}

fn resolve_html(
    token: &Token,
    handlers: &Handlers,
    state: &mut ParseState,
    out: &mut Resolved,
    history: &mut Vec<OpenEntry>,
) {
    let Some(tag) = html::parse_tag(&token.content) else {
        tracing::trace!(html = %token.content, "unparseable inline html");
        return;
    };

    if tag.closing {
        close_entry(&tag.name, out, history);
    } else if let Some(plugin) = handlers.html_blocks.get(&tag.name) {
        let block = plugin.build(&tag.attrs);
        let key = state.register(block.entity);
        let offset = out.len;
        out.push_str(&block.content);
        out.entities.push(EntityRange {
            offset,
            length: out.len - offset,
            key,
        });
    } else if let Some(plugin) = handlers.html_styles.get(&tag.name) {
        if tag.self_closing {
            return;
        }
        // an entry is pushed even without styles so its closing tag has a match
        let styles = plugin.styles(&tag.attrs);
        let first = out.styles.len();
        let offset = out.len;
        out.styles
            .extend(styles.into_iter().map(|style| StyleRange::new(offset, 0, style)));
        history.push(OpenEntry {
            tag: tag.name,
            styles: (first..out.styles.len()).collect(),
            entities: Vec::new(),
        });
    } else {
        tracing::trace!(tag = %tag.name, "no html plugin, dropping tag");
    }
}

/// Finalizes the most recent history entry opened by `tag`.
fn close_entry(tag: &str, out: &mut Resolved, history: &mut Vec<OpenEntry>) {
    match history.iter().rposition(|entry| entry.tag == tag) {
        Some(index) => {
            let entry = history.remove(index);
            let end = out.len;
            finalize(&entry, end, out);
        }
        None => tracing::trace!(tag, "close without a matching open, ignoring"),
    }
}

fn finalize(entry: &OpenEntry, end: usize, out: &mut Resolved) {
    for &index in &entry.styles {
        let range = &mut out.styles[index];
        range.length = end - range.offset;
    }
    for &index in &entry.entities {
        let range = &mut out.entities[index];
        range.length = end - range.offset;
    }
}

fn attach(block: &mut Block, resolved: Resolved, appended: bool, children: &[Token], handlers: &Handlers) {
    if appended {
        let shift = block.char_len() + 1;
        block.text.push('\n');
        block.text.push_str(&resolved.text);
        block.inline_style_ranges.extend(resolved.styles.into_iter().map(|mut range| {
            range.offset += shift;
            range
        }));
        block.entity_ranges.extend(resolved.entities.into_iter().map(|mut range| {
            range.offset += shift;
            range
        }));
        return;
    }

    block.text = resolved.text;
    block.inline_style_ranges = resolved.styles;
    block.entity_ranges = resolved.entities;

    if let [only] = children {
        if let Some(builder) = handlers.blocks.get(&only.kind) {
            let replacement = builder.build(only);
            block.block_type = replacement.block_type;
            block.text = replacement.text;
            block.data.extend(replacement.data);
        }
    }
}

/// Tracks source lines to count blank lines between top-level blocks.
#[derive(Debug, Default)]
struct BlankLines {
    // last source line covered by content seen so far
    last_line: Option<usize>,
    after_list: bool,
}

impl BlankLines {
    fn empty_blocks_before(&self, token: &Token) -> usize {
        let Some((start, _)) = token.lines else {
            return 0;
        };
        match self.last_line {
            None => start.saturating_sub(1),
            Some(last) => {
                let blank = start.saturating_sub(last + 1);
                blank.saturating_sub(usize::from(self.after_list))
            }
        }
    }

    fn track(&mut self, token: &Token) {
        if let Some((start, end)) = token.lines {
            // containers can claim trailing blank lines; only their first line counts
            let reach = if token.nesting() == Nesting::Open && !is_leaf_open(&token.kind) {
                start
            } else {
                end
            };
            self.last_line = Some(self.last_line.map_or(reach, |last| last.max(reach)));
        }
        if token.level == 0 && token.nesting() != Nesting::Close {
            self.after_list = matches!(token.kind.as_str(), "bullet_list_open" | "ordered_list_open");
        }
    }
}

fn is_leaf_open(kind: &str) -> bool {
    matches!(kind, "paragraph_open" | "heading_open")
}
