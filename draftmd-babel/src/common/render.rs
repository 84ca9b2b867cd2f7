//! Renders one block of the flat document as Markdown.
//!
//! # The High-Level Concept
//!
//! A block carries plain text plus ranges that may overlap arbitrarily: `[0,10)` italic
//! and `[5,14)` bold is perfectly valid in the flat model, but Markdown delimiters must
//! nest. The renderer walks the text one character at a time and keeps a single stack of
//! the ranges whose opening delimiter has been emitted (styles and entities share it,
//! outer to inner). When a range ends while something opened after it is still open, the
//! inner ranges are closed first, the target is closed, and the inner ones are opened
//! again:
//!
//! ```text
//! text:    Test Bold Text Test
//! ITALIC:  [0,10)
//! BOLD:    [5,14)
//! output:  _Test **Bold**_ **Text** Test
//! ```
//!
//! # Whitespace
//!
//! Emphasis delimiters are not recognized next to whitespace on the inside, so:
//!
//! - opens are deferred into a pending batch and only emitted right before the next
//!   character that is not a space (`Test **Bold` rather than `Test** Bold`);
//! - on every close, whitespace emitted at the end of the block body is moved after
//!   the closing delimiter (`**Bold Text** ` rather than `**Bold Text **`).
//!
//! A range that ends while it is still pending never emitted anything and is dropped.
//!
//! # The Algorithm
//!
//! For each index `i` in `0..=len`:
//!
//! 1. Close ranges ending at `i`, innermost first, repairing the nesting as above.
//!    Reopened ranges go to the front of the pending batch.
//! 2. Stop if `i == len`.
//! 3. Queue ranges starting at `i` (style ranges first, then entity ranges, each in input
//!    order).
//! 4. Flush the pending batch unless character `i` is a space that will be emitted.
//! 5. Emit character `i`: suppressed under an atomic range, backslash-escaped when the
//!    escape plan says so, followed by the block's line prefix when it is a newline.
//!
//! The block's own open/close output is placed around the body, after the list
//! indentation.

use super::escape;
use crate::ir::nodes::{Block, Entity, EntityMap};
use crate::tags::registry::{SharedTag, TagLookup};
use crate::tags::{TagContext, TagKind};
use std::collections::{HashSet, VecDeque};

/// Spaces of indentation per list depth.
pub(crate) const LIST_INDENT: usize = 4;

/// Inputs shared by every block of one render call.
pub(crate) struct RenderContext<'a, 'r> {
    pub entity_map: &'a EntityMap,
    pub tags: &'r mut TagLookup<'a>,
    pub escape: bool,
}

/// A style or entity range that has a handler, clamped to the block text.
struct Span<'a> {
    start: usize,
    end: usize,
    handler: SharedTag,
    entity: Option<&'a Entity>,
}

/// Renders `block`; `ordinal` is its number within an ordered list (0 otherwise).
pub(crate) fn render_block(block: &Block, ordinal: usize, cx: &mut RenderContext<'_, '_>) -> String {
    let chars: Vec<char> = block.text.chars().collect();
    let block_tag = cx.tags.get(TagKind::Block, &block.block_type);
    if block_tag.is_none() {
        tracing::trace!(block_type = %block.block_type, "no block handler, rendering as plain text");
    }
    let spans = collect_spans(block, chars.len(), cx);

    let block_verbatim = block_tag.as_ref().map_or(false, |tag| tag.is_verbatim());
    let mut verbatim = vec![block_verbatim; chars.len()];
    let mut atomic = vec![false; chars.len()];
    for span in &spans {
        if span.handler.is_verbatim() {
            verbatim[span.start..span.end].fill(true);
        }
        if span.handler.is_atomic() {
            atomic[span.start..span.end].fill(true);
        }
    }
    let escaped = if cx.escape && !block_verbatim {
        escape::plan(&chars, &verbatim)
    } else {
        vec![false; chars.len()]
    };

    let block_ctx = TagContext::for_block(block, ordinal);
    let line_prefix = block_tag
        .as_ref()
        .and_then(|tag| tag.line_prefix())
        .map(str::to_string);

    let mut body = Body::default();
    let mut stack: Vec<usize> = Vec::new();
    let mut pending: VecDeque<usize> = VecDeque::new();

    for i in 0..=chars.len() {
        // pending ranges ending here never produced output
        pending.retain(|&id| spans[id].end != i);

        let mut closing: Vec<usize> = stack
            .iter()
            .enumerate()
            .filter(|&(_, &id)| spans[id].end == i)
            .map(|(depth, _)| depth)
            .collect();
        closing.reverse();
        for depth in closing {
            let reopen = stack.split_off(depth + 1);
            for &id in reopen.iter().rev() {
                body.close(&span_close(&spans[id], block, ordinal));
            }
            if let Some(id) = stack.pop() {
                body.close(&span_close(&spans[id], block, ordinal));
            }
            for &id in reopen.iter().rev() {
                pending.push_front(id);
            }
        }

        let Some(&c) = chars.get(i) else {
            break;
        };

        pending.extend((0..spans.len()).filter(|&id| spans[id].start == i));

        if !pending.is_empty() && (!is_whitespace(c) || atomic[i]) {
            for id in pending.drain(..) {
                body.open(&span_open(&spans[id], block, ordinal));
                stack.push(id);
            }
        }

        if atomic[i] {
            continue;
        }
        body.push(c, escaped[i], line_prefix.as_deref());
    }

    // every span ends at or before the text length, so the stack is empty here
    debug_assert!(stack.is_empty());

    let indent = if block.list_kind().is_some() {
        " ".repeat(LIST_INDENT * block.list_depth())
    } else {
        String::new()
    };
    let (open, close) = match &block_tag {
        Some(tag) => (tag.open(&block_ctx), tag.close(&block_ctx)),
        None => (String::new(), String::new()),
    };
    format!("{indent}{open}{}{close}", body.text)
}

/// Resolves the block's ranges to handlers, clamping offsets and dropping ranges that
/// are empty, duplicated or unhandled.
fn collect_spans<'a>(block: &Block, len: usize, cx: &mut RenderContext<'a, '_>) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    let mut seen_styles = HashSet::new();
    let mut seen_entities = HashSet::new();

    for range in &block.inline_style_ranges {
        let start = range.offset.min(len);
        let end = range.offset.saturating_add(range.length).min(len);
        if start >= end || !seen_styles.insert((start, end, range.style.as_str())) {
            continue;
        }
        match cx.tags.get(TagKind::Style, &range.style) {
            Some(handler) => spans.push(Span {
                start,
                end,
                handler,
                entity: None,
            }),
            None => tracing::trace!(style = %range.style, "no style handler, passing text through"),
        }
    }

    for range in &block.entity_ranges {
        let start = range.offset.min(len);
        let end = range.offset.saturating_add(range.length).min(len);
        if start >= end || !seen_entities.insert((start, end, range.key)) {
            continue;
        }
        let Some(entity) = cx.entity_map.get(&range.key) else {
            tracing::debug!(key = range.key, "entity range references a missing entity");
            continue;
        };
        match cx.tags.get(TagKind::Entity, &entity.entity_type) {
            Some(handler) => spans.push(Span {
                start,
                end,
                handler,
                entity: Some(entity),
            }),
            None => tracing::trace!(entity_type = %entity.entity_type, "no entity handler, passing text through"),
        }
    }

    spans
}

fn span_context<'b>(span: &Span<'b>, block: &'b Block, ordinal: usize) -> TagContext<'b> {
    TagContext {
        block,
        entity: span.entity,
        ordinal,
    }
}

fn span_open(span: &Span<'_>, block: &Block, ordinal: usize) -> String {
    span.handler.open(&span_context(span, block, ordinal))
}

fn span_close(span: &Span<'_>, block: &Block, ordinal: usize) -> String {
    span.handler.close(&span_context(span, block, ordinal))
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Output buffer for the block body that knows where its trailing whitespace begins.
#[derive(Default)]
struct Body {
    text: String,
    // byte offset where the run of trailing whitespace (with line prefixes) starts
    trailing_ws: usize,
}

impl Body {
    fn push(&mut self, c: char, escaped: bool, line_prefix: Option<&str>) {
        if !is_whitespace(c) {
            if escaped {
                self.text.push('\\');
            }
            self.text.push(c);
            self.trailing_ws = self.text.len();
            return;
        }
        self.text.push(c);
        if c == '\n' {
            if let Some(prefix) = line_prefix {
                self.text.push_str(prefix);
            }
        }
    }

    fn open(&mut self, tag: &str) {
        self.text.push_str(tag);
        self.trailing_ws = self.text.len();
    }

    /// Emits a closing tag before any trailing whitespace.
    fn close(&mut self, tag: &str) {
        let whitespace = self.text.split_off(self.trailing_ws);
        self.text.push_str(tag);
        self.trailing_ws = self.text.len();
        self.text.push_str(&whitespace);
    }
}
