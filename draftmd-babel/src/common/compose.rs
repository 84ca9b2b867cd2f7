//! Sequences rendered blocks into one Markdown document.
//!
//! The composer owns everything that depends on more than one block:
//!
//! - skipping empty blocks (editors emit them for blank lines) unless newlines are
//!   preserved;
//! - numbering ordered list items, with one counter per depth;
//! - choosing the separator between two consecutive blocks so that list items stay
//!   together and everything else is split into paragraphs.

use super::render::{render_block, RenderContext};
use crate::ir::nodes::{Block, Document, ListKind};
use crate::tags::registry::TagLookup;
use crate::tags::TagRegistry;

/// Renders every block of `document` with the handlers in `tags`.
pub(crate) fn compose(
    document: &Document,
    tags: &TagRegistry,
    preserve_newlines: bool,
    escape: bool,
) -> String {
    let mut lookup = TagLookup::new(tags);
    let mut cx = RenderContext {
        entity_map: &document.entity_map,
        tags: &mut lookup,
        escape,
    };
    let mut numbering = ListNumbering::default();
    let mut previous: Option<&Block> = None;
    let mut out = String::new();

    for block in &document.blocks {
        if block.is_empty() && !preserve_newlines {
            tracing::debug!(key = %block.key, block_type = %block.block_type, "skipping empty block");
            continue;
        }
        let ordinal = numbering.next(block);
        if let Some(previous) = previous {
            out.push_str(separator(previous, block, preserve_newlines));
        }
        out.push_str(&render_block(block, ordinal, &mut cx));
        previous = Some(block);
    }

    out
}

/// Running ordered-list counters, one per depth.
#[derive(Debug, Default)]
struct ListNumbering {
    counters: Vec<usize>,
}

impl ListNumbering {
    /// Advances the counters for `block` and returns its ordinal (0 unless ordered).
    fn next(&mut self, block: &Block) -> usize {
        let depth = block.list_depth();
        match block.list_kind() {
            Some(ListKind::Ordered) => {
                self.counters.resize(depth + 1, 0);
                self.counters[depth] += 1;
                self.counters[depth]
            }
            Some(ListKind::Unordered) => {
                self.counters.truncate(depth);
                0
            }
            None => {
                self.counters.clear();
                0
            }
        }
    }
}

fn separator(previous: &Block, next: &Block, preserve_newlines: bool) -> &'static str {
    match (previous.list_kind(), next.list_kind()) {
        (Some(a), Some(b)) if a == b || previous.list_depth() != next.list_depth() => "\n",
        (Some(_), _) => "\n\n",
        _ if preserve_newlines => "\n",
        _ => "\n\n",
    }
}
