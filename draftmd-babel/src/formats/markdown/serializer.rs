//! Markdown export (flat document → Markdown)
//!
//! Pipeline: caller handlers merged over the defaults → per-block rendering
//! ([`crate::common::render`]) → block composition ([`crate::common::compose`]).

use crate::common::compose::compose;
use crate::ir::nodes::Document;
use crate::options::ToMarkdownOptions;
use crate::tags::TagRegistry;

/// Serialize a flat document to Markdown.
///
/// Never fails: names without a handler render as plain text and out-of-range offsets
/// are clamped to the block text.
pub fn to_markdown(document: &Document, options: &ToMarkdownOptions) -> String {
    let tags = TagRegistry::with_defaults().merged_with(&options.tags);
    compose(
        document,
        &tags,
        options.preserve_newlines,
        options.escape_markdown_characters,
    )
}
