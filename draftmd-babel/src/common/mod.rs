//! The format-agnostic conversion core shared by the Markdown serializer.
//!
//! - [`escape`] plans backslash escapes for a block's text.
//! - [`render`] turns one block and its overlapping ranges into nested Markdown.
//! - [`compose`] sequences blocks: skipping, list numbering and separators.

pub(crate) mod compose;
pub(crate) mod escape;
pub(crate) mod render;
