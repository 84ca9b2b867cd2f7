//! Intermediate representation shared by every format.
//!
//! Two structures live here:
//!
//! - [`nodes`]: the flat annotated document (blocks with offset-addressed style and
//!   entity ranges). This is what callers build and what every format converts to/from.
//! - [`tokens`]: the flat, markdown-it style token stream that Markdown tokenizers produce
//!   and the reverse parser consumes. It decouples the parser from any single Markdown
//!   library.

pub mod nodes;
pub mod tokens;
