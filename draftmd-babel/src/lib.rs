//! Conversion between flat annotated documents and Markdown
//!
//!     A draft document is a list of blocks, each holding plain text plus style and entity
//!     ranges that may overlap freely. Markdown is a nested syntax. This crate converts in
//!     both directions:
//!
//!         - [`to_markdown`]: document → Markdown, repairing overlaps into valid nesting.
//!         - [`to_document`]: Markdown → document, flattening nested syntax back into ranges.
//!
//!     Both directions are total: unknown names pass through as plain text, malformed
//!     input degrades instead of failing. Errors only exist at the edges (format lookup,
//!     JSON decoding), see [`FormatError`].
//!
//!     This is a pure lib: no I/O, no env vars, no printing. It powers draftmd-cli but
//!     supposes no shell environment.
//!
//! Architecture
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── options.rs              # Per-call options for both directions
//!     ├── ir
//!     │   ├── nodes.rs            # Document, Block, ranges, entities
//!     │   └── tokens.rs           # Flat token stream consumed by the reverse parser
//!     ├── tags                    # Forward handlers (TagHandler, Tag, FnTag, TagRegistry)
//!     ├── common
//!     │   ├── render.rs           # One block → Markdown, nesting repair
//!     │   ├── escape.rs           # Which characters need a backslash
//!     │   └── compose.rs          # Blocks → document, separators and list numbering
//!     └── formats
//!         ├── markdown            # tokenizer, builders, html plugins, parser, serializer
//!         └── json                # The raw wire schema via serde
//!
//! Core Algorithms
//!
//!     Forward: every range of a block becomes an open/close pair of handler output. Ranges
//!     are opened in order on a single stack. When a range must close while ranges opened
//!     after it are still open, those are closed first and reopened right after. Openings
//!     are deferred until the next non-space character, and closings are moved before any
//!     trailing whitespace, so `**Bold **` never comes out.
//!
//!     Reverse: the Markdown is tokenized into a flat markdown-it style stream. Block
//!     openers pick a builder by token kind; inline tokens are resolved against the block
//!     text with a history of open entries, turning every open/close pair into a range.
//!
//! Extending
//!
//!     Both directions are extended through options rather than global state:
//!     [`TagRegistry`] handlers (or a resolver closure) for export; block, entity and style
//!     builders, tokenizer plugins and HTML plugins for import. Built-ins are merged
//!     underneath the caller's additions for every call.
//!
//! Testing
//!     tests
//!     ├── lib.rs
//!     ├── json.rs
//!     ├── roundtrip.rs
//!     └── markdown
//!         ├── mod.rs
//!         ├── export.rs
//!         ├── import.rs
//!         └── idempotency.rs
//!
//!     Note that rust does not by default discover tests in subdirectories, so we need to include these
//!     in the mod.

pub mod common;
pub mod error;
pub mod format;
pub mod formats;
pub mod ir;
pub mod options;
pub mod registry;
pub mod tags;

pub use error::FormatError;
pub use format::Format;
pub use formats::markdown::parser::to_document;
pub use formats::markdown::serializer::to_markdown;
pub use ir::nodes::{
    Block, Document, Entity, EntityMap, EntityRange, ListKind, Mutability, StyleRange,
    MAX_LIST_DEPTH,
};
pub use options::{ToDocumentOptions, ToMarkdownOptions};
pub use registry::FormatRegistry;
pub use tags::{FnTag, Tag, TagContext, TagHandler, TagKind, TagRegistry};
