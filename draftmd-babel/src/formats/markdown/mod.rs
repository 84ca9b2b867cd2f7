//! Markdown format implementation
//!
//! Bidirectional conversion between the flat document and CommonMark Markdown.
//!
//! # Library Choice
//!
//! Import uses the `comrak` crate, flattened into a markdown-it style token stream by
//! [`tokenizer::ComrakTokenizer`]. The stream is the seam for extensions: tokenizer
//! plugins rewrite it, and builders are looked up by token kind. Export does not go
//! through comrak; overlapping ranges have no comrak AST equivalent, so blocks are
//! rendered directly (see [`crate::common`]).
//!
//! # Element Mapping Table
//!
//! | Block type / style / entity | Markdown                   | Import token(s)                  |
//! |-----------------------------|----------------------------|----------------------------------|
//! | unstyled                    | paragraph                  | paragraph_open                   |
//! | header-one … header-six     | `#` … `######`             | heading_open (level)             |
//! | blockquote                  | `> ` (also after newlines) | blockquote_open                  |
//! | unordered-list-item         | `- `, 4 spaces per depth   | bullet_list_open + list_item_open|
//! | ordered-list-item           | `N. `, 4 spaces per depth  | ordered_list_open + list_item_open|
//! | code-block                  | fenced, `data.language`    | fence, code_block                |
//! | atomic                      | (entity output only)       | paragraph with a lone image      |
//! | BOLD                        | `**`                       | strong_open                      |
//! | ITALIC                      | `_`                        | em_open                          |
//! | STRIKETHROUGH               | `~~`                       | del_open                         |
//! | CODE                        | `` ` `` (never escaped)    | code                             |
//! | SUPERSCRIPT                 | `^`                        | sup_open                         |
//! | SUBSCRIPT                   | `~`                        | sub_open                         |
//! | UNDERLINE                   | `++`                       | ins_open                         |
//! | LINK                        | `[text](url "title")`      | link_open                        |
//! | IMAGE / image               | `![alt](src "title")`      | image                            |
//!
//! # Lossy Conversions
//!
//! - Paragraphs inside a blockquote are joined with a single newline.
//! - Thematic breaks and HTML blocks are dropped on import.
//! - Nested blockquotes collapse into the outermost one.
//! - Blank lines are only kept with `preserve_newlines`, and not inside blockquotes.

pub mod builders;
pub mod html;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

use crate::error::FormatError;
use crate::format::Format;
use crate::ir::nodes::Document;
use crate::options::{ToDocumentOptions, ToMarkdownOptions};

/// Format implementation for Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownFormat {
    pub parse_options: ToDocumentOptions,
    pub render_options: ToMarkdownOptions,
}

impl MarkdownFormat {
    pub fn new(parse_options: ToDocumentOptions, render_options: ToMarkdownOptions) -> Self {
        MarkdownFormat {
            parse_options,
            render_options,
        }
    }
}

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "CommonMark Markdown format"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        Ok(parser::to_document(source, &self.parse_options))
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        Ok(serializer::to_markdown(doc, &self.render_options))
    }
}
