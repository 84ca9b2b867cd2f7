//! Format implementations
//!
//! Each format converts between the flat document and one text representation.

pub mod json;
pub mod markdown;

pub use json::JsonFormat;
pub use markdown::MarkdownFormat;
