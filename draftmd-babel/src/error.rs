//! Error types for format operations
//!
//! Conversions between a document and Markdown never fail. Errors only come from the
//! edges: looking a format up, or decoding and encoding the JSON wire schema.

use std::fmt;

/// Errors that can occur during format operations
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// No format registered under this name
    FormatNotFound(String),
    /// Source text could not be decoded into a document
    ParseError(String),
    /// Document could not be encoded
    SerializationError(String),
    /// The format lacks the requested direction
    NotSupported(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::FormatNotFound(name) => write!(f, "Format '{name}' not found"),
            FormatError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            FormatError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            FormatError::NotSupported(msg) => write!(f, "Operation not supported: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}
