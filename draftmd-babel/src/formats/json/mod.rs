//! JSON format implementation
//!
//! Reads and writes the raw draft wire schema (`blocks` + `entityMap`) through the serde
//! derives on [`Document`]. Missing optional fields take their defaults on parse, so
//! hand-written or trimmed documents are accepted.

use crate::error::FormatError;
use crate::format::Format;
use crate::ir::nodes::Document;

/// Format implementation for the JSON document schema
#[derive(Debug, Clone)]
pub struct JsonFormat {
    /// Indent the output instead of emitting one line.
    pub pretty: bool,
}

impl Default for JsonFormat {
    fn default() -> Self {
        JsonFormat { pretty: true }
    }
}

impl JsonFormat {
    pub fn new(pretty: bool) -> Self {
        JsonFormat { pretty }
    }
}

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Raw draft document JSON (blocks and entityMap)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Document, FormatError> {
        serde_json::from_str(source).map_err(|e| FormatError::ParseError(e.to_string()))
    }

    fn serialize(&self, doc: &Document) -> Result<String, FormatError> {
        let result = if self.pretty {
            serde_json::to_string_pretty(doc)
        } else {
            serde_json::to_string(doc)
        };
        result.map_err(|e| FormatError::SerializationError(e.to_string()))
    }
}
