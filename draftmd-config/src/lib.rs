//! Shared configuration loader for the draftmd toolchain.
//!
//! `defaults/draftmd.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user files and overrides on top
//! of those defaults via [`Loader`] before deserializing into [`DraftConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use draftmd_babel::formats::markdown::tokenizer::ComrakTokenizer;
use draftmd_babel::{ToDocumentOptions, ToMarkdownOptions};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/draftmd.default.toml");

/// File picked up from the working directory when present.
pub const LOCAL_CONFIG_FILE: &str = "draftmd.toml";

/// Top-level configuration consumed by draftmd applications.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
    pub render: RenderConfig,
    pub parse: ParseConfig,
    pub json: JsonConfig,
}

/// Knobs for document to Markdown conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub escape_markdown_characters: bool,
    pub preserve_newlines: bool,
}

impl From<&RenderConfig> for ToMarkdownOptions {
    fn from(config: &RenderConfig) -> Self {
        ToMarkdownOptions::new()
            .escape_markdown_characters(config.escape_markdown_characters)
            .preserve_newlines(config.preserve_newlines)
    }
}

/// Knobs for Markdown to document conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseConfig {
    pub preserve_newlines: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub underline: bool,
    pub subscript: bool,
}

impl From<&ParseConfig> for ToDocumentOptions {
    fn from(config: &ParseConfig) -> Self {
        ToDocumentOptions::new()
            .preserve_newlines(config.preserve_newlines)
            .with_tokenizer(ComrakTokenizer {
                strikethrough: config.strikethrough,
                superscript: config.superscript,
                underline: config.underline,
                subscript: config.subscript,
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonConfig {
    pub pretty: bool,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `render.preserve_newlines`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<DraftConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<DraftConfig, ConfigError> {
    Loader::new().build()
}
