//! Inline HTML support for Markdown import.
//!
//! Inline HTML tags arrive as `htmltag` tokens carrying the raw tag source. They are
//! parsed into a name and attributes and handed to plugins registered by tag name:
//!
//! - block plugins produce content plus an entity covering it (`<mention id="1"/>`);
//! - style plugins map an opening tag to any number of inline styles that stay open
//!   until the matching closing tag (`<span style="color: red">…</span>`).

use crate::ir::nodes::Entity;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub type HtmlAttrs = BTreeMap<String, String>;
pub type SharedHtmlBlockPlugin = Arc<dyn HtmlBlockPlugin>;
pub type SharedHtmlStylePlugin = Arc<dyn HtmlStylePlugin>;

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<\s*(/)?\s*([A-Za-z][A-Za-z0-9:-]*)((?s:.*?))(/)?\s*>$").expect("valid tag regex")
});

static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid attribute regex")
});

/// A parsed inline HTML tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTag {
    /// Lowercased tag name.
    pub name: String,
    pub closing: bool,
    pub self_closing: bool,
    pub attrs: HtmlAttrs,
}

/// Parses a single opening, closing or self-closing tag. Comments, declarations and
/// anything else return `None`.
pub fn parse_tag(source: &str) -> Option<HtmlTag> {
    let captures = TAG.captures(source.trim())?;
    let name = captures.get(2)?.as_str().to_ascii_lowercase();
    let attrs = captures
        .get(3)
        .map(|body| {
            ATTR.captures_iter(body.as_str())
                .filter_map(|attr| {
                    let key = attr.get(1)?.as_str().to_ascii_lowercase();
                    let value = attr
                        .get(2)
                        .or_else(|| attr.get(3))
                        .or_else(|| attr.get(4))
                        .map_or("", |m| m.as_str());
                    Some((key, value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    Some(HtmlTag {
        name,
        closing: captures.get(1).is_some(),
        self_closing: captures.get(4).is_some(),
        attrs,
    })
}

/// Content and entity produced by an HTML block plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlBlock {
    /// Text inserted into the block; the entity range covers it.
    pub content: String,
    pub entity: Entity,
}

/// Turns an inline HTML tag into text covered by an entity.
pub trait HtmlBlockPlugin: Send + Sync {
    fn build(&self, attrs: &HtmlAttrs) -> HtmlBlock;
}

impl<F> HtmlBlockPlugin for F
where
    F: Fn(&HtmlAttrs) -> HtmlBlock + Send + Sync,
{
    fn build(&self, attrs: &HtmlAttrs) -> HtmlBlock {
        self(attrs)
    }
}

/// Turns an opening HTML tag into inline style names.
pub trait HtmlStylePlugin: Send + Sync {
    fn styles(&self, attrs: &HtmlAttrs) -> Vec<String>;
}

impl<F> HtmlStylePlugin for F
where
    F: Fn(&HtmlAttrs) -> Vec<String> + Send + Sync,
{
    fn styles(&self, attrs: &HtmlAttrs) -> Vec<String> {
        self(attrs)
    }
}

/// Maps `style="color: x; background-color: y"` to `color-x` and `background-color-y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanStyles;

impl HtmlStylePlugin for SpanStyles {
    fn styles(&self, attrs: &HtmlAttrs) -> Vec<String> {
        let Some(style) = attrs.get("style") else {
            return Vec::new();
        };
        style
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'))
            .map(|(property, value)| (property.trim(), value.trim()))
            .filter(|(property, value)| {
                matches!(*property, "color" | "background-color") && !value.is_empty()
            })
            .map(|(property, value)| format!("{property}-{value}"))
            .collect()
    }
}

pub fn default_html_style_plugins() -> HashMap<String, SharedHtmlStylePlugin> {
    HashMap::from([("span".to_string(), Arc::new(SpanStyles) as SharedHtmlStylePlugin)])
}
