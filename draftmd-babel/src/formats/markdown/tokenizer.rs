//! Markdown tokenizers: Markdown source → flat token stream.
//!
//! The reverse parser never looks at Markdown syntax itself; it consumes the
//! markdown-it style [`Token`] stream produced here. The default [`ComrakTokenizer`]
//! parses with comrak and flattens the AST:
//!
//! | comrak node      | tokens                                              |
//! |------------------|-----------------------------------------------------|
//! | Paragraph        | `paragraph_open`, `inline`, `paragraph_close`       |
//! | Heading          | `heading_open` (attr `level`), `inline`, ...        |
//! | BlockQuote       | `blockquote_open` ... `blockquote_close`            |
//! | List             | `bullet_list_open` / `ordered_list_open` ...        |
//! | Item             | `list_item_open` ... `list_item_close`              |
//! | CodeBlock        | `fence` (attr `params`) or `code_block`             |
//! | HtmlBlock        | `html_block`                                        |
//! | ThematicBreak    | `hr`                                                |
//!
//! Inline nodes become children of the `inline` token: `text`, `softbreak`,
//! `hardbreak`, `code`, `em_*`, `strong_*`, `sup_*`, `link_*`, `image` and `htmltag`.
//! Nodes without a mapping contribute their children. Backslash escapes become `text`
//! tokens with the `escaped` attribute.
//!
//! Tilde and plus delimiters are resolved after flattening, over the unescaped text of
//! each `inline` token: `++x++` becomes `ins_*`, `~x~` becomes `sub_*` and `~~x~~`
//! becomes `del_*`. A run opens when followed by non-whitespace and closes when
//! preceded by non-whitespace; it pairs with the nearest open run of the same character
//! and length inside the same parent and on the same line.

use crate::ir::tokens::{self, Token};
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, Options};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Attribute set on `text` tokens that came from a backslash escape.
pub const ESCAPED_ATTR: &str = "escaped";

pub type SharedTokenizer = Arc<dyn Tokenizer>;
pub type SharedTokenizerPlugin = Arc<dyn TokenizerPlugin>;

/// Turns Markdown source into tokens.
pub trait Tokenizer: Send + Sync {
    fn name(&self) -> &str;

    /// Tokenize `source`. Plugins are handed over so tokenizers can let them adjust
    /// parser settings; rewriting the resulting stream is done by the caller.
    fn tokenize(&self, source: &str, plugins: &[SharedTokenizerPlugin]) -> Vec<Token>;
}

/// Extends tokenization with custom syntax.
///
/// A plugin may tweak comrak's options before parsing and rewrite the token stream
/// afterwards, typically replacing runs of inline children with tokens of its own kind
/// (and registering builders for those kinds in the parse options).
pub trait TokenizerPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn configure(&self, _options: &mut Options<'_>) {}

    fn rewrite(&self, tokens: &mut Vec<Token>);
}

/// The default tokenizer, backed by comrak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComrakTokenizer {
    /// `~~text~~`
    pub strikethrough: bool,
    /// `^text^`
    pub superscript: bool,
    /// `++text++`
    pub underline: bool,
    /// `~text~`
    pub subscript: bool,
}

impl Default for ComrakTokenizer {
    fn default() -> Self {
        ComrakTokenizer {
            strikethrough: true,
            superscript: true,
            underline: true,
            subscript: true,
        }
    }
}

impl ComrakTokenizer {
    fn options(&self) -> Options<'static> {
        let mut options = Options::default();
        // tildes are resolved by `resolve_delimiters`; comrak would take `~x~` as
        // strikethrough
        options.extension.strikethrough = false;
        options.extension.superscript = self.superscript;
        options.render.escaped_char_spans = true;
        options
    }

    /// Token kind for a delimiter run, if the run is enabled syntax.
    fn delimiter_kind(&self, marker: char, len: usize) -> Option<&'static str> {
        match (marker, len) {
            ('+', 2) if self.underline => Some("ins"),
            ('~', 1) if self.subscript => Some("sub"),
            ('~', 2) if self.strikethrough => Some("del"),
            _ => None,
        }
    }
}

impl Tokenizer for ComrakTokenizer {
    fn name(&self) -> &str {
        "comrak"
    }

    fn tokenize(&self, source: &str, plugins: &[SharedTokenizerPlugin]) -> Vec<Token> {
        let arena = Arena::new();
        let mut options = self.options();
        for plugin in plugins {
            plugin.configure(&mut options);
        }
        let root = parse_document(&arena, source, &options);

        let mut tokens = Vec::new();
        for child in root.children() {
            push_block(child, 0, &mut tokens);
        }
        for token in tokens.iter_mut().filter(|t| t.kind == "inline") {
            let children = merge_text(std::mem::take(&mut token.children));
            token.children = resolve_delimiters(children, self);
        }
        tokens
    }
}

fn push_block<'a>(node: &'a AstNode<'a>, level: usize, tokens: &mut Vec<Token>) {
    let data = node.data.borrow();
    let lines = (data.sourcepos.start.line, data.sourcepos.end.line);
    let open = |name: &str| {
        let token = Token::new(format!("{name}_open"), level);
        token.with_lines(lines.0, lines.1)
    };

    match &data.value {
        NodeValue::Paragraph => push_leaf(node, open("paragraph"), "paragraph_close", tokens),
        NodeValue::Heading(heading) => {
            let token = open("heading").with_attr("level", heading.level.to_string());
            push_leaf(node, token, "heading_close", tokens);
        }
        NodeValue::BlockQuote => push_container(node, open("blockquote"), "blockquote_close", tokens),
        NodeValue::List(list) => match list.list_type {
            ListType::Bullet => {
                push_container(node, open("bullet_list"), "bullet_list_close", tokens)
            }
            ListType::Ordered => {
                let token = open("ordered_list").with_attr("start", list.start.to_string());
                push_container(node, token, "ordered_list_close", tokens);
            }
        },
        NodeValue::Item(_) => push_container(node, open("list_item"), "list_item_close", tokens),
        NodeValue::CodeBlock(code) => {
            let kind = if code.fenced { "fence" } else { "code_block" };
            let mut token = Token::new(kind, level)
                .with_content(code.literal.clone())
                .with_lines(lines.0, lines.1);
            if code.fenced {
                token = token.with_attr("params", code.info.clone());
            }
            tokens.push(token);
        }
        NodeValue::HtmlBlock(html) => tokens.push(
            Token::new("html_block", level)
                .with_content(html.literal.clone())
                .with_lines(lines.0, lines.1),
        ),
        NodeValue::ThematicBreak => tokens.push(Token::new("hr", level).with_lines(lines.0, lines.1)),
        _ => {
            tracing::trace!(node = ?data.value, "no token mapping, descending into children");
            for child in node.children() {
                push_block(child, level, tokens);
            }
        }
    }
}

fn push_container<'a>(node: &'a AstNode<'a>, open: Token, close: &str, tokens: &mut Vec<Token>) {
    let level = open.level;
    tokens.push(open);
    for child in node.children() {
        push_block(child, level + 1, tokens);
    }
    tokens.push(Token::new(close, level));
}

fn push_leaf<'a>(node: &'a AstNode<'a>, open: Token, close: &str, tokens: &mut Vec<Token>) {
    let level = open.level;
    let mut children = Vec::new();
    for child in node.children() {
        push_inline(child, &mut children);
    }
    tokens.push(open);
    tokens.push(Token::new("inline", level + 1).with_children(children));
    tokens.push(Token::new(close, level));
}

fn push_inline<'a>(node: &'a AstNode<'a>, out: &mut Vec<Token>) {
    let data = node.data.borrow();
    let wrap = |name: &str, out: &mut Vec<Token>| {
        out.push(Token::new(format!("{name}_open"), 0));
        for child in node.children() {
            push_inline(child, out);
        }
        out.push(Token::new(format!("{name}_close"), 0));
    };

    match &data.value {
        NodeValue::Text(text) => out.push(tokens::text(text.clone())),
        NodeValue::SoftBreak => out.push(Token::new("softbreak", 0)),
        NodeValue::LineBreak => out.push(Token::new("hardbreak", 0)),
        NodeValue::Code(code) => out.push(Token::new("code", 0).with_content(code.literal.clone())),
        NodeValue::HtmlInline(html) => out.push(Token::new("htmltag", 0).with_content(html.clone())),
        NodeValue::Escaped => {
            let mut literal = String::new();
            for child in node.children() {
                collect_text(child, &mut literal);
            }
            out.push(tokens::text(literal).with_attr(ESCAPED_ATTR, "true"));
        }
        NodeValue::Emph => wrap("em", out),
        NodeValue::Strong => wrap("strong", out),
        NodeValue::Strikethrough => wrap("del", out),
        NodeValue::Superscript => wrap("sup", out),
        NodeValue::Link(link) => {
            out.push(Token {
                kind: "link_open".to_string(),
                attrs: link_attrs("href", &link.url, &link.title),
                ..Token::default()
            });
            for child in node.children() {
                push_inline(child, out);
            }
            out.push(Token::new("link_close", 0));
        }
        NodeValue::Image(link) => {
            let mut attrs = link_attrs("src", &link.url, &link.title);
            let mut alt = String::new();
            for child in node.children() {
                collect_text(child, &mut alt);
            }
            if !alt.is_empty() {
                attrs.insert("alt".to_string(), alt);
            }
            out.push(Token {
                kind: "image".to_string(),
                attrs,
                ..Token::default()
            });
        }
        _ => {
            for child in node.children() {
                push_inline(child, out);
            }
        }
    }
}

fn link_attrs(target: &str, url: &str, title: &str) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    attrs.insert(target.to_string(), url.to_string());
    if !title.is_empty() {
        attrs.insert("title".to_string(), title.to_string());
    }
    attrs
}

fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => out.push_str(text),
        NodeValue::Code(code) => out.push_str(&code.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

fn is_plain_text(token: &Token) -> bool {
    token.kind == "text" && token.attr(ESCAPED_ATTR).is_none()
}

/// Joins neighbouring unescaped text tokens so delimiter runs are seen whole.
fn merge_text(children: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(children.len());
    for token in children {
        if let Some(last) = merged.last_mut() {
            if is_plain_text(last) && is_plain_text(&token) {
                last.content.push_str(&token.content);
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

/// A run of `+` or `~` inside a text token, positions in chars.
#[derive(Debug, Clone, Copy)]
struct Run {
    token: usize,
    start: usize,
    len: usize,
    marker: char,
    depth: usize,
}

/// Whether the character beside a token edge is whitespace. `None` past the ends of
/// the inline content; non-text tokens count as non-whitespace.
fn edge_is_whitespace(token: Option<&Token>, last: bool) -> Option<bool> {
    let token = token?;
    match token.kind.as_str() {
        "softbreak" | "hardbreak" => Some(true),
        "text" => {
            let c = if last {
                token.content.chars().next_back()
            } else {
                token.content.chars().next()
            };
            Some(c.map_or(false, char::is_whitespace))
        }
        _ => Some(false),
    }
}

fn resolve_delimiters(children: Vec<Token>, tokenizer: &ComrakTokenizer) -> Vec<Token> {
    let mut openers: Vec<Run> = Vec::new();
    // text token index -> (char start, len, token kind) of matched runs
    let mut marks: HashMap<usize, Vec<(usize, usize, String)>> = HashMap::new();
    let mut depth = 0usize;

    for (index, token) in children.iter().enumerate() {
        match token.kind.as_str() {
            "softbreak" | "hardbreak" => {
                openers.clear();
                continue;
            }
            _ if token.nesting() == tokens::Nesting::Open => {
                depth += 1;
                continue;
            }
            _ if token.nesting() == tokens::Nesting::Close => {
                depth = depth.saturating_sub(1);
                openers.retain(|run| run.depth <= depth);
                continue;
            }
            _ if !is_plain_text(token) => continue,
            _ => {}
        }

        let chars: Vec<char> = token.content.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let marker = chars[i];
            if marker != '+' && marker != '~' {
                i += 1;
                continue;
            }
            let start = i;
            while i < chars.len() && chars[i] == marker {
                i += 1;
            }
            let Some(kind) = tokenizer.delimiter_kind(marker, i - start) else {
                continue;
            };
            let run = Run {
                token: index,
                start,
                len: i - start,
                marker,
                depth,
            };

            let before = match start.checked_sub(1) {
                Some(p) => Some(chars[p].is_whitespace()),
                None => edge_is_whitespace(index.checked_sub(1).and_then(|p| children.get(p)), true),
            };
            let after = match chars.get(i) {
                Some(c) => Some(c.is_whitespace()),
                None => edge_is_whitespace(children.get(index + 1), false),
            };

            if before == Some(false) {
                let matching = openers.iter().rposition(|open| {
                    open.marker == run.marker && open.len == run.len && open.depth == run.depth
                });
                if let Some(pos) = matching {
                    let open = openers[pos];
                    openers.truncate(pos);
                    marks
                        .entry(open.token)
                        .or_default()
                        .push((open.start, open.len, format!("{kind}_open")));
                    marks
                        .entry(run.token)
                        .or_default()
                        .push((run.start, run.len, format!("{kind}_close")));
                    continue;
                }
            }
            if after == Some(false) {
                openers.push(run);
            }
        }
    }

    if marks.is_empty() {
        return children;
    }

    let mut out = Vec::with_capacity(children.len() + marks.len() * 2);
    for (index, token) in children.into_iter().enumerate() {
        let Some(mut token_marks) = marks.remove(&index) else {
            out.push(token);
            continue;
        };
        token_marks.sort_by_key(|&(start, _, _)| start);
        let chars: Vec<char> = token.content.chars().collect();
        let mut at = 0;
        for (start, len, kind) in token_marks {
            if start > at {
                out.push(tokens::text(chars[at..start].iter().collect::<String>()));
            }
            out.push(Token::new(kind, 0));
            at = start + len;
        }
        if at < chars.len() {
            out.push(tokens::text(chars[at..].iter().collect::<String>()));
        }
    }
    out
}
