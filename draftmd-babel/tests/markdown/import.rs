//! Import tests for Markdown format (Markdown → document)
//!
//! These tests check block types, text and the flat ranges recovered from nested
//! Markdown syntax.

use draftmd_babel::formats::markdown::html::{HtmlAttrs, HtmlBlock};
use draftmd_babel::formats::markdown::tokenizer::TokenizerPlugin;
use draftmd_babel::ir::tokens::{self, Token};
use draftmd_babel::{
    to_document, Block, Document, Entity, EntityRange, Mutability, StyleRange, ToDocumentOptions,
};

fn parse(markdown: &str) -> Document {
    to_document(markdown, &ToDocumentOptions::default())
}

fn block_types(doc: &Document) -> Vec<&str> {
    doc.blocks.iter().map(|b| b.block_type.as_str()).collect()
}

/// Rewrites `text "…@"` + `link_open` … `link_close` into a mention token pair, the way
/// an `@[name](id)` syntax extension would.
struct Mentions;

impl TokenizerPlugin for Mentions {
    fn name(&self) -> &str {
        "mentions"
    }

    fn rewrite(&self, tokens: &mut Vec<Token>) {
        for token in tokens.iter_mut().filter(|t| t.kind == "inline") {
            let children = std::mem::take(&mut token.children);
            let mut rewritten: Vec<Token> = Vec::with_capacity(children.len());
            let mut iter = children.into_iter();

            while let Some(child) = iter.next() {
                let follows_at = rewritten
                    .last()
                    .is_some_and(|prev| prev.kind == "text" && prev.content.ends_with('@'));
                if child.kind != "link_open" || !follows_at {
                    rewritten.push(child);
                    continue;
                }

                if let Some(prev) = rewritten.last_mut() {
                    prev.content.pop();
                    if prev.content.is_empty() {
                        rewritten.pop();
                    }
                }
                let mut name = String::new();
                for inner in iter.by_ref() {
                    if inner.kind == "link_close" {
                        break;
                    }
                    name.push_str(&inner.content);
                }
                let id = child.attr("href").unwrap_or_default().to_string();
                rewritten.push(
                    Token::new("mention_open", 0)
                        .with_attr("id", id)
                        .with_attr("name", name.clone()),
                );
                rewritten.push(tokens::text(format!("@{name}")));
                rewritten.push(Token::new("mention_close", 0));
            }
            token.children = rewritten;
        }
    }
}

#[test]
fn test_empty_input() {
    let doc = parse("");
    assert_eq!(doc.blocks.len(), 1);
    assert_eq!(doc.blocks[0].text, "");
    assert_eq!(doc.blocks[0].block_type, "unstyled");
}

#[test]
fn test_codeblocks() {
    let cases = [
        ("```\nsingle line codeblock\n```", "single line codeblock"),
        (
            "```\nsingle line codeblock with trailing newline\n\n```",
            "single line codeblock with trailing newline\n",
        ),
        (
            "```\n\nsingle line codeblock with wrapping newlines\n\n```",
            "\nsingle line codeblock with wrapping newlines\n",
        ),
        ("```\nTest \n\n here is more \n ok\n```", "Test \n\n here is more \n ok"),
    ];
    for (markdown, text) in cases {
        let doc = parse(markdown);
        assert_eq!(doc.blocks[0].block_type, "code-block");
        assert_eq!(doc.blocks[0].text, text);
    }
}

#[test]
fn test_fence_language() {
    let doc = parse("```rust\nfn main() {}\n```");
    assert_eq!(doc.blocks[0].data_str("language"), Some("rust"));

    let doc = parse("    indented code");
    assert_eq!(doc.blocks[0].block_type, "code-block");
    assert_eq!(doc.blocks[0].text, "indented code");
    assert!(doc.blocks[0].data.is_empty());
}

#[test]
fn test_links() {
    let doc = parse(
        "This is a test of [a link](https://google.com)\n\n\n\nAnd [perhaps](https://facebook.github.io/draft-js/) we should test once more.",
    );
    assert_eq!(doc.blocks.len(), 2);

    let first = &doc.blocks[0];
    assert_eq!(first.text, "This is a test of a link");
    assert_eq!(first.block_type, "unstyled");
    assert!(first.inline_style_ranges.is_empty());
    assert_eq!(first.entity_ranges, vec![EntityRange { offset: 18, length: 6, key: 0 }]);
    assert_eq!(doc.entity_map[&0].entity_type, "LINK");
    assert_eq!(doc.entity_map[&0].mutability, Mutability::Mutable);
    assert_eq!(doc.entity_map[&0].data_str("url"), Some("https://google.com"));

    let second = &doc.blocks[1];
    assert_eq!(second.text, "And perhaps we should test once more.");
    assert_eq!(second.entity_ranges, vec![EntityRange { offset: 4, length: 7, key: 1 }]);
    assert_eq!(
        doc.entity_map[&1].data_str("url"),
        Some("https://facebook.github.io/draft-js/")
    );
}

#[test]
fn test_link_title() {
    let doc = parse("[docs](https://docs.rs \"Docs\")");
    assert_eq!(doc.entity_map[&0].data_str("title"), Some("Docs"));
}

#[test]
fn test_kitchen_sink() {
    let doc = parse(
        "# Hello!\n\nMy name is **Rose** :) \nToday, I'm here to talk to you about how great markdown is!\n\n## First, here's a few bullet points:\n\n- One\n- Two\n- Three\n\n```\nA codeblock\n```\n\nAnd then... `some monospace text`?\nOr... _italics?_",
    );

    assert_eq!(
        block_types(&doc),
        vec![
            "header-one",
            "unstyled",
            "header-two",
            "unordered-list-item",
            "unordered-list-item",
            "unordered-list-item",
            "code-block",
            "unstyled",
        ]
    );
    let texts: Vec<&str> = doc.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Hello!",
            "My name is Rose :)\nToday, I'm here to talk to you about how great markdown is!",
            "First, here's a few bullet points:",
            "One",
            "Two",
            "Three",
            "A codeblock",
            "And then... some monospace text?\nOr... italics?",
        ]
    );

    assert!(doc.blocks[0].inline_style_ranges.is_empty());
    assert_eq!(doc.blocks[1].inline_style_ranges, vec![StyleRange::new(11, 4, "BOLD")]);
    assert_eq!(
        doc.blocks[7].inline_style_ranges,
        vec![StyleRange::new(12, 19, "CODE"), StyleRange::new(39, 8, "ITALIC")]
    );
    assert!(doc.blocks.iter().all(|b| b.entity_ranges.is_empty()));
    assert!(doc.entity_map.is_empty());
}

#[test]
fn test_nested_styles() {
    let doc = parse("**bold _italic_** ~~gone~~ 2^10^");
    let block = &doc.blocks[0];
    assert_eq!(block.text, "bold italic gone 210");
    assert_eq!(
        block.inline_style_ranges,
        vec![
            StyleRange::new(0, 11, "BOLD"),
            StyleRange::new(5, 6, "ITALIC"),
            StyleRange::new(12, 4, "STRIKETHROUGH"),
            StyleRange::new(18, 2, "SUPERSCRIPT"),
        ]
    );
}

#[test]
fn test_subscript_and_underline() {
    let doc = parse("H~2~O and ++under++ but ~~gone~~");
    let block = &doc.blocks[0];
    assert_eq!(block.text, "H2O and under but gone");
    assert_eq!(
        block.inline_style_ranges,
        vec![
            StyleRange::new(1, 1, "SUBSCRIPT"),
            StyleRange::new(8, 5, "UNDERLINE"),
            StyleRange::new(18, 4, "STRIKETHROUGH"),
        ]
    );
}

#[test]
fn test_escaped_tilde_and_plus_stay_literal() {
    let doc = parse("H\\~2\\~O \\+\\+x\\+\\+");
    assert_eq!(doc.blocks[0].text, "H~2~O ++x++");
    assert!(doc.blocks[0].inline_style_ranges.is_empty());
}

#[test]
fn test_nested_same_style() {
    let doc = parse("*a *b* c*");
    let block = &doc.blocks[0];
    assert_eq!(block.text, "a b c");
    assert_eq!(
        block.inline_style_ranges,
        vec![StyleRange::new(0, 5, "ITALIC"), StyleRange::new(2, 1, "ITALIC")]
    );
}

#[test]
fn test_lists_with_depth() {
    let doc = parse("1. one\n    - nested\n        1. deeper\n2. two");
    let summary: Vec<(&str, usize, &str)> = doc
        .blocks
        .iter()
        .map(|b| (b.block_type.as_str(), b.depth, b.text.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ordered-list-item", 0, "one"),
            ("unordered-list-item", 1, "nested"),
            ("ordered-list-item", 2, "deeper"),
            ("ordered-list-item", 0, "two"),
        ]
    );
}

#[test]
fn test_blockquote() {
    let doc = parse("> Hello I am Blockquote");
    assert_eq!(doc.blocks[0].block_type, "blockquote");
    assert_eq!(doc.blocks[0].text, "Hello I am Blockquote");
}

#[test]
fn test_empty_blocks() {
    for (markdown, block_type) in [
        ("#", "header-one"),
        (">", "blockquote"),
        ("-", "unordered-list-item"),
        ("1.", "ordered-list-item"),
    ] {
        let doc = parse(markdown);
        assert_eq!(doc.blocks[0].block_type, block_type, "input {markdown:?}");
        assert_eq!(doc.blocks[0].text, "", "input {markdown:?}");
    }
}

#[test]
fn test_standalone_image_becomes_atomic_block() {
    let doc = parse("![A cat](cat.png \"Cat\")");
    let block = &doc.blocks[0];
    assert_eq!(block.block_type, "atomic");
    assert_eq!(block.text, " ");
    assert_eq!(block.entity_ranges, vec![EntityRange { offset: 0, length: 1, key: 0 }]);

    let entity = &doc.entity_map[&0];
    assert_eq!(entity.entity_type, "image");
    assert_eq!(entity.mutability, Mutability::Immutable);
    assert_eq!(entity.data_str("src"), Some("cat.png"));
    assert_eq!(entity.data_str("alt"), Some("A cat"));
    assert_eq!(entity.data_str("title"), Some("Cat"));
}

#[test]
fn test_thematic_break_is_dropped() {
    let doc = parse("above\n\n---\n\nbelow");
    let texts: Vec<&str> = doc.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, vec!["above", "below"]);
}

#[test]
fn test_custom_block_builder_sets_data() {
    let options = ToDocumentOptions::default().with_block("fence", |token: &Token| {
        Block::new("code-block", token.content.trim_end_matches('\n'))
            .with_data("lang", token.attr("params").unwrap_or_default())
    });

    let doc = to_document("```js\ntest()\n```", &options);
    assert_eq!(doc.blocks.len(), 1);
    assert_eq!(doc.blocks[0].block_type, "code-block");
    assert_eq!(doc.blocks[0].text, "test()");
    assert_eq!(doc.blocks[0].data_str("lang"), Some("js"));
}

#[test]
fn test_tokenizer_plugin_with_entity_builder() {
    let options = ToDocumentOptions::default()
        .with_plugin(Mentions)
        .with_entity("mention_open", |token: &Token| {
            Entity::new("MENTION", Mutability::Immutable)
                .with_data("id", token.attr("id").unwrap_or_default())
                .with_data("name", token.attr("name").unwrap_or_default())
        });

    let doc = to_document("Test @[Rose](1)", &options);
    let block = &doc.blocks[0];
    assert_eq!(block.text, "Test @Rose");
    assert_eq!(block.block_type, "unstyled");
    assert!(block.inline_style_ranges.is_empty());
    assert_eq!(block.entity_ranges, vec![EntityRange { offset: 5, length: 5, key: 0 }]);

    let entity = &doc.entity_map[&0];
    assert_eq!(entity.entity_type, "MENTION");
    assert_eq!(entity.data_str("id"), Some("1"));
    assert_eq!(entity.data_str("name"), Some("Rose"));
}

#[test]
fn test_custom_style_mapping() {
    let options = ToDocumentOptions::default().with_style("strong_open", "STRONG");
    let doc = to_document("**loud**", &options);
    assert_eq!(doc.blocks[0].inline_style_ranges, vec![StyleRange::new(0, 4, "STRONG")]);
}

#[test]
fn test_span_styles() {
    let doc = parse(r#"<span style="color: red; background-color: yellow">One</span> Two"#);
    let block = &doc.blocks[0];
    assert_eq!(block.text, "One Two");
    assert_eq!(
        block.inline_style_ranges,
        vec![
            StyleRange::new(0, 3, "color-red"),
            StyleRange::new(0, 3, "background-color-yellow"),
        ]
    );
}

#[test]
fn test_plain_span_inside_styled_span() {
    let doc = parse(r#"<span style="color: red">aa <span>bb</span> cc</span>"#);
    let block = &doc.blocks[0];
    assert_eq!(block.text, "aa bb cc");
    assert_eq!(block.inline_style_ranges, vec![StyleRange::new(0, 8, "color-red")]);
}

#[test]
fn test_html_block_plugin() {
    let options = ToDocumentOptions::default().with_html_block_plugin("user", |attrs: &HtmlAttrs| {
        let id = attrs.get("id").cloned().unwrap_or_default();
        HtmlBlock {
            content: format!("@{id}"),
            entity: Entity::new("MENTION", Mutability::Immutable).with_data("id", id),
        }
    });

    let doc = to_document(r#"Hi <user id="rose"/> there"#, &options);
    let block = &doc.blocks[0];
    assert_eq!(block.text, "Hi @rose there");
    assert_eq!(block.entity_ranges, vec![EntityRange { offset: 3, length: 5, key: 0 }]);
    assert_eq!(doc.entity_map[&0].data_str("id"), Some("rose"));
}

#[test]
fn test_preserve_newlines_inserts_empty_blocks() {
    let options = ToDocumentOptions::default().preserve_newlines(true);
    let doc = to_document("a\n\n\nb", &options);
    let texts: Vec<&str> = doc.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "", "", "b"]);

    let doc = to_document("\n\na", &options);
    let texts: Vec<&str> = doc.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, vec!["", "", "a"]);
}
