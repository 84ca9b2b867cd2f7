//! Markdown → document → Markdown must give back the input for Markdown that has a
//! single canonical rendering.

use draftmd_babel::{to_document, to_markdown, ToDocumentOptions, ToMarkdownOptions};

fn roundtrip(markdown: &str) -> String {
    let doc = to_document(markdown, &ToDocumentOptions::default());
    to_markdown(&doc, &ToMarkdownOptions::default())
}

fn roundtrip_preserving_newlines(markdown: &str) -> String {
    let doc = to_document(markdown, &ToDocumentOptions::default().preserve_newlines(true));
    to_markdown(&doc, &ToMarkdownOptions::default().preserve_newlines(true))
}

#[test]
fn test_blank_lines_are_preserved() {
    for markdown in [
        "Test\n\n\nHello There\n\nSmile\n\n\n\n\n\n\n\nYep Hi",
        "a\nb\n\nc\n\n\nd",
        "\n\na",
        "# Test\n\n\nHello There\n\nSmile\n\n\n\n\n\n\n\nYep Hi",
        "> Hello I am Blockquote\n\nI am not\n\n> I am",
        "- one\n- two\n\nafter the list",
    ] {
        assert_eq!(roundtrip_preserving_newlines(markdown), markdown);
    }
}

#[test]
fn test_inline_styles() {
    for markdown in [
        "_I am italic_ …I am not italic.",
        "Hello **I am bold** I am not bold.",
        "**bold** _italic_ test **bold _italic_** _italic_ _italic **bold** italic **bold italic**_",
        "Test `here is some inline code`",
        "~~struck~~ and x^2^",
        "H~2~O and ++underlined++",
    ] {
        assert_eq!(roundtrip(markdown), markdown);
    }
}

#[test]
fn test_blocks() {
    for markdown in [
        "```\nHello I am Codefence\n```",
        "```javascript\nsingle line codeblock\n```",
        "> Hello I am Blockquote",
        "1. one\n2. two\n    - nested\n3. three",
        "###### Small heading",
    ] {
        assert_eq!(roundtrip(markdown), markdown);
    }
}

#[test]
fn test_links_and_images() {
    for markdown in [
        "This is a test of [a link](https://google.com)\n\nAnd [perhaps](https://facebook.github.io/draft-js/) we should test once more.",
        "[docs](https://docs.rs \"Docs\")",
        "![A cat](cat.png \"Cat\")",
    ] {
        assert_eq!(roundtrip(markdown), markdown);
    }
}

#[test]
fn test_kitchen_sink() {
    let markdown = "# Hello!\n\nMy name is **Rose** :)\nToday, I'm here to talk to you about how great markdown is!\n\n## First, here's a few bullet points:\n\n- One\n- Two\n- Three\n\n```\nA codeblock\n```\n\nAnd then... `some monospace text`?\nOr... _italics?_";
    assert_eq!(roundtrip(markdown), markdown);
}

#[test]
fn test_escaped_delimiters() {
    for markdown in [
        "test \\_not italic\\_ test",
        "test \\*\\*not italic\\*\\* test",
        "\\# not a heading",
        "1\\. not a list",
        "see \\[x](y) and \\<b>",
        "\\<https://example.com>",
        "H\\~2\\~O and c\\+\\+x\\+\\+",
    ] {
        assert_eq!(roundtrip(markdown), markdown);
    }
}
