//! Export tests for Markdown format (document → Markdown)
//!
//! Documents are written in the raw JSON schema, the way editors hand them over, and
//! the Markdown output is checked as a string.

use comrak::nodes::NodeValue;
use comrak::{parse_document, Arena, Options};
use draftmd_babel::tags::registry::SharedTag;
use draftmd_babel::{
    to_markdown, Document, FnTag, TagContext, TagKind, TagRegistry, ToMarkdownOptions,
};
use insta::assert_snapshot;
use std::sync::Arc;

fn doc(json: &str) -> Document {
    serde_json::from_str(json).unwrap()
}

fn render(json: &str) -> String {
    to_markdown(&doc(json), &ToMarkdownOptions::default())
}

fn mention_id(ctx: &TagContext<'_>) -> String {
    ctx.entity
        .and_then(|entity| entity.data.get("mention"))
        .and_then(|mention| mention.get("id"))
        .map(|id| match id.as_str() {
            Some(id) => id.to_string(),
            None => id.to_string(),
        })
        .unwrap_or_default()
}

fn mention_tags() -> TagRegistry {
    TagRegistry::new().with(
        TagKind::Entity,
        "mention",
        FnTag::new(|_| "[".to_string(), |ctx| format!("](@{})", mention_id(ctx))),
    )
}

#[test]
fn test_kitchen_sink() {
    let md = render(
        r#"{"entityMap":{},"blocks":[
        {"key":"2uvch","text":"Hello!","type":"header-one"},
        {"key":"gcip","text":"My name is Rose :) \nToday, I'm here to talk to you about how great markdown is!\n","type":"unstyled","inlineStyleRanges":[{"offset":11,"length":4,"style":"BOLD"}]},
        {"key":"eu8ak","text":"First, here's a few bullet points:","type":"header-two"},
        {"key":"fiti6","text":"One","type":"unordered-list-item"},
        {"key":"d8amu","text":"Two","type":"unordered-list-item"},
        {"key":"7r62d","text":"Three","type":"unordered-list-item"},
        {"key":"3n7hc","text":"A codeblock","type":"code-block"},
        {"key":"9o0hn","text":"And then... some monospace text?\nOr... italics?","type":"unstyled",
         "inlineStyleRanges":[{"offset":12,"length":19,"style":"CODE"},{"offset":39,"length":8,"style":"ITALIC"}]}]}"#,
    );

    assert_eq!(
        md,
        "# Hello!\n\nMy name is **Rose** :) \nToday, I'm here to talk to you about how great markdown is!\n\n\n## First, here's a few bullet points:\n\n- One\n- Two\n- Three\n\n```\nA codeblock\n```\n\nAnd then... `some monospace text`?\nOr... _italics?_"
    );
}

#[test]
fn test_headings() {
    for (level, block_type) in ["header-one", "header-two", "header-three", "header-four", "header-five", "header-six"]
        .iter()
        .enumerate()
    {
        let json = format!(
            r#"{{"blocks":[{{"type":"{block_type}","text":"Test"}},{{"text":"Hello :)"}},{{"type":"{block_type}","text":"Test"}}]}}"#
        );
        let hashes = "#".repeat(level + 1);
        assert_eq!(
            render(&json),
            format!("{hashes} Test\n\nHello :)\n\n{hashes} Test")
        );
    }
}

#[test]
fn test_code_blocks() {
    assert_snapshot!(
        render(r#"{"blocks":[{"type":"code-block","text":"Test codeblock"}]}"#),
        @r"
    ```
    Test codeblock
    ```
    "
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"type":"code-block","text":"Test codeblock","data":{"language":"javascript"}}]}"#),
        @r"
    ```javascript
    Test codeblock
    ```
    "
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Hello I am some inline code","inlineStyleRanges":[{"offset":6,"length":21,"style":"CODE"}]}]}"#),
        @"Hello `I am some inline code`"
    );
}

#[test]
fn test_inline_styles() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Hello I am bold yay","inlineStyleRanges":[{"offset":6,"length":9,"style":"BOLD"}]}]}"#),
        @"Hello **I am bold** yay"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Hello There, I am italic yay","inlineStyleRanges":[{"offset":12,"length":12,"style":"ITALIC"}]}]}"#),
        @"Hello There, _I am italic_ yay"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"this is strikethrough text","inlineStyleRanges":[{"offset":8,"length":14,"style":"STRIKETHROUGH"}]}]}"#),
        @"this is ~~strikethrough~~ text"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"E = mc2","inlineStyleRanges":[{"offset":6,"length":1,"style":"SUPERSCRIPT"}]}]}"#),
        @"E = mc^2^"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"H2O","inlineStyleRanges":[{"offset":1,"length":1,"style":"SUBSCRIPT"}]}]}"#),
        @"H~2~O"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"an underlined word","inlineStyleRanges":[{"offset":3,"length":10,"style":"UNDERLINE"}]}]}"#),
        @"an ++underlined++ word"
    );
}

#[test]
fn test_whitespace_moves_outside_delimiters() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Test Bold Text Test","inlineStyleRanges":[{"offset":4,"length":10,"style":"BOLD"}]}]}"#),
        @"Test **Bold Text** Test"
    );
    assert_eq!(
        render(r#"{"blocks":[{"text":"Test\n\nI am some bold text\nI will not be bold","inlineStyleRanges":[{"offset":6,"length":20,"style":"BOLD"}]}]}"#),
        "Test\n\n**I am some bold text**\nI will not be bold"
    );
    assert_eq!(
        render(r#"{"blocks":[{"text":"Test Bold Text ","inlineStyleRanges":[{"offset":5,"length":10,"style":"BOLD"}]}]}"#),
        "Test **Bold Text** "
    );
}

#[test]
fn test_overlapping_ranges() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Test Bold Text Test","inlineStyleRanges":[{"offset":0,"length":10,"style":"ITALIC"},{"offset":5,"length":9,"style":"BOLD"}]}]}"#),
        @"_Test **Bold**_ **Text** Test"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"foo bar baz","inlineStyleRanges":[{"offset":0,"length":7,"style":"ITALIC"},{"offset":4,"length":7,"style":"BOLD"}]}]}"#),
        @"_foo **bar**_ **baz**"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"foo bar baz","inlineStyleRanges":[{"offset":4,"length":7,"style":"BOLD"}],"entityRanges":[{"offset":0,"length":7,"key":0}]}],
            "entityMap":{"0":{"type":"LINK","mutability":"MUTABLE","data":{"url":"http://localhost:8000"}}}}"#),
        @"[foo **bar**](http://localhost:8000) **baz**"
    );
}

#[test]
fn test_emoji_offsets_count_characters() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Testing 👍 italic words words words bold words words words",
            "inlineStyleRanges":[{"offset":10,"length":6,"style":"ITALIC"},{"offset":35,"length":4,"style":"BOLD"}]}]}"#),
        @"Testing 👍 _italic_ words words words **bold** words words words"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"🙋 link link","entityRanges":[{"offset":2,"length":4,"key":0},{"offset":7,"length":4,"key":1}]}],
            "entityMap":{"0":{"type":"LINK","mutability":"MUTABLE","data":{"url":"https://link.com","href":"https://link.com"}},
                         "1":{"type":"LINK","mutability":"MUTABLE","data":{"url":"https://link.com"}}}}"#),
        @"🙋 [link](https://link.com) [link](https://link.com)"
    );
}

#[test]
fn test_links_from_url_or_href() {
    for field in ["url", "href"] {
        let json = format!(
            r#"{{"entityMap":{{"0":{{"type":"LINK","mutability":"MUTABLE","data":{{"{field}":"https://google.com"}}}},
                "1":{{"type":"LINK","mutability":"MUTABLE","data":{{"{field}":"https://facebook.github.io/draft-js/"}}}}}},
              "blocks":[{{"text":"This is a test of a link","entityRanges":[{{"offset":18,"length":6,"key":0}}]}},
                {{"text":""}},
                {{"text":"And perhaps we should test once more.","entityRanges":[{{"offset":4,"length":7,"key":1}}]}}]}}"#
        );
        assert_eq!(
            render(&json),
            "This is a test of [a link](https://google.com)\n\nAnd [perhaps](https://facebook.github.io/draft-js/) we should test once more."
        );
    }
}

#[test]
fn test_link_title() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"docs","entityRanges":[{"offset":0,"length":4,"key":0}]}],
            "entityMap":{"0":{"type":"LINK","data":{"url":"https://docs.rs","title":"Docs \"home\""}}}}"#),
        @r#"[docs](https://docs.rs "Docs \"home\"")"#
    );
}

#[test]
fn test_mention_entity_handler() {
    let options = ToMarkdownOptions::default().with_tags(mention_tags());

    let md = to_markdown(
        &doc(r#"{"entityMap":{"0":{"type":"mention","mutability":"SEGMENTED","data":{"mention":{"name":"Bran Stark","id":168181}}}},
            "blocks":[{"text":"asdadd adasdasd Bran Stark sadadsadasddasdasdasdsadsadasdsadasdasdasdsa",
            "inlineStyleRanges":[{"offset":7,"length":9,"style":"BOLD"},{"offset":27,"length":27,"style":"BOLD"},
                                 {"offset":38,"length":7,"style":"ITALIC"},{"offset":63,"length":8,"style":"ITALIC"}],
            "entityRanges":[{"offset":16,"length":10,"key":0}]}]}"#),
        &options,
    );
    assert_snapshot!(md, @"asdadd **adasdasd** [Bran Stark](@168181) **sadadsadasd_dasdasd_asdsadsad**asdsadasd_asdasdsa_");

    let md = to_markdown(
        &doc(r#"{"entityMap":{"0":{"type":"mention","mutability":"SEGMENTED","data":{"mention":{"name":"Bran Stark","id":168181}}}},
            "blocks":[{"text":"jkhkhj Bran Stark  khkjj","inlineStyleRanges":[{"offset":0,"length":17,"style":"BOLD"}],
            "entityRanges":[{"offset":7,"length":10,"key":0}]}]}"#),
        &options,
    );
    assert_eq!(md, "**jkhkhj [Bran Stark](@168181)**  khkjj");
}

#[test]
fn test_entity_handler_sees_the_block() {
    let mention = FnTag::new(
        |ctx| match ctx.block.block_type.as_str() {
            "code-block" => format!("[code@{}:", mention_id(ctx)),
            _ => "[".to_string(),
        },
        |ctx| match ctx.block.block_type.as_str() {
            "code-block" => "]".to_string(),
            _ => format!("](@{})", mention_id(ctx)),
        },
    );
    let options = ToMarkdownOptions::default()
        .with_tags(TagRegistry::new().with(TagKind::Entity, "mention", mention));

    let md = to_markdown(
        &doc(r#"{"blocks":[
            {"text":"A mention in code block @Christophe Hamerling","type":"code-block","entityRanges":[{"offset":24,"length":21,"key":0}],"data":{"language":""}},
            {"text":"A mention in unstyled block @Loris Hamerling","entityRanges":[{"offset":28,"length":16,"key":1}]}],
            "entityMap":{"0":{"type":"mention","mutability":"IMMUTABLE","data":{"mention":{"id":"8cb18514-a9be-11eb-abce-0242ac120005"}}},
                         "1":{"type":"mention","mutability":"IMMUTABLE","data":{"mention":{"id":"8cb18514-a9be-11eb-abce-0242ac120006"}}}}}"#),
        &options,
    );
    assert_snapshot!(md, @r"
    ```
    A mention in code block [code@8cb18514-a9be-11eb-abce-0242ac120005:@Christophe Hamerling]
    ```

    A mention in unstyled block [@Loris Hamerling](@8cb18514-a9be-11eb-abce-0242ac120006)
    ");
}

#[test]
fn test_custom_style_handlers() {
    let mut tags = TagRegistry::new();
    for color in ["red", "orange", "yellow"] {
        tags.register(
            TagKind::Style,
            color,
            FnTag::fixed(format!("<span style=\"color: {color}\">"), "</span>"),
        );
    }
    let options = ToMarkdownOptions::default().with_tags(tags);

    let md = to_markdown(
        &doc(r#"{"blocks":[{"text":"OneTwoThree","inlineStyleRanges":[
            {"offset":0,"length":3,"style":"red"},{"offset":3,"length":3,"style":"orange"},{"offset":6,"length":5,"style":"yellow"}]}]}"#),
        &options,
    );
    assert_snapshot!(md, @r#"<span style="color: red">One</span><span style="color: orange">Two</span><span style="color: yellow">Three</span>"#);
}

#[test]
fn test_block_handler_reads_block_data() {
    let image = FnTag::new(
        |ctx| {
            let alt = ctx.block.data_str("alt").unwrap_or("");
            let src = ctx.block.data_str("src").unwrap_or("");
            let title = ctx
                .block
                .data_str("title")
                .map(|title| format!(" \"{title}\""))
                .unwrap_or_default();
            format!("![{alt}]({src}{title})")
        },
        |_| String::new(),
    );
    let options = ToMarkdownOptions::default()
        .with_tags(TagRegistry::new().with(TagKind::Block, "atomic:image", image));

    let md = to_markdown(
        &doc(r#"{"blocks":[{"text":"","type":"atomic:image","data":{"src":"https://example.com"}}]}"#),
        &options,
    );
    assert_snapshot!(md, @"![](https://example.com)");
}

#[test]
fn test_resolver_supplies_missing_handlers() {
    let tags = TagRegistry::new().with_resolver(|kind, name| match (kind, name) {
        (TagKind::Style, style) => style.strip_prefix("color-").map(|color| {
            Arc::new(FnTag::fixed(format!("<span style=\"color: {color}\">"), "</span>")) as SharedTag
        }),
        _ => None,
    });
    let options = ToMarkdownOptions::default().with_tags(tags);

    let md = to_markdown(
        &doc(r#"{"blocks":[{"text":"red and plain","inlineStyleRanges":[{"offset":0,"length":3,"style":"color-red"},{"offset":8,"length":5,"style":"HIGHLIGHT"}]}]}"#),
        &options,
    );
    assert_snapshot!(md, @r#"<span style="color: red">red</span> and plain"#);
}

#[test]
fn test_images() {
    assert_snapshot!(
        render(r#"{"blocks":[{"type":"atomic","text":" ","entityRanges":[{"offset":0,"length":1,"key":0}]}],
            "entityMap":{"0":{"type":"image","mutability":"IMMUTABLE","data":{"src":"cat.png","alt":"A cat","title":"Cat"}}}}"#),
        @r#"![A cat](cat.png "Cat")"#
    );
}

#[test]
fn test_nested_lists() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"item","type":"unordered-list-item"},{"text":"item","type":"unordered-list-item","depth":1}]}"#),
        @r"
    - item
        - item
    "
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"item","type":"ordered-list-item"},{"text":"item","type":"ordered-list-item","depth":1}]}"#),
        @r"
    1. item
        1. item
    "
    );
}

#[test]
fn test_complex_nested_ordered_lists() {
    let md = render(
        r#"{"blocks":[
        {"text":"Test Item one unnested","type":"ordered-list-item","depth":0},
        {"text":"Test Item one nested","type":"ordered-list-item","depth":1},
        {"text":"Test Item two nested","type":"ordered-list-item","depth":1},
        {"text":"Test item three nested","type":"ordered-list-item","depth":1},
        {"text":"Test item two unnested","type":"ordered-list-item","depth":0},
        {"text":"Test item three unnested","type":"ordered-list-item","depth":0},
        {"text":"Test Item Four unnested","type":"ordered-list-item","depth":0},
        {"text":"Test item one nested under test item four","type":"ordered-list-item","depth":1},
        {"text":"Test item one double nested","type":"ordered-list-item","depth":2},
        {"text":"Test item two double nested","type":"ordered-list-item","depth":2}]}"#,
    );
    assert_snapshot!(md, @r"
    1. Test Item one unnested
        1. Test Item one nested
        2. Test Item two nested
        3. Test item three nested
    2. Test item two unnested
    3. Test item three unnested
    4. Test Item Four unnested
        1. Test item one nested under test item four
            1. Test item one double nested
            2. Test item two double nested
    ");
}

#[test]
fn test_ordered_list_restarts_after_interruption() {
    let md = render(
        r#"{"blocks":[
        {"text":"first top level list item","type":"ordered-list-item"},
        {"text":"second top level list item","type":"ordered-list-item"},
        {"text":"another block-level item","type":"unstyled"},
        {"text":"another top level list item","type":"ordered-list-item"}]}"#,
    );
    assert_eq!(
        md,
        "1. first top level list item\n2. second top level list item\n\nanother block-level item\n\n1. another top level list item"
    );
}

#[test]
fn test_blank_line_after_lists() {
    assert_eq!(
        render(r#"{"blocks":[{"text":"item","type":"ordered-list-item"},{"text":"item","type":"ordered-list-item"},{"text":"foo"}]}"#),
        "1. item\n2. item\n\nfoo"
    );
    assert_eq!(
        render(r#"{"blocks":[{"text":"item","type":"unordered-list-item"},{"text":"item","type":"unordered-list-item"},{"text":"foo"}]}"#),
        "- item\n- item\n\nfoo"
    );
}

#[test]
fn test_empty_blocks_and_preserve_newlines() {
    let document = doc(
        r#"{"blocks":[{"text":"a"},{"text":"b"},{"text":""},{"text":"c"},{"text":""},{"text":""},{"text":"d"}]}"#,
    );
    assert_eq!(
        to_markdown(&document, &ToMarkdownOptions::default()),
        "a\n\nb\n\nc\n\nd"
    );
    assert_eq!(
        to_markdown(&document, &ToMarkdownOptions::default().preserve_newlines(true)),
        "a\nb\n\nc\n\n\nd"
    );
}

#[test]
fn test_blockquote_with_blank_lines() {
    let document = doc(r#"{"blocks":[{"text":"one\n\nblockquote","type":"blockquote"},{"text":"Hello :)"}]}"#);
    assert_eq!(
        to_markdown(&document, &ToMarkdownOptions::default()),
        "> one\n> \n> blockquote\n\nHello :)"
    );
    assert_eq!(
        to_markdown(&document, &ToMarkdownOptions::default().preserve_newlines(true)),
        "> one\n> \n> blockquote\nHello :)"
    );
}

#[test]
fn test_escapes_inline_markdown_characters() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Test _not italic_ Test **not bold**"}]}"#),
        @r"Test \_not italic\_ Test \*\*not bold\*\*"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Test _not **i** t**a**lic_ T_est **not bold** _hi_ ok **notmatching* smile!"}]}"#),
        @r"Test \_not \*\*i\*\* t**a**lic\_ T_est \*\*not bold\*\* \_hi\_ ok **notmatching* smile!"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Test_not italic_ Test**not bold**"}]}"#),
        @"Test_not italic_ Test**not bold**"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"Test _not italic Test not bold"}]}"#),
        @"Test _not italic Test not bold"
    );
}

#[test]
fn test_escapes_block_markdown_characters() {
    assert_snapshot!(
        render(r##"{"blocks":[{"text":"# Test _not # italic_ Test **not bold**"}]}"##),
        @r"\# Test \_not # italic\_ Test \*\*not bold\*\*"
    );
    assert_snapshot!(render(r##"{"blocks":[{"text":"#Test"}]}"##), @"#Test");
    assert_snapshot!(render(r#"{"blocks":[{"text":">Test"}]}"#), @r"\>Test");
}

#[test]
fn test_code_is_never_escaped() {
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"such special code which contains *special* chars is so important",
            "inlineStyleRanges":[{"offset":5,"length":43,"style":"CODE"}]}]}"#),
        @"such `special code which contains *special* chars` is so important"
    );
    assert_snapshot!(
        render(r#"{"blocks":[{"text":"such special _code_ which contains *special* chars *wow*","type":"code-block"}]}"#),
        @r"
    ```
    such special _code_ which contains *special* chars *wow*
    ```
    "
    );
}

#[test]
fn test_escaping_can_be_disabled() {
    let options = ToMarkdownOptions::default().escape_markdown_characters(false);
    for text in [
        "Test _not italic_ Test **not bold**",
        "# Test _not # italic_ Test **not bold**",
        ">Test",
        "_Test_",
    ] {
        let document = Document::new(vec![draftmd_babel::Block::unstyled(text)]);
        assert_eq!(to_markdown(&document, &options), text);
    }
}

/// The output is valid CommonMark: comrak reads back the structure that was rendered.
#[test]
fn test_output_parses_as_expected_structure() {
    let md = render(
        r#"{"blocks":[{"text":"Title","type":"header-two"},{"text":"a","type":"unordered-list-item"},{"text":"b","type":"unordered-list-item","depth":1},
            {"text":"quote","type":"blockquote"},{"text":"x = 1","type":"code-block","data":{"language":"rust"}}]}"#,
    );
    let arena = Arena::new();
    let root = parse_document(&arena, &md, &Options::default());

    let kinds: Vec<&str> = root
        .children()
        .map(|node| match &node.data.borrow().value {
            NodeValue::Heading(_) => "heading",
            NodeValue::List(_) => "list",
            NodeValue::BlockQuote => "blockquote",
            NodeValue::CodeBlock(code) if code.info == "rust" => "code",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["heading", "list", "blockquote", "code"]);
}
