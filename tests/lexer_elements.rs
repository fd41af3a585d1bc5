//! Tokenization tests for individual wiki constructs
//!
//! Each test feeds a small document through the full lexer (quotes, fences and
//! the block scanner) and checks the exact token sequence, `eof` included.

use rstest::rstest;
use wikilex::wiki::testing::{assert_tokens, kinds, lex};
use wikilex::wiki::token::TokenKind::{self, *};
use wikilex::wiki::token::{Token, TokenValue};
use wikilex::wiki::{tokenize, tokenize_block};

// ===== Inline Markup =====

#[rstest]
#[case("''foo''", EmphasizedBegin, EmphasizedEnd)]
#[case("'''foo'''", StrongBegin, StrongEnd)]
#[case("__foo__", UnderlineBegin, UnderlineEnd)]
#[case(",,foo,,", SubBegin, SubEnd)]
#[case("^^foo^^", SupBegin, SupEnd)]
#[case("--(foo)--", StrokeBegin, StrokeEnd)]
#[case("`foo`", CodeBegin, CodeEnd)]
#[case("``foo``", EscapedCodeBegin, EscapedCodeEnd)]
#[case("~-foo-~", SmallBegin, SmallEnd)]
#[case("~+foo+~", BigBegin, BigEnd)]
#[case("((foo))", FootnoteBegin, FootnoteEnd)]
fn test_inline_construct(#[case] source: &str, #[case] begin: TokenKind, #[case] end: TokenKind) {
    assert_tokens(source)
        .kinds(&[begin, Text, end, Eof])
        .token(1, Text, "foo")
        .balanced();
}

#[test]
fn test_inline_constructs_in_sequence() {
    let tokens = lex(concat!(
        "''foo''",
        "'''foo'''",
        "__foo__",
        ",,foo,,",
        "^^foo^^",
        "--(foo)--",
        "`foo`",
        "``foo``",
        "~-foo-~",
        "~+foo+~",
        "((foo))",
        "[color=red]foo[/color]",
    ));

    let mut expected = Vec::new();
    for (begin, end) in [
        (EmphasizedBegin, EmphasizedEnd),
        (StrongBegin, StrongEnd),
        (UnderlineBegin, UnderlineEnd),
        (SubBegin, SubEnd),
        (SupBegin, SupEnd),
        (StrokeBegin, StrokeEnd),
        (CodeBegin, CodeEnd),
        (EscapedCodeBegin, EscapedCodeEnd),
        (SmallBegin, SmallEnd),
        (BigBegin, BigEnd),
        (FootnoteBegin, FootnoteEnd),
    ] {
        expected.extend([begin, Text, end]);
    }
    expected.extend([ColorBegin, ColorValue, Text, ColorEnd, Eof]);

    let actual: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(actual, expected);
    assert!(tokens
        .iter()
        .filter(|t| t.kind == Text)
        .all(|t| t.value == TokenValue::from("foo")));
    assert!(tokens.contains(&Token::new(ColorValue, "red")));
}

#[rstest]
#[case("[size=10]big[/size]", SizeBegin, FontSize, "10", SizeEnd)]
#[case("[font=Arial]big[/font]", FontBegin, FontFace, "Arial", FontEnd)]
#[case("[color= #f00 ]big[/color]", ColorBegin, ColorValue, "#f00", ColorEnd)]
fn test_valued_inline_construct(
    #[case] source: &str,
    #[case] begin: TokenKind,
    #[case] value_kind: TokenKind,
    #[case] value: &str,
    #[case] end: TokenKind,
) {
    assert_tokens(source)
        .kinds(&[begin, value_kind, Text, end, Eof])
        .token(1, value_kind, value)
        .token(2, Text, "big");
}

#[test]
fn test_code_is_not_scanned_for_markup() {
    assert_tokens("`''a''`")
        .kinds(&[CodeBegin, Text, CodeEnd, Eof])
        .token(1, Text, "''a''");
}

// ===== Escaping =====

#[test]
fn test_escaped_inline_markers() {
    assert_eq!(
        lex("\\__test\\__\\\\foo"),
        vec![Token::text("__test__\\foo"), Token::eof()]
    );
}

#[test]
fn test_stray_backslash_at_end() {
    assert_eq!(lex("foo\\"), vec![Token::text("foo\\"), Token::eof()]);
}

// ===== Block Constructs =====

#[test]
fn test_ruler_and_line_break() {
    assert_tokens("--------------------\nfoo\\\\\n")
        .kinds(&[Ruler, Text, Newline, Eof])
        .token(1, Text, "foo");
}

#[test]
fn test_metadata_after_comment() {
    assert_tokens("## This is a comment\n# This: is metadata")
        .kinds(&[MetadataBegin, MetadataKey, Text, MetadataEnd, Eof])
        .token(1, MetadataKey, "This")
        .token(2, Text, "is metadata");
}

#[test]
fn test_metadata_arguments() {
    assert_tokens("#tag: foo, \"bar baz\"")
        .kinds(&[
            MetadataBegin,
            MetadataKey,
            Text,
            FuncArgumentDelimiter,
            FuncStringArg,
            MetadataEnd,
            Eof,
        ])
        .token(1, MetadataKey, "tag")
        .token(2, Text, "foo")
        .token(4, FuncStringArg, "\"bar baz\"");
}

#[rstest]
#[case("= Title =")]
#[case("== Title ==")]
#[case("===== Title =====")]
fn test_headline(#[case] source: &str) {
    assert_tokens(source)
        .kinds(&[HeadlineBegin, Text, HeadlineEnd, Eof])
        .token(1, Text, "Title");
}

#[test]
fn test_headline_with_markup() {
    assert_tokens("== ''a'' ==")
        .kinds(&[
            HeadlineBegin,
            EmphasizedBegin,
            Text,
            EmphasizedEnd,
            HeadlineEnd,
            Eof,
        ])
        .balanced();
}

#[test]
fn test_definition() {
    assert_tokens(" term:: description")
        .kinds(&[DefinitionBegin, DefinitionTerm, Text, DefinitionEnd, Eof])
        .token(1, DefinitionTerm, "term")
        .token(2, Text, "description");
}

#[test]
fn test_list_items() {
    let mut expected = Vec::new();
    for _ in 0..4 {
        expected.extend([ListItemBegin, Text, ListItemEnd]);
    }
    expected.push(Eof);

    assert_tokens(" * foo\n  * foo\n 1. foo\n a. foo")
        .kinds(&expected)
        .text("foofoofoofoo")
        .balanced();
}

#[test]
fn test_pre_blocks() {
    assert_tokens("{{{\nfoo\nbar\n}}}\n{{{#!bar foo, blub=blah\nfoo\n}}}")
        .kinds(&[
            PreBegin,
            Text,
            PreEnd,
            Text,
            PreBegin,
            ParserBegin,
            Text,
            FuncArgumentDelimiter,
            FuncKwarg,
            Text,
            ParserEnd,
            Text,
            PreEnd,
            Eof,
        ])
        .token(1, Text, "\nfoo\nbar\n")
        .token(3, Text, "\n")
        .token(5, ParserBegin, "bar")
        .token(6, Text, "foo")
        .token(7, FuncArgumentDelimiter, ",")
        .token(8, FuncKwarg, "blub")
        .token(9, Text, "blah")
        .token(10, ParserEnd, "")
        .token(11, Text, "\nfoo\n");
}

#[test]
fn test_pre_inside_text_is_not_a_quote() {
    assert_eq!(
        lex("foo\n{{{\n> foo\n}}}\nbar"),
        vec![
            Token::text("foo\n"),
            Token::new(PreBegin, "{{{"),
            Token::text("\n> foo\n"),
            Token::new(PreEnd, "}}}"),
            Token::text("\nbar"),
            Token::eof(),
        ]
    );
}

#[test]
fn test_tables() {
    assert_tokens("||1||2||3||\n||4||5||6||\n\n||<42 foo=bar>1||")
        .kinds(&[
            TableRowBegin,
            Text,
            TableColSwitch,
            Text,
            TableColSwitch,
            Text,
            TableRowEnd,
            TableRowBegin,
            Text,
            TableColSwitch,
            Text,
            TableColSwitch,
            Text,
            TableRowEnd,
            Text,
            TableRowBegin,
            TableDefBegin,
            Text,
            FuncKwarg,
            Text,
            TableDefEnd,
            Text,
            TableRowEnd,
            Eof,
        ])
        .token(14, Text, "\n")
        .token(17, Text, "42")
        .token(18, FuncKwarg, "foo")
        .token(19, Text, "bar")
        .token(21, Text, "1")
        .balanced();
}

#[test]
fn test_boxes() {
    assert_tokens("{{|\nfoo\n|}}\n{{|<1 foo=2>\nfoo\n|}}")
        .kinds(&[
            BoxBegin,
            Text,
            BoxEnd,
            Text,
            BoxBegin,
            BoxDefBegin,
            Text,
            FuncKwarg,
            Text,
            BoxDefEnd,
            Text,
            BoxEnd,
            Eof,
        ])
        .token(1, Text, "\nfoo\n")
        .token(6, Text, "1")
        .token(7, FuncKwarg, "foo")
        .token(8, Text, "2")
        .token(10, Text, "\nfoo\n")
        .balanced();
}

#[test]
fn test_conflict_markers() {
    // the closing marker would be read as a quote by the outer pass
    let source = format!("{}\nmine\n{}\ntheirs\n{}", "<".repeat(40), "=".repeat(40), ">".repeat(40));
    let tokens: Vec<Token> = tokenize_block(&source).collect();
    let actual: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        actual,
        vec![ConflictBegin, Text, ConflictSwitch, Text, ConflictEnd]
    );
    assert_eq!(tokens[1], Token::text("\nmine\n"));
    assert_eq!(tokens[3], Token::text("\ntheirs\n"));
}

// ===== Quotes =====

#[test]
fn test_nested_quotes_with_strong() {
    assert_eq!(
        kinds("> foo\n>> '''bar\n>> bar'''\n> foo"),
        vec![
            QuoteBegin,
            Text,
            QuoteBegin,
            StrongBegin,
            Text,
            StrongEnd,
            QuoteEnd,
            Text,
            QuoteEnd,
            Eof,
        ]
    );
    assert_tokens("> foo\n>> '''bar\n>> bar'''\n> foo")
        .token(1, Text, "foo")
        .token(4, Text, "bar\nbar")
        .token(7, Text, "foo");
}

// ===== Links =====

#[test]
fn test_links() {
    let tokens = lex(concat!(
        "[:foo:]",
        "[:foo:bar]",
        "[foo:bar:baz]",
        "[?action=edit]",
        "[http://example.com example]",
    ));
    let actual: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        actual,
        vec![
            WikiLinkBegin,
            LinkTarget,
            WikiLinkEnd,
            WikiLinkBegin,
            LinkTarget,
            Text,
            WikiLinkEnd,
            WikiLinkBegin,
            LinkTarget,
            Text,
            WikiLinkEnd,
            ExternalLinkBegin,
            LinkTarget,
            ExternalLinkEnd,
            ExternalLinkBegin,
            LinkTarget,
            Text,
            ExternalLinkEnd,
            Eof,
        ]
    );
    assert_eq!(tokens[1], Token::new(LinkTarget, (None, "foo")));
    assert_eq!(tokens[4], Token::new(LinkTarget, (None, "foo")));
    assert_eq!(tokens[5], Token::text("bar"));
    assert_eq!(tokens[8], Token::new(LinkTarget, (Some("foo"), "bar")));
    assert_eq!(tokens[9], Token::text("baz"));
    assert_eq!(tokens[12], Token::new(LinkTarget, "?action=edit"));
    assert_eq!(tokens[15], Token::new(LinkTarget, "http://example.com"));
    assert_eq!(tokens[16], Token::text("example"));
}

#[test]
fn test_source_link() {
    assert_tokens("see [ 42 ]")
        .kinds(&[Text, Sourcelink, Eof])
        .token(1, Sourcelink, "42");
}

#[rstest]
#[case("http://example.com/path.", "http://example.com/path", ".")]
#[case("mailto:someone@example.com now", "mailto:someone@example.com", " now")]
#[case("svn+ssh://host/repo", "svn+ssh://host/repo", "")]
fn test_free_link(#[case] source: &str, #[case] link: &str, #[case] rest: &str) {
    let tokens: Vec<Token> = tokenize(source).collect();
    assert_eq!(tokens[0], Token::new(FreeLink, link));
    let tail: String = tokens[1..]
        .iter()
        .filter_map(|t| t.value.as_text())
        .collect();
    assert_eq!(tail, rest);
}

#[test]
fn test_unknown_scheme_is_text() {
    assert_tokens("gopher://example.com").kinds(&[Text, Eof]);
}

// ===== Macros =====

#[test]
fn test_macro_with_arguments() {
    assert_tokens("[[Bild(\"a.png\", alt=\"x\")]]")
        .kinds(&[
            MacroBegin,
            MacroName,
            FuncStringArg,
            FuncArgumentDelimiter,
            FuncKwarg,
            FuncStringArg,
            MacroEnd,
            Eof,
        ])
        .token(1, MacroName, "Bild")
        .token(2, FuncStringArg, "\"a.png\"")
        .token(4, FuncKwarg, "alt")
        .balanced();
}

#[test]
fn test_macro_without_arguments() {
    assert_tokens("[[Inhaltsverzeichnis]]")
        .kinds(&[MacroBegin, MacroName, MacroEnd, Eof])
        .token(1, MacroName, "Inhaltsverzeichnis");
}

#[test]
fn test_unclosed_macro_closes_at_eof() {
    assert_tokens("[[Anker(foo")
        .kinds(&[MacroBegin, MacroName, Text, MacroEnd, Eof])
        .token(3, MacroEnd, "")
        .balanced();
}

#[rstest]
#[case("AND", "and")]
#[case("UND", "and")]
#[case("OR", "or")]
#[case("ODER", "or")]
#[case("NOT", "not")]
#[case("NICHT", "not")]
fn test_keyword_equivalence(#[case] keyword: &str, #[case] operator: &str) {
    let source = format!("[[Wenn(a {} b)]]", keyword);
    assert_tokens(&source)
        .kinds(&[MacroBegin, MacroName, Text, Text, Text, MacroEnd, Eof])
        .token(3, Text, operator);
}

#[test]
fn test_keyword_as_keyword_argument() {
    assert_tokens("[[X(OR=1)]]")
        .kinds(&[MacroBegin, MacroName, FuncKwarg, Text, MacroEnd, Eof])
        .token(2, FuncKwarg, "OR");
}

// ===== Coverage =====

#[rstest]
#[case("''a'' __b__ ~+c+~", "''a'' __b__ ~+c+~")]
#[case("x '''y ^^z^^''' w", "x '''y ^^z^^''' w")]
#[case("> ''quoted''\nplain", "''quoted''plain")]
#[case("{{{\nraw\n}}}", "{{{\nraw\n}}}")]
fn test_text_and_brackets_cover_source(#[case] source: &str, #[case] covered: &str) {
    let text: String = lex(source)
        .iter()
        .filter(|t| t.kind == Text || t.kind.is_begin() || t.kind.is_end())
        .filter_map(|t| t.value.as_text())
        .collect();
    assert_eq!(text, covered);
}
