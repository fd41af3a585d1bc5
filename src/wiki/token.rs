//! Token types produced by the wiki lexer
//!
//! A token is an immutable `(kind, value)` pair. The kind is drawn from a closed
//! vocabulary shared with the downstream parser, so every [`TokenKind`] renders to
//! the exact wire name the parser pattern-matches on (`strong_begin`,
//! `func_argument_delimiter`, ...). Kinds are plain enum values, which makes them
//! interned for free: comparing two kinds is a single integer comparison.
//!
//! Values come in three shapes:
//!
//!     - `None` for purely structural tokens (`quote_begin`, `eof`, ...) and for
//!       regex groups that did not take part in a match.
//!     - `Text` for anything captured from the source.
//!     - `Tuple` for rules that emit all regex groups at once, like the wiki link
//!       target `(interwiki, pagename)`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

macro_rules! token_kinds {
    ($($variant:ident => $name:literal,)*) => {
        /// The closed vocabulary of token kinds.
        ///
        /// Serialises (and displays) as the snake case wire name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum TokenKind {
            $($variant,)*
        }

        impl TokenKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [TokenKind] = &[$(TokenKind::$variant,)*];

            /// The wire name of this kind.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(TokenKind::$variant => $name,)*
                }
            }
        }

        impl FromStr for TokenKind {
            type Err = UnknownTokenKind;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(TokenKind::$variant),)*
                    _ => Err(UnknownTokenKind(s.to_string())),
                }
            }
        }
    };
}

token_kinds! {
    Text => "text",
    Newline => "newline",
    Eof => "eof",

    MetadataBegin => "metadata_begin",
    MetadataEnd => "metadata_end",
    MetadataKey => "metadata_key",
    HeadlineBegin => "headline_begin",
    HeadlineEnd => "headline_end",
    DefinitionBegin => "definition_begin",
    DefinitionEnd => "definition_end",
    DefinitionTerm => "definition_term",
    TableRowBegin => "table_row_begin",
    TableRowEnd => "table_row_end",
    TableColSwitch => "table_col_switch",
    TableDefBegin => "table_def_begin",
    TableDefEnd => "table_def_end",
    ListItemBegin => "list_item_begin",
    ListItemEnd => "list_item_end",
    BoxBegin => "box_begin",
    BoxEnd => "box_end",
    BoxDefBegin => "box_def_begin",
    BoxDefEnd => "box_def_end",
    PreBegin => "pre_begin",
    PreEnd => "pre_end",
    ParserBegin => "parser_begin",
    ParserEnd => "parser_end",
    ConflictBegin => "conflict_begin",
    ConflictEnd => "conflict_end",
    ConflictSwitch => "conflict_switch",
    Ruler => "ruler",
    QuoteBegin => "quote_begin",
    QuoteEnd => "quote_end",

    StrongBegin => "strong_begin",
    StrongEnd => "strong_end",
    EmphasizedBegin => "emphasized_begin",
    EmphasizedEnd => "emphasized_end",
    UnderlineBegin => "underline_begin",
    UnderlineEnd => "underline_end",
    StrokeBegin => "stroke_begin",
    StrokeEnd => "stroke_end",
    SmallBegin => "small_begin",
    SmallEnd => "small_end",
    BigBegin => "big_begin",
    BigEnd => "big_end",
    SubBegin => "sub_begin",
    SubEnd => "sub_end",
    SupBegin => "sup_begin",
    SupEnd => "sup_end",
    CodeBegin => "code_begin",
    CodeEnd => "code_end",
    EscapedCodeBegin => "escaped_code_begin",
    EscapedCodeEnd => "escaped_code_end",
    FootnoteBegin => "footnote_begin",
    FootnoteEnd => "footnote_end",
    ColorBegin => "color_begin",
    ColorEnd => "color_end",
    ColorValue => "color_value",
    SizeBegin => "size_begin",
    SizeEnd => "size_end",
    FontSize => "font_size",
    FontBegin => "font_begin",
    FontEnd => "font_end",
    FontFace => "font_face",

    WikiLinkBegin => "wiki_link_begin",
    WikiLinkEnd => "wiki_link_end",
    ExternalLinkBegin => "external_link_begin",
    ExternalLinkEnd => "external_link_end",
    LinkTarget => "link_target",
    Sourcelink => "sourcelink",
    FreeLink => "free_link",

    MacroBegin => "macro_begin",
    MacroEnd => "macro_end",
    MacroName => "macro_name",
    MacroArgumentsBegin => "macro_arguments_begin",
    MacroArgumentsEnd => "macro_arguments_end",
    FuncArgumentDelimiter => "func_argument_delimiter",
    FuncStringArg => "func_string_arg",
    FuncKwarg => "func_kwarg",
}

impl TokenKind {
    /// True for the `*_begin` half of a bracket pair.
    pub fn is_begin(self) -> bool {
        self.as_str().ends_with("_begin")
    }

    /// True for the `*_end` half of a bracket pair.
    pub fn is_end(self) -> bool {
        self.as_str().ends_with("_end")
    }

    /// The bracket name shared by a `*_begin`/`*_end` pair (`strong` for
    /// `strong_begin`), or `None` for kinds that are not brackets.
    pub fn bracket_name(self) -> Option<&'static str> {
        let name = self.as_str();
        name.strip_suffix("_begin")
            .or_else(|| name.strip_suffix("_end"))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a name outside the token vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTokenKind(pub String);

impl fmt::Display for UnknownTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown token kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownTokenKind {}

/// The payload of a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    None,
    Text(String),
    /// All groups of a match, in order. Non-participating groups are `None`.
    Tuple(Vec<Option<String>>),
}

impl TokenValue {
    /// The text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TokenValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TokenValue::None)
    }
}

impl From<&str> for TokenValue {
    fn from(text: &str) -> Self {
        TokenValue::Text(text.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(text: String) -> Self {
        TokenValue::Text(text)
    }
}

impl From<Option<&str>> for TokenValue {
    fn from(text: Option<&str>) -> Self {
        text.map_or(TokenValue::None, TokenValue::from)
    }
}

/// Wiki link targets: `(interwiki, pagename)`.
impl From<(Option<&str>, &str)> for TokenValue {
    fn from((interwiki, page): (Option<&str>, &str)) -> Self {
        TokenValue::Tuple(vec![interwiki.map(str::to_string), Some(page.to_string())])
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::None => f.write_str("None"),
            TokenValue::Text(text) => write!(f, "{:?}", text),
            TokenValue::Tuple(groups) => {
                f.write_str("(")?;
                for (i, group) in groups.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match group {
                        Some(text) => write!(f, "{:?}", text)?,
                        None => f.write_str("None")?,
                    }
                }
                f.write_str(")")
            }
        }
    }
}

/// A single lexed token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<TokenValue>) -> Self {
        Token {
            kind,
            value: value.into(),
        }
    }

    /// A token without payload.
    pub fn bare(kind: TokenKind) -> Self {
        Token {
            kind,
            value: TokenValue::None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Text, text.into())
    }

    pub fn eof() -> Self {
        Token::bare(TokenKind::Eof)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}, {})", self.kind, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for kind in TokenKind::ALL {
            assert_eq!(kind.as_str().parse::<TokenKind>(), Ok(*kind));
        }
        assert!("bogus_begin".parse::<TokenKind>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&TokenKind::EscapedCodeBegin).unwrap();
        assert_eq!(json, "\"escaped_code_begin\"");

        let json = serde_json::to_string(&TokenKind::FuncArgumentDelimiter).unwrap();
        assert_eq!(json, "\"func_argument_delimiter\"");
    }

    #[test]
    fn test_bracket_names() {
        assert_eq!(TokenKind::StrongBegin.bracket_name(), Some("strong"));
        assert_eq!(TokenKind::TableDefEnd.bracket_name(), Some("table_def"));
        assert_eq!(TokenKind::Ruler.bracket_name(), None);
        assert!(TokenKind::QuoteEnd.is_end());
        assert!(!TokenKind::Text.is_begin());
    }

    #[test]
    fn test_display_mirrors_token_repr() {
        assert_eq!(Token::text("foo").to_string(), "Token(text, \"foo\")");
        assert_eq!(Token::eof().to_string(), "Token(eof, None)");
        let target = Token::new(TokenKind::LinkTarget, (None, "Start"));
        assert_eq!(target.to_string(), "Token(link_target, (None, \"Start\"))");
    }

    #[test]
    fn test_token_serialization() {
        let token = Token::new(TokenKind::LinkTarget, (Some("wikipedia"), "Rust"));
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "link_target", "value": ["wikipedia", "Rust"]})
        );
        let json = serde_json::to_value(Token::bare(TokenKind::QuoteBegin)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "quote_begin", "value": null}));
    }
}
