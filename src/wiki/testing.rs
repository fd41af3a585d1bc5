//! Testing utilities for token assertions
//!
//! Lexer tests compare whole token sequences. Writing those out as `Vec<Token>`
//! literals gets noisy fast, so this module offers a small fluent API on top
//! of the lexer:
//!
//! ```rust-example
//! use wikilex::wiki::testing::assert_tokens;
//! use wikilex::wiki::token::TokenKind::*;
//!
//! assert_tokens("''a''")
//!     .kinds(&[EmphasizedBegin, Text, EmphasizedEnd, Eof])
//!     .token(1, Text, "a")
//!     .balanced();
//! ```
//!
//! [check_balanced] is exposed separately for property tests, where a panic
//! is less useful than an error message.

use crate::wiki::lexing::tokenize;
use crate::wiki::token::{Token, TokenKind, TokenValue};

/// Brackets opened by rules that are not announced states. They are not
/// guaranteed to be closed and are ignored by [check_balanced].
const UNANNOUNCED: &[&str] = &["table_def", "box_def", "parser"];

/// Tokenize `source` with the built-in grammar, `eof` included.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = tokenize(source).collect();
    tokens.push(Token::eof());
    tokens
}

/// The kinds of [lex], in order.
pub fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).into_iter().map(|token| token.kind).collect()
}

/// Check that every `*_begin` is closed by the matching `*_end`, innermost
/// first.
pub fn check_balanced(tokens: &[Token]) -> Result<(), String> {
    let mut open: Vec<&str> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let Some(name) = token.kind.bracket_name() else {
            continue;
        };
        if UNANNOUNCED.contains(&name) {
            continue;
        }
        if token.kind.is_begin() {
            open.push(name);
        } else if open.pop() != Some(name) {
            return Err(format!("{} at {} closes nothing open", token, i));
        }
    }
    match open.last() {
        Some(name) => Err(format!("'{}' is never closed", name)),
        None => Ok(()),
    }
}

/// Start a fluent assertion over the tokens of `source`.
pub fn assert_tokens(source: &str) -> TokenAssertion {
    TokenAssertion {
        source: source.to_string(),
        tokens: lex(source),
    }
}

pub struct TokenAssertion {
    source: String,
    tokens: Vec<Token>,
}

impl TokenAssertion {
    /// Assert the exact sequence of kinds.
    pub fn kinds(self, expected: &[TokenKind]) -> Self {
        let actual: Vec<TokenKind> = self.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            actual,
            expected,
            "Kinds differ for {:?}\n{}",
            self.source,
            self.dump()
        );
        self
    }

    /// Assert the token at `index`.
    pub fn token(self, index: usize, kind: TokenKind, value: impl Into<TokenValue>) -> Self {
        let expected = Token::new(kind, value);
        assert_eq!(
            self.tokens.get(index),
            Some(&expected),
            "Token {} differs for {:?}\n{}",
            index,
            self.source,
            self.dump()
        );
        self
    }

    /// Assert the full token sequence, `eof` included.
    pub fn tokens(self, expected: &[Token]) -> Self {
        assert_eq!(self.tokens, expected, "Tokens differ for {:?}", self.source);
        self
    }

    /// Assert that all announced brackets are balanced.
    pub fn balanced(self) -> Self {
        if let Err(message) = check_balanced(&self.tokens) {
            panic!("Unbalanced tokens for {:?}: {}\n{}", self.source, message, self.dump());
        }
        self
    }

    /// Assert that the concatenated text tokens equal `expected`.
    pub fn text(self, expected: &str) -> Self {
        let text: String = self
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Text)
            .filter_map(|t| t.value.as_text())
            .collect();
        assert_eq!(text, expected, "Text differs for {:?}", self.source);
        self
    }

    fn dump(&self) -> String {
        self.tokens
            .iter()
            .map(|t| format!("  {}", t))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::token::TokenKind::*;

    #[test]
    fn test_lex_appends_eof() {
        assert_eq!(lex(""), vec![Token::eof()]);
        assert_eq!(kinds("x"), vec![Text, Eof]);
    }

    #[test]
    fn test_check_balanced() {
        let open = Token::bare(StrongBegin);
        let close = Token::bare(StrongEnd);
        assert!(check_balanced(&[open.clone(), close.clone()]).is_ok());
        assert!(check_balanced(&[open.clone()]).is_err());
        assert!(check_balanced(&[close]).is_err());
        assert!(check_balanced(&[Token::bare(TableDefBegin)]).is_ok());
    }

    #[test]
    fn test_fluent_assertions() {
        assert_tokens("a ''b''")
            .kinds(&[Text, EmphasizedBegin, Text, EmphasizedEnd, Eof])
            .token(2, Text, "b")
            .text("a b")
            .balanced();
    }

    #[test]
    #[should_panic(expected = "Kinds differ")]
    fn test_kind_mismatch_panics() {
        assert_tokens("x").kinds(&[Ruler, Eof]);
    }
}
