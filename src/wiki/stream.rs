//! Token stream adapter
//!
//! Wraps any token iterator and gives the parser a cursor over it: a current
//! token, one-token lookahead and the ability to push tokens back. The stream
//! ends with an `eof` token that is repeated forever, so a parser never has
//! to deal with running out of input mid-rule.
//!
//! # Pushback
//!
//! Pushed tokens form a stack and are consumed last-in first-out before the
//! underlying iterator is touched again. [TokenStream::look] is built on it:
//! peeking advances the stream, then restores the old current token and
//! pushes the peeked one back.
//!
//! # Examples
//!
//! ```ignore
//! let mut stream = tokenize("''a''");
//! assert_eq!(stream.current().kind, TokenKind::EmphasizedBegin);
//! assert_eq!(stream.look().kind, TokenKind::Text);
//! stream.expect(TokenKind::EmphasizedBegin)?;
//! ```

use crate::wiki::token::{Token, TokenKind, TokenValue};
use std::fmt;
use std::io;

/// Raised when the current token is not what the consumer expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    Unexpected {
        expected: TokenKind,
        /// The expected value, for value checks.
        value: Option<TokenValue>,
        found: Token,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Unexpected {
                expected,
                value: None,
                found,
            } => write!(f, "Expected {}, found {}", expected, found),
            StreamError::Unexpected {
                expected,
                value: Some(value),
                found,
            } => write!(f, "Expected {} with value {}, found {}", expected, value, found),
        }
    }
}

impl std::error::Error for StreamError {}

/// A cursor over a token iterator with lookahead and pushback.
#[derive(Debug)]
pub struct TokenStream<I> {
    tokens: I,
    current: Token,
    pushed: Vec<Token>,
}

impl<I: Iterator<Item = Token>> TokenStream<I> {
    /// Wrap `tokens`; the first token becomes current right away.
    pub fn new(tokens: I) -> Self {
        let mut stream = TokenStream {
            tokens,
            current: Token::eof(),
            pushed: Vec::new(),
        };
        stream.advance();
        stream
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Make the next token current and return the previous one.
    pub fn advance(&mut self) -> Token {
        let next = match self.pushed.pop() {
            Some(token) => token,
            None => self.tokens.next().unwrap_or_else(Token::eof),
        };
        std::mem::replace(&mut self.current, next)
    }

    /// The token after the current one, without consuming anything.
    pub fn look(&mut self) -> Token {
        if let Some(token) = self.pushed.last() {
            return token.clone();
        }
        let old = self.current.clone();
        self.advance();
        let peeked = std::mem::replace(&mut self.current, old);
        self.pushed.push(peeked.clone());
        peeked
    }

    /// Push a token back; it is returned by the next [advance](Self::advance).
    pub fn push(&mut self, token: Token) {
        self.pushed.push(token);
    }

    /// Push a token and make it current immediately.
    pub fn push_as_current(&mut self, token: Token) {
        self.push(token);
        self.advance();
    }

    /// Insert `token` as current, in front of the old current token.
    pub fn shift(&mut self, token: Token) {
        let old = self.advance();
        let next = self.current.clone();
        self.push(next);
        self.push(old);
        self.push(token);
        self.advance();
    }

    /// Advance `n` times.
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// True if the current token has the given kind.
    pub fn test(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// True if the current token has the given kind and value.
    pub fn test_value(&self, kind: TokenKind, value: impl Into<TokenValue>) -> bool {
        self.current.kind == kind && self.current.value == value.into()
    }

    /// Consume the current token if it has the given kind.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, StreamError> {
        if !self.test(kind) {
            return Err(StreamError::Unexpected {
                expected: kind,
                value: None,
                found: self.current.clone(),
            });
        }
        Ok(self.advance())
    }

    /// Consume the current token if it has the given kind and value.
    pub fn expect_value(
        &mut self,
        kind: TokenKind,
        value: impl Into<TokenValue>,
    ) -> Result<Token, StreamError> {
        let value = value.into();
        if self.current.kind != kind || self.current.value != value {
            return Err(StreamError::Unexpected {
                expected: kind,
                value: Some(value),
                found: self.current.clone(),
            });
        }
        Ok(self.advance())
    }

    /// True once the current token is `eof` and nothing is pushed back.
    pub fn is_eof(&self) -> bool {
        self.pushed.is_empty() && self.current.is_eof()
    }

    /// Drain the stream, writing one `Token(kind, value)` line per token.
    pub fn debug<W: io::Write>(&mut self, out: &mut W) -> io::Result<()> {
        for token in self.by_ref() {
            writeln!(out, "{}", token)?;
        }
        Ok(())
    }
}

/// Yields every token up to, but not including, `eof`.
impl<I: Iterator<Item = Token>> Iterator for TokenStream<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        Some(self.advance())
    }
}
