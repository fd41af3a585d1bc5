//! Lexing
//!
//! Turning wiki source into tokens happens in two passes:
//!
//!     1. [quotes]: the outer pass resolves quote depth and fenced pre blocks
//!        line by line, and cuts the document into blocks.
//!     2. [block]: the inner pass runs the rule-stack scanner over each block.
//!
//! Both passes are lazy iterators, so a consumer only pays for the tokens it
//! pulls. [Lexer] bundles them with a grammar and wraps the result in a
//! [TokenStream], which adds lookahead and the trailing `eof`.
//!
//! For quick use, the free functions [tokenize], [tokenize_block] and
//! [escape] run against the built-in grammar.

pub mod block;
pub mod escape;
pub mod quotes;

pub use block::BlockTokenizer;
pub use quotes::Tokenizer;

use crate::wiki::rules::{Entry, Grammar, GrammarError, State, WIKI_GRAMMAR};
use crate::wiki::stream::TokenStream;
use std::collections::HashMap;
use std::fmt;

/// Errors raised while setting up a lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// The supplied rule table was rejected.
    Grammar(GrammarError),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::Grammar(err) => write!(f, "Grammar error: {}", err),
        }
    }
}

impl std::error::Error for LexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LexError::Grammar(err) => Some(err),
        }
    }
}

impl From<GrammarError> for LexError {
    fn from(err: GrammarError) -> Self {
        LexError::Grammar(err)
    }
}

#[derive(Debug)]
enum Rules {
    Builtin,
    Custom(Box<Grammar>),
}

/// A lexer bound to a grammar.
#[derive(Debug)]
pub struct Lexer {
    rules: Rules,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    /// A lexer for the built-in wiki grammar.
    pub fn new() -> Self {
        Lexer {
            rules: Rules::Builtin,
        }
    }

    /// A lexer for a custom rule table, validated up front.
    pub fn with_grammar(rule_sets: HashMap<State, Vec<Entry>>) -> Result<Self, LexError> {
        let grammar = Grammar::new(rule_sets)?;
        Ok(Lexer {
            rules: Rules::Custom(Box::new(grammar)),
        })
    }

    pub fn grammar(&self) -> &Grammar {
        match &self.rules {
            Rules::Builtin => &*WIKI_GRAMMAR,
            Rules::Custom(grammar) => &**grammar,
        }
    }

    /// Tokenize a whole document, quotes and fences included.
    pub fn tokenize<'a>(&self, source: &'a str) -> TokenStream<Tokenizer<'a, '_>> {
        TokenStream::new(Tokenizer::new(self.grammar(), source))
    }

    /// Tokenize a single block, skipping quote resolution.
    pub fn tokenize_block(&self, source: &str) -> TokenStream<BlockTokenizer<'_>> {
        TokenStream::new(BlockTokenizer::new(self.grammar(), source))
    }

    /// Escape `text` so that it lexes back as plain text.
    ///
    /// Only constructs that can start mid-line round-trip. A leading backslash
    /// moves a line-anchored construct such as a headline or list item off the
    /// line start, where it then stays as text, and quote prefixes are left
    /// alone because the quote pass runs before escapes are seen.
    pub fn escape(&self, text: &str) -> String {
        escape::escape(self.grammar(), text)
    }
}

/// Tokenize a document with the built-in grammar.
pub fn tokenize(source: &str) -> TokenStream<Tokenizer<'_, 'static>> {
    TokenStream::new(Tokenizer::new(&WIKI_GRAMMAR, source))
}

/// Tokenize one block with the built-in grammar.
pub fn tokenize_block(source: &str) -> TokenStream<BlockTokenizer<'static>> {
    TokenStream::new(BlockTokenizer::new(&WIKI_GRAMMAR, source))
}

/// Escape `text` against the built-in grammar.
pub fn escape(text: &str) -> String {
    escape::escape(&WIKI_GRAMMAR, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::rules::rule;
    use crate::wiki::token::{Token, TokenKind};

    #[test]
    fn test_builtin_lexer_matches_free_function() {
        let source = "> ''quoted''\nplain";
        let lexer = Lexer::new();
        let a: Vec<Token> = lexer.tokenize(source).collect();
        let b: Vec<Token> = tokenize(source).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_grammar() {
        let sets = HashMap::from([
            (State::Everything, vec![rule(r"\*").enter(State::Strong).into()]),
            (State::Strong, vec![rule(r"\*").leave(1).into()]),
        ]);
        let lexer = Lexer::with_grammar(sets).unwrap();
        let tokens: Vec<Token> = lexer.tokenize_block("a *b* ''c''").collect();
        assert_eq!(
            tokens,
            vec![
                Token::text("a "),
                Token::new(TokenKind::StrongBegin, "*"),
                Token::text("b"),
                Token::new(TokenKind::StrongEnd, "*"),
                Token::text(" ''c''"),
            ]
        );
        assert_eq!(lexer.escape("*x*"), r"\*x\*");
    }

    #[test]
    fn test_rejected_grammar_is_a_lex_error() {
        let sets = HashMap::from([(State::Everything, vec![rule("[").into()])]);
        let err = Lexer::with_grammar(sets).unwrap_err();
        assert!(matches!(err, LexError::Grammar(GrammarError::Pattern { .. })));
        assert!(err.to_string().starts_with("Grammar error: Invalid pattern"));
    }
}
