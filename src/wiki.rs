//! Main module for the wiki lexer

pub mod lexing;
pub mod rules;
pub mod stream;
pub mod testing;
pub mod token;

pub use lexing::{escape, tokenize, tokenize_block, LexError, Lexer};
pub use stream::{StreamError, TokenStream};
pub use token::{Token, TokenKind, TokenValue};
