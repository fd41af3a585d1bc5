//! Escaping text for verbatim display
//!
//! Inserts a backslash before every construct the lexer would recognise, and
//! doubles literal backslashes, so that lexing the result yields the input as
//! plain text. The markup is found with a dry run of the block tokenizer over
//! the same grammar, so the set of escaped constructs can never drift from the
//! set of recognised ones.

use super::block::BlockTokenizer;
use crate::wiki::rules::Grammar;

/// Escape `text` against `grammar`. Lines are rejoined with `\n`.
///
/// See [Lexer::escape](crate::wiki::Lexer::escape) for which constructs
/// survive a round trip.
pub fn escape(grammar: &Grammar, text: &str) -> String {
    let source = text.lines().collect::<Vec<_>>().join("\n");

    let mut tokenizer = BlockTokenizer::escaping(grammar, source.as_str());
    tokenizer.by_ref().for_each(drop);
    let offsets = tokenizer.into_escapes();

    let mut escaped = String::with_capacity(source.len() + offsets.len());
    let mut last = 0;
    for offset in offsets {
        escaped.push_str(&source[last..offset]);
        escaped.push('\\');
        last = offset;
    }
    escaped.push_str(&source[last..]);
    escaped
}
