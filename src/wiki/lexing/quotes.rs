//! Quote and fence resolution
//!
//! The outer pass. Lines are grouped by quote depth (`>`, `>>`, ...) and each
//! group is handed to the [BlockTokenizer](super::block::BlockTokenizer) on its
//! own, bracketed by `quote_begin` / `quote_end`. Broken markup inside a quote
//! therefore cannot leak into the surrounding text.
//!
//! Fenced pre blocks (`{{{` ... `}}}` at the start of a line) are opaque here:
//! while one is open, lines go to the buffer untouched, so a `>` inside a pre
//! block is never read as a quote.

use super::block::BlockTokenizer;
use crate::wiki::rules::Grammar;
use crate::wiki::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::str::Lines;
use tracing::trace;

static QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(>+) ?").unwrap());
static FENCE_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{\{").unwrap());
static FENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\}\}\}\s*$").unwrap());

/// Lazily tokenizes a whole document. Does not emit `eof`; wrap it in a
/// [TokenStream](crate::wiki::stream::TokenStream) for that.
#[derive(Debug)]
pub struct Tokenizer<'a, 'g> {
    grammar: &'g Grammar,
    lines: Lines<'a>,
    buffer: Vec<&'a str>,
    /// Open quote depths; the bottom entry is the unquoted level 0.
    depths: Vec<usize>,
    /// Parallel to `depths`: whether a fence is open at that level.
    open_fences: Vec<bool>,
    block: Option<BlockTokenizer<'g>>,
    pending: VecDeque<Token>,
    finished: bool,
}

impl<'a, 'g> Tokenizer<'a, 'g> {
    pub fn new(grammar: &'g Grammar, source: &'a str) -> Self {
        Tokenizer {
            grammar,
            lines: source.lines(),
            buffer: Vec::new(),
            depths: vec![0],
            open_fences: vec![false],
            block: None,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn depth(&self) -> usize {
        self.depths.last().copied().unwrap_or(0)
    }

    /// Hand the buffered lines to a fresh block tokenizer.
    fn flush(&mut self) {
        let source = self.buffer.join("\n");
        self.buffer.clear();
        self.block = Some(BlockTokenizer::new(self.grammar, source));
    }

    fn feed(&mut self, line: &'a str) {
        let fence_open = self.open_fences.last().copied().unwrap_or(false);

        if !fence_open && FENCE_START_RE.is_match(line) {
            self.set_fence(true);
        } else if fence_open && FENCE_END_RE.is_match(line) {
            self.set_fence(false);
        } else if !fence_open {
            let (level, rest) = match QUOTE_RE.captures(line) {
                Some(caps) => {
                    let prefix_len = caps.get(0).map_or(0, |m| m.end());
                    let level = caps.get(1).map_or(0, |m| m.as_str().len());
                    (level, &line[prefix_len..])
                }
                None => (0, line),
            };

            let depth = self.depth();
            if level > depth {
                self.flush();
                for new_level in depth + 1..=level {
                    trace!(target: "wikilex::lexer", depth = new_level, "quote opened");
                    self.depths.push(new_level);
                    self.open_fences.push(false);
                    self.pending.push_back(Token::bare(TokenKind::QuoteBegin));
                }
            } else if level < depth {
                self.flush();
                for _ in level..depth {
                    self.depths.pop();
                    self.open_fences.pop();
                    self.pending.push_back(Token::bare(TokenKind::QuoteEnd));
                }
                trace!(target: "wikilex::lexer", depth = level, "quote closed");
            }
            self.buffer.push(rest);
            return;
        }

        self.buffer.push(line);
    }

    fn set_fence(&mut self, open: bool) {
        if let Some(top) = self.open_fences.last_mut() {
            *top = open;
        }
    }

    fn finish(&mut self) {
        self.flush();
        while let Some(depth) = self.depths.pop() {
            self.open_fences.pop();
            if depth > 0 {
                self.pending.push_back(Token::bare(TokenKind::QuoteEnd));
            }
        }
        self.finished = true;
    }
}

impl Iterator for Tokenizer<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            // block tokens precede the quote brackets queued with them
            if let Some(block) = &mut self.block {
                match block.next() {
                    Some(token) => return Some(token),
                    None => self.block = None,
                }
            }
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            match self.lines.next() {
                Some(line) => self.feed(line),
                None => self.finish(),
            }
        }
    }
}
