//! Block tokenizer
//!
//! The inner scanner. It walks a stack of lexical states over one block of
//! source: at each position every rule of the top state is tried in order, the
//! first match emits its tokens and applies its stack action, and characters
//! no rule matches accumulate into a text buffer that is flushed as a single
//! `text` token at the next match or at the end of the block.
//!
//! A backslash escapes the next construct as a whole: whatever the next rule
//! match is, its text is absorbed into the text buffer. A backslash before a
//! plain character, or before a construct that matches nothing, is kept
//! literally, and two backslashes produce one.
//!
//! An empty match that would bring the stack back to a shape it already had
//! at the same position is ignored, so the scanner always moves on.
//!
//! When the block ends inside announced states, their end tokens are emitted
//! with an empty value, innermost first.

use crate::wiki::rules::{Action, Grammar, State};
use crate::wiki::token::{Token, TokenKind};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// One entry of the state stack. `end` is the token emitted when the frame
/// is popped; silent frames have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    end: Option<TokenKind>,
    state: State,
}

impl Frame {
    const BOTTOM: Frame = Frame {
        end: None,
        state: State::Everything,
    };
}

/// Lazily tokenizes one block. Yields tokens until the block is exhausted;
/// does not emit `eof`.
#[derive(Debug)]
pub struct BlockTokenizer<'g> {
    grammar: &'g Grammar,
    source: String,
    pos: usize,
    stack: Vec<Frame>,
    text: String,
    escaped: bool,
    /// Set in escape mode: start offsets of every construct found.
    escapes: Option<Vec<usize>>,
    /// Stacks seen ahead of empty matches at `empty_at`.
    empty_at: usize,
    empty_stacks: Vec<Vec<Frame>>,
    pending: VecDeque<Token>,
    finished: bool,
}

impl<'g> BlockTokenizer<'g> {
    pub fn new(grammar: &'g Grammar, source: impl Into<String>) -> Self {
        BlockTokenizer {
            grammar,
            source: source.into(),
            pos: 0,
            stack: vec![Frame::BOTTOM],
            text: String::new(),
            escaped: false,
            escapes: None,
            empty_at: 0,
            empty_stacks: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// A dry run that treats every construct as escaped and records where
    /// each one starts. Literal backslashes are recorded too. The produced
    /// text equals the source.
    pub(crate) fn escaping(grammar: &'g Grammar, source: impl Into<String>) -> Self {
        BlockTokenizer {
            escapes: Some(Vec::new()),
            ..BlockTokenizer::new(grammar, source)
        }
    }

    /// Offsets recorded in escape mode, in ascending order.
    pub(crate) fn into_escapes(self) -> Vec<usize> {
        self.escapes.unwrap_or_default()
    }

    fn state(&self) -> State {
        self.stack.last().map_or(State::Everything, |frame| frame.state)
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.pending.push_back(Token::text(text));
        }
    }

    /// Record the stack ahead of an empty match. True if an earlier empty match
    /// at the same position started from the same stack, so applying this one
    /// would cycle.
    fn revisits_stack(&mut self) -> bool {
        if self.empty_at != self.pos {
            self.empty_at = self.pos;
            self.empty_stacks.clear();
        }
        if self.empty_stacks.contains(&self.stack) {
            return true;
        }
        self.empty_stacks.push(self.stack.clone());
        false
    }

    /// Advance by one rule match or one character.
    fn step(&mut self) {
        let state = self.state();
        let grammar = self.grammar;
        let found = if self.escapes.is_some() {
            // nothing changes the stack in escape mode, so empty matches would stall
            grammar.expand(state).find_map(|rule| {
                rule.match_at(&self.source, self.pos)
                    .filter(|m| m.end > m.start)
                    .map(|m| (rule, m))
            })
        } else {
            grammar.find_match(state, &self.source, self.pos)
        };
        let cycles = matches!(&found, Some((_, m)) if m.end == m.start) && self.revisits_stack();
        let found = if cycles {
            trace!(target: "wikilex::lexer", %state, pos = self.pos, "empty match cycle");
            None
        } else {
            found
        };
        match found {
            Some((rule, m)) => {
                if self.escaped && m.end == m.start {
                    // nothing to escape
                    self.text.push('\\');
                    self.escaped = false;
                }
                if self.escaped || self.escapes.is_some() {
                    self.text.push_str(&m.text);
                    if let Some(escapes) = &mut self.escapes {
                        escapes.push(m.start);
                    }
                    self.escaped = false;
                    self.pos = m.end;
                    return;
                }

                self.flush_text();

                match rule.action {
                    Action::Stay => {}
                    Action::Enter { state, begin, end } => {
                        trace!(target: "wikilex::lexer", %state, "enter");
                        self.stack.push(Frame {
                            end: Some(end),
                            state,
                        });
                        self.pending.push_back(Token::new(begin, m.text.as_str()));
                    }
                    Action::SilentEnter(state) => {
                        trace!(target: "wikilex::lexer", %state, "enter silently");
                        self.stack.push(Frame { end: None, state });
                    }
                    Action::Switch(state) => {
                        trace!(target: "wikilex::lexer", from = %self.state(), to = %state, "switch");
                        if let Some(top) = self.stack.last_mut() {
                            top.state = state;
                        }
                    }
                }

                self.pending.extend(rule.emitted(&m));
                self.pos = m.end;

                for _ in 0..rule.leave {
                    // the bottom frame is never popped
                    if self.stack.len() <= 1 {
                        break;
                    }
                    if let Some(frame) = self.stack.pop() {
                        trace!(target: "wikilex::lexer", state = %frame.state, "leave");
                        if let Some(end) = frame.end {
                            self.pending.push_back(Token::new(end, m.text.as_str()));
                        }
                    }
                }
            }
            None => {
                let Some(ch) = self.source[self.pos..].chars().next() else {
                    self.pos = self.source.len();
                    return;
                };
                let start = self.pos;
                self.pos += ch.len_utf8();

                if ch == '\\' {
                    if let Some(escapes) = &mut self.escapes {
                        // doubled before a line end it would read as a line break
                        if !ends_line(&self.source[self.pos..]) {
                            escapes.push(start);
                        }
                        self.text.push('\\');
                    } else if self.escaped {
                        self.escaped = false;
                        self.text.push('\\');
                    } else {
                        self.escaped = true;
                    }
                } else {
                    if self.escaped {
                        self.text.push('\\');
                        self.escaped = false;
                    }
                    self.text.push(ch);
                }
            }
        }
    }

    fn finish(&mut self) {
        // a dangling backslash is kept literally
        if self.escaped {
            self.text.push('\\');
            self.escaped = false;
        }
        self.flush_text();

        let unclosed = self.stack.len().saturating_sub(1);
        if unclosed > 0 {
            debug!(
                target: "wikilex::lexer",
                unclosed,
                top = %self.state(),
                "block ended inside open states"
            );
        }
        while let Some(frame) = self.stack.pop() {
            if let Some(end) = frame.end {
                self.pending.push_back(Token::new(end, ""));
            }
        }
        self.finished = true;
    }
}

/// True if only horizontal whitespace is left before the next line break.
fn ends_line(rest: &str) -> bool {
    rest.chars()
        .take_while(|c| *c != '\n')
        .all(char::is_whitespace)
}

impl Iterator for BlockTokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            if self.pos < self.source.len() {
                self.step();
            } else {
                self.finish();
            }
        }
    }
}
