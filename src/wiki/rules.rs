//! Rule model
//!
//!     The lexer is driven by a table of rule sets, one per lexical state. A rule binds an
//!     anchored regular expression to an emission and a stack transition; a rule set is an
//!     ordered list of rules and `Include` markers. The table is plain data (see
//!     [grammar](grammar)) and is compiled once into a [Grammar].
//!
//! Rule Order
//!
//!     Rules within a set are tried in declared order and the first match wins. Includes are
//!     expanded textually, left to right and depth first, the first time a state is visited.
//!     The flattened list is cached per state and never changes afterwards.
//!
//! Load Time Validation
//!
//!     A rule whose pattern can match the empty string would stall the scanner unless it
//!     changes the stack, so such rules must switch state or leave at least one frame.
//!     Two such rules still cannot move the scanner: one that only leaves but sits in the
//!     bottom state, and one that switches to the state it already is in. Both are rejected.
//!     Entering a state requires a begin/end token pair for that state. Include cycles are
//!     rejected. All of this is checked by [Grammar::new], never while tokenizing.

pub mod grammar;

use crate::wiki::token::{Token, TokenKind, TokenValue};
use once_cell::sync::{Lazy, OnceCell};
use regex_automata::meta::Regex;
use regex_automata::util::captures::Captures;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// The built-in wiki grammar, compiled on first use.
pub static WIKI_GRAMMAR: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new(grammar::wiki_rule_sets()).expect("built-in wiki grammar is valid")
});

macro_rules! states {
    ($($variant:ident => $name:literal,)*) => {
        /// Lexical states. Each names one rule set.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum State {
            $($variant,)*
        }

        impl State {
            pub const ALL: &'static [State] = &[$(State::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(State::$variant => $name,)*
                }
            }
        }
    };
}

states! {
    Everything => "everything",
    InlineWithLinks => "inline_with_links",
    Block => "block",
    Inline => "inline",
    Links => "links",
    Metadata => "metadata",
    Conflict => "conflict",
    Headline => "headline",
    Definition => "definition",
    Strong => "strong",
    Emphasized => "emphasized",
    EscapedCode => "escaped_code",
    Code => "code",
    Underline => "underline",
    Stroke => "stroke",
    Small => "small",
    Big => "big",
    Sub => "sub",
    Sup => "sup",
    Footnote => "footnote",
    ListItem => "list_item",
    Color => "color",
    Size => "size",
    Font => "font",
    WikiLink => "wiki_link",
    ExternalLink => "external_link",
    Pre => "pre",
    ParserArguments => "parser_arguments",
    ParserData => "parser_data",
    TableRow => "table_row",
    TableDef => "table_def",
    TableContents => "table_contents",
    Box => "box",
    BoxDef => "box_def",
    BoxContents => "box_contents",
    Macro => "macro",
    MacroArguments => "macro_arguments",
    FunctionCall => "function_call",
}

impl State {
    /// The `<name>_begin` / `<name>_end` pair announced when this state is entered,
    /// or `None` for states that are only ever switched to or included.
    pub fn announce(self) -> Option<(TokenKind, TokenKind)> {
        use TokenKind::*;
        let pair = match self {
            State::Metadata => (MetadataBegin, MetadataEnd),
            State::Conflict => (ConflictBegin, ConflictEnd),
            State::Headline => (HeadlineBegin, HeadlineEnd),
            State::Definition => (DefinitionBegin, DefinitionEnd),
            State::Strong => (StrongBegin, StrongEnd),
            State::Emphasized => (EmphasizedBegin, EmphasizedEnd),
            State::EscapedCode => (EscapedCodeBegin, EscapedCodeEnd),
            State::Code => (CodeBegin, CodeEnd),
            State::Underline => (UnderlineBegin, UnderlineEnd),
            State::Stroke => (StrokeBegin, StrokeEnd),
            State::Small => (SmallBegin, SmallEnd),
            State::Big => (BigBegin, BigEnd),
            State::Sub => (SubBegin, SubEnd),
            State::Sup => (SupBegin, SupEnd),
            State::Footnote => (FootnoteBegin, FootnoteEnd),
            State::ListItem => (ListItemBegin, ListItemEnd),
            State::Color => (ColorBegin, ColorEnd),
            State::Size => (SizeBegin, SizeEnd),
            State::Font => (FontBegin, FontEnd),
            State::WikiLink => (WikiLinkBegin, WikiLinkEnd),
            State::ExternalLink => (ExternalLinkBegin, ExternalLinkEnd),
            State::Pre => (PreBegin, PreEnd),
            State::TableRow => (TableRowBegin, TableRowEnd),
            State::Box => (BoxBegin, BoxEnd),
            State::Macro => (MacroBegin, MacroEnd),
            State::MacroArguments => (MacroArgumentsBegin, MacroArgumentsEnd),
            _ => return None,
        };
        Some(pair)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a rule emits when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Nothing,
    /// One token carrying the whole matched text.
    Single(TokenKind),
    /// One token per regex group, paired up in order.
    Grouped(&'static [TokenKind]),
    /// One token carrying all groups as a tuple.
    Tuple(TokenKind),
    /// Keyword equivalence inside function calls: group 1 is a logical
    /// keyword, emitted as text holding the lower-cased operator.
    Operator,
}

/// The stack transition of a rule. At most one is possible per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    /// Push the state and announce it with `<name>_begin`.
    Enter(State),
    /// Push the state without begin/end tokens.
    SilentEnter(State),
    /// Replace the top of stack, keeping the frame's announce token.
    Switch(State),
}

/// Uncompiled rule as written in a rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSpec {
    pub pattern: &'static str,
    pub emit: Emit,
    pub transition: Transition,
    pub leave: usize,
}

impl RuleSpec {
    pub const fn new(pattern: &'static str) -> Self {
        RuleSpec {
            pattern,
            emit: Emit::Nothing,
            transition: Transition::Stay,
            leave: 0,
        }
    }

    pub const fn token(self, kind: TokenKind) -> Self {
        self.emit(Emit::Single(kind))
    }

    pub const fn emit(mut self, emit: Emit) -> Self {
        self.emit = emit;
        self
    }

    pub const fn enter(mut self, state: State) -> Self {
        self.transition = Transition::Enter(state);
        self
    }

    pub const fn silent_enter(mut self, state: State) -> Self {
        self.transition = Transition::SilentEnter(state);
        self
    }

    pub const fn switch(mut self, state: State) -> Self {
        self.transition = Transition::Switch(state);
        self
    }

    pub const fn leave(mut self, frames: usize) -> Self {
        self.leave = frames;
        self
    }
}

/// A rule set entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Rule(RuleSpec),
    Include(State),
}

/// Shorthand for a rule entry.
pub const fn rule(pattern: &'static str) -> RuleSpec {
    RuleSpec::new(pattern)
}

/// Pops one frame and does nothing else.
pub const fn fallback() -> Entry {
    Entry::Rule(RuleSpec::new("").leave(1))
}

/// Switches to another state without consuming input.
pub const fn switch(state: State) -> Entry {
    Entry::Rule(RuleSpec::new("").switch(state))
}

impl From<RuleSpec> for Entry {
    fn from(spec: RuleSpec) -> Self {
        Entry::Rule(spec)
    }
}

/// Errors raised while compiling a rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// The pattern is not a valid regular expression.
    Pattern {
        state: State,
        pattern: String,
        message: String,
    },
    /// The pattern can match nothing, and the rule neither switches nor leaves.
    EmptyMatch { state: State, pattern: String },
    /// The rule enters a state that has no begin/end token pair.
    Unannounced { state: State, target: State },
    /// A rule set includes itself, directly or indirectly.
    IncludeCycle { state: State },
    /// The pattern can match nothing, and its stack action is a no-op in `state`.
    Stall { state: State, pattern: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Pattern {
                state,
                pattern,
                message,
            } => write!(
                f,
                "Invalid pattern {:?} in state '{}': {}",
                pattern, state, message
            ),
            GrammarError::EmptyMatch { state, pattern } => write!(
                f,
                "Pattern {:?} in state '{}' can match the empty string but neither switches nor leaves",
                pattern, state
            ),
            GrammarError::Unannounced { state, target } => write!(
                f,
                "State '{}' enters '{}', which has no begin/end tokens",
                state, target
            ),
            GrammarError::IncludeCycle { state } => {
                write!(f, "Rule set '{}' includes itself", state)
            }
            GrammarError::Stall { state, pattern } => write!(
                f,
                "Pattern {:?} can match the empty string but leaves the stack of '{}' unchanged",
                pattern, state
            ),
        }
    }
}

impl std::error::Error for GrammarError {}

/// Compiled stack transition, with announce tokens resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Stay,
    Enter {
        state: State,
        begin: TokenKind,
        end: TokenKind,
    },
    SilentEnter(State),
    Switch(State),
}

/// A rule with its pattern compiled.
#[derive(Debug)]
pub struct CompiledRule {
    regex: Regex,
    pattern: &'static str,
    may_match_empty: bool,
    pub(crate) emit: Emit,
    pub(crate) action: Action,
    pub(crate) leave: usize,
}

/// A successful rule match, detached from the haystack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Capture groups 1.., `None` where a group did not participate.
    pub groups: Vec<Option<String>>,
}

impl CompiledRule {
    fn compile(state: State, spec: &RuleSpec) -> Result<Self, GrammarError> {
        let pattern_error = |message: String| GrammarError::Pattern {
            state,
            pattern: spec.pattern.to_string(),
            message,
        };
        let hir = syntax::parse(spec.pattern).map_err(|e| pattern_error(e.to_string()))?;
        let may_match_empty = hir.properties().minimum_len() == Some(0);
        let changes_stack = spec.leave > 0 || matches!(spec.transition, Transition::Switch(_));
        if may_match_empty && !changes_stack {
            return Err(GrammarError::EmptyMatch {
                state,
                pattern: spec.pattern.to_string(),
            });
        }

        let regex = Regex::new(spec.pattern).map_err(|e| pattern_error(e.to_string()))?;
        let action = match spec.transition {
            Transition::Stay => Action::Stay,
            Transition::Enter(target) => {
                let (begin, end) = target
                    .announce()
                    .ok_or(GrammarError::Unannounced { state, target })?;
                Action::Enter {
                    state: target,
                    begin,
                    end,
                }
            }
            Transition::SilentEnter(target) => Action::SilentEnter(target),
            Transition::Switch(target) => Action::Switch(target),
        };

        Ok(CompiledRule {
            regex,
            pattern: spec.pattern,
            may_match_empty,
            emit: spec.emit,
            action,
            leave: spec.leave,
        })
    }

    /// Match this rule anchored at `pos`. Look-behind assertions such as `^` and
    /// `\b` are evaluated against the whole haystack.
    pub fn match_at(&self, haystack: &str, pos: usize) -> Option<RuleMatch> {
        let input = Input::new(haystack).range(pos..).anchored(Anchored::Yes);
        let span = self.regex.search(&input)?.span();
        let groups = if self.regex.captures_len() > 1 {
            let mut caps = self.regex.create_captures();
            self.regex.search_captures(&input, &mut caps);
            groups(&caps, haystack)
        } else {
            Vec::new()
        };
        Some(RuleMatch {
            start: span.start,
            end: span.end,
            text: haystack[span.range()].to_string(),
            groups,
        })
    }

    /// True if matching nothing in `state` would leave the stack as it was.
    fn stalls_in(&self, state: State) -> bool {
        if !self.may_match_empty {
            return false;
        }
        match self.action {
            Action::Switch(target) => target == state && self.leave == 0,
            Action::Stay => state == State::Everything,
            _ => false,
        }
    }

    /// The tokens this rule emits for a match.
    pub fn emitted(&self, m: &RuleMatch) -> Vec<Token> {
        match self.emit {
            Emit::Nothing => Vec::new(),
            Emit::Single(kind) => vec![Token::new(kind, m.text.as_str())],
            Emit::Grouped(kinds) => kinds
                .iter()
                .zip(&m.groups)
                .map(|(kind, group)| Token::new(*kind, group.as_deref()))
                .collect(),
            Emit::Tuple(kind) => vec![Token::new(kind, TokenValue::Tuple(m.groups.clone()))],
            Emit::Operator => m
                .groups
                .first()
                .and_then(|group| group.as_deref())
                .and_then(logical_operator)
                .map(|operator| vec![Token::text(operator)])
                .unwrap_or_default(),
        }
    }
}

fn groups(caps: &Captures, haystack: &str) -> Vec<Option<String>> {
    (1..caps.group_len())
        .map(|i| {
            caps.get_group(i)
                .map(|span| haystack[span.range()].to_string())
        })
        .collect()
}

/// Maps a logical keyword, German or English, to its operator.
pub fn logical_operator(keyword: &str) -> Option<&'static str> {
    match keyword {
        "AND" | "UND" => Some("and"),
        "OR" | "ODER" => Some("or"),
        "NOT" | "NICHT" => Some("not"),
        _ => None,
    }
}

/// A compiled registry of rule sets.
///
/// Read-only once built; the per-state expansion cache fills lazily and is safe to
/// share between threads.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<CompiledRule>,
    sets: Vec<Vec<CompiledEntry>>,
    expansions: Vec<OnceCell<Vec<usize>>>,
}

#[derive(Debug, Clone, Copy)]
enum CompiledEntry {
    Rule(usize),
    Include(State),
}

impl Grammar {
    /// Compile rule sets. States without a set behave as empty sets: every
    /// character becomes text.
    pub fn new(rule_sets: HashMap<State, Vec<Entry>>) -> Result<Self, GrammarError> {
        let mut rules = Vec::new();
        let mut sets = vec![Vec::new(); State::ALL.len()];

        for state in State::ALL {
            let Some(entries) = rule_sets.get(state) else {
                continue;
            };
            for entry in entries {
                let compiled = match entry {
                    Entry::Rule(spec) => {
                        rules.push(CompiledRule::compile(*state, spec)?);
                        CompiledEntry::Rule(rules.len() - 1)
                    }
                    Entry::Include(included) => CompiledEntry::Include(*included),
                };
                sets[state.index()].push(compiled);
            }
        }

        let grammar = Grammar {
            rules,
            sets,
            expansions: State::ALL.iter().map(|_| OnceCell::new()).collect(),
        };
        for state in State::ALL {
            grammar.check_includes(*state, &mut Vec::new())?;
        }
        for state in State::ALL {
            if let Some(rule) = grammar.expand(*state).find(|rule| rule.stalls_in(*state)) {
                return Err(GrammarError::Stall {
                    state: *state,
                    pattern: rule.pattern.to_string(),
                });
            }
        }
        debug!(
            target: "wikilex::lexer",
            rules = grammar.rules.len(),
            states = State::ALL.len(),
            "compiled wiki grammar"
        );
        Ok(grammar)
    }

    fn check_includes(&self, state: State, path: &mut Vec<State>) -> Result<(), GrammarError> {
        if path.contains(&state) {
            return Err(GrammarError::IncludeCycle { state });
        }
        path.push(state);
        for entry in &self.sets[state.index()] {
            if let CompiledEntry::Include(included) = entry {
                self.check_includes(*included, path)?;
            }
        }
        path.pop();
        Ok(())
    }

    /// The flattened rules of a state, includes resolved, in match order.
    pub fn expand(&self, state: State) -> impl Iterator<Item = &CompiledRule> {
        self.expansions[state.index()]
            .get_or_init(|| {
                let mut flat = Vec::new();
                self.flatten_into(state, &mut flat);
                flat
            })
            .iter()
            .map(move |i| &self.rules[*i])
    }

    fn flatten_into(&self, state: State, flat: &mut Vec<usize>) {
        for entry in &self.sets[state.index()] {
            match entry {
                CompiledEntry::Rule(i) => flat.push(*i),
                CompiledEntry::Include(included) => self.flatten_into(*included, flat),
            }
        }
    }

    /// Try the rules of `state` at `pos`; the first match wins.
    pub fn find_match(&self, state: State, haystack: &str, pos: usize) -> Option<(&CompiledRule, RuleMatch)> {
        self.expand(state)
            .find_map(|rule| rule.match_at(haystack, pos).map(|m| (rule, m)))
    }
}
