//! The wiki rule table
//!
//! One rule set per [State]. Patterns are matched anchored at the scan position;
//! `(?m)` makes `^` and `$` line based, which the block level constructs rely on.

use super::{fallback, rule, switch, Emit, Entry, State};
use crate::wiki::token::TokenKind::*;
use std::collections::HashMap;

/// The URL schemes recognized in links. Kept short on purpose: every scheme
/// listed here can clash with an interwiki prefix.
macro_rules! url_pattern {
    () => {
        concat!(
            // with netloc
            r"(?:(?:https?|ftps?|file|ssh|mms|svn(?:\+ssh)?|git|dict|nntp|irc|rsync|smb)://|",
            // without netloc
            r"(?:mailto|telnet|s?news|sips?|skype):)",
        )
    };
}

/// Quoted string arguments, with backslash escapes inside the quotes.
const STRING_ARG: &str = r#"(?s)('([^'\\]*(?:\\.[^'\\]*)*)'|"([^"\\]*(?:\\.[^"\\]*)*)")"#;

const WIKI_LINK: &str = r"\[\s*([^:\]]+?)?\s*:\s*((?:::|[^:])*)\s*:\s*";

pub fn wiki_rule_sets() -> HashMap<State, Vec<Entry>> {
    use Entry::Include;
    use State::*;

    HashMap::from([
        (
            Everything,
            vec![Include(Block), Include(Inline), Include(Links)],
        ),
        (InlineWithLinks, vec![Include(Inline), Include(Links)]),
        (
            Block,
            vec![
                rule(r"(?m)^##.*?(\n|$)").into(),
                rule(r"(?m)^#\s*(.*?)\s*:\s*")
                    .emit(Emit::Grouped(&[MetadataKey]))
                    .enter(Metadata)
                    .into(),
                rule(r"(?m)^={1,5}\s*").enter(Headline).into(),
                rule(r"(?m)^\s+(.*?)::\s+")
                    .emit(Emit::Grouped(&[DefinitionTerm]))
                    .enter(Definition)
                    .into(),
                rule(r"(?m)^\|\|").enter(TableRow).into(),
                rule(r"(?m)^[ \t]+(?:[*-]|[01aAiI]\.)\s*")
                    .enter(ListItem)
                    .into(),
                rule(r"\{\{\|").enter(Box).into(),
                rule(r"\{\{\{").enter(Pre).into(),
                rule(r"(?m)^<{40}\s*$").enter(Conflict).into(),
                rule(r"(?m)^----+\s*(\n|$)").token(Ruler).into(),
            ],
        ),
        (
            Inline,
            vec![
                rule(r"\\\\[^\S\n]*(\n|$)").token(Newline).into(),
                rule(r"(?s)<!--.*?-->").into(),
                rule("'''").enter(Strong).into(),
                rule("''").enter(Emphasized).into(),
                rule("``").enter(EscapedCode).into(),
                rule("`").enter(Code).into(),
                rule("__").enter(Underline).into(),
                rule(r"--\(").enter(Stroke).into(),
                rule("~-").enter(Small).into(),
                rule(r"~\+").enter(Big).into(),
                rule(",,").enter(Sub).into(),
                rule(r"\^\^").enter(Sup).into(),
                rule(r"\(\(").enter(Footnote).into(),
                rule(r"\[\[([\w_]+)")
                    .emit(Emit::Grouped(&[MacroName]))
                    .enter(Macro)
                    .into(),
                rule(r"\[color\s*=\s*(.*?)\s*\]")
                    .emit(Emit::Grouped(&[ColorValue]))
                    .enter(Color)
                    .into(),
                rule(r"\[size\s*=\s*(.*?)\s*\]")
                    .emit(Emit::Grouped(&[FontSize]))
                    .enter(Size)
                    .into(),
                rule(r"\[font\s*=\s*(.*?)\s*\]")
                    .emit(Emit::Grouped(&[FontFace]))
                    .enter(Font)
                    .into(),
            ],
        ),
        (
            Links,
            vec![
                rule(r"\[\s*(\d+)\s*\]")
                    .emit(Emit::Grouped(&[Sourcelink]))
                    .into(),
                rule(concat!(r"(\[\s*)((?:", url_pattern!(), r"|\?|#)\S+)(\s*\])"))
                    .emit(Emit::Grouped(&[ExternalLinkBegin, LinkTarget, ExternalLinkEnd]))
                    .into(),
                rule(concat!(r"\[((?:", url_pattern!(), r"|\?).*?)\s+"))
                    .emit(Emit::Grouped(&[LinkTarget]))
                    .enter(ExternalLink)
                    .into(),
                rule(WIKI_LINK)
                    .emit(Emit::Tuple(LinkTarget))
                    .enter(WikiLink)
                    .into(),
                rule(concat!(
                    url_pattern!(),
                    r"[^\s/]+(/[^\s.,:;?]*([.,:;?][^\s.,:;?]+)*)?"
                ))
                .token(FreeLink)
                .into(),
            ],
        ),
        (
            Metadata,
            vec![
                rule(r"(?m)\s*(\n|$)").leave(1).into(),
                rule(r"\s*,\s*").token(FuncArgumentDelimiter).into(),
                rule(STRING_ARG).token(FuncStringArg).into(),
            ],
        ),
        (
            Conflict,
            vec![
                rule(r"(?m)^={40}\s*$").token(ConflictSwitch).into(),
                rule(r"(?m)^>{40}\s*$").leave(1).into(),
                Include(Everything),
            ],
        ),
        // arbitrary markup is allowed in headlines
        (
            Headline,
            vec![
                rule(r"(?m)\s*=+\s*$").leave(1).into(),
                Include(InlineWithLinks),
            ],
        ),
        (
            Definition,
            vec![rule(r"(?m)(\n|$)").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Strong,
            vec![rule("'''").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Emphasized,
            vec![rule("''").leave(1).into(), Include(InlineWithLinks)],
        ),
        (EscapedCode, vec![rule("``").leave(1).into()]),
        (Code, vec![rule("`").leave(1).into()]),
        (
            Underline,
            vec![rule("__").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Stroke,
            vec![rule(r"\)--").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Small,
            vec![rule("-~").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Big,
            vec![rule(r"\+~").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Sub,
            vec![rule(",,").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Sup,
            vec![rule(r"\^\^").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Footnote,
            vec![rule(r"\)\)").leave(1).into(), Include(Everything)],
        ),
        (
            ListItem,
            vec![rule(r"(?m)(\n|$)").leave(1).into(), Include(Everything)],
        ),
        (
            Color,
            vec![rule(r"\[/color\]").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Size,
            vec![rule(r"\[/size\]").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            Font,
            vec![rule(r"\[/font\]").leave(1).into(), Include(InlineWithLinks)],
        ),
        (
            WikiLink,
            vec![rule(r"\s*\]").leave(1).into(), Include(Inline)],
        ),
        (
            ExternalLink,
            vec![rule(r"\s*\]").leave(1).into(), Include(Inline)],
        ),
        // a pre block, optionally handed to a parser with arguments
        (
            Pre,
            vec![
                rule(r"\n?#!([\w_]+)")
                    .emit(Emit::Grouped(&[ParserBegin]))
                    .switch(ParserArguments)
                    .into(),
                switch(ParserData),
            ],
        ),
        (
            ParserArguments,
            vec![
                rule(r"(?m)$").token(ParserEnd).switch(ParserData).into(),
                rule(r"[^\S\n]+").into(),
                Include(FunctionCall),
            ],
        ),
        (
            ParserData,
            vec![rule(r"(?m)^\}\}\}\s*$").leave(1).into()],
        ),
        (
            TableRow,
            vec![
                rule(r"\s*<").token(TableDefBegin).switch(TableDef).into(),
                switch(TableContents),
            ],
        ),
        (
            TableDef,
            vec![
                rule(">").token(TableDefEnd).switch(TableContents).into(),
                Include(FunctionCall),
            ],
        ),
        (
            TableContents,
            vec![
                rule(r"(?m)\|\|\s*?(\n|$)").leave(1).into(),
                rule(r"\|\|").token(TableColSwitch).switch(TableRow).into(),
                Include(Everything),
            ],
        ),
        // a box works like a single table cell
        (
            Box,
            vec![
                rule(r"\s*<").token(BoxDefBegin).switch(BoxDef).into(),
                switch(BoxContents),
            ],
        ),
        (
            BoxDef,
            vec![
                rule(">").token(BoxDefEnd).switch(BoxContents).into(),
                Include(FunctionCall),
            ],
        ),
        (
            BoxContents,
            vec![
                rule(r"(?m)^\|\}\}\s*$").leave(1).into(),
                Include(Everything),
            ],
        ),
        // Waits for the argument list; anything unexpected closes the macro.
        (
            Macro,
            vec![
                rule(r"\s+").into(),
                rule(r"\]\]").leave(1).into(),
                rule(r"\(").silent_enter(MacroArguments).into(),
                fallback(),
            ],
        ),
        // Only entered from `macro`, so `)]]` closes both frames.
        (
            MacroArguments,
            vec![rule(r"\)\s*\]\]").leave(2).into(), Include(FunctionCall)],
        ),
        (
            FunctionCall,
            vec![
                rule(",").token(FuncArgumentDelimiter).into(),
                rule(r"\s+").into(),
                rule(STRING_ARG).token(FuncStringArg).into(),
                rule(r"([\w_]+)\s*=")
                    .emit(Emit::Grouped(&[FuncKwarg]))
                    .into(),
                rule(r"\b(AND|OR|NOT|UND|ODER|NICHT)\b")
                    .emit(Emit::Operator)
                    .into(),
            ],
        ),
    ])
}
