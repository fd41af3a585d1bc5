//! # wikilex
//!
//! A lexer for MoinMoin-style wiki markup. It turns a document into a flat
//! stream of typed tokens for a downstream parser: inline styles, headlines,
//! lists, tables, boxes, links, macros and pre blocks, nested through a stack
//! of lexical states, with quotes resolved line by line around it.
//!
//! ## Testing
//!
//! Token assertions for unit and integration tests live in the
//! [testing module](wiki::testing).

pub mod wiki;
