//! Template parser
//!
//! This module transforms template text into a syntax tree:
//! - [`lexer`]: Tokenization (template text → tokens), pulled lazily in two modes
//! - [`parser`]: Parsing (tokens → tree), with an explicit stack of open loops
//! - [`ast`]: Tree node definitions and the [`ast::NodeVisitor`] trait
//! - [`writer`]: Canonical re-serialization (tree → template text)
//!
//! # Template Syntax
//!
//! ```text
//! document := (text | tag)*
//! tag      := '{$' (FOR var element element [element] | '=' element* | END) '$}'
//! element  := STRING | INT | DOUBLE | IDENT | '@'FUNCTION | OPERATOR
//! ```
//!
//! Keywords are case-insensitive. Text is everything outside tags; `\\` and
//! `\{` are the only escapes allowed in it.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod writer;
