// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Handlebars template lexer, parser and helper analysis
//!
//! This crate turns Handlebars template source into a syntax tree and walks
//! that tree to find out which helpers the template calls. It is used by the
//! `hbs-helpers` macros at compile time and by the `hbs-helpers` binary.
//!
//! # Features
//!
//! - Tokenization of content, mustaches, blocks, partials, comments and raw blocks
//! - A recursive-descent parser producing an owned syntax tree
//! - Block name matching with the positions of both tags in errors
//! - A visitor interface for writing new analyses over the tree
//! - Helper collection: every invocation with at least one positional parameter
//!
//! # Example
//!
//! ```rust
//! use hbs_helpers_parser::helpers;
//!
//! let found = helpers(r#"{{#each items}}{{format this "x"}}{{/each}}"#).unwrap();
//! assert_eq!(found, vec!["each", "format"]);
//! ```
//!
//! # Module Structure
//!
//! - `lexer.rs`: Tokenization and source positions
//! - `ast.rs`: Syntax tree node types
//! - `parser.rs`: Recursive-descent parser
//! - `visitor.rs`: Visitor and accept traits
//! - `helpers.rs`: Helper collection pass
//! - `printer.rs`: Debug rendering of a syntax tree
//! - `error.rs`: Error types and handling

pub mod ast;
pub mod error;
pub mod helpers;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod visitor;

pub use error::{ErrorKind, ParseError, Result};
pub use helpers::{HelperCollector, collect_helpers, helpers};
pub use lexer::{Lexer, Position, Token, TokenKind, tokenize};
pub use parser::{MAX_DEPTH, Parser, parse};
pub use printer::{Printer, print_ast};
pub use visitor::{Accept, Visitor};
