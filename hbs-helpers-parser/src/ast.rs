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

//! Handlebars abstract syntax tree
//!
//! The tree is built once by the parser and never mutated afterwards. Every
//! node owns its children, nothing points back up the tree.
//!
//! ```text
//! {{#each items as |item|}}{{format item "x"}}{{/each}}
//!
//! Program
//! └── BlockStatement
//!     ├── Expression: each [items]
//!     └── Program (block params: item)
//!         └── MustacheStatement
//!             └── Expression: format [item, "x"]
//! ```

use crate::lexer::Position;

/// An ordered sequence of statements, the root of a template and the body
/// of every block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Statement>,
    /// Names declared by the owning block with `as |a b|`
    pub block_params: Vec<String>,
    /// Set on the inverse program of an `{{else if ...}}` chain
    pub chained: bool,
}

/// A node that can appear in the body of a [`Program`]
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Mustache(MustacheStatement),
    Block(BlockStatement),
    Partial(PartialStatement),
    Content(ContentStatement),
    Comment(CommentStatement),
}

/// A node that can appear where a value is expected: the target of an
/// invocation, a parameter or a hash value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Path(PathExpression),
    SubExpression(SubExpression),
    String(StringLiteral),
    Number(NumberLiteral),
    Boolean(BooleanLiteral),
}

/// `{{expression}}`, `{{{expression}}}` or `{{&expression}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MustacheStatement {
    pub expression: Expression,
    /// False for the triple-stash and `&` forms
    pub escaped: bool,
    pub position: Position,
}

/// `{{#expression}}program{{else}}inverse{{/name}}`
///
/// Inverted sections (`{{^expression}}`) swap the two programs, raw blocks
/// (`{{{{expression}}}}`) hold a single content statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub expression: Expression,
    pub program: Program,
    pub inverse: Option<Program>,
    pub position: Position,
    /// Position of the closing tag. For a block chained with `{{else name}}`
    /// this is the tag that ends its section.
    pub close_position: Position,
}

/// `{{> name context key=value}}`
#[derive(Debug, Clone, PartialEq)]
pub struct PartialStatement {
    pub name: Value,
    /// The context argument, the parser guarantees there is at most one
    pub params: Vec<Value>,
    pub hash: Option<Hash>,
    pub position: Position,
}

/// Literal text between tags
#[derive(Debug, Clone, PartialEq)]
pub struct ContentStatement {
    pub value: String,
    pub position: Position,
}

/// `{{! text }}` or `{{!-- text --}}`, with the delimiters removed
#[derive(Debug, Clone, PartialEq)]
pub struct CommentStatement {
    pub value: String,
    pub position: Position,
}

/// An invocation: a target, positional parameters and an optional hash
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub path: Box<Value>,
    pub params: Vec<Value>,
    pub hash: Option<Hash>,
}

impl Expression {
    /// The invoked name as written, e.g. `format` or `math.add`.
    ///
    /// Literal and subexpression targets have no helper name.
    pub fn helper_name(&self) -> Option<&str> {
        match self.path.as_ref() {
            Value::Path(path) => Some(&path.original),
            _ => None,
        }
    }

    /// An invocation with at least one positional parameter is a helper
    /// call, anything else is a plain reference
    pub fn is_helper(&self) -> bool {
        !self.params.is_empty()
    }
}

/// `(expression)` used as a parameter or hash value
#[derive(Debug, Clone, PartialEq)]
pub struct SubExpression {
    pub expression: Expression,
}

/// A dotted or slashed reference such as `user.name`, `../title` or `@index`
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    /// The path as written, including `@`, `this` and `..` segments
    pub original: String,
    /// Segments with `this`, `.` and `..` removed
    pub parts: Vec<String>,
    /// Number of leading `..` segments
    pub depth: usize,
    /// Starts with `@`
    pub data: bool,
    /// Starts with `this`, `.` or `..`
    pub scoped: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    /// The literal as written, `1.50` stays `1.50`
    pub original: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub value: bool,
}

/// `key=value` arguments of an invocation, in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hash {
    pub pairs: Vec<HashPair>,
}

impl Hash {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs.iter().find(|pair| pair.key == key).map(|pair| &pair.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: String,
    pub value: Value,
}
