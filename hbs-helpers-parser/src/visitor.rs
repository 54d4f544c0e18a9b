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

//! Double-dispatch traversal of the syntax tree
//!
//! Every node type implements [`Accept`], which hands the node to the
//! matching [`Visitor`] method. The visitor decides whether to go deeper by
//! calling `accept` on the children it cares about, so different analyses
//! can walk different parts of the tree without the tree knowing about them.
//!
//! ```rust
//! use hbs_helpers_parser::{ast::*, parse, Accept, Visitor};
//!
//! /// Counts content statements at the top level only
//! struct TopLevelContent;
//!
//! impl Visitor for TopLevelContent {
//!     type Output = usize;
//!     fn visit_program(&mut self, node: &Program) -> usize {
//!         node.body.iter().map(|statement| statement.accept(self)).sum()
//!     }
//!     fn visit_content(&mut self, _: &ContentStatement) -> usize { 1 }
//!     fn visit_mustache(&mut self, _: &MustacheStatement) -> usize { 0 }
//!     fn visit_block(&mut self, _: &BlockStatement) -> usize { 0 }
//!     fn visit_partial(&mut self, _: &PartialStatement) -> usize { 0 }
//!     fn visit_comment(&mut self, _: &CommentStatement) -> usize { 0 }
//!     fn visit_expression(&mut self, _: &Expression) -> usize { 0 }
//!     fn visit_sub_expression(&mut self, _: &SubExpression) -> usize { 0 }
//!     fn visit_path(&mut self, _: &PathExpression) -> usize { 0 }
//!     fn visit_string(&mut self, _: &StringLiteral) -> usize { 0 }
//!     fn visit_number(&mut self, _: &NumberLiteral) -> usize { 0 }
//!     fn visit_boolean(&mut self, _: &BooleanLiteral) -> usize { 0 }
//!     fn visit_hash(&mut self, _: &Hash) -> usize { 0 }
//!     fn visit_hash_pair(&mut self, _: &HashPair) -> usize { 0 }
//! }
//!
//! let program = parse("a{{#if x}}b{{/if}}c").unwrap();
//! assert_eq!(program.accept(&mut TopLevelContent), 2);
//! ```

use crate::ast::{
    BlockStatement, BooleanLiteral, CommentStatement, ContentStatement, Expression, Hash,
    HashPair, MustacheStatement, NumberLiteral, PartialStatement, PathExpression, Program,
    Statement, StringLiteral, SubExpression, Value,
};

/// One handler per node kind
pub trait Visitor {
    type Output;

    fn visit_program(&mut self, node: &Program) -> Self::Output;
    fn visit_mustache(&mut self, node: &MustacheStatement) -> Self::Output;
    fn visit_block(&mut self, node: &BlockStatement) -> Self::Output;
    fn visit_partial(&mut self, node: &PartialStatement) -> Self::Output;
    fn visit_content(&mut self, node: &ContentStatement) -> Self::Output;
    fn visit_comment(&mut self, node: &CommentStatement) -> Self::Output;
    fn visit_expression(&mut self, node: &Expression) -> Self::Output;
    fn visit_sub_expression(&mut self, node: &SubExpression) -> Self::Output;
    fn visit_path(&mut self, node: &PathExpression) -> Self::Output;
    fn visit_string(&mut self, node: &StringLiteral) -> Self::Output;
    fn visit_number(&mut self, node: &NumberLiteral) -> Self::Output;
    fn visit_boolean(&mut self, node: &BooleanLiteral) -> Self::Output;
    fn visit_hash(&mut self, node: &Hash) -> Self::Output;
    fn visit_hash_pair(&mut self, node: &HashPair) -> Self::Output;
}

/// Implemented by every node, dispatches to the matching [`Visitor`] handler
pub trait Accept {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output;
}

macro_rules! accept {
    ($($node:ty => $visit:ident),* $(,)?) => {
        $(
            impl Accept for $node {
                fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
                    visitor.$visit(self)
                }
            }
        )*
    };
}

accept! {
    Program => visit_program,
    MustacheStatement => visit_mustache,
    BlockStatement => visit_block,
    PartialStatement => visit_partial,
    ContentStatement => visit_content,
    CommentStatement => visit_comment,
    Expression => visit_expression,
    SubExpression => visit_sub_expression,
    PathExpression => visit_path,
    StringLiteral => visit_string,
    NumberLiteral => visit_number,
    BooleanLiteral => visit_boolean,
    Hash => visit_hash,
    HashPair => visit_hash_pair,
}

impl Accept for Statement {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Statement::Mustache(node) => visitor.visit_mustache(node),
            Statement::Block(node) => visitor.visit_block(node),
            Statement::Partial(node) => visitor.visit_partial(node),
            Statement::Content(node) => visitor.visit_content(node),
            Statement::Comment(node) => visitor.visit_comment(node),
        }
    }
}

impl Accept for Value {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Value::Path(node) => visitor.visit_path(node),
            Value::SubExpression(node) => visitor.visit_sub_expression(node),
            Value::String(node) => visitor.visit_string(node),
            Value::Number(node) => visitor.visit_number(node),
            Value::Boolean(node) => visitor.visit_boolean(node),
        }
    }
}
