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

//! Debug rendering of a syntax tree, one statement per line with nested
//! programs indented beneath their block

use crate::{
    ast::{
        BlockStatement, BooleanLiteral, CommentStatement, ContentStatement, Expression, Hash,
        HashPair, MustacheStatement, NumberLiteral, PartialStatement, PathExpression, Program,
        StringLiteral, SubExpression,
    },
    visitor::{Accept, Visitor},
};

const INDENT: &str = "  ";

#[derive(Debug, Default)]
pub struct Printer {
    depth: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, text: &str) -> String {
        format!("{}{}\n", INDENT.repeat(self.depth), text)
    }

    fn nested(&mut self, program: &Program) -> String {
        self.depth += 1;
        let out = program.accept(self);
        self.depth -= 1;
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('\n', "\\n")
}

impl Visitor for Printer {
    type Output = String;

    fn visit_program(&mut self, node: &Program) -> String {
        let mut out = String::new();
        if !node.block_params.is_empty() {
            out += &self.line(&format!("BLOCK PARAMS: [ {} ]", node.block_params.join(" ")));
        }
        for statement in &node.body {
            out += &statement.accept(self);
        }
        out
    }

    fn visit_mustache(&mut self, node: &MustacheStatement) -> String {
        let expression = node.expression.accept(self);
        if node.escaped {
            self.line(&format!("{{{{ {expression} }}}}"))
        } else {
            self.line(&format!("{{{{{{ {expression} }}}}}}"))
        }
    }

    fn visit_block(&mut self, node: &BlockStatement) -> String {
        let mut out = self.line("BLOCK:");
        self.depth += 1;
        let expression = node.expression.accept(self);
        out += &self.line(&expression);
        out += &self.line("PROGRAM:");
        out += &self.nested(&node.program);
        if let Some(inverse) = &node.inverse {
            out += &self.line("{{^}}");
            out += &self.nested(inverse);
        }
        self.depth -= 1;
        out
    }

    fn visit_partial(&mut self, node: &PartialStatement) -> String {
        let mut text = format!("{{{{> PARTIAL:{}", node.name.accept(self));
        for param in &node.params {
            text.push(' ');
            text += &param.accept(self);
        }
        if let Some(hash) = &node.hash {
            text.push(' ');
            text += &hash.accept(self);
        }
        text += " }}";
        self.line(&text)
    }

    fn visit_content(&mut self, node: &ContentStatement) -> String {
        self.line(&format!("CONTENT[ '{}' ]", escape(&node.value)))
    }

    fn visit_comment(&mut self, node: &CommentStatement) -> String {
        self.line(&format!("{{{{! '{}' }}}}", escape(&node.value)))
    }

    fn visit_expression(&mut self, node: &Expression) -> String {
        let params: Vec<String> = node.params.iter().map(|param| param.accept(self)).collect();
        let mut text = format!("{} [{}]", node.path.accept(self), params.join(", "));
        if let Some(hash) = &node.hash {
            text.push(' ');
            text += &hash.accept(self);
        }
        text
    }

    fn visit_sub_expression(&mut self, node: &SubExpression) -> String {
        format!("({})", node.expression.accept(self))
    }

    fn visit_path(&mut self, node: &PathExpression) -> String {
        format!("PATH:{}", node.original)
    }

    fn visit_string(&mut self, node: &StringLiteral) -> String {
        format!("\"{}\"", node.value)
    }

    fn visit_number(&mut self, node: &NumberLiteral) -> String {
        format!("NUMBER{{{}}}", node.original)
    }

    fn visit_boolean(&mut self, node: &BooleanLiteral) -> String {
        format!("BOOLEAN{{{}}}", node.value)
    }

    fn visit_hash(&mut self, node: &Hash) -> String {
        let pairs: Vec<String> = node.pairs.iter().map(|pair| pair.accept(self)).collect();
        format!("HASH{{{}}}", pairs.join(", "))
    }

    fn visit_hash_pair(&mut self, node: &HashPair) -> String {
        format!("{}={}", node.key, node.value.accept(self))
    }
}

pub fn print_ast(program: &Program) -> String {
    program.accept(&mut Printer::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn print(src: &str) -> String {
        print_ast(&parse(src).unwrap())
    }

    #[test]
    fn content_and_mustaches() {
        assert_eq!(
            print("Hi {{name}}!\n{{{raw}}}"),
            "CONTENT[ 'Hi ' ]\n{{ PATH:name [] }}\nCONTENT[ '!\\n' ]\n{{{ PATH:raw [] }}}\n"
        );
    }

    #[test]
    fn literals_and_hash() {
        assert_eq!(
            print(r#"{{fmt "a" 1.50 true key=(up b)}}"#),
            "{{ PATH:fmt [\"a\", NUMBER{1.50}, BOOLEAN{true}] HASH{key=(PATH:up [PATH:b])} }}\n"
        );
    }

    #[test]
    fn block_with_inverse() {
        let expected = "\
BLOCK:
  PATH:each [PATH:items]
  PROGRAM:
    BLOCK PARAMS: [ item ]
    {{ PATH:item.name [] }}
  {{^}}
    CONTENT[ 'none' ]
";
        assert_eq!(
            print("{{#each items as |item|}}{{item.name}}{{else}}none{{/each}}"),
            expected
        );
    }

    #[test]
    fn partial_and_comment() {
        assert_eq!(
            print("{{> card user title=\"x\"}}{{! note }}"),
            "{{> PARTIAL:PATH:card PATH:user HASH{title=\"x\"} }}\n{{! ' note ' }}\n"
        );
    }
}
