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

//! Handlebars template parsing
//!
//! A recursive-descent parser over the token stream produced by the
//! [`Lexer`]. It builds a single root [`Program`] or stops at the first
//! problem it finds, there is no error recovery.
//!
//! # Grammar
//!
//! ```text
//! program   := statement*
//! statement := mustache | block | raw_block | partial | CONTENT | COMMENT
//! mustache  := OPEN expr CLOSE | OPEN_UNESCAPED expr CLOSE_UNESCAPED
//! block     := OPEN_BLOCK expr block_params? CLOSE program inverse? close
//!            | OPEN_INVERSE expr block_params? CLOSE program (INVERSE program)? close
//! inverse   := INVERSE program
//!            | OPEN_INVERSE_CHAIN expr block_params? CLOSE program inverse?
//! close     := OPEN_END_BLOCK callee CLOSE
//! raw_block := OPEN_RAW_BLOCK expr CLOSE_RAW_BLOCK CONTENT? END_RAW_BLOCK
//! partial   := OPEN_PARTIAL (callee | sexpr) param? hash? CLOSE
//! expr      := callee param* hash?
//! callee    := path | STRING | NUMBER | BOOLEAN
//! param     := callee | sexpr
//! sexpr     := OPEN_SEXPR expr CLOSE_SEXPR
//! hash      := (ID EQUALS param)+
//! path      := DATA? ID (SEP ID)*
//! ```

use std::collections::VecDeque;

use log::debug;

use crate::{
    ast::{
        BlockStatement, BooleanLiteral, CommentStatement, ContentStatement, Expression, Hash,
        HashPair, MustacheStatement, NumberLiteral, PartialStatement, PathExpression, Program,
        Statement, StringLiteral, SubExpression, Value,
    },
    error::{ParseError, Result},
    lexer::{Lexer, Position, Token, TokenKind},
};

/// Describes a token for error messages
fn describe(token: Option<&Token<'_>>) -> String {
    match token {
        None => "end of input".to_string(),
        Some(token) if token.kind == TokenKind::Eof => "end of input".to_string(),
        Some(token) => format!("'{}'", token.value),
    }
}

/// Removes the `{{!`, `{{!--`, `--}}` and `}}` delimiters from a comment
fn strip_comment(raw: &str) -> String {
    let text = raw.strip_prefix("{{").unwrap_or(raw);
    let text = text.strip_prefix('~').unwrap_or(text);
    let text = text.strip_prefix('!').unwrap_or(text);
    let (text, long) = match text.strip_prefix("--") {
        Some(text) => (text, true),
        None => (text, false),
    };
    let text = text.strip_suffix("}}").unwrap_or(text);
    let text = text.strip_suffix('~').unwrap_or(text);
    let text = if long {
        text.strip_suffix("--").unwrap_or(text)
    } else {
        text
    };
    text.to_string()
}

/// Strips the brackets of a `[segment literal]`, reporting whether it had them
fn segment(value: &str) -> (&str, bool) {
    match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(inner) => (inner, true),
        None => (value, false),
    }
}

/// The name a block was opened or closed with, used to match the two
fn block_name(value: &Value) -> String {
    match value {
        Value::Path(path) => path.original.clone(),
        Value::String(literal) => literal.value.clone(),
        Value::Number(literal) => literal.original.clone(),
        Value::Boolean(literal) => literal.value.to_string(),
        Value::SubExpression(_) => String::new(),
    }
}

fn starts_param(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Id
            | TokenKind::Data
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::Boolean
            | TokenKind::OpenSexpr
    )
}

/// Blocks, `{{else name}}` sections and subexpressions nested deeper than
/// this are rejected with a syntax error
pub const MAX_DEPTH: usize = 128;

/// Parser state: the lexer, a small lookahead buffer and the current nesting
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token<'a>>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            lookahead: VecDeque::new(),
            depth: 0,
        }
    }

    /// Runs `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            let position = self.peek(0)?.map(|token| token.position).unwrap_or_default();
            return Err(ParseError::syntax(
                format!("nesting deeper than {MAX_DEPTH} levels"),
                position,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Makes sure `n + 1` tokens are buffered, failing on a lexer error token
    fn fill(&mut self, n: usize) -> Result<()> {
        while self.lookahead.len() <= n {
            match self.lexer.next() {
                Some(token) if token.kind == TokenKind::Error => {
                    return Err(ParseError::lexical(token.value, token.position));
                }
                Some(token) => self.lookahead.push_back(token),
                None => break,
            }
        }
        Ok(())
    }

    fn peek(&mut self, n: usize) -> Result<Option<&Token<'a>>> {
        self.fill(n)?;
        Ok(self.lookahead.get(n))
    }

    fn peek_kind(&mut self, n: usize) -> Result<TokenKind> {
        Ok(self.peek(n)?.map_or(TokenKind::Eof, |token| token.kind))
    }

    fn unexpected(&mut self, expected: &str) -> ParseError {
        let found = match self.peek(0) {
            Ok(token) => token.cloned(),
            Err(err) => return err,
        };
        let position = found
            .as_ref()
            .map(|token| token.position)
            .unwrap_or_default();
        ParseError::syntax(
            format!("expected {}, found {}", expected, describe(found.as_ref())),
            position,
        )
    }

    fn next(&mut self) -> Result<Token<'a>> {
        self.fill(0)?;
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => Err(self.unexpected("more input")),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'a>> {
        if self.peek_kind(0)? == kind {
            self.next()
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Parses the whole template
    pub fn parse(mut self) -> Result<Program> {
        let program = self.parse_program()?;
        match self.peek_kind(0)? {
            TokenKind::Eof => Ok(program),
            TokenKind::OpenEndBlock => Err(self.unexpected("a block to close")),
            TokenKind::Inverse | TokenKind::OpenInverseChain => {
                Err(self.unexpected("'else' only inside a block"))
            }
            _ => Err(self.unexpected("end of input")),
        }
    }

    fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();
        loop {
            match self.peek_kind(0)? {
                TokenKind::Eof
                | TokenKind::OpenEndBlock
                | TokenKind::Inverse
                | TokenKind::OpenInverseChain
                | TokenKind::EndRawBlock => break,
                _ => body.push(self.parse_statement()?),
            }
        }
        Ok(Program {
            body,
            ..Program::default()
        })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek_kind(0)? {
            TokenKind::Content => {
                let token = self.next()?;
                Ok(Statement::Content(ContentStatement {
                    value: token.value.into_owned(),
                    position: token.position,
                }))
            }
            TokenKind::Comment => {
                let token = self.next()?;
                Ok(Statement::Comment(CommentStatement {
                    value: strip_comment(&token.value),
                    position: token.position,
                }))
            }
            TokenKind::Open | TokenKind::OpenUnescaped => self.parse_mustache(),
            TokenKind::OpenBlock | TokenKind::OpenInverse => {
                self.nested(Self::parse_block).map(Statement::Block)
            }
            TokenKind::OpenRawBlock => self.parse_raw_block().map(Statement::Block),
            TokenKind::OpenPartial => self.parse_partial(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn parse_mustache(&mut self) -> Result<Statement> {
        let open = self.next()?;
        let unescaped = open.kind == TokenKind::OpenUnescaped;
        let expression = self.parse_expression()?;
        if unescaped {
            self.expect(TokenKind::CloseUnescaped, "'}}}'")?;
        } else {
            self.expect(TokenKind::Close, "'}}'")?;
        }
        Ok(Statement::Mustache(MustacheStatement {
            expression,
            escaped: !unescaped && !open.value.ends_with('&'),
            position: open.position,
        }))
    }

    fn parse_block(&mut self) -> Result<BlockStatement> {
        let open = self.next()?;
        let inverted = open.kind == TokenKind::OpenInverse;
        let expression = self.parse_expression()?;
        let block_params = self.parse_block_params()?;
        self.expect(TokenKind::Close, "'}}'")?;
        debug!(
            "parsing block '{}' at {}",
            block_name(&expression.path),
            open.position
        );

        let mut program = self.parse_program()?;
        program.block_params = block_params;
        let inverse = if inverted {
            if self.peek_kind(0)? == TokenKind::Inverse {
                self.next()?;
                Some(self.parse_program()?)
            } else {
                None
            }
        } else {
            self.parse_inverse()?
        };

        let close_position = self.parse_close(&expression, open.position)?;
        let (program, inverse) = if inverted {
            (inverse.unwrap_or_default(), Some(program))
        } else {
            (program, inverse)
        };
        Ok(BlockStatement {
            expression,
            program,
            inverse,
            position: open.position,
            close_position,
        })
    }

    /// Parses `{{else}} program` or an `{{else name ...}}` chain
    fn parse_inverse(&mut self) -> Result<Option<Program>> {
        match self.peek_kind(0)? {
            TokenKind::Inverse => {
                self.next()?;
                Ok(Some(self.parse_program()?))
            }
            TokenKind::OpenInverseChain => {
                let open = self.next()?;
                let expression = self.parse_expression()?;
                let block_params = self.parse_block_params()?;
                self.expect(TokenKind::Close, "'}}'")?;
                let mut program = self.parse_program()?;
                program.block_params = block_params;
                let inverse = self.nested(Self::parse_inverse)?;
                let close_position = match self.peek(0)? {
                    Some(token) => token.position,
                    None => open.position,
                };
                let chained = BlockStatement {
                    expression,
                    program,
                    inverse,
                    position: open.position,
                    close_position,
                };
                Ok(Some(Program {
                    body: vec![Statement::Block(chained)],
                    block_params: Vec::new(),
                    chained: true,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Parses `{{/name}}` and checks it against the opening expression
    fn parse_close(&mut self, expression: &Expression, open: Position) -> Result<Position> {
        let expected = block_name(&expression.path);
        if self.peek_kind(0)? == TokenKind::Eof {
            return Err(ParseError::syntax(format!("unclosed block '{expected}'"), open));
        }
        let close = self.expect(
            TokenKind::OpenEndBlock,
            &format!("closing tag for '{expected}'"),
        )?;
        let name = self.parse_callee()?;
        self.expect(TokenKind::Close, "'}}'")?;
        let found = block_name(&name);
        if found != expected {
            return Err(ParseError::MismatchedBlock {
                expected,
                found,
                open,
                close: close.position,
            });
        }
        Ok(close.position)
    }

    fn parse_raw_block(&mut self) -> Result<BlockStatement> {
        let open = self.next()?;
        let expression = self.parse_expression()?;
        self.expect(TokenKind::CloseRawBlock, "'}}}}'")?;
        let mut body = Vec::new();
        if self.peek_kind(0)? == TokenKind::Content {
            let token = self.next()?;
            body.push(Statement::Content(ContentStatement {
                value: token.value.into_owned(),
                position: token.position,
            }));
        }
        let close = self.expect(TokenKind::EndRawBlock, "end of raw block")?;
        let expected = block_name(&expression.path);
        if close.value != expected {
            return Err(ParseError::MismatchedBlock {
                expected,
                found: close.value.into_owned(),
                open: open.position,
                close: close.position,
            });
        }
        Ok(BlockStatement {
            expression,
            program: Program {
                body,
                ..Program::default()
            },
            inverse: None,
            position: open.position,
            close_position: close.position,
        })
    }

    fn parse_partial(&mut self) -> Result<Statement> {
        let open = self.next()?;
        let name = if self.peek_kind(0)? == TokenKind::OpenSexpr {
            Value::SubExpression(self.parse_sub_expression()?)
        } else {
            self.parse_callee()?
        };
        let (params, hash) = self.parse_arguments()?;
        if params.len() > 1 {
            return Err(ParseError::syntax(
                format!(
                    "partial '{}' takes at most one parameter, found {}",
                    block_name(&name),
                    params.len()
                ),
                open.position,
            ));
        }
        self.expect(TokenKind::Close, "'}}'")?;
        Ok(Statement::Partial(PartialStatement {
            name,
            params,
            hash,
            position: open.position,
        }))
    }

    fn parse_block_params(&mut self) -> Result<Vec<String>> {
        if self.peek_kind(0)? != TokenKind::OpenBlockParams {
            return Ok(Vec::new());
        }
        self.next()?;
        let mut names = Vec::new();
        while self.peek_kind(0)? == TokenKind::Id {
            let token = self.next()?;
            names.push(segment(&token.value).0.to_string());
        }
        if names.is_empty() {
            return Err(self.unexpected("block parameter name"));
        }
        self.expect(TokenKind::CloseBlockParams, "'|'")?;
        Ok(names)
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        let path = self.parse_callee()?;
        let (params, hash) = self.parse_arguments()?;
        Ok(Expression {
            path: Box::new(path),
            params,
            hash,
        })
    }

    /// Positional parameters followed by an optional hash, nothing positional
    /// may follow the first hash pair
    fn parse_arguments(&mut self) -> Result<(Vec<Value>, Option<Hash>)> {
        let mut params = Vec::new();
        loop {
            let kind = self.peek_kind(0)?;
            if kind == TokenKind::Id && self.peek_kind(1)? == TokenKind::Equals {
                let hash = self.parse_hash()?;
                if starts_param(self.peek_kind(0)?) {
                    return Err(self.unexpected("only hash arguments after a hash argument"));
                }
                return Ok((params, Some(hash)));
            }
            if !starts_param(kind) {
                return Ok((params, None));
            }
            params.push(self.parse_param()?);
        }
    }

    fn parse_hash(&mut self) -> Result<Hash> {
        let mut pairs: Vec<HashPair> = Vec::new();
        while self.peek_kind(0)? == TokenKind::Id && self.peek_kind(1)? == TokenKind::Equals {
            let key = self.next()?;
            self.next()?;
            let name = segment(&key.value).0.to_string();
            if !starts_param(self.peek_kind(0)?) {
                return Err(self.unexpected(&format!("value for hash key '{name}'")));
            }
            let value = self.parse_param()?;
            if pairs.iter().any(|pair| pair.key == name) {
                return Err(ParseError::syntax(
                    format!("duplicate hash key '{name}'"),
                    key.position,
                ));
            }
            pairs.push(HashPair { key: name, value });
        }
        Ok(Hash { pairs })
    }

    fn parse_param(&mut self) -> Result<Value> {
        if self.peek_kind(0)? == TokenKind::OpenSexpr {
            return Ok(Value::SubExpression(self.parse_sub_expression()?));
        }
        self.parse_callee()
    }

    fn parse_sub_expression(&mut self) -> Result<SubExpression> {
        self.nested(|parser| {
            parser.expect(TokenKind::OpenSexpr, "'('")?;
            let expression = parser.parse_expression()?;
            parser.expect(TokenKind::CloseSexpr, "')'")?;
            Ok(SubExpression { expression })
        })
    }

    fn parse_callee(&mut self) -> Result<Value> {
        match self.peek_kind(0)? {
            TokenKind::Id | TokenKind::Data => Ok(Value::Path(self.parse_path()?)),
            TokenKind::String => {
                let token = self.next()?;
                Ok(Value::String(StringLiteral {
                    value: token.value.into_owned(),
                }))
            }
            TokenKind::Number => {
                let token = self.next()?;
                let value = token.value.parse::<f64>().map_err(|_| {
                    ParseError::syntax(format!("invalid number '{}'", token.value), token.position)
                })?;
                Ok(Value::Number(NumberLiteral {
                    value,
                    original: token.value.into_owned(),
                }))
            }
            TokenKind::Boolean => {
                let token = self.next()?;
                Ok(Value::Boolean(BooleanLiteral {
                    value: token.value == "true",
                }))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_path(&mut self) -> Result<PathExpression> {
        let mut original = String::new();
        let data = self.peek_kind(0)? == TokenKind::Data;
        let position = match self.peek(0)? {
            Some(token) => token.position,
            None => Position::default(),
        };
        if data {
            self.next()?;
            original.push('@');
        }

        let mut parts = Vec::new();
        let mut depth = 0;
        let mut scoped = false;
        let mut first = true;
        loop {
            let token = self.expect(TokenKind::Id, "a path segment")?;
            let (part, literal) = segment(&token.value);
            original.push_str(&token.value);
            if !literal && matches!(part, ".." | "." | "this") {
                if !parts.is_empty() {
                    return Err(ParseError::syntax(
                        format!("invalid path: {original}"),
                        token.position,
                    ));
                }
                if first {
                    scoped = true;
                }
                if part == ".." {
                    depth += 1;
                }
            } else {
                parts.push(part.to_string());
            }
            first = false;
            if self.peek_kind(0)? != TokenKind::Sep {
                break;
            }
            original.push_str(&self.next()?.value);
        }

        Ok(PathExpression {
            original,
            parts,
            depth,
            data,
            scoped,
            position,
        })
    }
}

/// Parses a template into its syntax tree
pub fn parse(src: &str) -> Result<Program> {
    Parser::new(src).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    fn mustache(src: &str) -> MustacheStatement {
        match parse(src).unwrap().body.remove(0) {
            Statement::Mustache(mustache) => mustache,
            other => panic!("expected mustache, got {other:?}"),
        }
    }

    fn block(src: &str) -> BlockStatement {
        match parse(src).unwrap().body.remove(0) {
            Statement::Block(block) => block,
            other => panic!("expected block, got {other:?}"),
        }
    }

    fn path(value: &Value) -> &PathExpression {
        match value {
            Value::Path(path) => path,
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn content_and_mustache() {
        let program = parse("Hello {{name}}!").unwrap();
        assert_eq!(program.body.len(), 3);
        let Statement::Mustache(mustache) = &program.body[1] else {
            panic!("expected mustache");
        };
        assert_eq!(mustache.expression.helper_name(), Some("name"));
        assert!(mustache.expression.params.is_empty());
        assert!(mustache.escaped);
        assert_eq!(mustache.position, Position::new(6, 1, 7));
    }

    #[test]
    fn empty_template() {
        assert_eq!(parse("").unwrap(), Program::default());
    }

    #[test]
    fn unescaped_forms() {
        assert!(!mustache("{{{body}}}").escaped);
        assert!(!mustache("{{&body}}").escaped);
    }

    #[test]
    fn params_and_hash() {
        let mustache = mustache(r#"{{link "Home" url.path class="nav" active=true}}"#);
        let expression = &mustache.expression;
        assert_eq!(expression.helper_name(), Some("link"));
        assert_eq!(expression.params.len(), 2);
        assert!(matches!(&expression.params[0], Value::String(s) if s.value == "Home"));
        assert_eq!(path(&expression.params[1]).parts, vec!["url", "path"]);
        let hash = expression.hash.as_ref().unwrap();
        assert_eq!(hash.pairs.len(), 2);
        assert!(matches!(hash.get("class"), Some(Value::String(s)) if s.value == "nav"));
        assert!(matches!(hash.get("active"), Some(Value::Boolean(b)) if b.value));
    }

    #[test]
    fn nested_sub_expressions() {
        let mustache = mustache(r#"{{set "k" (append "a" (split "b"))}}"#);
        let Value::SubExpression(append) = &mustache.expression.params[1] else {
            panic!("expected subexpression");
        };
        assert_eq!(append.expression.helper_name(), Some("append"));
        let Value::SubExpression(split) = &append.expression.params[1] else {
            panic!("expected subexpression");
        };
        assert_eq!(split.expression.helper_name(), Some("split"));
    }

    #[test]
    fn path_details() {
        let expression = mustache("{{../../user.name}}").expression;
        let target = path(&expression.path);
        assert_eq!(target.original, "../../user.name");
        assert_eq!(target.parts, vec!["user", "name"]);
        assert_eq!(target.depth, 2);
        assert!(target.scoped);

        let expression = mustache("{{@root.title}}").expression;
        let target = path(&expression.path);
        assert_eq!(target.original, "@root.title");
        assert!(target.data);

        let expression = mustache("{{this/name}}").expression;
        let target = path(&expression.path);
        assert_eq!(target.parts, vec!["name"]);
        assert!(target.scoped);

        let expression = mustache("{{[foo bar].baz}}").expression;
        assert_eq!(path(&expression.path).parts, vec!["foo bar", "baz"]);
    }

    #[test]
    fn numbers_keep_their_spelling() {
        let expression = mustache("{{round 1.50}}").expression;
        let Value::Number(number) = &expression.params[0] else {
            panic!("expected number");
        };
        assert_eq!(number.value, 1.5);
        assert_eq!(number.original, "1.50");
    }

    #[test]
    fn block_with_inverse() {
        let block = block("{{#if user}}Hi {{user.name}}{{else}}Log in{{/if}}");
        assert_eq!(block.expression.helper_name(), Some("if"));
        assert_eq!(block.program.body.len(), 2);
        let inverse = block.inverse.unwrap();
        assert_eq!(inverse.body.len(), 1);
        assert!(!inverse.chained);
    }

    #[test]
    fn block_params() {
        let block = block("{{#each items as |item index|}}{{item}}{{/each}}");
        assert_eq!(block.program.block_params, vec!["item", "index"]);
        assert_eq!(block.expression.params.len(), 1);
    }

    #[test]
    fn else_chain() {
        let block = block("{{#if a}}A{{else if b}}B{{else}}C{{/if}}");
        let inverse = block.inverse.unwrap();
        assert!(inverse.chained);
        let Statement::Block(chained) = &inverse.body[0] else {
            panic!("expected chained block");
        };
        assert_eq!(chained.expression.helper_name(), Some("if"));
        assert_eq!(path(&chained.expression.params[0]).original, "b");
        assert_eq!(chained.inverse.as_ref().unwrap().body.len(), 1);
    }

    #[test]
    fn inverted_block_swaps_programs() {
        let block = block("{{^items}}none{{else}}some{{/items}}");
        let Statement::Content(content) = &block.program.body[0] else {
            panic!("expected content");
        };
        assert_eq!(content.value, "some");
        let inverse = block.inverse.unwrap();
        let Statement::Content(content) = &inverse.body[0] else {
            panic!("expected content");
        };
        assert_eq!(content.value, "none");

        let block = self::block("{{^items}}none{{/items}}");
        assert!(block.program.body.is_empty());
        assert_eq!(block.inverse.unwrap().body.len(), 1);
    }

    #[test]
    fn raw_block_keeps_body_verbatim() {
        let block = block("{{{{raw}}}}{{not parsed}}{{{{/raw}}}}");
        assert_eq!(block.expression.helper_name(), Some("raw"));
        let Statement::Content(content) = &block.program.body[0] else {
            panic!("expected content");
        };
        assert_eq!(content.value, "{{not parsed}}");
    }

    #[test]
    fn partials() {
        let program = parse(r#"{{> card user title="x"}}{{> (pick kind) }}"#).unwrap();
        let Statement::Partial(card) = &program.body[0] else {
            panic!("expected partial");
        };
        assert_eq!(path(&card.name).original, "card");
        assert_eq!(card.params.len(), 1);
        assert!(card.hash.is_some());
        let Statement::Partial(dynamic) = &program.body[1] else {
            panic!("expected partial");
        };
        assert!(matches!(&dynamic.name, Value::SubExpression(_)));
    }

    #[test]
    fn comments_are_stripped() {
        let program = parse("{{! short }}{{!-- long }} --}}").unwrap();
        let values: Vec<&str> = program
            .body
            .iter()
            .map(|statement| match statement {
                Statement::Comment(comment) => comment.value.as_str(),
                _ => panic!("expected comment"),
            })
            .collect();
        assert_eq!(values, vec![" short ", " long }} "]);
    }

    #[test]
    fn matching_block_names_parse() {
        assert!(parse("{{#foo}}x{{/foo}}").is_ok());
        assert!(parse("{{#foo.bar baz}}x{{/foo.bar}}").is_ok());
    }

    #[test]
    fn mismatched_block_names_fail() {
        let err = parse("{{#a}}...{{/b}}").unwrap_err();
        assert_eq!(
            err,
            ParseError::MismatchedBlock {
                expected: "a".to_string(),
                found: "b".to_string(),
                open: Position::new(0, 1, 1),
                close: Position::new(9, 1, 10),
            }
        );
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn mismatched_raw_block_fails() {
        let err = parse("{{{{raw}}}}x{{{{/raw}}}}{{#a}}{{/b}}").unwrap_err();
        assert!(matches!(err, ParseError::MismatchedBlock { .. }));
    }

    #[rstest]
    #[case("{{foo", ErrorKind::Lexical, "unclosed tag opened at line 1, column 1")]
    #[case("{{foo \"bar}}", ErrorKind::Lexical, "unterminated string literal")]
    #[case("{{foo ; }}", ErrorKind::Lexical, "unexpected character ';'")]
    #[case("{{#each items}}", ErrorKind::Syntax, "unclosed block 'each'")]
    #[case("{{/each}}", ErrorKind::Syntax, "expected a block to close, found '{{/'")]
    #[case("{{else}}", ErrorKind::Syntax, "expected 'else' only inside a block, found '{{else}}'")]
    #[case("{{}}", ErrorKind::Syntax, "expected an expression, found '}}'")]
    #[case("{{foo a=1 b}}", ErrorKind::Syntax, "expected only hash arguments after a hash argument, found 'b'")]
    #[case("{{foo a=}}", ErrorKind::Syntax, "expected value for hash key 'a', found '}}'")]
    #[case("{{foo a=1 a=2}}", ErrorKind::Syntax, "duplicate hash key 'a'")]
    #[case("{{foo (bar}}", ErrorKind::Syntax, "expected ')', found '}}'")]
    #[case("{{> card a b}}", ErrorKind::Syntax, "partial 'card' takes at most one parameter, found 2")]
    #[case("{{foo.this}}", ErrorKind::Syntax, "invalid path: foo.this")]
    #[case("{{{foo}}", ErrorKind::Syntax, "expected '}}}', found '}}'")]
    #[case("{{foo as |x|}}", ErrorKind::Syntax, "expected '}}', found 'as |'")]
    #[case("{{#each as ||}}{{/each}}", ErrorKind::Syntax, "expected block parameter name, found '|'")]
    fn parse_errors(#[case] src: &str, #[case] kind: ErrorKind, #[case] message: &str) {
        let err = parse(src).unwrap_err();
        assert_eq!(err.kind(), kind, "{err}");
        match err {
            ParseError::Lexical { message: m, .. } | ParseError::Syntax { message: m, .. } => {
                assert_eq!(m, message)
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn first_error_wins() {
        let err = parse("{{#a}}{{/b}}{{foo").unwrap_err();
        assert!(matches!(err, ParseError::MismatchedBlock { .. }));
    }

    #[test]
    fn nesting_limit() {
        let blocks = |depth: usize| format!("{}x{}", "{{#a b}}".repeat(depth), "{{/a}}".repeat(depth));
        assert!(parse(&blocks(MAX_DEPTH)).is_ok());
        let err = parse(&blocks(MAX_DEPTH + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.position().offset, MAX_DEPTH * "{{#a b}}".len());

        let sub_expressions =
            |depth: usize| format!("{{{{a {}x{}}}}}", "(b ".repeat(depth), ")".repeat(depth));
        assert!(parse(&sub_expressions(MAX_DEPTH)).is_ok());
        let err = parse(&sub_expressions(MAX_DEPTH + 1)).unwrap_err();
        assert!(err.to_string().contains("nesting deeper than 128 levels"), "{err}");

        let chain = format!("{{{{#if a}}}}{}{{{{/if}}}}", "{{else if b}}".repeat(MAX_DEPTH + 1));
        assert!(parse(&chain).is_err());
    }

    #[test]
    fn far_too_deep_is_an_error() {
        let src = format!("{{{{a {}x{}}}}}", "(b ".repeat(10_000), ")".repeat(10_000));
        assert!(parse(&src).is_err());
        let src = format!("{}{}", "{{#a b}}".repeat(10_000), "{{/a}}".repeat(10_000));
        assert!(parse(&src).is_err());
    }

    #[test]
    fn deep_nesting() {
        let depth = 64;
        let src = format!("{}x{}", "{{#a b}}".repeat(depth), "{{/a}}".repeat(depth));
        let mut program = parse(&src).unwrap();
        for _ in 0..depth {
            let Statement::Block(block) = program.body.remove(0) else {
                panic!("expected block");
            };
            program = block.program;
        }
        assert_eq!(program.body.len(), 1);
    }
}
