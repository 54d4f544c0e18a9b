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

//! Handlebars template tokenization
//!
//! The lexer works in two modes. In content mode it emits runs of literal
//! text until it meets a `{{`, in tag mode it splits the inside of a tag into
//! identifiers, separators, literals and delimiters:
//!
//! ```text
//! Hello {{#each items as |item|}}{{format item "x"}}{{/each}}
//! ```
//!
//! becomes `Content`, `OpenBlock`, `Id`, `Id`, `OpenBlockParams`, `Id`,
//! `CloseBlockParams`, `Close`, `Open`, `Id`, `Id`, `String`, `Close`,
//! `OpenEndBlock`, `Id`, `Close`, `Eof`.
//!
//! Problems are reported in-band: the stream ends with a single `Error`
//! token instead of an `Eof`.

use std::{borrow::Cow, collections::VecDeque, fmt::Display, sync::LazyLock};

use log::trace;
use regex::Regex;

/// Matches a number literal at the start of the input
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(?:\.[0-9]+)?").expect("valid number pattern"));

/// Matches an identifier: anything outside the reserved punctuation set
static ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"^[^\s!"#%-,\./;->@\[-\^`\{-~]+"##).expect("valid identifier pattern")
});

/// Characters that may follow an identifier
const ID_LOOKAHEAD: &str = "=~}/.)|";
/// Characters that may follow a number or boolean literal
const LITERAL_LOOKAHEAD: &str = "~})";
/// Characters that may follow a `.` for it to be read as an identifier
const DOT_LOOKAHEAD: &str = "=~}/)|";

/// A location in the template source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Byte offset from the start of the source
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Types of tokens produced by the [`Lexer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Literal text outside of any tag
    Content,
    /// A whole `{{! ... }}` or `{{!-- ... --}}` tag
    Comment,
    /// `{{` or `{{&`
    Open,
    /// `{{{`
    OpenUnescaped,
    /// `{{#`
    OpenBlock,
    /// `{{/`
    OpenEndBlock,
    /// `{{>`
    OpenPartial,
    /// `{{^` followed by an expression
    OpenInverse,
    /// `{{else` followed by an expression
    OpenInverseChain,
    /// A standalone `{{^}}` or `{{else}}`
    Inverse,
    /// `{{{{`
    OpenRawBlock,
    /// `}}}}`
    CloseRawBlock,
    /// `{{{{/name}}}}`, the value holds the name
    EndRawBlock,
    /// `}}`
    Close,
    /// `}}}`
    CloseUnescaped,
    OpenSexpr,
    CloseSexpr,
    Equals,
    /// `@`
    Data,
    /// `.` or `/` between path segments
    Sep,
    /// `as |`
    OpenBlockParams,
    /// `|`
    CloseBlockParams,
    Id,
    String,
    Number,
    Boolean,
    Eof,
    Error,
}

/// A token parsed from a template
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The token's text. Escapes are already resolved for content and
    /// string literals, error tokens carry their message here.
    pub value: Cow<'a, str>,
    pub position: Position,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, value: impl Into<Cow<'a, str>>, position: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{{{:?}}}", self.kind, self.value)
    }
}

enum Mode {
    Content,
    /// Inside a tag that was opened at `start`. `raw` is set for `{{{{`.
    Tag { raw: bool, start: Position },
    /// Raw block body, runs until `{{{{/name}}}}`
    Raw { name: String },
    Done,
}

/// Lazily turns template source into tokens
///
/// Lexing the same source twice always yields the same sequence.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    mode: Mode,
    /// Name of the raw block currently being opened, taken from its first id
    raw_name: Option<String>,
    pending: VecDeque<Token<'a>>,
}

fn followed_by(rest: &str, set: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || set.contains(c),
    }
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            mode: Mode::Content,
            raw_name: None,
            pending: VecDeque::new(),
        }
    }

    fn here(&self) -> Position {
        Position::new(self.pos, self.line, self.column)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Advances by `len` bytes, `len` must land on a char boundary
    fn bump(&mut self, len: usize) {
        for c in self.src[self.pos..self.pos + len].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }

    /// Emits a token spanning the next `len` bytes
    fn take(&mut self, kind: TokenKind, len: usize) -> Token<'a> {
        let position = self.here();
        let value = &self.src[self.pos..self.pos + len];
        self.bump(len);
        Token::new(kind, value, position)
    }

    fn error(&mut self, message: impl Into<String>, position: Position) -> Token<'a> {
        self.mode = Mode::Done;
        Token::new(TokenKind::Error, message.into(), position)
    }

    /// Reported at the end of input, after any tokens lexed inside the tag
    fn unclosed(&mut self, start: Position) -> Token<'a> {
        let position = self.here();
        self.error(format!("unclosed tag opened at {start}"), position)
    }

    fn lex_content(&mut self) -> Token<'a> {
        let rest = self.rest();
        if rest.is_empty() {
            self.mode = Mode::Done;
            return Token::new(TokenKind::Eof, "", self.here());
        }

        let bytes = rest.as_bytes();
        let mut owned: Option<String> = None;
        let mut segment = 0;
        let mut search = 0;
        let end = loop {
            let Some(found) = rest[search..].find("{{") else {
                break rest.len();
            };
            let at = search + found;
            if at == 0 || bytes[at - 1] != b'\\' {
                break at;
            }
            // `\{{` is a literal `{{`, `\\{{` a literal backslash before a real tag
            let buffer = owned.get_or_insert_with(String::new);
            buffer.push_str(&rest[segment..at - 1]);
            segment = at;
            if at > 1 && bytes[at - 2] == b'\\' {
                break at;
            }
            search = at + 2;
        };

        if end == 0 {
            return self.lex_open();
        }

        let position = self.here();
        let value = match owned {
            Some(mut buffer) => {
                buffer.push_str(&rest[segment..end]);
                Cow::Owned(buffer)
            }
            None => Cow::Borrowed(&rest[..end]),
        };
        self.bump(end);
        Token::new(TokenKind::Content, value, position)
    }

    fn lex_comment(&mut self, head: usize) -> Token<'a> {
        let rest = self.rest();
        let position = self.here();
        let end = if rest[head..].starts_with("!--") {
            let mut search = head + 3;
            loop {
                let Some(found) = rest[search..].find("--") else {
                    break None;
                };
                let at = search + found + 2;
                if rest[at..].starts_with("}}") {
                    break Some(at + 2);
                }
                if rest[at..].starts_with("~}}") {
                    break Some(at + 3);
                }
                search = search + found + 1;
            }
        } else {
            rest[head..].find("}}").map(|found| head + found + 2)
        };
        match end {
            Some(end) => self.take(TokenKind::Comment, end),
            None => self.error("unterminated comment", position),
        }
    }

    fn lex_open(&mut self) -> Token<'a> {
        let rest = self.rest();
        let start = self.here();

        if rest.starts_with("{{{{") {
            self.mode = Mode::Tag { raw: true, start };
            self.raw_name = None;
            return self.take(TokenKind::OpenRawBlock, 4);
        }

        let head = if rest[2..].starts_with('~') { 3 } else { 2 };
        let after = &rest[head..];
        if after.starts_with('!') {
            return self.lex_comment(head);
        }

        // `{{else}}`, `{{^}}` and `{{else expr}}` before plain `{{`
        let padded = after.trim_start();
        let padding = after.len() - padded.len();
        if let Some(tail) = padded.strip_prefix("else") {
            let trimmed = tail.trim_start();
            let close = if trimmed.starts_with("~}}") {
                Some(3)
            } else if trimmed.starts_with("}}") {
                Some(2)
            } else {
                None
            };
            if let Some(close) = close {
                let len = head + padding + 4 + (tail.len() - trimmed.len()) + close;
                return self.take(TokenKind::Inverse, len);
            }
            // `{{else~ if x}}` keeps the marker in the opening token
            let marker = usize::from(tail.starts_with('~'));
            if tail[marker..].starts_with(char::is_whitespace) {
                self.mode = Mode::Tag { raw: false, start };
                return self.take(TokenKind::OpenInverseChain, head + padding + 4 + marker);
            }
        }
        if let Some(tail) = after.strip_prefix('^') {
            let trimmed = tail.trim_start();
            let skipped = tail.len() - trimmed.len();
            if trimmed.starts_with("~}}") {
                return self.take(TokenKind::Inverse, head + 1 + skipped + 3);
            }
            if trimmed.starts_with("}}") {
                return self.take(TokenKind::Inverse, head + 1 + skipped + 2);
            }
        }

        let (kind, len) = match after.chars().next() {
            Some('{') => (TokenKind::OpenUnescaped, head + 1),
            Some('&') => (TokenKind::Open, head + 1),
            Some('#') => (TokenKind::OpenBlock, head + 1),
            Some('/') => (TokenKind::OpenEndBlock, head + 1),
            Some('>') => (TokenKind::OpenPartial, head + 1),
            Some('^') => (TokenKind::OpenInverse, head + 1),
            _ => (TokenKind::Open, head),
        };
        self.mode = Mode::Tag { raw: false, start };
        self.take(kind, len)
    }

    fn lex_string(&mut self, quote: char) -> Token<'a> {
        let rest = self.rest();
        let position = self.here();
        let mut escaped = false;
        let mut end = None;
        for (i, c) in rest.char_indices().skip(1) {
            match c {
                '\\' => escaped = !escaped,
                c if c == quote && !escaped => {
                    end = Some(i);
                    break;
                }
                _ => escaped = false,
            }
        }
        let Some(end) = end else {
            return self.error("unterminated string literal", position);
        };
        let body = &rest[1..end];
        let escape = format!("\\{quote}");
        let value = if body.contains(&escape) {
            Cow::Owned(body.replace(&escape, &quote.to_string()))
        } else {
            Cow::Borrowed(body)
        };
        self.bump(end + 1);
        Token::new(TokenKind::String, value, position)
    }

    /// `[...]` segments may hold any character but `]`, the brackets are kept
    fn lex_segment_literal(&mut self) -> Token<'a> {
        let rest = self.rest();
        let position = self.here();
        match rest.find(']') {
            Some(end) => self.take(TokenKind::Id, end + 1),
            None => self.error("unterminated segment literal", position),
        }
    }

    fn lex_tag(&mut self, raw: bool, start: Position) -> Token<'a> {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.bump(rest.len() - trimmed.len());
        let rest = trimmed;

        if rest.is_empty() {
            return self.unclosed(start);
        }

        if raw && rest.starts_with("}}}}") {
            let name = self.raw_name.take().unwrap_or_default();
            self.mode = Mode::Raw { name };
            return self.take(TokenKind::CloseRawBlock, 4);
        }
        for (closer, kind) in [
            ("~}}}", TokenKind::CloseUnescaped),
            ("}}}", TokenKind::CloseUnescaped),
            ("~}}", TokenKind::Close),
            ("}}", TokenKind::Close),
        ] {
            if !raw && rest.starts_with(closer) {
                self.mode = Mode::Content;
                return self.take(kind, closer.len());
            }
        }

        let position = self.here();
        let Some(c) = rest.chars().next() else {
            return self.unclosed(start);
        };
        match c {
            '(' => return self.take(TokenKind::OpenSexpr, 1),
            ')' => return self.take(TokenKind::CloseSexpr, 1),
            '=' => return self.take(TokenKind::Equals, 1),
            '@' => return self.take(TokenKind::Data, 1),
            '|' => return self.take(TokenKind::CloseBlockParams, 1),
            '/' => return self.take(TokenKind::Sep, 1),
            '"' | '\'' => return self.lex_string(c),
            '[' => return self.lex_segment_literal(),
            '.' => {
                if rest.starts_with("..") && followed_by(&rest[2..], DOT_LOOKAHEAD) {
                    return self.take(TokenKind::Id, 2);
                }
                if followed_by(&rest[1..], DOT_LOOKAHEAD) {
                    return self.take(TokenKind::Id, 1);
                }
                return self.take(TokenKind::Sep, 1);
            }
            _ => (),
        }

        if let Some(tail) = rest.strip_prefix("as") {
            let trimmed = tail.trim_start();
            if trimmed.len() < tail.len() && trimmed.starts_with('|') {
                let len = rest.len() - trimmed.len() + 1;
                return self.take(TokenKind::OpenBlockParams, len);
            }
        }
        if let Some(found) = NUMBER.find(rest) {
            if followed_by(&rest[found.end()..], LITERAL_LOOKAHEAD) {
                return self.take(TokenKind::Number, found.end());
            }
        }
        for literal in ["true", "false"] {
            if rest.starts_with(literal) && followed_by(&rest[literal.len()..], LITERAL_LOOKAHEAD) {
                return self.take(TokenKind::Boolean, literal.len());
            }
        }
        if let Some(found) = ID.find(rest) {
            let tail = &rest[found.end()..];
            if followed_by(tail, ID_LOOKAHEAD) {
                let token = self.take(TokenKind::Id, found.end());
                if raw && self.raw_name.is_none() {
                    self.raw_name = Some(token.value.to_string());
                }
                return token;
            }
            let bad = tail.chars().next().unwrap_or_default();
            let at = Position::new(
                position.offset + found.end(),
                position.line,
                position.column + found.as_str().chars().count(),
            );
            return self.error(format!("unexpected character '{bad}'"), at);
        }
        self.error(format!("unexpected character '{c}'"), position)
    }

    fn lex_raw(&mut self, name: String) -> Token<'a> {
        let rest = self.rest();
        let position = self.here();
        let mut search = 0;
        while let Some(found) = rest[search..].find("{{{{/") {
            let at = search + found;
            let after = &rest[at + 5..];
            if let Some(tail) = after.strip_prefix(name.as_str()) {
                let trimmed = tail.trim_start();
                if !name.is_empty() && trimmed.starts_with("}}}}") {
                    let close_len = 5 + name.len() + (tail.len() - trimmed.len()) + 4;
                    let content = &rest[..at];
                    self.bump(at);
                    let close_position = self.here();
                    self.bump(close_len);
                    self.mode = Mode::Content;
                    let end = Token::new(TokenKind::EndRawBlock, name, close_position);
                    if content.is_empty() {
                        return end;
                    }
                    self.pending.push_back(end);
                    return Token::new(TokenKind::Content, content, position);
                }
            }
            search = at + 5;
        }
        self.error(format!("unterminated raw block '{name}'"), position)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.pop_front() {
            return Some(token);
        }
        let token = match std::mem::replace(&mut self.mode, Mode::Content) {
            Mode::Done => {
                self.mode = Mode::Done;
                return None;
            }
            Mode::Content => self.lex_content(),
            Mode::Tag { raw, start } => {
                self.mode = Mode::Tag { raw, start };
                self.lex_tag(raw, start)
            }
            Mode::Raw { name } => self.lex_raw(name),
        };
        trace!("lexed {} at {}", token, token.position);
        Some(token)
    }
}

/// Lexes a whole template, the last token is always `Eof` or `Error`
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    Lexer::new(src).collect()
}
