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

//! Error handling for the Handlebars parser
//!
//! Every failure while lexing or parsing a template surfaces as a single
//! [`ParseError`]. The lexer reports problems in-band with an error token, the
//! parser turns that token (or any grammar violation it finds itself) into one
//! of these values and stops.

use thiserror::Error;

use crate::lexer::Position;

/// Broad classification of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unterminated tag, invalid character inside a tag, unterminated string
    Lexical,
    /// Unexpected token, malformed expression or hash, mismatched block
    Syntax,
}

/// Error type for template parsing failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("lexical error at {position}: {message}")]
    Lexical { message: String, position: Position },

    #[error("syntax error at {position}: {message}")]
    Syntax { message: String, position: Position },

    /// A block closed with a different name than the one that opened it
    #[error(
        "syntax error at {close}: {found} doesn't match {expected} (block opened at {open})"
    )]
    MismatchedBlock {
        expected: String,
        found: String,
        open: Position,
        close: Position,
    },
}

impl ParseError {
    pub(crate) fn lexical(message: impl Into<String>, position: Position) -> Self {
        Self::Lexical {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lexical { .. } => ErrorKind::Lexical,
            Self::Syntax { .. } | Self::MismatchedBlock { .. } => ErrorKind::Syntax,
        }
    }

    /// Where the error was detected. For a mismatched block this is the
    /// closing tag.
    pub fn position(&self) -> Position {
        match self {
            Self::Lexical { position, .. } | Self::Syntax { position, .. } => *position,
            Self::MismatchedBlock { close, .. } => *close,
        }
    }
}

/// Result type for template parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
