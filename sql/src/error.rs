//! Parser error types.

use crate::Span;
use thiserror::Error;

/// A parse error with location information.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error at line {}, column {}: {message}", .span.line, .span.column)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            found: None,
        }
    }

    pub fn unexpected_eof(span: Span, expected: &str) -> Self {
        Self {
            message: format!("unexpected end of input, expected {}", expected),
            span,
            found: Some("end of input".to_string()),
        }
    }

    pub fn unexpected_token(span: Span, expected: &str, found: &str) -> Self {
        Self {
            message: format!("expected {}, found {}", expected, found),
            span,
            found: Some(found.to_string()),
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
