//! Parser for Quarry SQL text.
//!
//! Organized into submodules by parsing category:
//! - `expr`: Expression parsing (operators, literals, column references)
//! - `stmt`: Statement parsing (CREATE TABLE, DROP TABLE, INSERT, SELECT)

mod expr;
mod stmt;

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenKind};

// ==================== PARSER STATE ====================

/// Parser state.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from source text.
    pub fn new(input: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    /// Parse exactly one statement, with an optional trailing `;`.
    pub fn parse_single(&mut self) -> ParseResult<Stmt> {
        let stmt = self.parse_stmt()?;
        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        self.expect_eof()?;
        Ok(stmt)
    }

    /// Parse a `;`-separated script.
    pub fn parse_script(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if self.is_at_end() {
                break;
            }
            stmts.push(self.parse_stmt()?);
            if !self.is_at_end() {
                self.expect(&TokenKind::Semicolon)?;
            }
        }
        if stmts.is_empty() {
            return Err(ParseError::unexpected_eof(self.peek().span, "statement"));
        }
        Ok(stmts)
    }
}

// ==================== TOKEN HELPERS ====================

impl Parser {
    pub(crate) fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("tokens should always end with EOF")
        })
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    /// Consume the token if it matches.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.name()))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn expect_int(&mut self) -> ParseResult<i64> {
        match self.peek().kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected("integer")),
        }
    }

    fn expect_eof(&self) -> ParseResult<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => ParseError::unexpected_eof(token.span, expected),
            _ => ParseError::unexpected_token(token.span, expected, token.kind.name()),
        }
    }

    pub(crate) fn span_from(&self, start: Span) -> Span {
        let end_token = if self.pos > 0 {
            &self.tokens[self.pos - 1]
        } else {
            self.peek()
        };
        Span::new(start.start, end_token.span.end, start.line, start.column)
    }
}

// ==================== PUBLIC API ====================

/// Parse a single statement from SQL text.
pub fn parse_stmt(input: &str) -> ParseResult<Stmt> {
    Parser::new(input)?.parse_single()
}

/// Parse a `;`-separated list of statements from SQL text.
pub fn parse_script(input: &str) -> ParseResult<Vec<Stmt>> {
    Parser::new(input)?.parse_script()
}

// ==================== TESTS ====================
