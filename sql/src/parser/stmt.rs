//! Statement parsing.

use super::Parser;
use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::lexer::TokenKind;
use quarry_core::DataType;

impl Parser {
    /// Parse a statement.
    pub fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::Select => Ok(Stmt::Select(self.parse_select()?)),
            TokenKind::Insert => Ok(Stmt::Insert(self.parse_insert()?)),
            TokenKind::Create => Ok(Stmt::CreateTable(self.parse_create_table()?)),
            TokenKind::Drop => Ok(Stmt::DropTable(self.parse_drop_table()?)),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_table_ref(&mut self) -> ParseResult<TableRef> {
        let start = self.peek().span;
        let first = self.expect_ident()?;
        let (database, table) = if self.eat(&TokenKind::Dot) {
            (Some(first), self.expect_ident()?)
        } else {
            (None, first)
        };
        Ok(TableRef {
            database,
            table,
            span: self.span_from(start),
        })
    }

    // ==================== SELECT ====================

    fn parse_select(&mut self) -> ParseResult<SelectStmt> {
        let start = self.expect(&TokenKind::Select)?.span;

        let mut projection = vec![self.parse_select_item()?];
        while self.eat(&TokenKind::Comma) {
            projection.push(self.parse_select_item()?);
        }

        let from = if self.eat(&TokenKind::From) {
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        let where_clause = if self.eat(&TokenKind::Where) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut order_by = Vec::new();
        if self.eat(&TokenKind::Order) {
            self.expect(&TokenKind::By)?;
            loop {
                let expr = self.parse_expr()?;
                let descending = if self.eat(&TokenKind::Desc) {
                    true
                } else {
                    self.eat(&TokenKind::Asc);
                    false
                };
                order_by.push(OrderTerm { expr, descending });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let limit = if self.eat(&TokenKind::Limit) {
            let span = self.peek().span;
            let n = self.expect_int()?;
            Some(u64::try_from(n).map_err(|_| ParseError::new("LIMIT must not be negative", span))?)
        } else {
            None
        };

        Ok(SelectStmt {
            projection,
            from,
            where_clause,
            order_by,
            limit,
            span: self.span_from(start),
        })
    }

    fn parse_select_item(&mut self) -> ParseResult<SelectItem> {
        if self.check(&TokenKind::Star) {
            return Ok(SelectItem::Wildcard(self.advance().span));
        }
        let expr = self.parse_expr()?;
        let alias = if self.eat(&TokenKind::As) {
            Some(self.expect_ident()?)
        } else if matches!(self.peek().kind, TokenKind::Ident(_)) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        Ok(SelectItem::Expr { expr, alias })
    }

    // ==================== INSERT ====================

    fn parse_insert(&mut self) -> ParseResult<InsertStmt> {
        let start = self.expect(&TokenKind::Insert)?.span;
        self.expect(&TokenKind::Into)?;
        let table = self.parse_table_ref()?;

        let columns = if self.eat(&TokenKind::LParen) {
            let mut names = vec![self.expect_ident()?];
            while self.eat(&TokenKind::Comma) {
                names.push(self.expect_ident()?);
            }
            self.expect(&TokenKind::RParen)?;
            Some(names)
        } else {
            None
        };

        self.expect(&TokenKind::Values)?;
        let mut rows = vec![self.parse_value_row()?];
        while self.eat(&TokenKind::Comma) {
            rows.push(self.parse_value_row()?);
        }

        Ok(InsertStmt {
            table,
            columns,
            rows,
            span: self.span_from(start),
        })
    }

    fn parse_value_row(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(&TokenKind::LParen)?;
        let mut values = vec![self.parse_expr()?];
        while self.eat(&TokenKind::Comma) {
            values.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::RParen)?;
        Ok(values)
    }

    // ==================== DDL ====================

    fn parse_create_table(&mut self) -> ParseResult<CreateTableStmt> {
        let start = self.expect(&TokenKind::Create)?.span;
        self.expect(&TokenKind::Table)?;

        let if_not_exists = if self.eat(&TokenKind::If) {
            self.expect(&TokenKind::Not)?;
            self.expect(&TokenKind::Exists)?;
            true
        } else {
            false
        };

        let table = self.parse_table_ref()?;
        self.expect(&TokenKind::LParen)?;
        let mut columns = vec![self.parse_column_def()?];
        while self.eat(&TokenKind::Comma) {
            columns.push(self.parse_column_def()?);
        }
        self.expect(&TokenKind::RParen)?;

        Ok(CreateTableStmt {
            table,
            if_not_exists,
            columns,
            span: self.span_from(start),
        })
    }

    fn parse_column_def(&mut self) -> ParseResult<ColumnDef> {
        let start = self.peek().span;
        let name = self.expect_ident()?;
        let type_span = self.peek().span;
        let type_name = self.expect_ident()?;

        let length = if self.eat(&TokenKind::LParen) {
            let span = self.peek().span;
            let n = self.expect_int()?;
            self.expect(&TokenKind::RParen)?;
            match u32::try_from(n) {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    return Err(ParseError::new(
                        format!("invalid length {} for type {}", n, type_name),
                        span,
                    ))
                }
            }
        } else {
            None
        };

        let data_type = DataType::from_sql_name(&type_name, length).ok_or_else(|| {
            ParseError::new(format!("unknown data type '{}'", type_name), type_span)
        })?;

        Ok(ColumnDef {
            name,
            data_type,
            span: self.span_from(start),
        })
    }

    fn parse_drop_table(&mut self) -> ParseResult<DropTableStmt> {
        let start = self.expect(&TokenKind::Drop)?.span;
        self.expect(&TokenKind::Table)?;

        let if_exists = if self.eat(&TokenKind::If) {
            self.expect(&TokenKind::Exists)?;
            true
        } else {
            false
        };

        let table = self.parse_table_ref()?;
        Ok(DropTableStmt {
            table,
            if_exists,
            span: self.span_from(start),
        })
    }
}
