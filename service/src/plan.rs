//! Statement planning.
//!
//! The planner resolves names against the catalog and the session's current
//! database, binds column references to positions, and checks INSERT values
//! against the target column types. Any error here rejects the statement
//! before it is tracked.

use std::collections::HashSet;

use quarry_core::{Column, DataType, Datum, Row, Schema};
use quarry_sql::{
    BinaryOp, CreateTableStmt, DropTableStmt, Expr, InsertStmt, LiteralKind, SelectItem,
    SelectStmt, Stmt, TableRef, UnaryOp,
};

use crate::catalog::{qualified, Catalog, SystemView};
use crate::error::{EngineError, EngineResult};
use crate::eval::{assign, eval};

/// An expression with column references bound to row positions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BoundExpr {
    Literal(Datum),
    Column(usize),
    Binary(BinaryOp, Box<BoundExpr>, Box<BoundExpr>),
    Unary(UnaryOp, Box<BoundExpr>),
    /// The flag is true for IS NOT NULL.
    IsNull(Box<BoundExpr>, bool),
}

/// Where a SELECT reads its rows from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Source {
    Table {
        database: String,
        table: String,
        schema: Schema,
    },
    View(SystemView),
    /// SELECT without FROM: one empty row.
    Single,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortTarget {
    /// Expression over the input row.
    Input(BoundExpr),
    /// Position in the projected row (ORDER BY an output alias).
    Output(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SortKey {
    pub target: SortTarget,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectPlan {
    pub source: Source,
    pub filter: Option<BoundExpr>,
    pub projections: Vec<BoundExpr>,
    pub order_by: Vec<SortKey>,
    pub limit: Option<u64>,
    /// Output schema.
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InsertPlan {
    pub database: String,
    pub table: String,
    /// Table schema the rows were checked against.
    pub schema: Schema,
    pub rows: Vec<Row>,
}

/// An executable statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Plan {
    CreateTable {
        database: String,
        table: String,
        schema: Schema,
        if_not_exists: bool,
    },
    DropTable {
        database: String,
        table: String,
        if_exists: bool,
    },
    Insert(InsertPlan),
    Select(SelectPlan),
}

impl Plan {
    /// DDL completes synchronously at submission.
    pub fn is_ddl(&self) -> bool {
        matches!(self, Plan::CreateTable { .. } | Plan::DropTable { .. })
    }
}

/// Plans statements for one session.
pub(crate) struct QueryPlanner<'c> {
    catalog: &'c Catalog,
    current_database: &'c str,
}

impl<'c> QueryPlanner<'c> {
    pub fn new(catalog: &'c Catalog, current_database: &'c str) -> Self {
        Self {
            catalog,
            current_database,
        }
    }

    pub fn plan(&self, stmt: &Stmt) -> EngineResult<Plan> {
        match stmt {
            Stmt::CreateTable(s) => self.plan_create_table(s),
            Stmt::DropTable(s) => self.plan_drop_table(s),
            Stmt::Insert(s) => self.plan_insert(s).map(Plan::Insert),
            Stmt::Select(s) => self.plan_select(s).map(Plan::Select),
        }
    }

    fn database_of(&self, table: &TableRef) -> String {
        table
            .database
            .clone()
            .unwrap_or_else(|| self.current_database.to_string())
    }

    // ==================== DDL ====================

    fn plan_create_table(&self, stmt: &CreateTableStmt) -> EngineResult<Plan> {
        let database = self.database_of(&stmt.table);
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(stmt.columns.len());
        for def in &stmt.columns {
            if !seen.insert(def.name.to_ascii_lowercase()) {
                return Err(EngineError::duplicate_column(&def.name));
            }
            columns.push(Column::new(&def.name, def.data_type));
        }
        Ok(Plan::CreateTable {
            database,
            table: stmt.table.table.clone(),
            schema: Schema::new(columns),
            if_not_exists: stmt.if_not_exists,
        })
    }

    fn plan_drop_table(&self, stmt: &DropTableStmt) -> EngineResult<Plan> {
        Ok(Plan::DropTable {
            database: self.database_of(&stmt.table),
            table: stmt.table.table.clone(),
            if_exists: stmt.if_exists,
        })
    }

    // ==================== INSERT ====================

    fn plan_insert(&self, stmt: &InsertStmt) -> EngineResult<InsertPlan> {
        let database = self.database_of(&stmt.table);
        if Catalog::is_system_database(&database) {
            return Err(EngineError::insufficient_privilege(format!(
                "cannot insert into '{}'",
                qualified(&database, &stmt.table.table)
            )));
        }
        let table = self
            .catalog
            .database(&database)?
            .table(&stmt.table.table)
            .ok_or_else(|| EngineError::undefined_table(qualified(&database, &stmt.table.table)))?;
        let schema = &table.schema;

        // VALUES are constant: any column reference is undefined here.
        let empty = Schema::empty();
        let mut values = Vec::with_capacity(stmt.rows.len());
        for row in &stmt.rows {
            let mut evaluated = Vec::with_capacity(row.len());
            for expr in row {
                let bound = bind(expr, &empty)?;
                evaluated.push(eval(&bound, &[])?);
            }
            values.push(evaluated);
        }

        let targets: Vec<usize> = match &stmt.columns {
            Some(names) => {
                let mut seen = HashSet::new();
                let mut targets = Vec::with_capacity(names.len());
                for name in names {
                    let idx = schema
                        .index_of(name)
                        .ok_or_else(|| EngineError::undefined_column(name))?;
                    if !seen.insert(idx) {
                        return Err(EngineError::duplicate_column(name));
                    }
                    targets.push(idx);
                }
                targets
            }
            None => (0..schema.len()).collect(),
        };

        let mut rows = Vec::with_capacity(values.len());
        for evaluated in values {
            if evaluated.len() > targets.len() {
                return Err(EngineError::datatype_mismatch(
                    "INSERT has more expressions than target columns",
                ));
            }
            let mut datums = vec![Datum::Null; schema.len()];
            for (value, &idx) in evaluated.into_iter().zip(&targets) {
                let column = &schema.columns()[idx];
                datums[idx] = assign(value, column)?;
            }
            rows.push(Row::new(datums));
        }

        Ok(InsertPlan {
            database,
            table: table.name.clone(),
            schema: schema.clone(),
            rows,
        })
    }

    // ==================== SELECT ====================

    fn plan_select(&self, stmt: &SelectStmt) -> EngineResult<SelectPlan> {
        let (source, input) = match &stmt.from {
            None => (Source::Single, Schema::empty()),
            Some(table_ref) => self.resolve_source(table_ref)?,
        };

        let mut projections = Vec::new();
        let mut columns = Vec::new();
        for item in &stmt.projection {
            match item {
                SelectItem::Wildcard(_) => {
                    if matches!(source, Source::Single) {
                        return Err(EngineError::undefined_column("*"));
                    }
                    for (idx, column) in input.columns().iter().enumerate() {
                        projections.push(BoundExpr::Column(idx));
                        columns.push(column.clone());
                    }
                }
                SelectItem::Expr { expr, alias } => {
                    let bound = bind(expr, &input)?;
                    let name = alias.clone().unwrap_or_else(|| expr.output_name());
                    columns.push(Column::new(name, infer_type(&bound, &input)));
                    projections.push(bound);
                }
            }
        }
        let schema = Schema::new(columns);

        let filter = stmt
            .where_clause
            .as_ref()
            .map(|expr| bind(expr, &input))
            .transpose()?;

        let mut order_by = Vec::with_capacity(stmt.order_by.len());
        for term in &stmt.order_by {
            let target = match bind(&term.expr, &input) {
                Ok(bound) => SortTarget::Input(bound),
                Err(err @ EngineError::UndefinedColumn { .. }) => match &term.expr {
                    Expr::Column(name, _) => SortTarget::Output(
                        schema.index_of(name).ok_or(err)?,
                    ),
                    _ => return Err(err),
                },
                Err(err) => return Err(err),
            };
            order_by.push(SortKey {
                target,
                descending: term.descending,
            });
        }

        Ok(SelectPlan {
            source,
            filter,
            projections,
            order_by,
            limit: stmt.limit,
            schema,
        })
    }

    fn resolve_source(&self, table_ref: &TableRef) -> EngineResult<(Source, Schema)> {
        let database = self.database_of(table_ref);
        if Catalog::is_system_database(&database) {
            let view = SystemView::resolve(&table_ref.table).ok_or_else(|| {
                EngineError::undefined_table(qualified(&database, &table_ref.table))
            })?;
            return Ok((Source::View(view), view.schema()));
        }
        let table = self
            .catalog
            .database(&database)?
            .table(&table_ref.table)
            .ok_or_else(|| EngineError::undefined_table(qualified(&database, &table_ref.table)))?;
        Ok((
            Source::Table {
                database,
                table: table.name.clone(),
                schema: table.schema.clone(),
            },
            table.schema.clone(),
        ))
    }
}

/// Bind column references in `expr` to positions in `scope`.
pub(crate) fn bind(expr: &Expr, scope: &Schema) -> EngineResult<BoundExpr> {
    Ok(match expr {
        Expr::Literal(lit) => BoundExpr::Literal(literal_datum(&lit.kind)),
        Expr::Column(name, _) => BoundExpr::Column(
            scope
                .index_of(name)
                .ok_or_else(|| EngineError::undefined_column(name))?,
        ),
        Expr::BinaryOp(op, left, right, _) => BoundExpr::Binary(
            *op,
            Box::new(bind(left, scope)?),
            Box::new(bind(right, scope)?),
        ),
        Expr::UnaryOp(op, operand, _) => BoundExpr::Unary(*op, Box::new(bind(operand, scope)?)),
        Expr::IsNull(operand, negated, _) => {
            BoundExpr::IsNull(Box::new(bind(operand, scope)?), *negated)
        }
    })
}

fn literal_datum(kind: &LiteralKind) -> Datum {
    match kind {
        LiteralKind::Null => Datum::Null,
        LiteralKind::Bool(b) => Datum::Bool(*b),
        LiteralKind::Int(n) => match i32::try_from(*n) {
            Ok(v) => Datum::Int4(v),
            Err(_) => Datum::Int8(*n),
        },
        LiteralKind::Float(f) => Datum::Float8(*f),
        LiteralKind::String(s) => Datum::Text(s.clone()),
    }
}

/// Static result type of a bound expression.
fn infer_type(expr: &BoundExpr, scope: &Schema) -> DataType {
    match expr {
        BoundExpr::Literal(datum) => match datum {
            Datum::Bool(_) => DataType::Bool,
            Datum::Int4(_) => DataType::Int4,
            Datum::Int8(_) => DataType::Int8,
            Datum::Float8(_) => DataType::Float8,
            Datum::Null | Datum::Text(_) => DataType::Text,
        },
        BoundExpr::Column(idx) => scope
            .column(*idx)
            .map(|c| c.data_type)
            .unwrap_or(DataType::Text),
        BoundExpr::Binary(op, left, right) if op.is_arithmetic() => {
            match (infer_type(left, scope), infer_type(right, scope)) {
                (DataType::Float8, _) | (_, DataType::Float8) => DataType::Float8,
                (DataType::Int8, _) | (_, DataType::Int8) => DataType::Int8,
                _ => DataType::Int4,
            }
        }
        BoundExpr::Binary(..) | BoundExpr::IsNull(..) => DataType::Bool,
        BoundExpr::Unary(UnaryOp::Not, _) => DataType::Bool,
        BoundExpr::Unary(UnaryOp::Neg, operand) => infer_type(operand, scope),
    }
}
