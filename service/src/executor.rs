//! Plan execution against the catalog.

use quarry_core::{Datum, Row, Schema};

use crate::catalog::{qualified, Catalog, Table};
use crate::error::{EngineError, EngineResult};
use crate::eval::{eval, eval_predicate};
use crate::plan::{InsertPlan, Plan, SelectPlan, SortTarget, Source};

/// Materialized output of a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct QueryOutput {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

/// Executes plans. Reads and writes go straight to the catalog.
pub(crate) struct Executor<'c> {
    catalog: &'c mut Catalog,
}

impl<'c> Executor<'c> {
    pub fn new(catalog: &'c mut Catalog) -> Self {
        Self { catalog }
    }

    pub fn execute(&mut self, plan: &Plan) -> EngineResult<QueryOutput> {
        match plan {
            Plan::CreateTable {
                database,
                table,
                schema,
                if_not_exists,
            } => {
                self.catalog
                    .create_table(database, table, schema.clone(), *if_not_exists)?;
                Ok(QueryOutput::default())
            }
            Plan::DropTable {
                database,
                table,
                if_exists,
            } => {
                self.catalog.drop_table(database, table, *if_exists)?;
                Ok(QueryOutput::default())
            }
            Plan::Insert(insert) => self.execute_insert(insert),
            Plan::Select(select) => self.execute_select(select),
        }
    }

    /// Look up a planned table, failing if it was dropped or redefined since.
    fn planned_table<'a>(
        catalog: &'a Catalog,
        database: &str,
        table: &str,
        schema: &Schema,
    ) -> EngineResult<&'a Table> {
        let found = catalog
            .database(database)?
            .table(table)
            .ok_or_else(|| EngineError::undefined_table(qualified(database, table)))?;
        if &found.schema != schema {
            return Err(EngineError::internal(format!(
                "table '{}' was redefined while the query was pending",
                qualified(database, table)
            )));
        }
        Ok(found)
    }

    fn execute_insert(&mut self, plan: &InsertPlan) -> EngineResult<QueryOutput> {
        Self::planned_table(&*self.catalog, &plan.database, &plan.table, &plan.schema)?;
        let table = self
            .catalog
            .database_mut(&plan.database)?
            .table_mut(&plan.table)
            .ok_or_else(|| EngineError::undefined_table(qualified(&plan.database, &plan.table)))?;
        table.rows.extend(plan.rows.iter().cloned());
        Ok(QueryOutput::default())
    }

    fn execute_select(&self, plan: &SelectPlan) -> EngineResult<QueryOutput> {
        let input = match &plan.source {
            Source::Single => vec![Row::default()],
            Source::View(view) => view.rows(&*self.catalog),
            Source::Table {
                database,
                table,
                schema,
            } => Self::planned_table(&*self.catalog, database, table, schema)?
                .rows
                .clone(),
        };

        // (sort keys, projected row)
        let mut produced: Vec<(Vec<Datum>, Vec<Datum>)> = Vec::new();
        for row in &input {
            let values = row.values();
            if let Some(filter) = &plan.filter {
                if !eval_predicate(filter, values)? {
                    continue;
                }
            }
            let projected = plan
                .projections
                .iter()
                .map(|expr| eval(expr, values))
                .collect::<EngineResult<Vec<_>>>()?;
            let mut keys = Vec::with_capacity(plan.order_by.len());
            for key in &plan.order_by {
                keys.push(match &key.target {
                    SortTarget::Input(expr) => eval(expr, values)?,
                    SortTarget::Output(idx) => projected[*idx].clone(),
                });
            }
            produced.push((keys, projected));
        }

        if !plan.order_by.is_empty() {
            produced.sort_by(|(a, _), (b, _)| {
                for (i, key) in plan.order_by.iter().enumerate() {
                    let ordering = a[i].cmp_sortable(&b[i]);
                    let ordering = if key.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    };
                    if ordering.is_ne() {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        let limit = plan
            .limit
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        let rows = produced
            .into_iter()
            .take(limit)
            .map(|(_, projected)| Row::new(projected))
            .collect();

        Ok(QueryOutput {
            schema: plan.schema.clone(),
            rows,
        })
    }
}
