//! Scenario runner.

use std::sync::Arc;

use log::{debug, info};
use quarry_client::QuarryClient;
use quarry_core::{ClientError, ClientResult, KeyValueSet};
use quarry_service::{CoordinatorConfig, InMemoryCoordinator, LocalServiceTracker};
use quarry_session::ClientConfig;

use crate::assertion::StepOutput;
use crate::error::{ScenarioError, ScenarioResult};
use crate::loader::Operations;
use crate::scenario::Scenario;

/// Runs a scenario against a fresh in-process coordinator.
pub struct Runner<'s> {
    scenario: &'s Scenario,
    operations: Operations,
}

impl<'s> Runner<'s> {
    pub fn new(scenario: &'s Scenario) -> ScenarioResult<Self> {
        let operations = scenario.load_operations()?;
        Ok(Self {
            scenario,
            operations,
        })
    }

    pub fn run(&self) -> ScenarioResult<()> {
        info!("running scenario '{}'", self.scenario.name());

        // 1. Start a coordinator and open a session
        let coordinator = InMemoryCoordinator::with_config(
            CoordinatorConfig::new().with_execution_latency(self.scenario.latency()),
        );
        let tracker = LocalServiceTracker::new(Arc::new(coordinator));
        let config = ClientConfig::new()
            .with_poll_interval_ms(1)
            .with_max_poll_interval_ms(5);
        let client = QuarryClient::connect_with_config(&tracker, None, config)?;

        // 2. Prepare the working database
        if let Some(db) = self.scenario.database_name() {
            client.create_database(db)?;
            client.select_database(db)?;
        }

        // 3. Seed
        if let Some(seed) = self.scenario.load_seed()? {
            for step in seed.step_names() {
                if let Some(sql) = seed.get_step(step) {
                    execute(&client, &sql).map_err(|e| {
                        ScenarioError::step_execution(format!("seed:{}", step), e.to_string())
                    })?;
                }
            }
        }

        // 4. Execute each step and verify its assertion
        for step in self.scenario.steps() {
            let sql = self
                .operations
                .get_step(&step.name)
                .ok_or_else(|| ScenarioError::step_not_found(&step.name))?;
            debug!("step '{}': {}", step.name, sql);
            let result = execute(&client, &sql);
            step.assertion.verify(&step.name, &result)?;
        }

        client.close();
        Ok(())
    }
}

/// Run a step's SQL and materialize its rows.
fn execute(client: &QuarryClient, sql: &str) -> Result<StepOutput, ClientError> {
    let mut result = client.execute_query_and_get_result(sql)?;
    let columns = result
        .schema()
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let rows = result.collect_rows()?;
    Ok(StepOutput { columns, rows })
}

/// Open a client over a fresh coordinator with default settings.
pub fn standalone_client() -> ClientResult<(LocalServiceTracker, QuarryClient)> {
    let tracker = LocalServiceTracker::standalone();
    let client = QuarryClient::connect(&tracker, None, KeyValueSet::new())?;
    Ok((tracker, client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{row, ResultCode};

    #[test]
    fn test_runner_with_inline_operations() {
        // GIVEN
        let ops = r#"
--# create
CREATE TABLE t (a1 int, a2 char)

--# insert
INSERT INTO t VALUES (7, 'T')

--# select
SELECT * FROM t

--# bad
SELECT a3 FROM t
"#;

        // WHEN
        let scenario = Scenario::new("inline")
            .database("inline_db")
            .operations_source(ops)
            .unwrap()
            .step("create", |a| a.empty())
            .step("insert", |a| a.ok())
            .step("select", |a| a.columns(&["a1", "a2"]).first(row![7, "T"]))
            .step("bad", |a| a.error_code(ResultCode::UndefinedColumn));

        // THEN
        scenario.run().unwrap();
    }

    #[test]
    fn test_missing_step_is_reported() {
        let scenario = Scenario::new("missing")
            .operations_source("--# one\nSELECT 1")
            .unwrap()
            .step("two", |a| a.rows(1));

        let err = scenario.run().unwrap_err();
        assert!(matches!(err, ScenarioError::StepNotFound(ref s) if s == "two"));
    }
}
