//! Loader for SQL step scripts.
//!
//! A script is split into named steps by `--# step_name` markers. Inside a
//! step, `-- @param $name = value` lines define substitutions and other
//! `-- @` lines are metadata; both are dropped from the SQL.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ScenarioError, ScenarioResult};

/// A parsed step script.
#[derive(Debug, Clone, Default)]
pub struct Operations {
    /// SQL per step name.
    steps: HashMap<String, String>,
    /// Step names in order of appearance.
    order: Vec<String>,
    /// Substitutions per step.
    params: HashMap<String, Vec<(String, String)>>,
}

impl Operations {
    pub fn parse(source: &str) -> ScenarioResult<Self> {
        let mut ops = Self::default();
        let mut current: Option<String> = None;
        let mut body = String::new();
        let mut params = Vec::new();

        for line in source.lines() {
            let trimmed = line.trim();

            if let Some(name) = trimmed.strip_prefix("--#") {
                if let Some(step) = current.take() {
                    ops.finish_step(step, &body, std::mem::take(&mut params));
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(ScenarioError::operations_parse(
                        "<inline>",
                        "empty step name after --#",
                    ));
                }
                if ops.order.iter().any(|s| s == name) {
                    return Err(ScenarioError::operations_parse(
                        "<inline>",
                        format!("duplicate step '{}'", name),
                    ));
                }
                ops.order.push(name.to_string());
                current = Some(name.to_string());
                body.clear();
            } else if current.is_some() {
                if let Some(def) = trimmed.strip_prefix("-- @param ") {
                    if let Some(param) = parse_param_def(def) {
                        params.push(param);
                    }
                } else if !trimmed.starts_with("-- @") {
                    body.push_str(line);
                    body.push('\n');
                }
            }
        }
        if let Some(step) = current {
            ops.finish_step(step, &body, params);
        }

        Ok(ops)
    }

    pub fn load(path: &Path) -> ScenarioResult<Self> {
        let source =
            std::fs::read_to_string(path).map_err(|e| ScenarioError::file_read(path, e))?;
        Self::parse(&source).map_err(|e| ScenarioError::operations_parse(path, e.to_string()))
    }

    fn finish_step(&mut self, name: String, body: &str, params: Vec<(String, String)>) {
        let sql = body.trim();
        if !sql.is_empty() {
            self.steps.insert(name.clone(), sql.to_string());
        }
        if !params.is_empty() {
            self.params.insert(name, params);
        }
    }

    /// SQL of a step with its parameters substituted.
    pub fn get_step(&self, name: &str) -> Option<String> {
        let sql = self.steps.get(name)?;
        let substituted = self
            .params
            .get(name)
            .into_iter()
            .flatten()
            .fold(sql.clone(), |sql, (param, value)| {
                sql.replace(&format!("${}", param), value)
            });
        Some(substituted)
    }

    pub fn get_step_raw(&self, name: &str) -> Option<&str> {
        self.steps.get(name).map(String::as_str)
    }

    pub fn step_names(&self) -> &[String] {
        &self.order
    }
}

/// Parse `$name = value` into `(name, value)`.
fn parse_param_def(def: &str) -> Option<(String, String)> {
    let (name, value) = def.split_once('=')?;
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps_in_order() {
        // GIVEN
        let source = r#"
-- file comment, ignored

--# create
CREATE TABLE t (a1 int, a2 char);

--# insert
INSERT INTO t VALUES (7, 'T');

--# select
SELECT * FROM t;
"#;

        // WHEN
        let ops = Operations::parse(source).unwrap();

        // THEN
        assert_eq!(ops.step_names(), ["create", "insert", "select"]);
        assert_eq!(ops.get_step("select").unwrap(), "SELECT * FROM t;");
        assert!(ops.get_step("missing").is_none());
    }

    #[test]
    fn test_params_and_metadata() {
        // GIVEN
        let source = r#"
--# by_id
-- @description: one row by id
-- @param $id = 42
SELECT * FROM t WHERE a1 = $id
"#;

        // WHEN
        let ops = Operations::parse(source).unwrap();

        // THEN
        assert_eq!(ops.get_step("by_id").unwrap(), "SELECT * FROM t WHERE a1 = 42");
        assert_eq!(ops.get_step_raw("by_id").unwrap(), "SELECT * FROM t WHERE a1 = $id");
    }

    #[test]
    fn test_rejects_bad_markers() {
        assert!(Operations::parse("--#\nSELECT 1").is_err());
        assert!(Operations::parse("--# a\nSELECT 1\n--# a\nSELECT 2").is_err());
    }

    #[test]
    fn test_empty_step_has_no_sql() {
        let ops = Operations::parse("--# nothing\n\n--# one\nSELECT 1").unwrap();
        assert_eq!(ops.step_names().len(), 2);
        assert!(ops.get_step("nothing").is_none());
    }
}
