//! Assertion types and builders for verifying step results.

use quarry_core::{ClientError, Datum, ResultCode, Row};

use crate::error::{ScenarioError, ScenarioResult};

/// Materialized result of one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// A complete assertion for a step result.
#[derive(Default)]
pub struct Assertion {
    // Result shape
    pub columns: Option<Vec<String>>,
    pub rows: Option<usize>,
    pub rows_min: Option<usize>,
    pub rows_max: Option<usize>,
    pub empty: Option<bool>,

    // Result content
    pub value: Option<Datum>,
    pub contains: Vec<Row>,
    pub returns: Option<Vec<Row>>,
    pub ordered: bool,
    pub first: Option<Row>,

    // Failures
    pub error: Option<String>,
    pub error_code: Option<ResultCode>,
    pub error_pattern: Option<String>,

    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&StepOutput) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("empty", &self.empty)
            .field("value", &self.value)
            .field("returns", &self.returns)
            .field("ordered", &self.ordered)
            .field("error", &self.error)
            .field("error_code", &self.error_code)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    fn expects_error(&self) -> bool {
        self.error.is_some() || self.error_code.is_some() || self.error_pattern.is_some()
    }

    /// Verify the assertion against a step result.
    pub fn verify(&self, step: &str, result: &Result<StepOutput, ClientError>) -> ScenarioResult<()> {
        if self.expects_error() {
            return match result {
                Err(err) => self.verify_error(step, err),
                Ok(output) => Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "expected an error, but step succeeded with {} rows",
                        output.rows.len()
                    ),
                )),
            };
        }

        let output = result
            .as_ref()
            .map_err(|err| ScenarioError::assertion_failed(step, format!("step failed: {}", err)))?;

        if let Some(ref custom) = self.custom {
            if !custom(output) {
                return Err(ScenarioError::assertion_failed(step, "custom assertion failed"));
            }
        }

        self.verify_shape(step, output)?;
        self.verify_content(step, output)
    }

    fn verify_error(&self, step: &str, err: &ClientError) -> ScenarioResult<()> {
        let message = err.to_string();

        if let Some(expected) = self.error_code {
            if err.code() != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error code {}, got {} ({})", expected, err.code(), message),
                ));
            }
        }

        if let Some(ref expected) = self.error {
            if !message.contains(expected.as_str()) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error containing '{}', got: {}", expected, message),
                ));
            }
        }

        if let Some(ref pattern) = self.error_pattern {
            let re = regex_lite::Regex::new(pattern).map_err(|e| {
                ScenarioError::assertion_failed(step, format!("invalid regex pattern: {}", e))
            })?;
            if !re.is_match(&message) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error matching '{}', got: {}", pattern, message),
                ));
            }
        }

        Ok(())
    }

    fn verify_shape(&self, step: &str, output: &StepOutput) -> ScenarioResult<()> {
        if let Some(ref expected) = self.columns {
            if &output.columns != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "column mismatch:\n  expected: {:?}\n  actual:   {:?}",
                        expected, output.columns
                    ),
                ));
            }
        }

        let count = output.rows.len();
        if let Some(expected) = self.rows {
            if count != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {} rows, got {}", expected, count),
                ));
            }
        }
        if let Some(min) = self.rows_min {
            if count < min {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected at least {} rows, got {}", min, count),
                ));
            }
        }
        if let Some(max) = self.rows_max {
            if count > max {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected at most {} rows, got {}", max, count),
                ));
            }
        }
        match self.empty {
            Some(true) if count > 0 => Err(ScenarioError::assertion_failed(
                step,
                format!("expected empty result, got {} rows", count),
            )),
            Some(false) if count == 0 => Err(ScenarioError::assertion_failed(
                step,
                "expected non-empty result",
            )),
            _ => Ok(()),
        }
    }

    fn verify_content(&self, step: &str, output: &StepOutput) -> ScenarioResult<()> {
        if let Some(ref expected) = self.value {
            let actual = match output.rows.as_slice() {
                [row] if row.len() == 1 => &row.values()[0],
                _ => {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        format!(
                            "expected single value, got {} rows with {} columns",
                            output.rows.len(),
                            output.columns.len()
                        ),
                    ))
                }
            };
            if !values_equal(actual, expected) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("value mismatch:\n  expected: {}\n  actual:   {}", expected, actual),
                ));
            }
        }

        for expected in &self.contains {
            if !output.rows.iter().any(|row| rows_equal(row, expected)) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "expected a row {}, got:\n{}",
                        format_row(expected),
                        format_rows(&output.rows)
                    ),
                ));
            }
        }

        if let Some(ref expected) = self.first {
            match output.rows.first() {
                Some(row) if rows_equal(row, expected) => {}
                other => {
                    return Err(ScenarioError::assertion_failed(
                        step,
                        format!(
                            "first row mismatch:\n  expected: {}\n  actual:   {}",
                            format_row(expected),
                            other.map(format_row).unwrap_or_else(|| "<none>".into())
                        ),
                    ))
                }
            }
        }

        if let Some(ref expected) = self.returns {
            let matched = if self.ordered {
                expected.len() == output.rows.len()
                    && expected.iter().zip(&output.rows).all(|(e, a)| rows_equal(a, e))
            } else {
                multiset_equal(&output.rows, expected)
            };
            if !matched {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "rows mismatch{}:\n  expected:\n{}\n  actual:\n{}",
                        if self.ordered { " (ordered)" } else { "" },
                        format_rows(expected),
                        format_rows(&output.rows)
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Builder for fluent assertion construction.
pub struct AssertionBuilder {
    assertion: Assertion,
}

impl AssertionBuilder {
    pub fn new() -> Self {
        Self {
            assertion: Assertion::new(),
        }
    }

    pub fn build(self) -> Assertion {
        self.assertion
    }

    /// Succeed without checking anything else.
    pub fn ok(self) -> Self {
        self
    }

    /// Assert the result columns, in order.
    pub fn columns(mut self, names: &[&str]) -> Self {
        self.assertion.columns = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn rows(mut self, n: usize) -> Self {
        self.assertion.rows = Some(n);
        self
    }

    pub fn rows_min(mut self, n: usize) -> Self {
        self.assertion.rows_min = Some(n);
        self
    }

    pub fn rows_max(mut self, n: usize) -> Self {
        self.assertion.rows_max = Some(n);
        self
    }

    pub fn empty(mut self) -> Self {
        self.assertion.empty = Some(true);
        self
    }

    pub fn not_empty(mut self) -> Self {
        self.assertion.empty = Some(false);
        self
    }

    /// Assert a single-row, single-column result.
    pub fn value(mut self, v: impl Into<Datum>) -> Self {
        self.assertion.value = Some(v.into());
        self
    }

    /// Assert that some row equals `row`.
    pub fn contains(mut self, row: Row) -> Self {
        self.assertion.contains.push(row);
        self
    }

    pub fn first(mut self, row: Row) -> Self {
        self.assertion.first = Some(row);
        self
    }

    /// Assert exactly these rows, in any order unless `ordered()` is set.
    pub fn returns(mut self, rows: Vec<Row>) -> Self {
        self.assertion.returns = Some(rows);
        self
    }

    pub fn ordered(mut self) -> Self {
        self.assertion.ordered = true;
        self
    }

    /// Assert a failure whose message contains `text`.
    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.assertion.error = Some(text.into());
        self
    }

    /// Assert a failure carrying `code`.
    pub fn error_code(mut self, code: ResultCode) -> Self {
        self.assertion.error_code = Some(code);
        self
    }

    /// Assert a failure whose message matches a regex.
    pub fn error_matches(mut self, pattern: impl Into<String>) -> Self {
        self.assertion.error_pattern = Some(pattern.into());
        self
    }

    pub fn assert_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&StepOutput) -> bool + Send + Sync + 'static,
    {
        self.assertion.custom = Some(Box::new(f));
        self
    }
}

impl Default for AssertionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric values compare by value across widths.
fn values_equal(a: &Datum, b: &Datum) -> bool {
    match (a, b) {
        (Datum::Float8(_), _) | (_, Datum::Float8(_)) => match (a.as_double(), b.as_double()) {
            (Some(x), Some(y)) => (x - y).abs() < 1e-9,
            _ => false,
        },
        _ => match (a.as_long(), b.as_long()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

fn rows_equal(actual: &Row, expected: &Row) -> bool {
    actual.len() == expected.len()
        && actual
            .values()
            .iter()
            .zip(expected.values())
            .all(|(a, e)| values_equal(a, e))
}

fn multiset_equal(actual: &[Row], expected: &[Row]) -> bool {
    if actual.len() != expected.len() {
        return false;
    }
    let mut used = vec![false; actual.len()];
    expected.iter().all(|e| {
        let found = actual
            .iter()
            .enumerate()
            .position(|(i, a)| !used[i] && rows_equal(a, e));
        match found {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

fn format_row(row: &Row) -> String {
    let values: Vec<String> = row.values().iter().map(|v| v.to_string()).collect();
    format!("({})", values.join(", "))
}

fn format_rows(rows: &[Row]) -> String {
    rows.iter()
        .map(|r| format!("    {}", format_row(r)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::row;

    fn output() -> StepOutput {
        StepOutput {
            columns: vec!["a1".into(), "a2".into()],
            rows: vec![row![7, "T"], row![8, "U"]],
        }
    }

    #[test]
    fn test_shape_and_content() {
        let assertion = AssertionBuilder::new()
            .columns(&["a1", "a2"])
            .rows(2)
            .contains(row![8i64, "U"])
            .returns(vec![row![8, "U"], row![7, "T"]])
            .build();

        assert!(assertion.verify("s", &Ok(output())).is_ok());
    }

    #[test]
    fn test_ordered_returns() {
        let assertion = AssertionBuilder::new()
            .returns(vec![row![8, "U"], row![7, "T"]])
            .ordered()
            .build();

        let err = assertion.verify("s", &Ok(output())).unwrap_err();
        assert!(err.to_string().contains("ordered"));
    }

    #[test]
    fn test_error_expectations() {
        // GIVEN
        let failure: Result<StepOutput, ClientError> = Err(ClientError::query_failed(
            None,
            ResultCode::UndefinedColumn,
            "column 'x' does not exist",
        ));

        // WHEN/THEN
        let by_code = AssertionBuilder::new()
            .error_code(ResultCode::UndefinedColumn)
            .build();
        assert!(by_code.verify("s", &failure).is_ok());

        let by_pattern = AssertionBuilder::new().error_matches("column '.' does").build();
        assert!(by_pattern.verify("s", &failure).is_ok());

        let wrong = AssertionBuilder::new().error("syntax").build();
        assert!(wrong.verify("s", &failure).is_err());

        assert!(by_code.verify("s", &Ok(output())).is_err());
    }

    #[test]
    fn test_numeric_values_compare_across_widths() {
        assert!(values_equal(&Datum::Int4(3), &Datum::Int8(3)));
        assert!(values_equal(&Datum::Int4(3), &Datum::Float8(3.0)));
        assert!(!values_equal(&Datum::Text("3".into()), &Datum::Int4(3)));
        assert!(values_equal(&Datum::Null, &Datum::Null));
    }
}
