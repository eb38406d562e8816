//! Scenario definitions.

use std::path::PathBuf;

use crate::assertion::{Assertion, AssertionBuilder};
use crate::error::ScenarioResult;
use crate::loader::Operations;
use crate::runner::Runner;

/// A named step and the assertion its result must satisfy.
#[derive(Debug)]
pub struct Step {
    pub name: String,
    pub assertion: Assertion,
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Inline(Operations),
}

impl Source {
    fn load(&self) -> ScenarioResult<Operations> {
        match self {
            Source::File(path) => Operations::load(path),
            Source::Inline(ops) => Ok(ops.clone()),
        }
    }
}

/// A scripted run against a fresh in-process coordinator.
///
/// Script paths are relative to the `scripts/` directory of this crate.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    database: Option<String>,
    seed: Option<Source>,
    operations: Option<Source>,
    execution_latency: u32,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: None,
            seed: None,
            operations: None,
            execution_latency: 0,
            steps: Vec::new(),
        }
    }

    /// Create this database and select it before seeding.
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    /// Script whose steps all run, in order, before the checked steps.
    pub fn seed(mut self, path: &str) -> Self {
        self.seed = Some(Source::File(scripts_dir().join(path)));
        self
    }

    pub fn seed_source(mut self, source: &str) -> ScenarioResult<Self> {
        self.seed = Some(Source::Inline(Operations::parse(source)?));
        Ok(self)
    }

    pub fn operations(mut self, path: &str) -> Self {
        self.operations = Some(Source::File(scripts_dir().join(path)));
        self
    }

    pub fn operations_source(mut self, source: &str) -> ScenarioResult<Self> {
        self.operations = Some(Source::Inline(Operations::parse(source)?));
        Ok(self)
    }

    /// Status polls each query spends before the coordinator runs it.
    pub fn execution_latency(mut self, polls: u32) -> Self {
        self.execution_latency = polls;
        self
    }

    pub fn step<F>(mut self, name: &str, f: F) -> Self
    where
        F: FnOnce(AssertionBuilder) -> AssertionBuilder,
    {
        self.steps.push(Step {
            name: name.to_string(),
            assertion: f(AssertionBuilder::new()).build(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn latency(&self) -> u32 {
        self.execution_latency
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub(crate) fn load_seed(&self) -> ScenarioResult<Option<Operations>> {
        self.seed.as_ref().map(Source::load).transpose()
    }

    pub(crate) fn load_operations(&self) -> ScenarioResult<Operations> {
        match &self.operations {
            Some(source) => source.load(),
            None => Ok(Operations::default()),
        }
    }

    pub fn run(&self) -> ScenarioResult<()> {
        Runner::new(self)?.run()
    }
}

fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scripts")
}
