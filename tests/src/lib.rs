//! Quarry integration test framework.
//!
//! Scenarios run SQL scripts against an in-process coordinator through the
//! public client and check each step's outcome:
//!
//! ```ignore
//! Scenario::new("orders")
//!     .database("shop")
//!     .seed("orders/seed.sql")
//!     .operations("orders/queries.sql")
//!     .step("count_rows", |a| a.rows(3))
//!     .step("bad_column", |a| a.error_code(ResultCode::UndefinedColumn))
//!     .run()
//!     .unwrap();
//! ```

pub mod assertion;
pub mod loader;
pub mod runner;
pub mod scenario;

pub mod prelude {
    pub use crate::assertion::{Assertion, AssertionBuilder, StepOutput};
    pub use crate::error::{ScenarioError, ScenarioResult};
    pub use crate::scenario::Scenario;
    pub use quarry_core::{row, Datum, ResultCode, Row};
}
