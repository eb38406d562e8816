//! Quarry Service
//!
//! The coordinator boundary consumed by the Quarry clients:
//! - Session, catalog and query execution service traits
//! - Service trackers that resolve and connect to a coordinator
//! - An in-memory coordinator implementing every service, with a small SQL
//!   engine (planner, evaluator, executor) over an in-memory catalog

mod api;
mod catalog;
mod coordinator;
mod error;
mod eval;
mod executor;
mod plan;
mod tracker;

pub use api::{
    CatalogService, Coordinator, QueryService, QueryStatus, ResultBatch, SessionService,
    SubmitQueryResponse,
};
pub use coordinator::{CoordinatorConfig, InMemoryCoordinator};
pub use error::{EngineError, EngineResult};
pub use tracker::{LocalServiceTracker, ServiceTracker, UnreachableServiceTracker};
