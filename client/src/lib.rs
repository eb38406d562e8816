//! Quarry Client
//!
//! One entry point over a single coordinator session:
//! - [`QuarryClient`] opens the session and owns both clients
//! - Catalog administration through [`CatalogAdminClient`]
//! - Query submission and results through [`QueryClient`]

mod facade;

pub use facade::QuarryClient;
pub use quarry_catalog::CatalogAdminClient;
pub use quarry_core::{
    ClientError, ClientResult, DataType, Datum, KeyValueSet, QueryId, QueryState, ResultCode,
    Row, Schema,
};
pub use quarry_query::{CancelHandle, QueryClient, QueryStatus, ResultSet, SubmitQueryResponse};
pub use quarry_service::{LocalServiceTracker, ServiceTracker};
pub use quarry_session::{ClientConfig, SessionConnection};
