//! Quarry Query
//!
//! Submit SQL to the coordinator and read its results.
//!
//! Responsibilities:
//! - Submit queries and report their result codes
//! - Track query state on request
//! - Wait for completion with a bounded, cancellable poll loop
//! - Page through result rows with a forward-only cursor

mod cancel;
mod client;
mod poll;
mod result_set;

pub use cancel::CancelHandle;
pub use client::QueryClient;
pub use quarry_service::{QueryStatus, SubmitQueryResponse};
pub use result_set::ResultSet;
