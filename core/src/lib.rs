//! Quarry Core Types
//!
//! This crate provides the foundational types shared by every Quarry client crate:
//! - Identity types (SessionId, QueryId)
//! - Data types, datums, rows and schemas
//! - Result codes and query execution states
//! - The remote fault type and the client-visible error taxonomy
//! - Database naming rules

mod code;
mod error;
mod id;
pub mod messages;
mod names;
mod value;

pub use code::*;
pub use error::*;
pub use id::*;
pub use names::*;
pub use value::*;

/// Per-session configuration and session variables.
pub type KeyValueSet = std::collections::BTreeMap<String, String>;
