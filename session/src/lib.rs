//! Quarry Session
//!
//! The connection every Quarry client works through:
//! - Opening and closing a coordinator session
//! - The session's current database and session variables
//! - Client configuration (user, fetch size, poll loop bounds)

mod config;
mod connection;

pub use config::{ClientConfig, CLIENT_KEY_PREFIX};
pub use connection::SessionConnection;
