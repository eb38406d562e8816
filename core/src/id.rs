//! Identity types for sessions and queries.
//!
//! Identifiers are allocated by the coordinator and are:
//! - Unique within the coordinator instance that issued them
//! - Immutable once assigned
//! - Opaque to callers (only meaningful relative to the issuing cluster)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a server-side session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId from a raw value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a submitted query.
///
/// Structurally a (submission context, sequence number) pair. The context is
/// optional because identifiers decoded from the wire may lack it; such an
/// identifier, like one with a negative sequence, never names a live query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId {
    id: Option<String>,
    seq: i32,
}

impl QueryId {
    const PREFIX: &'static str = "q_";
    /// Stands in for a missing context in the text form.
    const NULL_CONTEXT: &'static str = "<null>";

    /// Create a query identifier from its context string and sequence number.
    pub fn new(id: impl Into<String>, seq: i32) -> Self {
        Self {
            id: Some(id.into()),
            seq,
        }
    }

    /// Build an identifier from possibly-missing wire fields.
    pub fn from_parts(id: Option<String>, seq: i32) -> Self {
        Self { id, seq }
    }

    /// The identifier handed back for statements that never became a tracked query.
    pub fn null() -> Self {
        Self { id: None, seq: -1 }
    }

    /// Returns true if this is the null identifier.
    pub fn is_null(&self) -> bool {
        self.id.is_none() && self.seq < 0
    }

    /// Context string, if present.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Sequence number.
    pub fn seq(&self) -> i32 {
        self.seq
    }

    /// A well-formed identifier has a non-empty context and a non-negative sequence.
    pub fn is_well_formed(&self) -> bool {
        matches!(&self.id, Some(id) if !id.is_empty()) && self.seq >= 0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}{}_{:04}", Self::PREFIX, id, self.seq),
            None => write!(f, "{}{}_{}", Self::PREFIX, Self::NULL_CONTEXT, self.seq),
        }
    }
}

/// Error returned when a string is not a query identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid query id '{input}': {reason}")]
pub struct ParseQueryIdError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for QueryId {
    type Err = ParseQueryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseQueryIdError {
            input: s.to_string(),
            reason,
        };

        let body = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| err("missing 'q_' prefix"))?;
        let (id, seq) = body
            .rsplit_once('_')
            .ok_or_else(|| err("missing sequence number"))?;
        if id.is_empty() {
            return Err(err("empty context"));
        }
        let seq = seq
            .parse::<i32>()
            .map_err(|_| err("sequence number is not an integer"))?;

        if id == Self::NULL_CONTEXT {
            return Ok(QueryId::from_parts(None, seq));
        }
        Ok(QueryId::new(id, seq))
    }
}
