//! Naming rules and well-known names.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::messages::{ERR_EMPTY_DATABASE_NAME, ERR_INVALID_DATABASE_NAME};
use crate::{ClientError, ClientResult};

/// Database every coordinator starts with and sessions fall back to.
pub const DEFAULT_DATABASE: &str = "default";

/// Protected system database; never droppable by ordinary privilege.
pub const INFORMATION_SCHEMA: &str = "information_schema";

/// Session variable mirroring the session's current database.
pub const CURRENT_DATABASE_VAR: &str = "CURRENT_DATABASE";

const DATABASE_NAME_PATTERN: &str = "^[A-Za-z0-9_-]+$";

fn database_name_pattern() -> ClientResult<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(DATABASE_NAME_PATTERN).ok())
        .as_ref()
        .ok_or_else(|| {
            ClientError::internal(format!(
                "invalid database name pattern '{}'",
                DATABASE_NAME_PATTERN
            ))
        })
}

/// Returns true if `name` is a syntactically valid database name.
pub fn is_valid_database_name(name: &str) -> bool {
    database_name_pattern().map_or(false, |re| re.is_match(name))
}

/// Check a database name before it is sent anywhere.
///
/// Names must be non-empty and consist only of ASCII letters, digits, `_` and `-`.
/// Comparison elsewhere is case-sensitive, so `db1` and `DB1` are distinct names.
pub fn validate_database_name(name: &str) -> ClientResult<()> {
    if name.is_empty() {
        return Err(ClientError::invalid_argument(ERR_EMPTY_DATABASE_NAME));
    }
    if !database_name_pattern()?.is_match(name) {
        return Err(ClientError::invalid_argument(format!(
            "{}: '{}'",
            ERR_INVALID_DATABASE_NAME, name
        )));
    }
    Ok(())
}
