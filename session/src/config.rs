//! Client configuration.

use std::time::Duration;

use quarry_core::{ClientError, ClientResult, KeyValueSet};
use serde::{Deserialize, Serialize};

/// Prefix of configuration keys consumed by the client itself.
pub const CLIENT_KEY_PREFIX: &str = "quarry.client.";

/// Settings of a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User name presented when the session is created.
    pub user: String,
    /// Rows requested per result page.
    pub fetch_rows: usize,
    /// First delay of the status poll loop.
    pub poll_interval_ms: u64,
    /// Upper bound of the poll delay after backoff.
    pub max_poll_interval_ms: u64,
    /// Polls before a blocking wait gives up.
    pub max_poll_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user: "quarry".to_string(),
            fetch_rows: 200,
            poll_interval_ms: 100,
            max_poll_interval_ms: 1000,
            max_poll_attempts: 600,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_fetch_rows(mut self, rows: usize) -> Self {
        self.fetch_rows = rows;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_max_poll_interval_ms(mut self, ms: u64) -> Self {
        self.max_poll_interval_ms = ms;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ClientResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            ClientError::invalid_argument(format!("invalid client configuration: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ClientResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ClientError::internal(e.to_string()))
    }

    /// Split a session configuration set into client settings and the
    /// remaining keys, which become initial session variables.
    pub fn from_properties(properties: &KeyValueSet) -> ClientResult<(Self, KeyValueSet)> {
        let mut config = Self::default();
        let mut variables = KeyValueSet::new();

        for (key, value) in properties {
            let Some(name) = key.strip_prefix(CLIENT_KEY_PREFIX) else {
                variables.insert(key.clone(), value.clone());
                continue;
            };
            match name {
                "user" => config.user = value.clone(),
                "fetch-rows" => config.fetch_rows = parse_value(key, value)?,
                "poll-interval-ms" => config.poll_interval_ms = parse_value(key, value)?,
                "max-poll-interval-ms" => config.max_poll_interval_ms = parse_value(key, value)?,
                "max-poll-attempts" => config.max_poll_attempts = parse_value(key, value)?,
                _ => {
                    return Err(ClientError::invalid_argument(format!(
                        "unknown client setting '{}'",
                        key
                    )))
                }
            }
        }

        config.validate()?;
        Ok((config, variables))
    }

    /// Reject settings the poll loop and result fetching cannot work with.
    pub fn validate(&self) -> ClientResult<()> {
        if self.user.is_empty() {
            return Err(ClientError::invalid_argument("user name is empty"));
        }
        if self.fetch_rows == 0 {
            return Err(ClientError::invalid_argument("fetch_rows must be positive"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ClientError::invalid_argument(
                "poll_interval_ms must be positive",
            ));
        }
        if self.max_poll_attempts == 0 {
            return Err(ClientError::invalid_argument(
                "max_poll_attempts must be positive",
            ));
        }
        if self.poll_interval_ms > self.max_poll_interval_ms {
            return Err(ClientError::invalid_argument(
                "poll_interval_ms exceeds max_poll_interval_ms",
            ));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ClientResult<T> {
    value.trim().parse().map_err(|_| {
        ClientError::invalid_argument(format!("invalid value '{}' for '{}'", value, key))
    })
}
