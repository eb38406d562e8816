//! Waiting for a query to reach a terminal state.

use std::thread;
use std::time::Duration;

use log::{debug, error, info};
use quarry_core::{ClientError, ClientResult, QueryId, QueryState};
use quarry_service::{QueryService, QueryStatus};
use quarry_session::SessionConnection;

use crate::cancel::CancelToken;

/// Exponential delay between status polls, capped at `max`.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub(crate) fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            max,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }
}

/// Poll the status of `query_id` until it is terminal.
///
/// Gives up with `Timeout` after the configured number of polls and with
/// `Cancelled` when `cancel` fires between polls. Both errors carry the id so
/// the caller can still kill the query.
pub(crate) fn wait_for_terminal(
    connection: &SessionConnection,
    query_id: &QueryId,
    cancel: &CancelToken,
) -> ClientResult<QueryStatus> {
    let config = connection.config();
    let max_attempts = config.max_poll_attempts;
    let mut backoff = Backoff::new(config.poll_interval(), config.max_poll_interval());
    let mut previous: Option<QueryState> = None;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            info!("wait for query {} cancelled after {} polls", query_id, attempt - 1);
            return Err(ClientError::Cancelled {
                query_id: query_id.clone(),
            });
        }

        let status = connection.call("get_query_status", |svc, sid| {
            svc.get_query_status(sid, query_id)
        })?;
        if previous != Some(status.state) {
            debug!("query {} is {}", query_id, status.state);
        }

        match status.state {
            QueryState::Failed => {
                error!(
                    "query {} failed with {}: {}",
                    query_id,
                    status.error_code,
                    status.error_message.as_deref().unwrap_or_default()
                );
                return Ok(status);
            }
            state if state.is_terminal() => return Ok(status),
            state => previous = Some(state),
        }

        if attempt < max_attempts {
            thread::sleep(backoff.next_delay());
        }
    }

    Err(ClientError::Timeout {
        query_id: query_id.clone(),
        attempts: max_attempts,
    })
}
