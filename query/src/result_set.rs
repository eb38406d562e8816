//! Forward-only cursor over the rows of a finished query.

use std::collections::VecDeque;
use std::sync::Arc;

use log::warn;
use quarry_core::{messages, ClientError, ClientResult, Datum, QueryId, Row, Schema};
use quarry_service::QueryService;
use quarry_session::SessionConnection;

/// Rows of a succeeded query, fetched lazily in pages of the session's
/// `fetch_rows`.
///
/// The cursor starts before the first row; call [`advance`](Self::advance)
/// to move onto it. Column indexes are zero-based. Closing or dropping the
/// result releases its query on the server.
#[derive(Debug)]
pub struct ResultSet {
    connection: Arc<SessionConnection>,
    query_id: QueryId,
    schema: Schema,
    buffered: VecDeque<Row>,
    current: Option<Row>,
    /// Rows received from the server so far.
    fetched: usize,
    end_of_result: bool,
    closed: bool,
}

impl ResultSet {
    /// Open the result of a succeeded query and fetch its first page.
    pub(crate) fn open(connection: Arc<SessionConnection>, query_id: QueryId) -> ClientResult<Self> {
        let mut result = Self {
            connection,
            query_id,
            schema: Schema::empty(),
            buffered: VecDeque::new(),
            current: None,
            fetched: 0,
            end_of_result: false,
            closed: false,
        };
        result.fetch_page()?;
        Ok(result)
    }

    /// The result of a statement that produced no rows.
    pub(crate) fn empty(connection: Arc<SessionConnection>) -> Self {
        Self {
            connection,
            query_id: QueryId::null(),
            schema: Schema::empty(),
            buffered: VecDeque::new(),
            current: None,
            fetched: 0,
            end_of_result: true,
            closed: false,
        }
    }

    fn fetch_page(&mut self) -> ClientResult<()> {
        let limit = self.connection.config().fetch_rows;
        let offset = self.fetched;
        let query_id = &self.query_id;
        let batch = self.connection.call("fetch_result", |svc, sid| {
            svc.fetch_result(sid, query_id, offset, limit)
        })?;

        self.schema = batch.schema;
        self.fetched += batch.rows.len();
        self.end_of_result = batch.end_of_result || batch.rows.is_empty();
        self.buffered.extend(batch.rows);
        Ok(())
    }

    /// Move to the next row. Returns false once the rows are exhausted.
    pub fn advance(&mut self) -> ClientResult<bool> {
        self.connection.ensure_open()?;
        if self.closed {
            return Err(ClientError::invalid_argument(messages::ERR_RESULT_SET_CLOSED));
        }
        if self.buffered.is_empty() && !self.end_of_result {
            self.fetch_page()?;
        }
        self.current = self.buffered.pop_front();
        Ok(self.current.is_some())
    }

    /// Release the query and drop the buffered rows. Closing twice is a
    /// no-op, and so is closing after the session is gone.
    pub fn close(&mut self) -> ClientResult<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.buffered.clear();
        self.current = None;
        if self.query_id.is_null() || self.connection.is_closed() {
            return Ok(());
        }
        let query_id = &self.query_id;
        self.connection
            .call("close_query", |svc, sid| svc.close_query(sid, query_id))
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn query_id(&self) -> &QueryId {
        &self.query_id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The row under the cursor.
    pub fn row(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    pub fn get(&self, idx: usize) -> ClientResult<&Datum> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| ClientError::invalid_argument("cursor is not on a row"))?;
        row.get(idx).ok_or_else(|| {
            ClientError::invalid_argument(format!(
                "column index {} out of range for {} columns",
                idx,
                row.len()
            ))
        })
    }

    pub fn is_null(&self, idx: usize) -> ClientResult<bool> {
        Ok(self.get(idx)?.is_null())
    }

    pub fn get_bool(&self, idx: usize) -> ClientResult<Option<bool>> {
        self.typed(idx, "BOOLEAN", Datum::as_bool)
    }

    pub fn get_int(&self, idx: usize) -> ClientResult<Option<i32>> {
        self.typed(idx, "INT4", Datum::as_int)
    }

    pub fn get_long(&self, idx: usize) -> ClientResult<Option<i64>> {
        self.typed(idx, "INT8", Datum::as_long)
    }

    pub fn get_double(&self, idx: usize) -> ClientResult<Option<f64>> {
        self.typed(idx, "FLOAT8", Datum::as_double)
    }

    /// Any non-null value rendered as text.
    pub fn get_string(&self, idx: usize) -> ClientResult<Option<String>> {
        Ok(match self.get(idx)? {
            Datum::Null => None,
            Datum::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }

    /// Position of a result column, matched case-insensitively.
    pub fn find_column(&self, name: &str) -> ClientResult<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| ClientError::invalid_argument(format!("no column named '{}'", name)))
    }

    /// Drain the rows after the cursor.
    pub fn collect_rows(&mut self) -> ClientResult<Vec<Row>> {
        let mut rows = Vec::new();
        while self.advance()? {
            if let Some(row) = self.current.take() {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn typed<T>(
        &self,
        idx: usize,
        expected: &str,
        convert: impl FnOnce(&Datum) -> Option<T>,
    ) -> ClientResult<Option<T>> {
        let datum = self.get(idx)?;
        if datum.is_null() {
            return Ok(None);
        }
        convert(datum).map(Some).ok_or_else(|| {
            ClientError::invalid_argument(format!(
                "column {} holds {}, not {}",
                idx,
                datum.type_name(),
                expected
            ))
        })
    }
}

impl Drop for ResultSet {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("failed to release query {}: {}", self.query_id, err);
        }
    }
}
