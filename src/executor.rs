//! SQL execution over `may_postgres`.
//!
//! `StoreExecutor` is the seam between the PostgreSQL record store and the
//! client; tests and alternative drivers implement it without a database.

use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Execution error type
#[derive(Debug)]
pub enum SqlError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Row could not be decoded
    ParseError(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            SqlError::ParseError(s) => write!(f, "Parse error: {s}"),
            SqlError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for SqlError {}

impl From<PostgresError> for SqlError {
    fn from(err: PostgresError) -> Self {
        SqlError::PostgresError(err)
    }
}

/// Executes SQL text and returns raw rows.
pub trait StoreExecutor {
    /// Execute a statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `SqlError` if execution fails.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, SqlError>;

    /// Execute a query and return the first column of every row as text.
    ///
    /// # Errors
    ///
    /// Returns `SqlError` if execution fails or a column is not text.
    fn query_text(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<String>, SqlError>;
}

/// `StoreExecutor` backed by a `may_postgres::Client`.
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, SqlError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let rows = self.client.query(query, params).map_err(|e| {
            #[cfg(feature = "metrics")]
            METRICS.record_query_error();
            SqlError::PostgresError(e)
        })?;

        let duration = start.elapsed();
        #[cfg(feature = "metrics")]
        METRICS.record_query_duration(duration);
        log::debug!("query returned {} row(s) in {:?}", rows.len(), duration);
        Ok(rows)
    }
}

impl StoreExecutor for MayPostgresExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, SqlError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let affected = self.client.execute(query, params).map_err(|e| {
            #[cfg(feature = "metrics")]
            METRICS.record_query_error();
            SqlError::PostgresError(e)
        })?;

        let duration = start.elapsed();
        #[cfg(feature = "metrics")]
        METRICS.record_query_duration(duration);
        log::debug!("statement affected {} row(s) in {:?}", affected, duration);
        Ok(affected)
    }

    fn query_text(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<String>, SqlError> {
        self.query_all(query, params)?
            .iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|e| SqlError::ParseError(format!("Failed to read text column: {e}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_error_display() {
        let err = SqlError::ParseError("bad row".to_string());
        assert_eq!(err.to_string(), "Parse error: bad row");
        let err = SqlError::Other("closed".to_string());
        assert!(err.to_string().starts_with("Execution error"));
    }
}
