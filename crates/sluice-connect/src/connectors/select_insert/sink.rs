//! Select-Insert Sink Connector
//!
//! Moves rows server-side: instead of uploading record payloads, each batch
//! compiles into a single `INSERT INTO ... SELECT ... WHERE col IN (...)`
//! statement keyed by one field per record, so the destination copies the
//! matching rows itself in one round trip.
//!
//! # Example
//!
//! ```yaml
//! connectors:
//!   - name: accessed-users
//!     type: select-insert-sink
//!     config:
//!       host: db.internal
//!       username: app
//!       password: secret
//!       database: events
//!       table: accessed_users
//!       select_query: "SELECT id, NOW() FROM users"
//!       condition_column: uuid
//!       condition_key: uuid
//!       ignore: true
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::connectors::select_insert::compiler::compile;
use crate::connectors::select_insert::config::SelectInsertConfig;
use crate::error::{ConnectorError, ConnectorResult};
use crate::traits::{BatchOutcome, BatchSink, CheckResult, RecordBatch};
use sluice_rdbc::connection::ConnectionFactory;
use sluice_rdbc::error::ErrorCategory;

/// Message prefix MySQL uses when the SELECT's column count does not match
/// the destination table
const COLUMN_COUNT_MISMATCH_PREFIX: &str = "Column count doesn't match value count";

/// Select-insert sink connector
///
/// Stateless between batches: each `write_batch` opens a fresh connection,
/// makes exactly one execution attempt, and closes the connection whether
/// the statement succeeded or not. Retry scheduling belongs to the host
/// pipeline, driven by the returned [`BatchOutcome`].
pub struct SelectInsertSink {
    factory: Arc<dyn ConnectionFactory>,
}

impl SelectInsertSink {
    /// Create a sink backed by the given connection factory
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self { factory }
    }

    /// Create a sink backed by MySQL
    #[cfg(feature = "mysql")]
    pub fn mysql() -> Self {
        Self::new(Arc::new(sluice_rdbc::mysql::MySqlConnectionFactory))
    }
}

#[async_trait]
impl BatchSink for SelectInsertSink {
    type Config = SelectInsertConfig;

    async fn check(&self, config: &Self::Config) -> ConnectorResult<CheckResult> {
        if let Err(e) = config.validate_startup() {
            return Ok(CheckResult::new().check_failed("configuration", e.to_string()));
        }
        let mut result = CheckResult::new().check_passed("configuration");

        match self.factory.connect(&config.connection_config()).await {
            Ok(conn) => {
                result = result.check_passed("connectivity");
                result = match conn.execute("SELECT 1", &[]).await {
                    Ok(_) => result.check_passed("query_execution"),
                    Err(e) => result.check_failed("query_execution", e.to_string()),
                };
                if let Err(e) = conn.close().await {
                    warn!(error = %e, "failed to close check connection");
                }
            }
            Err(e) => {
                result = result.check_failed("connectivity", e.to_string());
            }
        }

        Ok(result)
    }

    async fn write_batch(&self, config: &Self::Config, batch: &RecordBatch) -> BatchOutcome {
        if batch.is_empty() {
            debug!(table = %config.table, "empty batch, nothing to write");
            return BatchOutcome::success(0);
        }

        if let Err(e) = config.validate_startup() {
            return BatchOutcome::fatal(e);
        }

        let compiled = match compile(config, batch) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(table = %config.table, records = batch.len(), error = %e,
                    "batch cannot compile, dead-lettering");
                return BatchOutcome::fatal(e);
            }
        };

        let conn = match self.factory.connect(&config.connection_config()).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(host = %config.host, database = %config.database, error = %e,
                    "connection failed, batch will be retried");
                return BatchOutcome::retryable(ConnectorError::connection(e.to_string()));
            }
        };

        let result = conn.execute(&compiled.sql, &compiled.params).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close connection");
        }

        match result {
            Ok(rows_affected) => {
                debug!(table = %config.table, records = batch.len(), rows_affected,
                    "batch written");
                BatchOutcome::success(rows_affected)
            }
            Err(e) => classify_execution_error(e),
        }
    }
}

/// Classify a statement execution failure.
///
/// A column-count mismatch means the SELECT's shape disagrees with the
/// destination table; redelivering the identical batch re-runs the identical
/// statement, so it is fatal. Everything else is handed back for retry with
/// its cause unchanged, uniqueness violations included (configure `ignore`
/// to skip those instead).
fn classify_execution_error(err: sluice_rdbc::Error) -> BatchOutcome {
    if err.category() == ErrorCategory::Schema
        || err.message().starts_with(COLUMN_COUNT_MISMATCH_PREFIX)
    {
        warn!(error = %err, "statement shape rejected by destination, dead-lettering");
        return BatchOutcome::fatal(ConnectorError::Schema(err.to_string()));
    }

    warn!(error = %err, "batch write failed, batch will be retried");
    let cause = match err.category() {
        ErrorCategory::Timeout => ConnectorError::Timeout(err.message().to_string()),
        ErrorCategory::Connection => ConnectorError::connection(err.message().to_string()),
        _ => ConnectorError::transient(err.to_string()),
    };
    BatchOutcome::retryable(cause)
}
