//! Sink connector trait and outcome classification

use super::batch::RecordBatch;
use crate::error::{ConnectorError, ConnectorResult};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Trait for sink connector configuration
pub trait SinkConfig: DeserializeOwned + Validate + JsonSchema + Send + Sync {}

// Blanket implementation
impl<T> SinkConfig for T where T: DeserializeOwned + Validate + JsonSchema + Send + Sync {}

/// Classified result of writing one batch.
///
/// The host pipeline keys its scheduling off the variant: `Success` lets the
/// batch be discarded, `RetryableFailure` requeues it under the normal
/// backoff policy, and `FatalFailure` dead-letters it permanently.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The statement executed; the batch may be discarded
    Success {
        /// Rows the destination reported as affected
        rows_affected: u64,
    },
    /// Failed, but a later redelivery may succeed; cause returned unchanged
    RetryableFailure(ConnectorError),
    /// Failed permanently; redelivering the same batch cannot succeed
    FatalFailure(ConnectorError),
}

impl BatchOutcome {
    /// Success with an affected-row count
    pub fn success(rows_affected: u64) -> Self {
        Self::Success { rows_affected }
    }

    /// Retryable failure from a cause
    pub fn retryable(cause: ConnectorError) -> Self {
        Self::RetryableFailure(cause)
    }

    /// Fatal failure from a cause
    pub fn fatal(cause: ConnectorError) -> Self {
        Self::FatalFailure(cause)
    }

    /// Whether the batch was written
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the host pipeline should requeue the batch
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableFailure(_))
    }

    /// Whether the host pipeline must dead-letter the batch
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalFailure(_))
    }

    /// Flatten into a `Result` for callers that propagate with `?`.
    ///
    /// Retryable causes pass through unchanged; fatal causes are wrapped in
    /// [`ConnectorError::Fatal`] so the classification survives flattening.
    pub fn into_result(self) -> ConnectorResult<u64> {
        match self {
            Self::Success { rows_affected } => Ok(rows_affected),
            Self::RetryableFailure(cause) => Err(cause),
            Self::FatalFailure(cause) => match cause {
                already @ ConnectorError::Fatal(_) => Err(already),
                other => Err(ConnectorError::Fatal(other.to_string())),
            },
        }
    }
}

/// Result of a connectivity/configuration check
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    /// Individual check outcomes in execution order
    pub details: Vec<CheckDetail>,
}

/// A single named check outcome
#[derive(Debug, Clone)]
pub struct CheckDetail {
    /// Check name (e.g. "connectivity")
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Failure message, if any
    pub message: Option<String>,
}

impl CheckResult {
    /// Create an empty check result
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passed check (builder-style)
    pub fn check_passed(mut self, name: impl Into<String>) -> Self {
        self.details.push(CheckDetail {
            name: name.into(),
            passed: true,
            message: None,
        });
        self
    }

    /// Record a failed check (builder-style)
    pub fn check_failed(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.details.push(CheckDetail {
            name: name.into(),
            passed: false,
            message: Some(message.into()),
        });
        self
    }

    /// Whether every recorded check passed
    pub fn passed(&self) -> bool {
        self.details.iter().all(|d| d.passed)
    }
}

/// Trait for batch sink connectors
///
/// Batch sinks consume finalized record batches and write them to external
/// systems, returning a classified outcome per batch. Implementations hold
/// no shared mutable state; concurrent batches run on independent workers.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Configuration type for this sink
    type Config: SinkConfig;

    /// Check connectivity and configuration
    async fn check(&self, config: &Self::Config) -> ConnectorResult<CheckResult>;

    /// Write one finalized batch and classify the result.
    ///
    /// Exactly one write attempt per invocation; retry scheduling belongs
    /// to the caller.
    async fn write_batch(&self, config: &Self::Config, batch: &RecordBatch) -> BatchOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        assert!(BatchOutcome::success(3).is_success());
        assert!(BatchOutcome::retryable(ConnectorError::connection("down")).is_retryable());
        assert!(BatchOutcome::fatal(ConnectorError::fatal("schema drift")).is_fatal());
    }

    #[test]
    fn test_into_result_preserves_retryable_cause() {
        let outcome = BatchOutcome::retryable(ConnectorError::connection("down"));
        let err = outcome.into_result().unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, ConnectorError::Connection(_)));
    }

    #[test]
    fn test_into_result_wraps_fatal_cause() {
        let outcome = BatchOutcome::fatal(ConnectorError::Schema("column count".into()));
        let err = outcome.into_result().unwrap_err();
        assert!(matches!(err, ConnectorError::Fatal(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_check_result() {
        let result = CheckResult::new()
            .check_passed("connectivity")
            .check_failed("query_execution", "access denied");
        assert!(!result.passed());
        assert_eq!(result.details.len(), 2);
    }
}
