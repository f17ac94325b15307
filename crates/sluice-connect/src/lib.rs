//! # sluice-connect
//!
//! Connector SDK for the sluice streaming pipeline.
//!
//! A connector consumes finalized [`RecordBatch`]es from the host pipeline
//! and writes them to an external system, returning a classified
//! [`BatchOutcome`] per batch so the pipeline can decide between discard,
//! retry, and dead-letter.
//!
//! ## Built-in connectors
//!
//! - [`SelectInsertSink`](connectors::SelectInsertSink): compiles each batch
//!   into one `INSERT INTO ... SELECT ... WHERE col IN (...)` statement so
//!   the destination database copies matching rows server-side.
//!
//! ## Example
//!
//! ```no_run
//! use sluice_connect::connectors::{SelectInsertConfig, SelectInsertSink};
//! use sluice_connect::traits::{BatchSink, RecordBatch};
//! use serde_json::json;
//!
//! # #[cfg(feature = "mysql")]
//! # async fn run() -> anyhow::Result<()> {
//! let config: SelectInsertConfig = serde_yaml::from_str(
//!     r#"
//!     username: app
//!     password: secret
//!     database: events
//!     table: accessed_users
//!     select_query: "SELECT id, NOW() FROM users"
//!     condition_column: uuid
//!     condition_key: uuid
//!     "#,
//! )?;
//!
//! let sink = SelectInsertSink::mysql();
//! let batch = RecordBatch::new().with_record(json!({"uuid": "A"}));
//! let outcome = sink.write_batch(&config, &batch).await;
//! assert!(outcome.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod connectors;
pub mod error;
pub mod metadata_resolver;
pub mod traits;
pub mod types;

pub use error::{ConnectorError, ConnectorResult};
pub use traits::{BatchOutcome, BatchSink, CheckResult, Record, RecordBatch};
pub use types::SensitiveString;

/// Commonly used types, for glob import
pub mod prelude {
    pub use crate::error::{ConnectorError, ConnectorResult};
    pub use crate::traits::{
        BatchOutcome, BatchSink, CheckDetail, CheckResult, Record, RecordBatch, SinkConfig,
    };
    pub use crate::types::SensitiveString;
}
