//! Core SDK traits for sluice-connect

pub mod batch;
pub mod sink;

pub use batch::{Record, RecordBatch};
pub use sink::{BatchOutcome, BatchSink, CheckDetail, CheckResult, SinkConfig};
