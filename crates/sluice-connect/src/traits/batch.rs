//! Record batch types
//!
//! A [`RecordBatch`] is what the host pipeline hands a sink per flush cycle:
//! an ordered sequence of records plus batch-level metadata shared by all of
//! them. The pipeline owns buffering and flush thresholds; sinks only ever
//! see finalized batches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single record: field name to scalar value
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A finalized batch of records flushed together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordBatch {
    /// Ordered records in arrival order
    records: Vec<Record>,

    /// Batch-level metadata shared by all records (e.g. routing keys)
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl RecordBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batch from records
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            metadata: HashMap::new(),
        }
    }

    /// Append a record, preserving arrival order
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Append a record built from a JSON object (builder-style)
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a JSON object. Intended for tests and
    /// in-process producers that control their own shapes.
    pub fn with_record(mut self, value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => self.records.push(map),
            other => panic!("record must be a JSON object, got {}", other),
        }
        self
    }

    /// Set a metadata entry (builder-style)
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The records in arrival order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Batch-level metadata
    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Look up a metadata value by key
    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
