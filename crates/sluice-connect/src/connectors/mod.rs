//! Built-in connectors

pub mod select_insert;

pub use select_insert::{SelectInsertConfig, SelectInsertSink};
