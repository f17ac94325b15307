//! Select-insert sink connector

pub mod compiler;
pub mod config;
pub mod sink;

pub use compiler::{compile, CompiledStatement};
pub use config::SelectInsertConfig;
pub use sink::SelectInsertSink;
