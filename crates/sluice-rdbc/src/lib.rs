//! # sluice-rdbc
//!
//! Relational database connectivity for the Sluice event pipeline.
//!
//! Provides the narrow interface the pipeline's sinks need from a database:
//! batch-scoped connections, positional parameter binding, string-literal
//! escaping, and an error taxonomy that separates retriable failures from
//! permanent ones.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sluice_rdbc::prelude::*;
//!
//! let factory = sluice_rdbc::mysql::MySqlConnectionFactory;
//! let config = ConnectionConfig::new("events").with_credentials("app", "secret");
//!
//! let conn = factory.connect(&config).await?;
//! let affected = conn.execute("DELETE FROM staging WHERE id = ?", &[Value::Int64(7)]).await?;
//! conn.close().await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `mysql` - MySQL/MariaDB support via mysql_async

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod connection;
pub mod error;
pub mod security;
pub mod types;

// Backend implementations (conditionally compiled)
#[cfg(feature = "mysql")]
pub mod mysql;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::connection::{Connection, ConnectionConfig, ConnectionFactory, DatabaseType};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::types::{json_to_value, Value};
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use types::Value;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _value = Value::Int64(42);
        let _config = ConnectionConfig::new("events");
        let _type = DatabaseType::MySQL;
    }

    #[test]
    fn test_error_types() {
        let err = Error::connection("test error");
        assert!(err.is_retriable());
        assert_eq!(err.category(), ErrorCategory::Connection);
    }
}
