//! Connection traits for sluice-rdbc
//!
//! Core abstractions for database connectivity:
//! - Connection: statement execution with positional parameters
//! - ConnectionFactory: opens batch-scoped connections
//!
//! Connections here are deliberately batch-scoped: the sink opens one per
//! batch and closes it when the batch resolves. Pooling, if any, belongs to
//! a factory implementation, not to this interface.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Value;

/// A connection to a database
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a statement that modifies data, returns affected row count.
    ///
    /// `params` are substituted positionally for `?` markers; pass an empty
    /// slice to execute the SQL text directly.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Check if connection is valid/alive
    async fn is_valid(&self) -> bool;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}

/// Configuration for creating connections
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub username: String,
    /// Database password
    pub password: String,
    /// Database name
    pub database: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Redact the password to prevent leaking credentials to logs.
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3306,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            connect_timeout_ms: 10_000,
        }
    }
}

impl ConnectionConfig {
    /// Create configuration for a database on the default host/port
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }
}

/// Factory for creating connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Create a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>>;

    /// Get the database type
    fn database_type(&self) -> DatabaseType;
}

/// Database type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseType {
    /// MySQL/MariaDB
    MySQL,
    /// Unknown/custom
    Unknown,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MySQL => write!(f, "MySQL"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_builder() {
        let config = ConnectionConfig::new("events")
            .with_host("db.internal")
            .with_port(3307)
            .with_credentials("app", "hunter2")
            .with_connect_timeout(5000);

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.username, "app");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.database, "events");
        assert_eq!(config.connect_timeout_ms, 5000);
    }

    #[test]
    fn test_connection_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3306);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig::new("events").with_credentials("app", "hunter2");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_database_type_display() {
        assert_eq!(format!("{}", DatabaseType::MySQL), "MySQL");
        assert_eq!(format!("{}", DatabaseType::Unknown), "Unknown");
    }
}
