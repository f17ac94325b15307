//! MySQL backend implementation for sluice-rdbc
//!
//! Wraps `mysql_async` behind the [`Connection`] trait and maps server
//! error codes onto the crate's error taxonomy so callers can classify
//! failures without parsing driver strings.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::connection::{Connection, ConnectionConfig, ConnectionFactory, DatabaseType};
use crate::error::{Error, Result};
use crate::types::Value;

// MySQL server error codes this sink cares about.
const ER_DUP_ENTRY: u16 = 1062;
const ER_WRONG_VALUE_COUNT_ON_ROW: u16 = 1136;
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;
const ER_ACCESS_DENIED: u16 = 1045;

/// Convert a sluice Value to a MySQL parameter
fn value_to_sql(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(b) => mysql_async::Value::from(*b),
        Value::Int64(n) => mysql_async::Value::from(*n),
        Value::Float64(n) => mysql_async::Value::from(*n),
        Value::String(s) => mysql_async::Value::from(s.clone()),
        Value::Json(j) => mysql_async::Value::from(j.to_string()),
    }
}

/// Map a mysql_async error onto the crate taxonomy.
fn map_mysql_error(err: mysql_async::Error) -> Error {
    match err {
        mysql_async::Error::Server(server) => match server.code {
            ER_WRONG_VALUE_COUNT_ON_ROW => Error::schema(server.message),
            ER_DUP_ENTRY => Error::constraint(server.message),
            ER_LOCK_DEADLOCK => Error::Deadlock,
            ER_LOCK_WAIT_TIMEOUT => Error::timeout(server.message),
            ER_ACCESS_DENIED => Error::Authentication {
                message: server.message,
            },
            _ => Error::query(server.message),
        },
        mysql_async::Error::Io(io) => Error::connection(io.to_string()),
        other => Error::query(other.to_string()),
    }
}

/// MySQL connection implementation
pub struct MySqlConnection {
    conn: Mutex<Option<Conn>>,
    database: String,
}

impl MySqlConnection {
    /// Get the database name this connection is connected to
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Create a new MySQL connection from an existing driver connection
    pub fn new(conn: Conn, database: String) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            database,
        }
    }

    /// Open a new connection from configuration
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));

        // The driver has no handshake deadline of its own; without this a
        // silent host blocks connect() forever.
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let conn = tokio::time::timeout(timeout, Conn::new(opts))
            .await
            .map_err(|_| {
                Error::timeout(format!(
                    "connecting to {}:{} exceeded {}ms",
                    config.host, config.port, config.connect_timeout_ms
                ))
            })?
            .map_err(|e| match e {
                mysql_async::Error::Server(_) => map_mysql_error(e),
                other => Error::connection(format!("failed to connect to MySQL: {}", other)),
            })?;

        debug!(host = %config.host, port = config.port, database = %config.database,
            "MySQL connection established");
        Ok(Self::new(conn, config.database.clone()))
    }

    async fn take_conn(&self) -> Option<Conn> {
        self.conn.lock().await.take()
    }

    async fn put_conn(&self, conn: Conn) {
        *self.conn.lock().await = Some(conn);
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut conn = self
            .take_conn()
            .await
            .ok_or_else(|| Error::connection("connection not available"))?;

        let result = if params.is_empty() {
            conn.query_drop(sql).await
        } else {
            let mysql_params: Vec<mysql_async::Value> = params.iter().map(value_to_sql).collect();
            conn.exec_drop(sql, mysql_params).await
        };

        match result {
            Ok(()) => {
                let affected = conn.affected_rows();
                self.put_conn(conn).await;
                Ok(affected)
            }
            Err(e) => {
                self.put_conn(conn).await;
                Err(map_mysql_error(e))
            }
        }
    }

    async fn is_valid(&self) -> bool {
        let Some(mut conn) = self.take_conn().await else {
            return false;
        };
        let alive = conn.query_drop("SELECT 1").await.is_ok();
        self.put_conn(conn).await;
        alive
    }

    async fn close(&self) -> Result<()> {
        if let Some(conn) = self.take_conn().await {
            conn.disconnect()
                .await
                .map_err(|e| Error::connection(format!("failed to close connection: {}", e)))?;
        }
        Ok(())
    }
}

/// Factory producing [`MySqlConnection`]s
pub struct MySqlConnectionFactory;

#[async_trait]
impl ConnectionFactory for MySqlConnectionFactory {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Connection>> {
        let conn = MySqlConnection::connect(config).await?;
        Ok(Box::new(conn))
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn server_error(code: u16, message: &str) -> mysql_async::Error {
        mysql_async::Error::Server(mysql_async::ServerError {
            code,
            message: message.to_string(),
            state: String::new(),
        })
    }

    #[test]
    fn test_column_count_mismatch_is_schema_error() {
        let err = map_mysql_error(server_error(
            ER_WRONG_VALUE_COUNT_ON_ROW,
            "Column count doesn't match value count at row 1",
        ));
        assert_eq!(err.category(), ErrorCategory::Schema);
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_duplicate_entry_is_constraint_error() {
        let err = map_mysql_error(server_error(
            ER_DUP_ENTRY,
            "Duplicate entry '1001' for key 'PRIMARY'",
        ));
        assert_eq!(err.category(), ErrorCategory::Constraint);
    }

    #[test]
    fn test_deadlock_and_lock_timeout() {
        let err = map_mysql_error(server_error(ER_LOCK_DEADLOCK, "Deadlock found"));
        assert_eq!(err.category(), ErrorCategory::Deadlock);
        assert!(err.is_retriable());

        let err = map_mysql_error(server_error(ER_LOCK_WAIT_TIMEOUT, "Lock wait timeout"));
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert!(err.is_retriable());
    }

    #[test]
    fn test_io_error_is_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = map_mysql_error(mysql_async::Error::Io(mysql_async::IoError::Io(io)));
        assert_eq!(err.category(), ErrorCategory::Connection);
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_connect_times_out_on_silent_server() {
        // A bound listener that never speaks the MySQL protocol: the TCP
        // connect succeeds but the handshake greeting never arrives.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = ConnectionConfig::new("events")
            .with_port(port)
            .with_connect_timeout(200);

        let err = MySqlConnection::connect(&config).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert!(err.is_retriable());
    }

    #[test]
    fn test_value_to_sql() {
        assert!(matches!(
            value_to_sql(&Value::Null),
            mysql_async::Value::NULL
        ));
        assert!(matches!(
            value_to_sql(&Value::Int64(42)),
            mysql_async::Value::Int(42)
        ));
        assert!(matches!(
            value_to_sql(&Value::String("x".into())),
            mysql_async::Value::Bytes(_)
        ));
    }
}
