//! Select-insert sink configuration

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::error::{ConnectorError, ConnectorResult};
use crate::types::SensitiveString;
use sluice_rdbc::connection::ConnectionConfig;
use sluice_rdbc::security::validate_sql_identifier;

/// Rejects queries that already carry their own WHERE clause
static WHERE_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bwhere\b").expect("where-clause regex pattern is invalid - this is a bug")
});

/// Requires the query to start with SELECT
static SELECT_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*select\b").expect("select-prefix regex pattern is invalid - this is a bug")
});

/// Select-Insert Sink Connector Configuration
///
/// Configures an `INSERT INTO ... SELECT ... WHERE col IN (...)` statement
/// built once per batch. `select_query` must be a bare SELECT without a WHERE
/// clause; the sink owns the WHERE clause and appends the batch's condition
/// values to it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct SelectInsertConfig {
    /// Database host (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 3306)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database user
    #[validate(length(min = 1))]
    pub username: String,

    /// Database password
    #[serde(default)]
    pub password: SensitiveString,

    /// Database name
    #[validate(length(min = 1))]
    pub database: String,

    /// Destination table
    #[validate(length(min = 1))]
    pub table: String,

    /// Source SELECT statement, without a WHERE clause
    #[validate(length(min = 1))]
    pub select_query: String,

    /// Column the generated WHERE clause filters on
    #[validate(length(min = 1))]
    pub condition_column: String,

    /// Record field the condition values are read from
    #[validate(length(min = 1))]
    pub condition_key: String,

    /// Extra condition ANDed onto the WHERE clause.
    ///
    /// The first element is a raw SQL fragment (may contain `?` markers);
    /// the remaining elements supply its bound values, each either a literal
    /// or a `${key}` reference into batch metadata.
    #[serde(default)]
    pub extra_condition: Vec<String>,

    /// Explicit destination column list; empty means table order
    #[serde(default)]
    pub inserted_columns: Vec<String>,

    /// Use `INSERT IGNORE` to skip uniqueness violations
    #[serde(default)]
    pub ignore: bool,

    /// Upper bound on records per flushed batch (default: 1000)
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 100000))]
    pub batch_size: u32,

    /// Connection timeout in milliseconds (default: 10000)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_batch_size() -> u32 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for SelectInsertConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: SensitiveString::default(),
            database: String::new(),
            table: String::new(),
            select_query: String::new(),
            condition_column: String::new(),
            condition_key: String::new(),
            extra_condition: Vec::new(),
            inserted_columns: Vec::new(),
            ignore: false,
            batch_size: default_batch_size(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl SelectInsertConfig {
    /// Run startup validation: field constraints plus statement-shape rules.
    ///
    /// Rejects a `select_query` that carries its own WHERE clause or does not
    /// start with SELECT, and identifiers that are not plain SQL names. These
    /// are operator mistakes; no batch can succeed until the config changes.
    pub fn validate_startup(&self) -> ConnectorResult<()> {
        self.validate()
            .map_err(|e| ConnectorError::config(e.to_string()))?;

        if WHERE_CLAUSE_RE.is_match(&self.select_query) {
            return Err(ConnectorError::config(
                "'select_query' must not contain a WHERE clause; use 'extra_condition' instead",
            ));
        }
        if !SELECT_PREFIX_RE.is_match(&self.select_query) {
            return Err(ConnectorError::config(
                "'select_query' must be a SELECT statement",
            ));
        }

        validate_sql_identifier(&self.table)
            .map_err(|e| ConnectorError::config(format!("invalid 'table': {e}")))?;
        validate_sql_identifier(&self.condition_column)
            .map_err(|e| ConnectorError::config(format!("invalid 'condition_column': {e}")))?;
        for column in &self.inserted_columns {
            validate_sql_identifier(column).map_err(|e| {
                ConnectorError::config(format!("invalid column in 'inserted_columns': {e}"))
            })?;
        }

        Ok(())
    }

    /// Build the connection configuration for this sink
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig::new(&self.database)
            .with_host(&self.host)
            .with_port(self.port)
            .with_credentials(&self.username, self.password.expose_secret())
            .with_connect_timeout(self.connect_timeout_ms)
    }
}
