//! Statement compilation for the select-insert sink
//!
//! Compilation is pure: one batch plus one config in, one SQL string plus its
//! bound parameters out. No connection is touched here, which keeps the
//! statement shape testable without a database.

use crate::connectors::select_insert::config::SelectInsertConfig;
use crate::error::{ConnectorError, ConnectorResult};
use crate::metadata_resolver::MetadataExpr;
use crate::traits::RecordBatch;
use sluice_rdbc::security::escape_string_literal;
use sluice_rdbc::types::Value;

/// A compiled statement ready for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    /// Full SQL text with the condition values inlined as escaped literals
    pub sql: String,
    /// Bound parameters for `?` markers in the extra condition fragment
    pub params: Vec<Value>,
}

/// Compile one batch into an `INSERT ... SELECT ... WHERE col IN (...)`
/// statement.
///
/// Condition values keep the batch's record order, duplicates included; the
/// destination query's semantics decide what repeated values mean. Every
/// value is escaped and single-quoted before inlining.
pub fn compile(
    config: &SelectInsertConfig,
    batch: &RecordBatch,
) -> ConnectorResult<CompiledStatement> {
    let condition_values = collect_condition_values(config, batch)?;
    let (extra_fragment, params) = resolve_extra_condition(config, batch)?;

    let mut sql = String::from("INSERT ");
    if config.ignore {
        sql.push_str("IGNORE ");
    }
    sql.push_str("INTO `");
    sql.push_str(&config.table);
    sql.push('`');
    if !config.inserted_columns.is_empty() {
        sql.push_str(" (");
        sql.push_str(&config.inserted_columns.join(", "));
        sql.push(')');
    }
    sql.push('\n');
    sql.push_str(&config.select_query);
    sql.push('\n');
    sql.push_str("WHERE ");
    sql.push_str(&config.condition_column);
    sql.push_str(" IN (");
    sql.push_str(&condition_values.join(","));
    sql.push(')');
    if let Some(fragment) = extra_fragment {
        sql.push_str(" AND (");
        sql.push_str(&fragment);
        sql.push(')');
    }

    Ok(CompiledStatement { sql, params })
}

/// Render one quoted, escaped literal per record, in record order.
fn collect_condition_values(
    config: &SelectInsertConfig,
    batch: &RecordBatch,
) -> ConnectorResult<Vec<String>> {
    let key = config.condition_key.as_str();
    let mut values = Vec::with_capacity(batch.len());

    for (index, record) in batch.records().iter().enumerate() {
        let raw = match record.get(key) {
            None | Some(serde_json::Value::Null) => {
                return Err(ConnectorError::MissingField {
                    field: key.to_string(),
                    index,
                })
            }
            Some(value) => value,
        };
        let text = match raw {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => {
                return Err(ConnectorError::fatal(format!(
                    "condition value for field '{key}' in record {index} is not a scalar: {other}"
                )))
            }
        };
        values.push(format!("'{}'", escape_string_literal(&text)));
    }

    Ok(values)
}

/// Split the extra condition into its SQL fragment and resolved bound values.
///
/// The fragment's `?` marker count must match the number of value elements;
/// a mismatch is an operator mistake the destination would reject on every
/// redelivery.
fn resolve_extra_condition(
    config: &SelectInsertConfig,
    batch: &RecordBatch,
) -> ConnectorResult<(Option<String>, Vec<Value>)> {
    let Some((fragment, value_exprs)) = config.extra_condition.split_first() else {
        return Ok((None, Vec::new()));
    };

    let mut params = Vec::with_capacity(value_exprs.len());
    for expr in value_exprs {
        let value = MetadataExpr::parse(expr)
            .resolve(batch.metadata())
            .map_err(|e| ConnectorError::fatal(format!("extra_condition value: {e}")))?;
        params.push(value);
    }

    let marker_count = count_placeholders(fragment);
    if marker_count != params.len() {
        return Err(ConnectorError::fatal(format!(
            "extra_condition has {marker_count} placeholder(s) but {} value(s)",
            params.len()
        )));
    }

    Ok((Some(fragment.clone()), params))
}

/// Count `?` parameter markers in a SQL fragment, skipping any inside
/// single-quoted string literals.
fn count_placeholders(fragment: &str) -> usize {
    let mut count = 0;
    let mut in_string = false;
    let mut chars = fragment.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' => in_string = !in_string,
            '\\' if in_string => {
                chars.next();
            }
            '?' if !in_string => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> SelectInsertConfig {
        SelectInsertConfig {
            username: "app".into(),
            database: "events".into(),
            table: "accessed_users".into(),
            select_query: "SELECT id, NOW() FROM users".into(),
            condition_column: "uuid".into(),
            condition_key: "uuid".into(),
            ..Default::default()
        }
    }

    fn batch() -> RecordBatch {
        RecordBatch::new()
            .with_record(json!({"uuid": "A"}))
            .with_record(json!({"uuid": "B"}))
            .with_record(json!({"uuid": "C"}))
    }

    #[test]
    fn test_statement_shape() {
        let compiled = compile(&config(), &batch()).unwrap();
        assert_eq!(
            compiled.sql,
            "INSERT INTO `accessed_users`\nSELECT id, NOW() FROM users\nWHERE uuid IN ('A','B','C')"
        );
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_ignore_and_column_list() {
        let cfg = SelectInsertConfig {
            ignore: true,
            inserted_columns: vec!["user_id".into(), "accessed_at".into()],
            ..config()
        };
        let compiled = compile(&cfg, &batch()).unwrap();
        assert!(compiled
            .sql
            .starts_with("INSERT IGNORE INTO `accessed_users` (user_id, accessed_at)\n"));
    }

    #[test]
    fn test_in_list_preserves_order_and_duplicates() {
        let batch = RecordBatch::new()
            .with_record(json!({"uuid": "B"}))
            .with_record(json!({"uuid": "A"}))
            .with_record(json!({"uuid": "B"}));
        let compiled = compile(&config(), &batch).unwrap();
        assert!(compiled.sql.ends_with("WHERE uuid IN ('B','A','B')"));
    }

    #[test]
    fn test_numeric_condition_values_are_quoted() {
        let batch = RecordBatch::new()
            .with_record(json!({"uuid": 7}))
            .with_record(json!({"uuid": 8}));
        let compiled = compile(&config(), &batch).unwrap();
        assert!(compiled.sql.ends_with("WHERE uuid IN ('7','8')"));
    }

    #[test]
    fn test_condition_values_are_escaped() {
        let batch = RecordBatch::new().with_record(json!({"uuid": "a'; DROP TABLE users; --"}));
        let compiled = compile(&config(), &batch).unwrap();
        assert!(compiled
            .sql
            .ends_with("WHERE uuid IN ('a\\'; DROP TABLE users; --')"));
    }

    #[test]
    fn test_missing_condition_field() {
        let batch = RecordBatch::new()
            .with_record(json!({"uuid": "A"}))
            .with_record(json!({"other": "B"}));
        let err = compile(&config(), &batch).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::MissingField { ref field, index: 1 } if field == "uuid"
        ));
    }

    #[test]
    fn test_null_condition_field_is_missing() {
        let batch = RecordBatch::new().with_record(json!({"uuid": null}));
        let err = compile(&config(), &batch).unwrap_err();
        assert!(matches!(err, ConnectorError::MissingField { index: 0, .. }));
    }

    #[test]
    fn test_extra_condition_fragment_only() {
        let cfg = SelectInsertConfig {
            extra_condition: vec!["deleted_at IS NULL".into()],
            ..config()
        };
        let compiled = compile(&cfg, &batch()).unwrap();
        assert!(compiled
            .sql
            .ends_with("WHERE uuid IN ('A','B','C') AND (deleted_at IS NULL)"));
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_extra_condition_with_metadata_params() {
        let cfg = SelectInsertConfig {
            extra_condition: vec!["app_id = ?".into(), "${app_id}".into()],
            ..config()
        };
        let batch = batch().with_metadata("app_id", json!(1));
        let compiled = compile(&cfg, &batch).unwrap();
        assert!(compiled.sql.ends_with(" AND (app_id = ?)"));
        assert_eq!(compiled.params, vec![Value::Int64(1)]);
    }

    #[test]
    fn test_extra_condition_param_order() {
        let cfg = SelectInsertConfig {
            extra_condition: vec![
                "app_id = ? AND region = ?".into(),
                "${app_id}".into(),
                "${region}".into(),
            ],
            ..config()
        };
        let batch = batch()
            .with_metadata("app_id", json!(1))
            .with_metadata("region", json!("eu-west"));
        let compiled = compile(&cfg, &batch).unwrap();
        assert_eq!(
            compiled.params,
            vec![Value::Int64(1), Value::String("eu-west".into())]
        );
    }

    #[test]
    fn test_extra_condition_literal_value() {
        let cfg = SelectInsertConfig {
            extra_condition: vec!["env = ?".into(), "production".into()],
            ..config()
        };
        let compiled = compile(&cfg, &batch()).unwrap();
        assert_eq!(compiled.params, vec![Value::String("production".into())]);
    }

    #[test]
    fn test_extra_condition_unresolvable_metadata() {
        let cfg = SelectInsertConfig {
            extra_condition: vec!["app_id = ?".into(), "${app_id}".into()],
            ..config()
        };
        let err = compile(&cfg, &batch()).unwrap_err();
        assert!(matches!(err, ConnectorError::Fatal(_)));
        assert!(err.to_string().contains("app_id"));
    }

    #[test]
    fn test_quoted_question_mark_is_not_a_placeholder() {
        let cfg = SelectInsertConfig {
            extra_condition: vec!["note = '?' AND app_id = ?".into(), "${app_id}".into()],
            ..config()
        };
        let batch = batch().with_metadata("app_id", json!(1));
        let compiled = compile(&cfg, &batch).unwrap();
        assert!(compiled.sql.ends_with(" AND (note = '?' AND app_id = ?)"));
        assert_eq!(compiled.params, vec![Value::Int64(1)]);
    }

    #[test]
    fn test_count_placeholders_skips_quoted_runs() {
        assert_eq!(count_placeholders("a = ? AND b = ?"), 2);
        assert_eq!(count_placeholders("note = '?'"), 0);
        assert_eq!(count_placeholders("note = 'it\\'s ?' AND a = ?"), 1);
        assert_eq!(count_placeholders(""), 0);
    }

    #[test]
    fn test_extra_condition_placeholder_count_mismatch() {
        let cfg = SelectInsertConfig {
            extra_condition: vec!["app_id = ? AND region = ?".into(), "${app_id}".into()],
            ..config()
        };
        let batch = batch().with_metadata("app_id", json!(1));
        let err = compile(&cfg, &batch).unwrap_err();
        assert!(matches!(err, ConnectorError::Fatal(_)));
        assert!(err.to_string().contains("placeholder"));
    }
}
