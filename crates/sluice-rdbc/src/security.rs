//! Security utilities for SQL injection prevention in sluice-rdbc.
//!
//! Provides:
//! - Identifier validation for table and column names
//! - String literal escaping for MySQL string contexts
//!
//! Escaping lives here rather than on the driver because condition values
//! are inlined into IN-lists before a statement reaches any backend; the
//! backends and the statement compiler share this single escaping path.

use crate::error::Error;

/// Validate a SQL identifier (table, column names).
///
/// Enforces strict character rules:
/// - Must not be empty
/// - Maximum 64 characters (MySQL identifier limit)
/// - Must start with ASCII letter or underscore
/// - May only contain ASCII alphanumeric characters and underscores
///
/// # Examples
///
/// ```
/// use sluice_rdbc::security::validate_sql_identifier;
///
/// assert!(validate_sql_identifier("accessed_users").is_ok());
/// assert!(validate_sql_identifier("_staging").is_ok());
///
/// assert!(validate_sql_identifier("x; DROP TABLE users--").is_err());
/// assert!(validate_sql_identifier("").is_err());
/// assert!(validate_sql_identifier("123abc").is_err());
/// ```
pub fn validate_sql_identifier(name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(Error::config("SQL identifier cannot be empty"));
    }

    if name.len() > 64 {
        return Err(Error::config(format!(
            "SQL identifier too long: {} chars (max 64)",
            name.len()
        )));
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => {
            return Err(Error::config(format!(
                "Invalid SQL identifier '{}': must start with a letter or underscore",
                name
            )));
        }
    }

    for c in chars {
        if !c.is_ascii_alphanumeric() && c != '_' {
            return Err(Error::config(format!(
                "Invalid SQL identifier '{}': contains invalid character '{}'",
                name, c
            )));
        }
    }

    Ok(())
}

/// Escape a string value for safe embedding in a MySQL single-quoted
/// string literal.
///
/// Applies MySQL's escaping rules (the same set `mysql_real_escape_string`
/// covers): backslash, both quote characters, NUL, newline, carriage return
/// and Ctrl-Z. The result is the literal body only; callers add the
/// surrounding quotes.
///
/// # Examples
///
/// ```
/// use sluice_rdbc::security::escape_string_literal;
///
/// assert_eq!(escape_string_literal("users"), "users");
/// assert_eq!(escape_string_literal("don't"), "don\\'t");
/// assert_eq!(escape_string_literal("a\\b"), "a\\\\b");
/// ```
pub fn escape_string_literal(value: &str) -> String {
    // Fast path: nothing to escape (common case for UUIDs, hashes, ids)
    if !value
        .bytes()
        .any(|b| matches!(b, b'\\' | b'\'' | b'"' | 0 | b'\n' | b'\r' | 0x1a))
    {
        return value.to_string();
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{1a}' => escaped.push_str("\\Z"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_sql_identifier("users").is_ok());
        assert!(validate_sql_identifier("my_table").is_ok());
        assert!(validate_sql_identifier("_private").is_ok());
        assert!(validate_sql_identifier("TABLE_123").is_ok());
    }

    #[test]
    fn test_empty_identifier() {
        assert!(validate_sql_identifier("").is_err());
    }

    #[test]
    fn test_too_long_identifier() {
        let long = "a".repeat(65);
        assert!(validate_sql_identifier(&long).is_err());

        let max = "a".repeat(64);
        assert!(validate_sql_identifier(&max).is_ok());
    }

    #[test]
    fn test_identifier_injection_attempts() {
        assert!(validate_sql_identifier("x; DROP TABLE users--").is_err());
        assert!(validate_sql_identifier("x' OR '1'='1").is_err());
        assert!(validate_sql_identifier("123abc").is_err());
        assert!(validate_sql_identifier("user name").is_err());
        assert!(validate_sql_identifier("x\nDROP TABLE").is_err());
        assert!(validate_sql_identifier("schema.table").is_err());
        assert!(validate_sql_identifier("x`").is_err());
    }

    #[test]
    fn test_escape_no_special_chars() {
        assert_eq!(
            escape_string_literal("03449258-29ce-403c-900a-a2c6ea1d09a2"),
            "03449258-29ce-403c-900a-a2c6ea1d09a2"
        );
        assert_eq!(escape_string_literal(""), "");
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_string_literal("don't"), "don\\'t");
        assert_eq!(escape_string_literal(r#"say "hi""#), "say \\\"hi\\\"");
    }

    #[test]
    fn test_escape_backslash_first() {
        // A backslash followed by a quote must escape both characters
        assert_eq!(escape_string_literal("a\\'b"), "a\\\\\\'b");
    }

    #[test]
    fn test_escape_control_chars() {
        assert_eq!(escape_string_literal("a\nb"), "a\\nb");
        assert_eq!(escape_string_literal("a\rb"), "a\\rb");
        assert_eq!(escape_string_literal("a\0b"), "a\\0b");
        assert_eq!(escape_string_literal("a\u{1a}b"), "a\\Zb");
    }

    #[test]
    fn test_escape_injection_attempt() {
        assert_eq!(
            escape_string_literal("x'; DROP TABLE users--"),
            "x\\'; DROP TABLE users--"
        );
    }
}
