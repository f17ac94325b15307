//! Metadata placeholder resolution
//!
//! Sink configurations may reference batch metadata with `${key}`
//! placeholders (e.g. the bound values of an extra SQL condition). This
//! module is the small expression language behind that: an expression is
//! classified once at parse time and evaluated once per batch against the
//! batch's metadata mapping, independent of any SQL text.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

use sluice_rdbc::types::{json_to_value, Value};

/// Pre-compiled regex for placeholder extraction
static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}")
        .expect("placeholder regex pattern is invalid - this is a bug")
});

/// Error resolving a metadata expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataResolveError {
    /// The referenced key is absent from the batch metadata
    #[error("unknown metadata key '{0}'")]
    UnknownKey(String),
}

/// A parsed metadata expression
///
/// - `Literal`: no placeholders, passed through as a string value
/// - `Reference`: exactly one placeholder and nothing else; resolves to the
///   metadata value with its type preserved (`${app_id}` with `app_id: 1`
///   yields an integer, not `"1"`)
/// - `Template`: placeholders mixed with text; resolves to a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataExpr {
    /// Verbatim string
    Literal(String),
    /// Single `${key}` reference
    Reference(String),
    /// Text with embedded `${key}` placeholders
    Template(String),
}

impl MetadataExpr {
    /// Classify an expression string.
    pub fn parse(expr: &str) -> Self {
        let mut captures = PLACEHOLDER_REGEX.captures_iter(expr);
        match captures.next() {
            None => Self::Literal(expr.to_string()),
            Some(cap) if cap.get(0).map(|m| m.as_str()) == Some(expr) => {
                Self::Reference(cap[1].to_string())
            }
            Some(_) => Self::Template(expr.to_string()),
        }
    }

    /// Evaluate against a batch's metadata mapping.
    pub fn resolve(
        &self,
        metadata: &HashMap<String, serde_json::Value>,
    ) -> Result<Value, MetadataResolveError> {
        match self {
            Self::Literal(s) => Ok(Value::String(s.clone())),
            Self::Reference(key) => {
                let value = metadata
                    .get(key)
                    .ok_or_else(|| MetadataResolveError::UnknownKey(key.clone()))?;
                Ok(json_to_value(value))
            }
            Self::Template(text) => {
                let mut missing = None;
                let resolved = PLACEHOLDER_REGEX.replace_all(text, |cap: &regex::Captures| {
                    let key = &cap[1];
                    match metadata.get(key) {
                        Some(serde_json::Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                        None => {
                            missing.get_or_insert_with(|| key.to_string());
                            String::new()
                        }
                    }
                });
                match missing {
                    Some(key) => Err(MetadataResolveError::UnknownKey(key)),
                    None => Ok(Value::String(resolved.into_owned())),
                }
            }
        }
    }
}
