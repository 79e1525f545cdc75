//! Error taxonomy for routing and dispatch.
//!
//! Routing and registration errors are returned as `Err`; dispatch errors are
//! carried as data inside [`DispatchResult`](crate::tools::DispatchResult).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Misconfiguration detected by the router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid router input: {0}")]
    InvalidInput(String),
}

/// Failure while building a tool table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("tool name must not be empty")]
    EmptyName,
}

/// Why a single argument failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FieldError {
    #[error("missing required field '{field}'")]
    Missing { field: String },

    #[error("field '{field}' must be a {expected}")]
    InvalidType { field: String, expected: String },

    #[error("field '{field}' is not a number: {value}")]
    NotANumber { field: String, value: String },

    #[error("field '{field}' is not an integer: {value}")]
    NotAnInteger { field: String, value: String },

    #[error("field '{field}' must be one of [{}], got '{value}'", .allowed.join(", "))]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("field '{field}' is out of range: {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("unexpected field '{field}'")]
    Unexpected { field: String },
}

impl FieldError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field }
            | Self::InvalidType { field, .. }
            | Self::NotANumber { field, .. }
            | Self::NotAnInteger { field, .. }
            | Self::NotAllowed { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Unexpected { field } => field,
        }
    }
}

/// Failure kinds reported by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchError {
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("invalid arguments: {}", FieldList(.fields))]
    InvalidArguments { fields: Vec<FieldError> },

    #[error("handler failed: {message}")]
    HandlerFailure { message: String },
}

impl DispatchError {
    /// Names of the fields rejected by validation (empty for other kinds).
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            Self::InvalidArguments { fields } => fields.iter().map(FieldError::field).collect(),
            _ => Vec::new(),
        }
    }
}

struct FieldList<'a>(&'a [FieldError]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_arguments_lists_every_field() {
        let err = DispatchError::InvalidArguments {
            fields: vec![
                FieldError::Missing { field: "x".into() },
                FieldError::NotANumber {
                    field: "y".into(),
                    value: "abc".into(),
                },
            ],
        };
        assert_eq!(err.field_names(), vec!["x", "y"]);
        assert_eq!(
            err.to_string(),
            "invalid arguments: missing required field 'x'; field 'y' is not a number: abc"
        );
    }

    #[test]
    fn dispatch_error_serializes_with_kind_tag() {
        let err = DispatchError::UnknownTool {
            name: "search".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "unknown_tool");
        assert_eq!(json["name"], "search");
    }
}
