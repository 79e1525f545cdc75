//! Tool handler trait and the definition format offered to the model.

use super::schema::Arguments;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a tool exposed to the inference model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Implementation behind a registered tool.
///
/// Receives arguments that already passed schema validation. Returning `Err`
/// (or panicking) is reported as a handler failure, never propagated.
pub trait ToolHandler: Send + Sync {
    fn call(&self, args: &Arguments) -> Result<Value>;
}

impl<F> ToolHandler for F
where
    F: Fn(&Arguments) -> Result<Value> + Send + Sync,
{
    fn call(&self, args: &Arguments) -> Result<Value> {
        self(args)
    }
}
