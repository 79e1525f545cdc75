//! The tool table: registered tools keyed by unique name.

use super::schema::ArgumentSchema;
use super::traits::{ToolDefinition, ToolHandler};
use crate::error::RegistryError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Registered description of one invocable tool.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub argument_schema: ArgumentSchema,
    pub handler: Arc<dyn ToolHandler>,
    /// The handler's output is the final answer; the caller should not feed
    /// it back to the model.
    pub direct_return: bool,
}

impl ToolSpec {
    pub fn new(
        name: &str,
        description: &str,
        argument_schema: ArgumentSchema,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            argument_schema,
            handler: Arc::new(handler),
            direct_return: false,
        }
    }

    pub fn direct_return(mut self, direct_return: bool) -> Self {
        self.direct_return = direct_return;
        self
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.argument_schema.to_json_schema(),
        }
    }
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("argument_schema", &self.argument_schema)
            .field("direct_return", &self.direct_return)
            .finish_non_exhaustive()
    }
}

/// Tool table keyed by name. Names are unique; iteration is in name order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Rejects empty and duplicate names.
    pub fn register(&mut self, spec: ToolSpec) -> Result<(), RegistryError> {
        if spec.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateTool(spec.name));
        }
        debug!("Registered tool: {}", spec.name);
        self.tools.insert(spec.name.clone(), spec);
        Ok(())
    }

    /// Build a table from a list of tools, failing on the first bad entry.
    pub fn from_specs(specs: impl IntoIterator<Item = ToolSpec>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Definitions for every registered tool.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(ToolSpec::definition).collect()
    }
}
