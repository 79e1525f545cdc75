//! Tool table, argument validation and dispatch.

pub mod builtin;
pub mod dispatcher;
pub mod registry;
pub mod schema;
pub mod traits;

pub use builtin::builtin_registry;
pub use dispatcher::{DispatchResult, Dispatcher};
pub use registry::{ToolRegistry, ToolSpec};
pub use schema::{validate, ArgumentSchema, Arguments, FieldSpec, FieldType};
pub use traits::{ToolDefinition, ToolHandler};
