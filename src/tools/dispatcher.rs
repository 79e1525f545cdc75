//! Tool dispatch: turn a model response into at most one validated tool call.
//!
//! One call to [`Dispatcher::dispatch`] walks
//! `Parse -> Resolve -> Validate -> Invoke` and ends in exactly one of three
//! terminal states:
//!
//! - **NoCall**: the response is not a structured call; the raw text is the
//!   answer.
//! - **Rejected**: unknown tool, invalid arguments, or the handler failed.
//! - **Complete**: the handler returned a value.
//!
//! Failures are returned as data in [`DispatchResult::error`]; `dispatch`
//! itself never fails or panics on account of the input or a handler.

use super::registry::{ToolRegistry, ToolSpec};
use super::schema::{validate, Arguments};
use super::traits::ToolDefinition;
use crate::error::{DispatchError, FieldError};
use crate::types::{CallTrace, FunctionCall};
use serde::Serialize;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub output: Option<Value>,
    pub trace: Option<CallTrace>,
    pub error: Option<DispatchError>,
    /// Set when the invoked tool's output is the final answer.
    pub direct_return: bool,
}

impl DispatchResult {
    fn no_call(raw: &str) -> Self {
        Self {
            output: Some(Value::String(raw.to_string())),
            trace: None,
            error: None,
            direct_return: false,
        }
    }

    fn rejected(trace: CallTrace, error: DispatchError) -> Self {
        Self {
            output: None,
            trace: Some(trace),
            error: Some(error),
            direct_return: false,
        }
    }

    fn complete(trace: CallTrace, output: Value, direct_return: bool) -> Self {
        Self {
            output: Some(output),
            trace: Some(trace),
            error: None,
            direct_return,
        }
    }

    /// True when no structured call was found in the response.
    pub fn is_no_call(&self) -> bool {
        self.trace.is_none() && self.error.is_none()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Output rendered for display: strings as-is, other values as JSON.
    pub fn output_text(&self) -> Option<String> {
        self.output.as_ref().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// A call decoded from the response, before argument decoding.
struct RawCall {
    name: String,
    arguments: Value,
}

/// Validates and invokes tool calls against a fixed tool table.
///
/// The table is read-only after construction, so a `Dispatcher` can be shared
/// across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tools: ToolRegistry,
}

impl Dispatcher {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Definitions of every tool, for offering to the model.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    /// Dispatch the first function call encoded in `raw_response`.
    pub fn dispatch(&self, raw_response: &str) -> DispatchResult {
        // Parse
        let Some(raw_call) = parse_call(raw_response) else {
            debug!("No function call in response ({} chars)", raw_response.len());
            return DispatchResult::no_call(raw_response);
        };

        let mut trace = CallTrace {
            tool_name: raw_call.name.clone(),
            arguments: raw_call.arguments.clone(),
        };

        // Resolve
        let Some(spec) = self.tools.get(&raw_call.name) else {
            warn!("Rejected call to unknown tool: {}", raw_call.name);
            return DispatchResult::rejected(
                trace,
                DispatchError::UnknownTool {
                    name: raw_call.name,
                },
            );
        };

        // Validate
        let call = match decode_arguments(raw_call) {
            Ok(call) => call,
            Err(field) => return reject_arguments(trace, vec![field]),
        };
        trace.arguments = Value::Object(call.arguments.clone());
        let args = match validate(&call.arguments, &spec.argument_schema) {
            Ok(args) => args,
            Err(fields) => return reject_arguments(trace, fields),
        };

        // Invoke
        let shown = serde_json::Value::Object(args.clone());
        info!("Tool: {}({})", spec.name, shown);
        match invoke(spec, &args) {
            Ok(output) => {
                debug!("Tool {} completed", spec.name);
                DispatchResult::complete(trace, output, spec.direct_return)
            }
            Err(message) => {
                warn!("Tool {} failed: {}", spec.name, message);
                DispatchResult::rejected(trace, DispatchError::HandlerFailure { message })
            }
        }
    }
}

fn reject_arguments(trace: CallTrace, fields: Vec<FieldError>) -> DispatchResult {
    let error = DispatchError::InvalidArguments { fields };
    warn!("Rejected call to {}: {}", trace.tool_name, error);
    DispatchResult::rejected(trace, error)
}

/// Run the handler, turning both `Err` and panics into a message.
fn invoke(spec: &ToolSpec, args: &Arguments) -> Result<Value, String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| spec.handler.call(args)));
    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

/// Decode the response as `[{"name": ..., "arguments": ...}, ...]`.
///
/// Anything else, including malformed JSON, is not a call.
fn parse_call(raw_response: &str) -> Option<RawCall> {
    let text = strip_code_fence(raw_response.trim());
    let value: Value = serde_json::from_str(text).ok()?;

    let calls = value.as_array()?;
    let first = calls.first()?.as_object()?;
    let name = first.get("name")?.as_str()?.to_string();
    let arguments = first.get("arguments")?.clone();

    if calls.len() > 1 {
        debug!("Ignoring {} additional function calls", calls.len() - 1);
    }

    Some(RawCall { name, arguments })
}

/// Accept an object, a string holding a JSON object, or `null`.
fn decode_arguments(raw: RawCall) -> Result<FunctionCall, FieldError> {
    let invalid = || FieldError::InvalidType {
        field: "arguments".to_string(),
        expected: "JSON object".to_string(),
    };

    let arguments = match raw.arguments {
        Value::Object(map) => map,
        Value::Null => Arguments::new(),
        Value::String(s) if s.trim().is_empty() => Arguments::new(),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => map,
            _ => return Err(invalid()),
        },
        _ => return Err(invalid()),
    };

    Ok(FunctionCall {
        name: raw.name,
        arguments,
    })
}

/// Remove a surrounding Markdown code fence (```json ... ```), if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line, unless that
    // line already holds the payload
    match body.split_once('\n') {
        Some((info, rest)) if !info.trim_start().starts_with(['[', '{']) => rest.trim(),
        _ => body.trim(),
    }
}
