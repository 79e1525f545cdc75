//! Built-in tools shipped with the binary.

use super::registry::{ToolRegistry, ToolSpec};
use super::schema::{ArgumentSchema, Arguments, FieldSpec};
use crate::error::RegistryError;
use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

const SPEED_UNITS: &[&str] = &["km/h", "mph", "m/s"];

/// Tool table with every built-in tool registered.
pub fn builtin_registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::from_specs(vec![arithmetic(), word_count(), convert_speed()])
}

/// `arithmetic`: apply one binary operation to two numbers.
pub fn arithmetic() -> ToolSpec {
    ToolSpec::new(
        "arithmetic",
        "Apply a basic arithmetic operation to two numbers.",
        ArgumentSchema::new()
            .field(
                "op",
                FieldSpec::one_of("Operation to apply", &["add", "subtract", "multiply", "divide"])
                    .required(),
            )
            .field("a", FieldSpec::number("Left operand").required())
            .field("b", FieldSpec::number("Right operand").required()),
        execute_arithmetic,
    )
}

/// `word-count`: count words and characters in a text. Returns directly.
pub fn word_count() -> ToolSpec {
    ToolSpec::new(
        "word-count",
        "Count the words and characters in a piece of text.",
        ArgumentSchema::new().field("text", FieldSpec::string("Text to analyse").required()),
        execute_word_count,
    )
    .direct_return(true)
}

/// `convert-speed`: convert a speed between km/h, mph and m/s.
pub fn convert_speed() -> ToolSpec {
    ToolSpec::new(
        "convert-speed",
        "Convert a vehicle speed between units.",
        ArgumentSchema::new()
            .field("value", FieldSpec::number("Speed to convert").required().min(0.0))
            .field("from", FieldSpec::one_of("Unit of the given speed", SPEED_UNITS).required())
            .field("to", FieldSpec::one_of("Unit to convert to", SPEED_UNITS).required()),
        execute_convert_speed,
    )
}

fn number(args: &Arguments, name: &str) -> Result<f64> {
    args.get(name)
        .and_then(Value::as_f64)
        .with_context(|| format!("Missing '{}' argument", name))
}

fn string<'a>(args: &'a Arguments, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .with_context(|| format!("Missing '{}' argument", name))
}

fn execute_arithmetic(args: &Arguments) -> Result<Value> {
    let op = string(args, "op")?;
    let a = number(args, "a")?;
    let b = number(args, "b")?;

    let result = match op {
        "add" => a + b,
        "subtract" => a - b,
        "multiply" => a * b,
        "divide" => {
            if b == 0.0 {
                bail!("Division by zero");
            }
            a / b
        }
        other => bail!("Unsupported operation: {}", other),
    };

    Ok(json!(result))
}

fn execute_word_count(args: &Arguments) -> Result<Value> {
    let text = string(args, "text")?;
    Ok(json!({
        "words": text.split_whitespace().count(),
        "characters": text.chars().count(),
    }))
}

fn execute_convert_speed(args: &Arguments) -> Result<Value> {
    let value = number(args, "value")?;
    let from = string(args, "from")?;
    let to = string(args, "to")?;

    let metres_per_second = value / metres_per_second_factor(from)?;
    let converted = metres_per_second * metres_per_second_factor(to)?;

    Ok(Value::String(format!("{:.2} {}", converted, to)))
}

/// How many of `unit` make one m/s.
fn metres_per_second_factor(unit: &str) -> Result<f64> {
    Ok(match unit {
        "m/s" => 1.0,
        "km/h" => 3.6,
        "mph" => 3600.0 / 1609.344,
        other => bail!("Unknown speed unit: {}", other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use crate::tools::Dispatcher;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(builtin_registry().unwrap())
    }

    #[test]
    fn registry_contains_every_builtin() {
        let registry = builtin_registry().unwrap();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["arithmetic", "convert-speed", "word-count"]
        );
    }

    #[test]
    fn arithmetic_accepts_numeric_strings() {
        let result = dispatcher()
            .dispatch(r#"[{"name": "arithmetic", "arguments": {"op": "multiply", "a": "6", "b": 7}}]"#);
        assert_eq!(result.output, Some(json!(42.0)));
    }

    #[test]
    fn division_by_zero_is_a_handler_failure() {
        let result = dispatcher()
            .dispatch(r#"[{"name": "arithmetic", "arguments": {"op": "divide", "a": 1, "b": 0}}]"#);
        assert_eq!(
            result.error,
            Some(DispatchError::HandlerFailure {
                message: "Division by zero".into()
            })
        );
    }

    #[test]
    fn word_count_returns_directly() {
        let result = dispatcher()
            .dispatch(r#"[{"name": "word-count", "arguments": {"text": "the quick  brown fox"}}]"#);
        assert!(result.direct_return);
        assert_eq!(result.output, Some(json!({"words": 4, "characters": 20})));
    }

    #[test]
    fn convert_speed_formats_with_unit() {
        let result = dispatcher().dispatch(
            r#"[{"name": "convert-speed", "arguments": {"value": 10, "from": "m/s", "to": "km/h"}}]"#,
        );
        assert_eq!(result.output_text().as_deref(), Some("36.00 km/h"));
    }

    #[test]
    fn convert_speed_rejects_unknown_units_and_negative_speeds() {
        let result = dispatcher().dispatch(
            r#"[{"name": "convert-speed", "arguments": {"value": -5, "from": "knots", "to": "km/h"}}]"#,
        );
        assert_eq!(result.error.unwrap().field_names(), vec!["value", "from"]);
    }
}
