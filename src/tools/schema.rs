//! Argument schemas and validation.
//!
//! Coercion is narrow: strings stay strings, numeric fields
//! accept JSON numbers or numeric strings, enum fields must match one of the
//! allowed values exactly. Nothing else is widened.

use crate::error::FieldError;
use serde_json::{json, Map, Value};

/// Argument map passed to tool handlers.
pub type Arguments = Map<String, Value>;

/// Declared type of a tool argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Enum { allowed: Vec<String> },
}

impl FieldType {
    fn json_type(&self) -> &'static str {
        match self {
            Self::String | Self::Enum { .. } => "string",
            Self::Number => "number",
            Self::Integer => "integer",
        }
    }
}

/// Declaration of one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
    /// Inclusive lower bound, numeric fields only.
    pub minimum: Option<f64>,
    /// Inclusive upper bound, numeric fields only.
    pub maximum: Option<f64>,
}

impl FieldSpec {
    fn new(field_type: FieldType, description: &str) -> Self {
        Self {
            field_type,
            description: description.to_string(),
            required: false,
            minimum: None,
            maximum: None,
        }
    }

    pub fn string(description: &str) -> Self {
        Self::new(FieldType::String, description)
    }

    pub fn number(description: &str) -> Self {
        Self::new(FieldType::Number, description)
    }

    pub fn integer(description: &str) -> Self {
        Self::new(FieldType::Integer, description)
    }

    pub fn one_of(description: &str, allowed: &[&str]) -> Self {
        Self::new(
            FieldType::Enum {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
            description,
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }
}

/// Ordered set of argument declarations for one tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. A later declaration with the same name replaces the
    /// earlier one in place.
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = spec,
            None => self.fields.push((name.to_string(), spec)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// JSON Schema `parameters` object for the inference API.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for (name, spec) in &self.fields {
            let mut prop = json!({
                "type": spec.field_type.json_type(),
                "description": spec.description,
            });
            if let FieldType::Enum { allowed } = &spec.field_type {
                prop["enum"] = json!(allowed);
            }
            if let Some(min) = spec.minimum {
                prop["minimum"] = json!(min);
            }
            if let Some(max) = spec.maximum {
                prop["maximum"] = json!(max);
            }
            properties.insert(name.clone(), prop);

            if spec.required {
                required.push(Value::String(name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Check `arguments` against `schema` and return the coerced arguments.
///
/// Every failure is collected: declared fields first, in schema order, then
/// undeclared ones in input order.
pub fn validate(arguments: &Arguments, schema: &ArgumentSchema) -> Result<Arguments, Vec<FieldError>> {
    let mut coerced = Map::new();
    let mut errors = Vec::new();

    for (name, spec) in schema.fields() {
        match arguments.get(name) {
            None | Some(Value::Null) => {
                if spec.required {
                    errors.push(FieldError::Missing {
                        field: name.to_string(),
                    });
                }
            }
            Some(value) => match coerce(name, value, spec) {
                Ok(v) => {
                    coerced.insert(name.to_string(), v);
                }
                Err(e) => errors.push(e),
            },
        }
    }

    for name in arguments.keys() {
        if schema.get(name).is_none() {
            errors.push(FieldError::Unexpected {
                field: name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

fn coerce(name: &str, value: &Value, spec: &FieldSpec) -> Result<Value, FieldError> {
    match &spec.field_type {
        FieldType::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(FieldError::InvalidType {
                field: name.to_string(),
                expected: "string".to_string(),
            }),
        },
        FieldType::Enum { allowed } => match value {
            Value::String(s) if allowed.iter().any(|a| a == s) => Ok(value.clone()),
            Value::String(s) => Err(FieldError::NotAllowed {
                field: name.to_string(),
                value: s.clone(),
                allowed: allowed.clone(),
            }),
            other => Err(FieldError::NotAllowed {
                field: name.to_string(),
                value: other.to_string(),
                allowed: allowed.clone(),
            }),
        },
        FieldType::Number => {
            let n = parse_number(name, value)?;
            check_range(name, n, spec)?;
            match value {
                Value::Number(_) => Ok(value.clone()),
                _ => serde_json::Number::from_f64(n)
                    .map(Value::Number)
                    .ok_or_else(|| not_a_number(name, value)),
            }
        }
        FieldType::Integer => {
            let i = parse_integer(name, value)?;
            check_range(name, i as f64, spec)?;
            Ok(Value::from(i))
        }
    }
}

fn parse_number(name: &str, value: &Value) -> Result<f64, FieldError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| not_a_number(name, value)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| not_a_number(name, value)),
        _ => Err(FieldError::InvalidType {
            field: name.to_string(),
            expected: "number".to_string(),
        }),
    }
}

fn parse_integer(name: &str, value: &Value) -> Result<i64, FieldError> {
    if let Some(i) = value.as_i64() {
        return Ok(i);
    }

    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    let n = parse_number(name, value)?;
    if n.fract() != 0.0 || n < i64::MIN as f64 || n >= i64::MAX as f64 {
        return Err(FieldError::NotAnInteger {
            field: name.to_string(),
            value: display_value(value),
        });
    }
    Ok(n as i64)
}

fn check_range(name: &str, n: f64, spec: &FieldSpec) -> Result<(), FieldError> {
    let below = spec.minimum.is_some_and(|min| n < min);
    let above = spec.maximum.is_some_and(|max| n > max);
    if below || above {
        return Err(FieldError::OutOfRange {
            field: name.to_string(),
            value: n,
        });
    }
    Ok(())
}

fn not_a_number(name: &str, value: &Value) -> FieldError {
    FieldError::NotANumber {
        field: name.to_string(),
        value: display_value(value),
    }
}

/// Strings without their JSON quotes, everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    fn velocity_schema() -> ArgumentSchema {
        ArgumentSchema::new()
            .field("engine_rpm", FieldSpec::number("The engine rpm").required().min(0.0))
            .field("hour", FieldSpec::integer("Hour of measurement").min(0.0).max(23.0))
            .field("source", FieldSpec::string("Source location").required())
            .field(
                "condition",
                FieldSpec::one_of("Vehicle condition", &["Normal", "Traffic"]).required(),
            )
    }

    #[test]
    fn valid_arguments_are_coerced() {
        let out = validate(
            &args(json!({
                "engine_rpm": " 2500.5 ",
                "hour": "7",
                "source": "CW",
                "condition": "Traffic"
            })),
            &velocity_schema(),
        )
        .unwrap();

        assert_eq!(out["engine_rpm"], json!(2500.5));
        assert_eq!(out["hour"], json!(7));
        assert_eq!(out["source"], json!("CW"));
        assert_eq!(out["condition"], json!("Traffic"));
    }

    #[test]
    fn json_numbers_pass_through() {
        let out = validate(
            &args(json!({"engine_rpm": 3000, "source": "S", "condition": "Normal", "hour": 12.0})),
            &velocity_schema(),
        )
        .unwrap();
        assert_eq!(out["engine_rpm"], json!(3000));
        assert_eq!(out["hour"], json!(12));
    }

    #[test]
    fn missing_required_fields_are_named() {
        let errs = validate(&args(json!({"source": "CW"})), &velocity_schema()).unwrap_err();
        let names: Vec<&str> = errs.iter().map(FieldError::field).collect();
        assert_eq!(names, vec!["engine_rpm", "condition"]);
        assert!(errs.iter().all(|e| matches!(e, FieldError::Missing { .. })));
    }

    #[test]
    fn null_counts_as_missing() {
        let errs = validate(
            &args(json!({"engine_rpm": null, "source": "CW", "condition": "Normal"})),
            &velocity_schema(),
        )
        .unwrap_err();
        assert_eq!(
            errs,
            vec![FieldError::Missing {
                field: "engine_rpm".into()
            }]
        );
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let out = validate(
            &args(json!({"engine_rpm": 1, "source": "CW", "condition": "Normal"})),
            &velocity_schema(),
        )
        .unwrap();
        assert!(!out.contains_key("hour"));
    }

    #[test]
    fn enum_match_is_case_sensitive() {
        let errs = validate(
            &args(json!({"engine_rpm": 1, "source": "CW", "condition": "traffic"})),
            &velocity_schema(),
        )
        .unwrap_err();
        assert!(matches!(
            &errs[0],
            FieldError::NotAllowed { field, value, .. } if field == "condition" && value == "traffic"
        ));
    }

    #[test]
    fn non_numeric_and_non_finite_strings_are_rejected() {
        for bad in ["fast", "NaN", "inf", ""] {
            let errs = validate(
                &args(json!({"engine_rpm": bad, "source": "CW", "condition": "Normal"})),
                &velocity_schema(),
            )
            .unwrap_err();
            assert!(
                matches!(&errs[0], FieldError::NotANumber { field, .. } if field == "engine_rpm"),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn fractional_integer_is_rejected() {
        let errs = validate(
            &args(json!({"engine_rpm": 1, "source": "CW", "condition": "Normal", "hour": "7.5"})),
            &velocity_schema(),
        )
        .unwrap_err();
        assert!(matches!(&errs[0], FieldError::NotAnInteger { value, .. } if value == "7.5"));
    }

    #[test]
    fn integers_beyond_i64_are_rejected_not_saturated() {
        let schema = ArgumentSchema::new().field("n", FieldSpec::integer("Count").required());
        let too_big: Value = serde_json::from_str("9223372036854775808").unwrap();
        for value in [json!("9223372036854775808"), too_big] {
            let errs = validate(&args(json!({ "n": value.clone() })), &schema).unwrap_err();
            assert!(
                matches!(&errs[0], FieldError::NotAnInteger { field, .. } if field == "n"),
                "{value} should be rejected"
            );
        }

        let out = validate(&args(json!({"n": i64::MAX})), &schema).unwrap();
        assert_eq!(out["n"], json!(i64::MAX));
        let out = validate(&args(json!({"n": "-9223372036854775808"})), &schema).unwrap();
        assert_eq!(out["n"], json!(i64::MIN));
    }

    #[test]
    fn range_constraints_apply_after_coercion() {
        let errs = validate(
            &args(json!({"engine_rpm": "-1", "source": "CW", "condition": "Normal", "hour": 24})),
            &velocity_schema(),
        )
        .unwrap_err();
        let names: Vec<&str> = errs.iter().map(FieldError::field).collect();
        assert_eq!(names, vec!["engine_rpm", "hour"]);
        assert!(errs.iter().all(|e| matches!(e, FieldError::OutOfRange { .. })));
    }

    #[test]
    fn strings_are_not_widened() {
        let errs = validate(
            &args(json!({"engine_rpm": 1, "source": 42, "condition": "Normal"})),
            &velocity_schema(),
        )
        .unwrap_err();
        assert_eq!(
            errs,
            vec![FieldError::InvalidType {
                field: "source".into(),
                expected: "string".into()
            }]
        );
    }

    #[test]
    fn booleans_are_not_numbers() {
        let errs = validate(
            &args(json!({"engine_rpm": true, "source": "CW", "condition": "Normal"})),
            &velocity_schema(),
        )
        .unwrap_err();
        assert!(matches!(&errs[0], FieldError::InvalidType { expected, .. } if expected == "number"));
    }

    #[test]
    fn unexpected_fields_are_rejected_after_declared_ones() {
        let errs = validate(
            &args(json!({"speed": 1, "source": "CW", "condition": "Normal", "extra": "x"})),
            &velocity_schema(),
        )
        .unwrap_err();
        let names: Vec<&str> = errs.iter().map(FieldError::field).collect();
        assert_eq!(names, vec!["engine_rpm", "speed", "extra"]);
    }

    #[test]
    fn json_schema_lists_properties_and_required() {
        let schema = velocity_schema().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["hour"]["type"], "integer");
        assert_eq!(schema["properties"]["hour"]["maximum"], json!(23.0));
        assert_eq!(schema["properties"]["condition"]["enum"], json!(["Normal", "Traffic"]));
        assert_eq!(schema["required"], json!(["engine_rpm", "source", "condition"]));
    }

    #[test]
    fn redeclaring_a_field_replaces_it() {
        let schema = ArgumentSchema::new()
            .field("q", FieldSpec::string("first"))
            .field("q", FieldSpec::string("second").required());
        assert_eq!(schema.fields().count(), 1);
        assert!(schema.get("q").unwrap().required);
    }
}
