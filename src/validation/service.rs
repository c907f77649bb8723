/*!
 * Generic response validator.
 *
 * Parses a raw model payload and checks it against a `ResponseSchema`:
 * the payload must be a JSON object, every required key must be present,
 * and every present key must satisfy its rule. Nothing is coerced except the
 * unit-interval rule, which accepts numeric strings and stores the parsed
 * number in the validated result.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::ValidationError;

use super::schema::{FieldRule, ResponseSchema};

/// A reply that passed its schema.
///
/// Serializes as the bare JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatedResult(Map<String, Value>);

impl ValidatedResult {
    /// Value of `key`, if present
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of `key`, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Numeric value of `key`, if present and a number
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// String items of the list at `key`; non-string items are rendered as JSON
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Return a copy with `key` set to `value`
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

/// JSON type name for error messages
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a raw payload into a JSON object
pub fn parse_object(raw_payload: &str) -> Result<Map<String, Value>, ValidationError> {
    let value: Value = serde_json::from_str(raw_payload.trim())
        .map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    match value {
        Value::Object(object) => Ok(object),
        other => Err(ValidationError::NotAnObject(json_type_name(&other).to_string())),
    }
}

/// Check that every key in `required_keys` is present, reporting all missing ones
pub fn validate_required_keys(
    object: &Map<String, Value>,
    required_keys: &[&str],
) -> Result<(), ValidationError> {
    let missing: Vec<String> = required_keys
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingKeys(missing))
    }
}

/// Parse a numeric value or numeric string
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Check one value against its rule, returning a replacement when the rule normalizes it
fn check_field(key: &str, rule: FieldRule, value: &Value) -> Result<Option<Value>, ValidationError> {
    match rule {
        FieldRule::Present => Ok(None),

        FieldRule::Text => match value {
            Value::String(_) => Ok(None),
            _ => Err(ValidationError::WrongType {
                key: key.to_string(),
                expected: "a string",
            }),
        },

        FieldRule::List { min, max } => match value {
            Value::Array(items) if (min..=max).contains(&items.len()) => Ok(None),
            Value::Array(items) => Err(ValidationError::BadLength {
                key: key.to_string(),
                len: items.len(),
                min,
                max,
            }),
            _ => Err(ValidationError::WrongType {
                key: key.to_string(),
                expected: "a list",
            }),
        },

        FieldRule::OneOf(allowed) => match value {
            Value::String(label) if allowed.contains(&label.as_str()) => Ok(None),
            Value::String(label) => Err(ValidationError::NotInVocabulary {
                key: key.to_string(),
                value: label.clone(),
                allowed: allowed.iter().map(|label| label.to_string()).collect(),
            }),
            _ => Err(ValidationError::WrongType {
                key: key.to_string(),
                expected: "a string",
            }),
        },

        FieldRule::UnitInterval => {
            let number = coerce_number(value).ok_or_else(|| ValidationError::WrongType {
                key: key.to_string(),
                expected: "a number between 0 and 1",
            })?;

            // NaN fails the range check too
            if !(0.0..=1.0).contains(&number) {
                return Err(ValidationError::OutOfRange {
                    key: key.to_string(),
                    value: match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    },
                    min: 0.0,
                    max: 1.0,
                });
            }

            // Numbers are kept as sent; numeric strings become numbers
            match value {
                Value::String(_) => Ok(Number::from_f64(number).map(Value::Number)),
                _ => Ok(None),
            }
        }
    }
}

/// Validate `raw_payload` against `schema`.
///
/// # Arguments
/// * `raw_payload` - The model's reply as received
/// * `schema` - Required keys and their rules
///
/// # Returns
/// * `Result<ValidatedResult, ValidationError>` - The parsed object, or the first violation
pub fn validate(raw_payload: &str, schema: &ResponseSchema) -> Result<ValidatedResult, ValidationError> {
    let mut object = parse_object(raw_payload)?;
    validate_required_keys(&object, &schema.required_keys())?;

    for spec in schema.fields() {
        let replacement = match object.get(spec.key) {
            Some(value) => check_field(spec.key, spec.rule, value)?,
            None => None,
        };
        if let Some(normalized) = replacement {
            object.insert(spec.key.to_string(), normalized);
        }
    }

    debug!("Response passed the {} schema", schema.name());
    Ok(ValidatedResult(object))
}
