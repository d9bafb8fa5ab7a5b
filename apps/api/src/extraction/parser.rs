//! Turns raw model text into a validated `IncidentOutput`.
//!
//! Order: fence stripping → JSON parse → schema validation. Each stage has its
//! own failure class so the endpoint can tell "not JSON" from "wrong shape".

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::incident::IncidentOutput;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// How validation treats fields the record does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Unknown fields are ignored. Models routinely over-produce.
    #[default]
    Lenient,
    /// Unknown fields are reported as violations.
    Strict,
}

/// One constraint the parsed object failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Field name, or `$` for the top-level value.
    pub field: String,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolations(pub Vec<FieldViolation>);

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: expected {}, found {}", v.field, v.expected, v.found))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model output is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("model output does not match the incident schema: {0}")]
    Schema(SchemaViolations),
}

/// Removes a ```json ... ``` wrapper, but only when BOTH markers are present.
///
/// Only the lowercase `json` tag is recognised and a lone opening or closing
/// fence is left in place, so such output fails JSON parsing downstream.
pub fn strip_json_fence(raw: &str) -> &str {
    let text = raw.trim();
    if text.starts_with(FENCE_OPEN) && text.ends_with(FENCE_CLOSE) {
        text[FENCE_OPEN.len()..text.len() - FENCE_CLOSE.len()].trim()
    } else {
        text
    }
}

/// Full parse: fence stripping, JSON decoding, schema validation.
pub fn parse_llm_output(raw: &str, strictness: Strictness) -> Result<IncidentOutput, ParseError> {
    let text = strip_json_fence(raw);
    let value: Value = serde_json::from_str(text)?;
    validate_output(&value, strictness).map_err(ParseError::Schema)
}

/// Checks `value` against the `IncidentOutput` field set.
///
/// Declared fields must be a string or null when present; missing fields
/// resolve to `None`. All violations are collected, not just the first.
pub fn validate_output(value: &Value, strictness: Strictness) -> Result<IncidentOutput, SchemaViolations> {
    let Some(object) = value.as_object() else {
        return Err(SchemaViolations(vec![FieldViolation {
            field: "$".to_string(),
            expected: "object",
            found: json_type(value),
        }]));
    };

    let mut violations = Vec::new();
    let mut take = |name: &str| -> Option<String> {
        match object.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                violations.push(FieldViolation {
                    field: name.to_string(),
                    expected: "string or null",
                    found: json_type(other),
                });
                None
            }
        }
    };

    let output = IncidentOutput {
        data_ocorrencia: take("data_ocorrencia"),
        local: take("local"),
        tipo_incidente: take("tipo_incidente"),
        impacto: take("impacto"),
    };

    if strictness == Strictness::Strict {
        violations.extend(unknown_fields(object));
    }

    if violations.is_empty() {
        Ok(output)
    } else {
        Err(SchemaViolations(violations))
    }
}

fn unknown_fields(object: &Map<String, Value>) -> impl Iterator<Item = FieldViolation> + '_ {
    object
        .iter()
        .filter(|(key, _)| !IncidentOutput::FIELDS.contains(&key.as_str()))
        .map(|(key, value)| FieldViolation {
            field: key.clone(),
            expected: "no such field",
            found: json_type(value),
        })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
