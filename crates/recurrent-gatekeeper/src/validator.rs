//! Response validation logic

use crate::error::{SchemaViolation, ValidationFailure};
use crate::extract::extract_json;
use recurrent_domain::OutputSchema;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// The Gatekeeper validates model responses before they are accumulated
#[derive(Debug, Clone, Default)]
pub struct Gatekeeper {
    schema: Option<OutputSchema>,
}

impl Gatekeeper {
    /// Create a new Gatekeeper; without a schema only parseability is checked
    pub fn new(schema: Option<OutputSchema>) -> Self {
        Self { schema }
    }

    /// Schema responses are checked against, if any
    pub fn schema(&self) -> Option<&OutputSchema> {
        self.schema.as_ref()
    }

    /// Extract, parse and check a raw model response
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or every reason it was rejected
    pub fn validate(&self, raw: &str) -> Result<Value, ValidationFailure> {
        let candidate = extract_json(raw);
        let value: Value = serde_json::from_str(candidate)
            .map_err(|e| ValidationFailure::NotJson(e.to_string()))?;

        if let Some(schema) = &self.schema {
            let violations = check(schema, &value);
            if !violations.is_empty() {
                debug!("Response rejected with {} schema violations", violations.len());
                return Err(ValidationFailure::Schema(violations));
            }
        }

        Ok(value)
    }
}

/// Every violation of `schema` in `value`, in document order
pub(crate) fn check(schema: &OutputSchema, value: &Value) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    check_node(schema, value, &mut String::from("$"), &mut violations);
    violations
}

fn check_node(
    schema: &OutputSchema,
    value: &Value,
    path: &mut String,
    violations: &mut Vec<SchemaViolation>,
) {
    match (schema, value) {
        (OutputSchema::Any, _) => {}

        (OutputSchema::String { allowed }, Value::String(s)) => {
            if !allowed.is_empty() && !allowed.iter().any(|a| a == s) {
                push(violations, path, format!("one of {:?}", allowed), format!("{:?}", s));
            }
        }

        (OutputSchema::Number, Value::Number(_)) => {}

        (OutputSchema::Integer, Value::Number(n)) => {
            let integral = n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0);
            if !integral {
                push(violations, path, "integer".to_string(), n.to_string());
            }
        }

        (OutputSchema::Boolean, Value::Bool(_)) | (OutputSchema::Null, Value::Null) => {}

        (OutputSchema::Array { items, min_items }, Value::Array(elements)) => {
            if let Some(min) = min_items {
                if elements.len() < *min {
                    push(
                        violations,
                        path,
                        format!("at least {} items", min),
                        format!("{} items", elements.len()),
                    );
                }
            }
            if let Some(items) = items {
                for (i, element) in elements.iter().enumerate() {
                    let len = path.len();
                    path.push_str(&format!("[{}]", i));
                    check_node(items, element, path, violations);
                    path.truncate(len);
                }
            }
        }

        (
            OutputSchema::Object {
                properties,
                required,
                additional_properties,
            },
            Value::Object(map),
        ) => {
            for name in required {
                if !map.contains_key(name) {
                    violations.push(SchemaViolation {
                        path: format!("{}.{}", path, name),
                        expected: "required property".to_string(),
                        found: "nothing".to_string(),
                    });
                }
            }
            for (name, field) in map {
                let len = path.len();
                path.push('.');
                path.push_str(name);
                match properties.get(name) {
                    Some(property) => check_node(property, field, path, violations),
                    None if !additional_properties => violations.push(SchemaViolation {
                        path: path.clone(),
                        expected: "no additional properties".to_string(),
                        found: kind_of(field).to_string(),
                    }),
                    None => {}
                }
                path.truncate(len);
            }
        }

        (expected, found) => push(
            violations,
            path,
            expected.type_name().to_string(),
            kind_of(found).to_string(),
        ),
    }
}

fn push(violations: &mut Vec<SchemaViolation>, path: &str, expected: String, found: String) {
    violations.push(SchemaViolation {
        path: path.to_string(),
        expected,
        found,
    });
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Why a candidate summary is not an extension of the prior one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixViolation {
    /// Candidate is shorter than the prior summary
    Truncated {
        /// Prior summary length in bytes
        prior_len: usize,
        /// Candidate length in bytes
        candidate_len: usize,
    },

    /// Candidate diverges from the prior summary
    Rewritten {
        /// Byte offset of the first difference
        offset: usize,
    },
}

impl fmt::Display for PrefixViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixViolation::Truncated {
                prior_len,
                candidate_len,
            } => write!(
                f,
                "candidate summary ({} bytes) is shorter than the previous summary ({} bytes); \
                 keep the previous summary verbatim and append to it",
                candidate_len, prior_len
            ),
            PrefixViolation::Rewritten { offset } => write!(
                f,
                "candidate summary changes the previous summary at byte {}; \
                 keep the previous summary verbatim and append to it",
                offset
            ),
        }
    }
}

/// Check that `candidate` starts with `prior`, byte for byte
///
/// No whitespace or case normalization is applied.
pub fn check_prefix_extension(prior: &str, candidate: &str) -> Result<(), PrefixViolation> {
    if candidate.as_bytes().starts_with(prior.as_bytes()) {
        return Ok(());
    }

    let offset = prior
        .bytes()
        .zip(candidate.bytes())
        .position(|(a, b)| a != b);

    match offset {
        Some(offset) => Err(PrefixViolation::Rewritten { offset }),
        None => Err(PrefixViolation::Truncated {
            prior_len: prior.len(),
            candidate_len: candidate.len(),
        }),
    }
}
