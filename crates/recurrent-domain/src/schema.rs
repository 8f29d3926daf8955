//! Output schema module - expected shape of a model response
//!
//! Schemas are written in the configuration file using a small subset of
//! JSON Schema:
//!
//! ```json
//! {
//!   "type": "object",
//!   "required": ["topics"],
//!   "properties": {
//!     "topics": { "type": "array", "items": { "type": "string" } }
//!   }
//! }
//! ```
//!
//! A node without `"type"` takes its type from the keywords it carries:
//! `properties`, `required` or `additionalProperties` make it an object,
//! `items` or `minItems` an array, and a string `enum` a string. A node with
//! none of these accepts any value. `enum` is supported on strings only.
//! Keywords outside the subset (`description`, `title`, ...) are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structural description of a JSON value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub enum OutputSchema {
    /// Any JSON value
    Any,

    /// A string, optionally restricted to a fixed set of values
    String {
        /// Allowed values (empty means unrestricted)
        allowed: Vec<String>,
    },

    /// Any JSON number
    Number,

    /// A number without a fractional part
    Integer,

    /// `true` or `false`
    Boolean,

    /// `null`
    Null,

    /// An array whose elements all match `items`
    Array {
        /// Element schema (`None` accepts any element)
        items: Option<Box<OutputSchema>>,
        /// Minimum number of elements
        min_items: Option<usize>,
    },

    /// An object with typed properties
    Object {
        /// Schemas for known properties
        properties: BTreeMap<String, OutputSchema>,
        /// Properties that must be present
        required: Vec<String>,
        /// Whether properties not listed in `properties` are allowed
        additional_properties: bool,
    },
}

impl OutputSchema {
    /// Name of the JSON type this schema expects
    pub fn type_name(&self) -> &'static str {
        match self {
            OutputSchema::Any => "any",
            OutputSchema::String { .. } => "string",
            OutputSchema::Number => "number",
            OutputSchema::Integer => "integer",
            OutputSchema::Boolean => "boolean",
            OutputSchema::Null => "null",
            OutputSchema::Array { .. } => "array",
            OutputSchema::Object { .. } => "object",
        }
    }

    /// Object schema with the given required string properties
    ///
    /// Used for the fixed response shapes the pipeline itself relies on.
    pub fn object_of_strings(required: &[&str]) -> Self {
        let properties = required
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    OutputSchema::String { allowed: Vec::new() },
                )
            })
            .collect();

        OutputSchema::Object {
            properties,
            required: required.iter().map(|name| name.to_string()).collect(),
            additional_properties: true,
        }
    }

    /// Render the schema as pretty JSON for inclusion in a prompt
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.type_name().to_string())
    }
}

/// Wire form of a schema node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    allowed: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<RawSchema>>,

    #[serde(
        rename = "minItems",
        alias = "min_items",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    min_items: Option<usize>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, RawSchema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        alias = "additional_properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    additional_properties: Option<bool>,
}

impl RawSchema {
    /// Type named by `"type"`, or implied by the keywords present
    fn inferred_kind(&self) -> &str {
        if let Some(kind) = self.kind.as_deref() {
            return kind;
        }
        if !self.properties.is_empty()
            || !self.required.is_empty()
            || self.additional_properties.is_some()
        {
            "object"
        } else if self.items.is_some() || self.min_items.is_some() {
            "array"
        } else if !self.allowed.is_empty() {
            "string"
        } else {
            "any"
        }
    }
}

impl TryFrom<RawSchema> for OutputSchema {
    type Error = String;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let kind = raw.inferred_kind().to_string();
        if !raw.allowed.is_empty() && kind != "string" {
            return Err(format!(
                "'enum' is only supported on string schemas, found on '{}'",
                kind
            ));
        }

        let schema = match kind.as_str() {
            "any" => OutputSchema::Any,
            "string" => OutputSchema::String {
                allowed: raw
                    .allowed
                    .into_iter()
                    .map(|value| match value {
                        Value::String(s) => Ok(s),
                        other => Err(format!("'enum' values must be strings, found {}", other)),
                    })
                    .collect::<Result<_, _>>()?,
            },
            "number" => OutputSchema::Number,
            "integer" => OutputSchema::Integer,
            "boolean" => OutputSchema::Boolean,
            "null" => OutputSchema::Null,
            "array" => OutputSchema::Array {
                items: raw
                    .items
                    .map(|items| OutputSchema::try_from(*items).map(Box::new))
                    .transpose()?,
                min_items: raw.min_items,
            },
            "object" => {
                let mut properties = BTreeMap::new();
                for (name, node) in raw.properties {
                    properties.insert(name, OutputSchema::try_from(node)?);
                }
                for name in &raw.required {
                    if name.is_empty() {
                        return Err("required property names must not be empty".to_string());
                    }
                }
                OutputSchema::Object {
                    properties,
                    required: raw.required,
                    additional_properties: raw.additional_properties.unwrap_or(true),
                }
            }
            other => return Err(format!("unsupported schema type '{}'", other)),
        };

        Ok(schema)
    }
}

impl From<OutputSchema> for RawSchema {
    fn from(schema: OutputSchema) -> Self {
        let kind = Some(schema.type_name().to_string());
        match schema {
            OutputSchema::Any => RawSchema::default(),
            OutputSchema::String { allowed } => RawSchema {
                kind,
                allowed: allowed.into_iter().map(Value::String).collect(),
                ..RawSchema::default()
            },
            OutputSchema::Array { items, min_items } => RawSchema {
                kind,
                items: items.map(|items| Box::new(RawSchema::from(*items))),
                min_items,
                ..RawSchema::default()
            },
            OutputSchema::Object {
                properties,
                required,
                additional_properties,
            } => RawSchema {
                kind,
                properties: properties
                    .into_iter()
                    .map(|(name, node)| (name, RawSchema::from(node)))
                    .collect(),
                required,
                additional_properties: (!additional_properties).then_some(false),
                ..RawSchema::default()
            },
            OutputSchema::Number
            | OutputSchema::Integer
            | OutputSchema::Boolean
            | OutputSchema::Null => RawSchema {
                kind,
                ..RawSchema::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_schema() {
        let schema: OutputSchema = serde_json::from_str(
            r#"{
                "type": "object",
                "required": ["topics"],
                "properties": {
                    "topics": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["topic_description", "start_line"],
                            "properties": {
                                "topic_description": {"type": "string"},
                                "start_line": {"type": "integer"}
                            }
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        match schema {
            OutputSchema::Object { properties, required, additional_properties } => {
                assert_eq!(required, vec!["topics".to_string()]);
                assert!(additional_properties);
                match &properties["topics"] {
                    OutputSchema::Array { items: Some(items), .. } => {
                        assert_eq!(items.type_name(), "object");
                    }
                    other => panic!("Expected array, got {:?}", other),
                }
            }
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_type_is_inferred() {
        let parse = |json: &str| serde_json::from_str::<OutputSchema>(json).unwrap();

        assert_eq!(parse(r#"{"description": "free-form"}"#), OutputSchema::Any);

        match parse(r#"{"required": ["topics"], "properties": {"topics": {"type": "array"}}}"#) {
            OutputSchema::Object { properties, required, .. } => {
                assert_eq!(required, vec!["topics".to_string()]);
                assert_eq!(properties["topics"].type_name(), "array");
            }
            other => panic!("Expected object, got {:?}", other),
        }
        assert_eq!(parse(r#"{"required": ["a"]}"#).type_name(), "object");
        assert_eq!(parse(r#"{"additionalProperties": false}"#).type_name(), "object");

        assert_eq!(
            parse(r#"{"items": {"type": "integer"}}"#),
            OutputSchema::Array {
                items: Some(Box::new(OutputSchema::Integer)),
                min_items: None
            }
        );
        assert_eq!(parse(r#"{"minItems": 1}"#).type_name(), "array");

        assert_eq!(
            parse(r#"{"enum": ["yes", "no"]}"#),
            OutputSchema::String {
                allowed: vec!["yes".to_string(), "no".to_string()]
            }
        );
    }

    #[test]
    fn test_enum_on_non_string_type_rejected() {
        let result: Result<OutputSchema, _> =
            serde_json::from_str(r#"{"type": "integer", "enum": [1, 2]}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("'enum' is only supported on string schemas, found on 'integer'"));

        let result: Result<OutputSchema, _> =
            serde_json::from_str(r#"{"type": "string", "enum": ["a", 2]}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("'enum' values must be strings, found 2"));

        let result: Result<OutputSchema, _> = serde_json::from_str(r#"{"enum": [true]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_string_enum() {
        let schema: OutputSchema =
            serde_json::from_str(r#"{"type": "string", "enum": ["positive", "negative"]}"#)
                .unwrap();
        assert_eq!(
            schema,
            OutputSchema::String {
                allowed: vec!["positive".to_string(), "negative".to_string()]
            }
        );
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let result: Result<OutputSchema, _> = serde_json::from_str(r#"{"type": "tuple"}"#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unsupported schema type 'tuple'"));
    }

    #[test]
    fn test_additional_properties_flag() {
        let schema: OutputSchema = serde_json::from_str(
            r#"{"type": "object", "additionalProperties": false, "properties": {"a": {"type": "null"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            schema,
            OutputSchema::Object { additional_properties: false, .. }
        ));
    }

    #[test]
    fn test_prompt_json_keeps_structure() {
        let schema = OutputSchema::object_of_strings(&["summary"]);
        let rendered = schema.to_prompt_json();
        assert!(rendered.contains("\"summary\""));
        assert!(rendered.contains("\"required\""));

        let parsed: OutputSchema = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, schema);
    }
}
