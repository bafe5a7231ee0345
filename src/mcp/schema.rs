//! Tool Argument Schemas
//!
//! Typed schema table for tool arguments. Emits JSON Schema for
//! `tools/list` and validates argument maps before a handler runs, so a
//! tool never executes with a malformed shape (no partial side effects).

use serde_json::{json, Map, Value};

/// Field value kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Integer,
    Number,
    Boolean,
    StrArray,
}

impl FieldKind {
    fn json_type(&self) -> Value {
        match self {
            FieldKind::Str => json!({"type": "string"}),
            FieldKind::Integer => json!({"type": "integer"}),
            FieldKind::Number => json!({"type": "number"}),
            FieldKind::Boolean => json!({"type": "boolean"}),
            FieldKind::StrArray => json!({"type": "array", "items": {"type": "string"}}),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::StrArray => "array of strings",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Str => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::StrArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// One named argument field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            description: "",
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::Str)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// Argument schema for one tool: a set of named fields plus an
/// `additionalProperties` closure flag (closed by default).
#[derive(Debug, Clone)]
pub struct ArgumentSchema {
    fields: Vec<FieldSpec>,
    additional_properties: bool,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            additional_properties: false,
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Allow keys the schema does not declare.
    pub fn open(mut self) -> Self {
        self.additional_properties = true;
        self
    }

    /// Render as a JSON Schema object for tool discovery.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut spec = field.kind.json_type();
            if !field.description.is_empty() {
                spec["description"] = json!(field.description);
            }
            properties.insert(field.name.to_string(), spec);
            if field.required {
                required.push(json!(field.name));
            }
        }

        let mut schema = json!({
            "type": "object",
            "properties": Value::Object(properties),
            "additionalProperties": self.additional_properties,
        });
        if !required.is_empty() {
            schema["required"] = Value::Array(required);
        }
        schema
    }

    /// Validate an argument map against this schema.
    ///
    /// Returns every violation, not just the first, so clients can fix a
    /// bad call in one round trip.
    pub fn validate(&self, arguments: &Value) -> Result<(), Vec<String>> {
        let Some(map) = arguments.as_object() else {
            return Err(vec!["arguments must be an object".to_string()]);
        };

        let mut errors = Vec::new();

        for field in &self.fields {
            match map.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        errors.push(format!("missing required field: {}", field.name));
                    }
                }
                Some(value) => {
                    if !field.kind.accepts(value) {
                        errors.push(format!(
                            "field {} must be a {}",
                            field.name,
                            field.kind.type_name()
                        ));
                    }
                }
            }
        }

        if !self.additional_properties {
            for key in map.keys() {
                if !self.fields.iter().any(|f| f.name == key) {
                    errors.push(format!("unknown field: {}", key));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for ArgumentSchema {
    fn default() -> Self {
        Self::new()
    }
}
