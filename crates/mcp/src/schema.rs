//! Builder for the JSON Schema objects used as tool `inputSchema`.

use serde_json::{Map, Value, json};

/// An `{"type": "object"}` schema assembled one property at a time.
///
/// ```
/// use mcp::InputSchema;
///
/// let schema = InputSchema::new()
///     .string("name", "Display name")
///     .required("name")
///     .integer_with_default("limit", "Page size", 10);
/// let value = serde_json::Value::from(schema);
/// assert_eq!(value["required"][0], "name");
/// ```
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "string", "description": description}))
    }

    pub fn string_with_default(self, name: &str, description: &str, default: &str) -> Self {
        self.property(
            name,
            json!({"type": "string", "description": description, "default": default}),
        )
    }

    pub fn number(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "number", "description": description}))
    }

    pub fn integer_with_default(self, name: &str, description: &str, default: i64) -> Self {
        self.property(
            name,
            json!({"type": "integer", "description": description, "default": default}),
        )
    }

    pub fn boolean(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "boolean", "description": description}))
    }

    pub fn boolean_with_default(self, name: &str, description: &str, default: bool) -> Self {
        self.property(
            name,
            json!({"type": "boolean", "description": description, "default": default}),
        )
    }

    /// Array of strings.
    pub fn string_array(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({
                "type": "array",
                "description": description,
                "items": {"type": "string"},
                "default": []
            }),
        )
    }

    /// Array whose items are left untyped.
    pub fn array(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({"type": "array", "description": description, "default": []}),
        )
    }

    /// Mark a previously declared property as required.
    pub fn required(mut self, name: &str) -> Self {
        if !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    fn property(mut self, name: &str, schema: Value) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }
}

impl From<InputSchema> for Value {
    fn from(schema: InputSchema) -> Self {
        let mut object = Map::new();
        object.insert("type".into(), Value::from("object"));
        object.insert("properties".into(), Value::Object(schema.properties));
        if !schema.required.is_empty() {
            object.insert("required".into(), Value::from(schema.required));
        }
        Value::Object(object)
    }
}
