//! Typed access to the untyped argument map of a tool call.
//!
//! Required arguments fail loudly. Optional arguments never fail: a missing
//! key, a `null`, and a value of the wrong type all read as `None`.

use asgardeo::ScopeCreate;
use serde_json::{Map, Value};

use crate::error::{Result, ToolError};

/// Conversion from one JSON argument value.
pub trait FromArgument: Sized {
    /// Type name used in error messages.
    const EXPECTED: &'static str;

    /// `None` when the value has the wrong runtime type.
    fn from_argument(value: &Value) -> Option<Self>;
}

impl FromArgument for String {
    const EXPECTED: &'static str = "string";

    fn from_argument(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromArgument for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_argument(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromArgument for f64 {
    const EXPECTED: &'static str = "number";

    fn from_argument(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

/// Integral value of a JSON number. Accepts `10.0`, rejects `10.5`.
fn integral(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.into());
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e19).then_some(f as i128)
}

macro_rules! integer_argument {
    ($($ty:ty),*) => {
        $(
            impl FromArgument for $ty {
                const EXPECTED: &'static str = "integer";

                fn from_argument(value: &Value) -> Option<Self> {
                    integral(value).and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )*
    };
}

integer_argument!(i64, u32, u64);

impl FromArgument for Vec<Value> {
    const EXPECTED: &'static str = "array";

    fn from_argument(value: &Value) -> Option<Self> {
        value.as_array().cloned()
    }
}

impl FromArgument for Map<String, Value> {
    const EXPECTED: &'static str = "object";

    fn from_argument(value: &Value) -> Option<Self> {
        value.as_object().cloned()
    }
}

/// A record that can be given either as a bare name or as an object.
pub trait FromElement: Sized {
    /// The simplified form: a single string.
    fn from_name(name: &str) -> Self;

    /// The structured form. `Err` carries the reason the object was rejected.
    fn from_fields(fields: &Map<String, Value>) -> std::result::Result<Self, String>;
}

impl FromElement for ScopeCreate {
    fn from_name(name: &str) -> Self {
        ScopeCreate::named(name)
    }

    fn from_fields(fields: &Map<String, Value>) -> std::result::Result<Self, String> {
        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .ok_or("scope `name` is required and must be a string")?;
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            display_name: text("displayName"),
            description: text("description"),
        })
    }
}

/// The arguments of one tool call.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Raw value, with `null` treated as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn required<T: FromArgument>(&self, key: &str) -> Result<T> {
        self.get(key)
            .and_then(T::from_argument)
            .ok_or_else(|| ToolError::missing(key, T::EXPECTED))
    }

    pub fn optional<T: FromArgument>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(T::from_argument)
    }

    pub fn optional_or<T: FromArgument>(&self, key: &str, default: T) -> T {
        self.optional(key).unwrap_or(default)
    }

    /// Array argument as strings. Numbers and booleans are stringified;
    /// nulls, arrays and objects are dropped. Absent or non-array is `[]`.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.optional_string_list(key).unwrap_or_default()
    }

    /// Like [`Arguments::string_list`], but `None` when the key is absent, so
    /// "leave unchanged" and "set to empty" can be told apart.
    pub fn optional_string_list(&self, key: &str) -> Option<Vec<String>> {
        let items = self.get(key)?.as_array()?;
        Some(items.iter().filter_map(stringify).collect())
    }

    /// Array of records, each either a bare name or an object.
    ///
    /// Absent is `[]`. A present non-array fails, as does any element that is
    /// neither a string nor a valid object.
    pub fn records<T: FromElement>(&self, key: &str) -> Result<Vec<T>> {
        let Some(value) = self.get(key) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| ToolError::missing(key, "array"))?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let invalid = |reason: String| ToolError::InvalidElementFormat {
                    key: key.to_string(),
                    index,
                    reason,
                };
                match item {
                    Value::String(name) => Ok(T::from_name(name)),
                    Value::Object(fields) => T::from_fields(fields).map_err(invalid),
                    other => Err(invalid(format!(
                        "expected string or object, found {}",
                        kind_of(other)
                    ))),
                }
            })
            .collect()
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
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
