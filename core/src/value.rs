//! Property values for content tree nodes.
//!
//! Property values are plain JSON values; a node's properties are an ordered
//! JSON object keyed by property name.

use serde_json::Value;

/// Type alias for property storage.
pub type Properties = serde_json::Map<String, Value>;

/// Returns the JSON type name of a value, used in validation messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Helper macro to create property maps.
#[macro_export]
macro_rules! props {
    () => {
        $crate::Properties::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = $crate::Properties::new();
            $(
                map.insert($key.to_string(), $crate::serde_json::json!($value));
            )+
            map
        }
    };
}
