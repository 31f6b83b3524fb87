use serde::{Deserialize, Serialize};

/// A single scalar (or array) value, as bound for a placeholder or returned
/// in a result row. Dialect-agnostic; `lotus-dialect` maps these onto the
/// wire types each driver expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    /// ISO-8601 date (`YYYY-MM-DD`).
    Date(String),
    /// ISO-8601 time (`HH:MM:SS`).
    Time(String),
    /// ISO-8601 datetime, always with an offset.
    DateTime(String),
    Uuid(String),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render for non-null hashing/masking purposes: a stable UTF-8 form.
    pub fn as_hashable_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) | Value::Date(s) | Value::Time(s) | Value::DateTime(s) | Value::Uuid(s) => {
                s.clone()
            }
            Value::Json(v) => v.to_string(),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.as_hashable_string()).collect();
                format!("[{}]", parts.join(","))
            }
        }
    }

    /// Render as a display string for text output (CSV cells, table printing).
    pub fn as_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.as_hashable_string(),
        }
    }

    pub fn as_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) | Value::Date(s) | Value::Time(s) | Value::DateTime(s) | Value::Uuid(s) => {
                serde_json::Value::String(s.clone())
            }
            Value::Json(v) => v.clone(),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::as_json).collect()),
        }
    }
}
