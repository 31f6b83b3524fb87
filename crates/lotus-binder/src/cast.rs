use lotus_core::{LotusError, LotusResult, VarType, Value};
use once_cell::sync::Lazy;
use regex::Regex;

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").unwrap()
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?$").unwrap());
static DATETIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?([+-]\d{2}:?\d{2}|Z)?$").unwrap());

/// Cast a raw JSON value supplied by a caller into a `Value` matching
/// `ty`, per §4.4's "Type casting of values" table. Every rejection
/// produces `LotusError::invalid_value` carrying the declared type name,
/// the raw text that failed, and a short reason.
pub fn cast_value(ty: &VarType, raw: &serde_json::Value) -> LotusResult<Value> {
    match ty {
        VarType::Text => Ok(Value::Text(json_to_text(raw))),
        VarType::Boolean => cast_boolean(raw),
        VarType::Integer => cast_integer(raw),
        VarType::Number => cast_number(raw),
        VarType::Uuid => cast_pattern(raw, "uuid", &UUID_RE, Value::Uuid),
        VarType::Date => cast_pattern(raw, "date", &DATE_RE, Value::Date),
        VarType::Time => cast_pattern(raw, "time", &TIME_RE, Value::Time),
        VarType::Datetime => cast_pattern(raw, "datetime", &DATETIME_RE, Value::DateTime),
        VarType::Json => Ok(Value::Json(raw.clone())),
        VarType::Array(elem) => cast_array(elem, raw),
    }
}

fn json_to_text(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cast_boolean(raw: &serde_json::Value) -> LotusResult<Value> {
    match raw {
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "on" => Ok(Value::Boolean(true)),
            "false" | "f" | "0" | "no" | "off" => Ok(Value::Boolean(false)),
            _ => Err(LotusError::invalid_value("boolean", s, "expected true/false")),
        },
        other => Err(LotusError::invalid_value("boolean", &other.to_string(), "expected true/false")),
    }
}

fn cast_integer(raw: &serde_json::Value) -> LotusResult<Value> {
    match raw {
        serde_json::Value::Number(n) if n.is_i64() => Ok(Value::Integer(n.as_i64().unwrap())),
        serde_json::Value::Number(n) => {
            Err(LotusError::invalid_value("integer", &n.to_string(), "not a whole number"))
        }
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| LotusError::invalid_value("integer", s, "not a whole number")),
        other => Err(LotusError::invalid_value("integer", &other.to_string(), "not a whole number")),
    }
}

fn cast_number(raw: &serde_json::Value) -> LotusResult<Value> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| LotusError::invalid_value("number", &n.to_string(), "not a number")),
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| LotusError::invalid_value("number", s, "not a number")),
        other => Err(LotusError::invalid_value("number", &other.to_string(), "not a number")),
    }
}

fn cast_pattern(
    raw: &serde_json::Value,
    type_name: &str,
    pattern: &Regex,
    wrap: impl Fn(String) -> Value,
) -> LotusResult<Value> {
    let text = match raw {
        serde_json::Value::String(s) => s.clone(),
        other => return Err(LotusError::invalid_value(type_name, &other.to_string(), "expected a string")),
    };
    if pattern.is_match(&text) {
        Ok(wrap(text))
    } else {
        Err(LotusError::invalid_value(type_name, &text, "does not match expected format"))
    }
}

fn cast_array(elem: &VarType, raw: &serde_json::Value) -> LotusResult<Value> {
    let items = match raw {
        serde_json::Value::Array(items) => items,
        other => return Err(LotusError::invalid_value("array", &other.to_string(), "expected an array")),
    };
    let cast_items: LotusResult<Vec<Value>> = items.iter().map(|item| cast_value(elem, item)).collect();
    Ok(Value::Array(cast_items?))
}
