use serde::{Deserialize, Serialize};

/// Declared type of a query variable. Drives both type inference fallback
/// and value casting (see `lotus-binder`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarType {
    Text,
    Number,
    Integer,
    Date,
    Datetime,
    Time,
    Boolean,
    Json,
    Uuid,
    /// PostgreSQL-only array of the element type named here.
    Array(Box<VarType>),
}

impl VarType {
    pub fn is_array(&self) -> bool {
        matches!(self, VarType::Array(_))
    }
}

/// How a variable is surfaced to a caller building a UI on top of Lotus.
/// Opaque beyond the core's own use (kept for round-tripping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Input,
    Select,
    Date,
    Checkbox,
    Json,
}

/// A single named variable declared on a `QuerySpec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<Widget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_options: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_query: Option<String>,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        Self {
            name: name.into(),
            var_type,
            default: None,
            widget: None,
            static_options: None,
            options_query: None,
        }
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A query as authored by a caller, before binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySpec {
    pub statement: String,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
    pub data_repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_path: Option<String>,
}

impl QuerySpec {
    /// Schema identifier grammar used for `search_path` elements:
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn search_path_elements(&self) -> Vec<&str> {
        self.search_path
            .as_deref()
            .map(|s| s.split(',').map(|p| p.trim()).filter(|p| !p.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn is_valid_search_path(&self) -> bool {
        self.search_path_elements()
            .iter()
            .all(|ident| is_valid_identifier(ident))
    }

    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn has_unique_variable_names(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.variables.iter().all(|v| seen.insert(v.name.as_str()))
    }
}

pub fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
