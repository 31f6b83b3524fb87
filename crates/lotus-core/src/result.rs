use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Optional pagination metadata attached to a `QueryResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimate: Option<u64>,
}

/// The tabular result of running a query, after post-processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub num_rows: u64,
    pub duration_ms: u64,
    pub command: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<Window>,
}

impl QueryResult {
    pub fn empty(command: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            num_rows: 0,
            duration_ms: 0,
            command: command.into(),
            meta: serde_json::Value::Null,
            window: None,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Render rows as CSV text (header row, double-quote escaping, nulls
    /// as empty cells).
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.iter().map(|c| csv_escape(c)).collect::<Vec<_>>().join(","));
        out.push_str("\r\n");
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| if v.is_null() { String::new() } else { csv_escape(&v.as_display_string()) })
                .collect();
            out.push_str(&cells.join(","));
            out.push_str("\r\n");
        }
        out
    }

    /// Render rows as a JSON array of objects keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let objects: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut map = serde_json::Map::new();
                for (col, val) in self.columns.iter().zip(row.iter()) {
                    map.insert(col.clone(), val.as_json());
                }
                serde_json::Value::Object(map)
            })
            .collect();
        serde_json::Value::Array(objects)
    }

    /// Render rows as JSON Lines: one object per line, no trailing newline.
    pub fn to_jsonl(&self) -> String {
        let lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let mut map = serde_json::Map::new();
                for (col, val) in self.columns.iter().zip(row.iter()) {
                    map.insert(col.clone(), val.as_json());
                }
                serde_json::Value::Object(map).to_string()
            })
            .collect();
        lines.join("\n")
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryResult {
        QueryResult {
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec![Value::Integer(1), Value::Text("Ann, A.".into())],
                vec![Value::Integer(2), Value::Null],
            ],
            num_rows: 2,
            duration_ms: 5,
            command: "SELECT".into(),
            meta: serde_json::Value::Null,
            window: None,
        }
    }

    #[test]
    fn csv_quotes_fields_with_commas_and_empties_nulls() {
        let csv = sample().to_csv();
        assert!(csv.contains("\"Ann, A.\""));
        assert!(csv.ends_with("2,\r\n"));
    }

    #[test]
    fn json_preserves_null() {
        let json = sample().to_json();
        assert_eq!(json[1]["name"], serde_json::Value::Null);
    }

    #[test]
    fn jsonl_has_no_trailing_newline() {
        let jsonl = sample().to_jsonl();
        assert!(!jsonl.ends_with('\n'));
        assert_eq!(jsonl.lines().count(), 2);
    }
}
