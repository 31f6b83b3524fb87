use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Schema-level allow/deny rules for one backend.
///
/// `allow: [Pattern::All]` (the config shorthand `"*"`) means "no schema
/// gate" per §4.2 step 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaRules {
    #[serde(default)]
    pub allow: Vec<Pattern>,
    #[serde(default)]
    pub deny: Vec<Pattern>,
}

impl SchemaRules {
    pub fn allows_everything(&self) -> bool {
        self.allow.is_empty() || self.allow.iter().any(|p| matches!(p, Pattern::All))
    }

    pub fn is_denied(&self, schema: &str) -> bool {
        self.deny.iter().any(|p| p.matches(schema))
    }

    pub fn is_explicitly_allowed(&self, schema: &str) -> bool {
        self.allow.iter().any(|p| p.matches(schema))
    }
}

/// A table rule. `Bare` matches the named table in any schema; `Scoped`
/// requires the schema to match too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableRule {
    Scoped { schema: Pattern, table: Pattern },
    Bare(Pattern),
}

impl TableRule {
    pub fn matches(&self, schema: &str, table: &str) -> bool {
        match self {
            TableRule::Bare(t) => t.matches(table),
            TableRule::Scoped { schema: s, table: t } => s.matches(schema) && t.matches(table),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRules {
    #[serde(default)]
    pub allow: Vec<TableRule>,
    #[serde(default)]
    pub deny: Vec<TableRule>,
}

impl TableRules {
    pub fn is_denied(&self, schema: &str, table: &str) -> bool {
        self.deny.iter().any(|r| r.matches(schema, table))
    }

    /// Whether any `allow` rule *could* target this schema — used to decide
    /// whether the schema operates in default-allow or default-deny mode.
    pub fn has_allow_rule_for_schema(&self, schema: &str) -> bool {
        self.allow.iter().any(|r| match r {
            TableRule::Bare(_) => true,
            TableRule::Scoped { schema: s, .. } => s.matches(schema),
        })
    }

    pub fn is_explicitly_allowed(&self, schema: &str, table: &str) -> bool {
        self.allow.iter().any(|r| r.matches(schema, table))
    }
}

/// Masking strategy for a column with `mask` policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    Null,
    Sha256,
    Fixed(String),
    Partial {
        #[serde(default)]
        keep_first: usize,
        #[serde(default)]
        keep_last: usize,
        #[serde(default = "default_replacement")]
        replacement: String,
    },
}

fn default_replacement() -> String {
    "*".to_string()
}

/// The effective action to take on a column's value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ColumnAction {
    Allow,
    Omit,
    Error,
    Mask {
        strategy: MaskStrategy,
    },
}

impl ColumnAction {
    pub fn is_allow(&self) -> bool {
        matches!(self, ColumnAction::Allow)
    }
}

/// One entry in the column-rules config list. `schema`/`table` are `None`
/// for less specific scopes; `column` is always required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub column: String,
    #[serde(flatten)]
    pub action: ColumnAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_schema: Option<bool>,
}

/// Normalized, specificity-indexed column policy lookup, built once at
/// config load per the "Column policy inheritance" redesign note: no
/// runtime reflection, a precedence order computed up front.
#[derive(Debug, Clone, Default)]
pub struct ColumnPolicyIndex {
    by_schema_table_column: HashMap<(String, String, String), ColumnRule>,
    by_table_column: HashMap<(String, String), ColumnRule>,
    by_column: HashMap<String, ColumnRule>,
}

impl ColumnPolicyIndex {
    pub fn build(rules: &[ColumnRule]) -> Self {
        let mut index = ColumnPolicyIndex::default();
        // First match wins within a specificity tier, so only insert if absent.
        for rule in rules {
            match (&rule.schema, &rule.table) {
                (Some(schema), Some(table)) => {
                    index
                        .by_schema_table_column
                        .entry((schema.clone(), table.clone(), rule.column.clone()))
                        .or_insert_with(|| rule.clone());
                }
                (None, Some(table)) => {
                    index
                        .by_table_column
                        .entry((table.clone(), rule.column.clone()))
                        .or_insert_with(|| rule.clone());
                }
                (None, None) => {
                    index
                        .by_column
                        .entry(rule.column.clone())
                        .or_insert_with(|| rule.clone());
                }
                (Some(_), None) => {
                    // A schema-qualified-but-table-less rule has no well-defined
                    // target; config validation rejects this shape at load time.
                }
            }
        }
        index
    }

    /// Resolve the effective rule for `(schema, table, column)`, walking
    /// from most to least specific. Unmatched columns default to `Allow`
    /// (the caller constructs that default; this returns `None`).
    pub fn resolve(&self, schema: &str, table: &str, column: &str) -> Option<&ColumnRule> {
        self.by_schema_table_column
            .get(&(schema.to_string(), table.to_string(), column.to_string()))
            .or_else(|| self.by_table_column.get(&(table.to_string(), column.to_string())))
            .or_else(|| self.by_column.get(column))
    }

    /// Resolve using only the least-specific (bare column) tier, for
    /// columns whose originating table is unknown (computed expressions).
    pub fn resolve_bare(&self, column: &str) -> Option<&ColumnRule> {
        self.by_column.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_rule(column: &str) -> ColumnRule {
        ColumnRule {
            schema: None,
            table: None,
            column: column.to_string(),
            action: ColumnAction::Allow,
            show_in_schema: None,
        }
    }

    #[test]
    fn table_rule_bare_matches_any_schema() {
        let rule = TableRule::Bare(Pattern::exact("api_keys"));
        assert!(rule.matches("public", "api_keys"));
        assert!(rule.matches("tenant_a", "api_keys"));
    }

    #[test]
    fn most_specific_column_rule_wins() {
        let rules = vec![
            allow_rule("email"),
            ColumnRule {
                schema: Some("public".into()),
                table: Some("users".into()),
                column: "email".into(),
                action: ColumnAction::Error,
                show_in_schema: None,
            },
        ];
        let index = ColumnPolicyIndex::build(&rules);
        let resolved = index.resolve("public", "users", "email").unwrap();
        assert!(matches!(resolved.action, ColumnAction::Error));
    }

    #[test]
    fn unmatched_column_has_no_entry() {
        let index = ColumnPolicyIndex::build(&[]);
        assert!(index.resolve("public", "users", "id").is_none());
    }

    #[test]
    fn first_match_wins_within_same_specificity() {
        let rules = vec![
            ColumnRule {
                schema: None,
                table: Some("users".into()),
                column: "ssn".into(),
                action: ColumnAction::Omit,
                show_in_schema: None,
            },
            ColumnRule {
                schema: None,
                table: Some("users".into()),
                column: "ssn".into(),
                action: ColumnAction::Allow,
                show_in_schema: None,
            },
        ];
        let index = ColumnPolicyIndex::build(&rules);
        let resolved = index.resolve("public", "users", "ssn").unwrap();
        assert!(matches!(resolved.action, ColumnAction::Omit));
    }
}
