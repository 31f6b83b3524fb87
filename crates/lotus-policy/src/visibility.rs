use lotus_config::{builtin_schema_rules, builtin_table_rules, ColumnAction, ColumnPolicyIndex, RuleBundle, SchemaRules, TableRules};
use lotus_core::DialectKind;

/// Outcome of `VisibilityEngine::check_table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDecision {
    Allow,
    Deny,
}

/// A pure function over `(backend, schema?, table, column?)` and the
/// compiled rule set — never touches the database (§4.2).
pub struct VisibilityEngine<'a> {
    dialect: DialectKind,
    schema_rules: &'a SchemaRules,
    table_rules: &'a TableRules,
    column_index: &'a ColumnPolicyIndex,
    builtin_schema: SchemaRules,
    builtin_table: TableRules,
}

impl<'a> VisibilityEngine<'a> {
    pub fn new(dialect: DialectKind, bundle: &'a RuleBundle, column_index: &'a ColumnPolicyIndex) -> Self {
        Self {
            dialect,
            schema_rules: &bundle.schema_rules,
            table_rules: &bundle.table_rules,
            column_index,
            builtin_schema: builtin_schema_rules(dialect),
            builtin_table: builtin_table_rules(dialect),
        }
    }

    /// §4.2 step 1: schema gating. Built-in denies always apply first and
    /// cannot be re-enabled by configuration.
    pub fn allowed_schema(&self, schema: &str) -> bool {
        if self.builtin_schema.is_denied(schema) {
            return false;
        }
        if self.schema_rules.is_denied(schema) {
            return false;
        }
        if self.schema_rules.allows_everything() {
            return true;
        }
        self.schema_rules.is_explicitly_allowed(schema)
    }

    /// §4.2 steps 1-3: full table decision, folding in schema gating,
    /// built-in table denies, explicit deny, and the default-allow /
    /// default-deny posture.
    pub fn check_table(&self, schema: &str, table: &str) -> TableDecision {
        if !self.allowed_schema(schema) {
            return TableDecision::Deny;
        }
        if self.builtin_table.is_denied(schema, table) {
            return TableDecision::Deny;
        }
        if self.table_rules.is_denied(schema, table) {
            return TableDecision::Deny;
        }
        if self.table_rules.has_allow_rule_for_schema(schema) {
            return if self.table_rules.is_explicitly_allowed(schema, table) {
                TableDecision::Allow
            } else {
                TableDecision::Deny
            };
        }
        TableDecision::Allow
    }

    pub fn is_table_visible(&self, schema: &str, table: &str) -> bool {
        self.check_table(schema, table) == TableDecision::Allow
    }

    /// §4.2 step 4: resolve the effective column action. Unmatched columns
    /// default to `Allow`.
    pub fn column_action(&self, schema: &str, table: &str, column: &str) -> ColumnAction {
        self.column_index
            .resolve(schema, table, column)
            .map(|rule| rule.action.clone())
            .unwrap_or(ColumnAction::Allow)
    }

    /// Same as `column_action` but tolerant of an unknown schema/table
    /// (e.g. a computed expression in the select list) — falls back to
    /// whatever scope is actually known, down to the bare column rule.
    pub fn column_action_opt(&self, schema: Option<&str>, table: Option<&str>, column: &str) -> ColumnAction {
        match (schema, table) {
            (Some(s), Some(t)) => self.column_action(s, t, column),
            _ => self
                .column_index
                .resolve_bare(column)
                .map(|rule| rule.action.clone())
                .unwrap_or(ColumnAction::Allow),
        }
    }

    /// Whether a column should be hidden from schema introspection: an
    /// `omit` or `error` policy hides unless `show_in_schema` overrides it.
    pub fn column_visible_in_schema(&self, schema: &str, table: &str, column: &str) -> bool {
        match self.column_index.resolve(schema, table, column) {
            None => true,
            Some(rule) => match rule.action {
                ColumnAction::Omit | ColumnAction::Error => rule.show_in_schema.unwrap_or(false),
                ColumnAction::Allow | ColumnAction::Mask { .. } => true,
            },
        }
    }

    /// Evaluate a whole list of touched relations (as discovered by
    /// preflight) against table visibility, returning the ones that are
    /// blocked, fully qualified as `schema.table`.
    pub fn blocked_relations(&self, relations: &[(String, String)]) -> Vec<String> {
        relations
            .iter()
            .filter(|(schema, table)| !self.is_table_visible(schema, table))
            .map(|(schema, table)| format!("{schema}.{table}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotus_config::{ColumnAction as CA, ColumnPolicyIndex, ColumnRule, MaskStrategy, RuleBundle, SchemaRules, TableRule, TableRules};
    use lotus_config::Pattern;

    fn engine<'a>(bundle: &'a RuleBundle, index: &'a ColumnPolicyIndex) -> VisibilityEngine<'a> {
        VisibilityEngine::new(DialectKind::Postgres, bundle, index)
    }

    #[test]
    fn builtin_schema_deny_cannot_be_overridden() {
        let bundle = RuleBundle {
            schema_rules: SchemaRules {
                allow: vec![Pattern::exact("pg_catalog")],
                deny: vec![],
            },
            ..Default::default()
        };
        let index = ColumnPolicyIndex::build(&[]);
        let engine = engine(&bundle, &index);
        assert!(!engine.allowed_schema("pg_catalog"));
    }

    #[test]
    fn default_allow_when_no_allow_rules_for_schema() {
        let bundle = RuleBundle::default();
        let index = ColumnPolicyIndex::build(&[]);
        let engine = engine(&bundle, &index);
        assert_eq!(engine.check_table("public", "orders"), TableDecision::Allow);
    }

    #[test]
    fn default_deny_once_any_allow_rule_targets_schema() {
        let bundle = RuleBundle {
            table_rules: TableRules {
                allow: vec![TableRule::Scoped {
                    schema: Pattern::exact("public"),
                    table: Pattern::exact("orders"),
                }],
                deny: vec![],
            },
            ..Default::default()
        };
        let index = ColumnPolicyIndex::build(&[]);
        let engine = engine(&bundle, &index);
        assert_eq!(engine.check_table("public", "orders"), TableDecision::Allow);
        assert_eq!(engine.check_table("public", "users"), TableDecision::Deny);
    }

    #[test]
    fn table_deny_wins_over_allow() {
        let bundle = RuleBundle {
            table_rules: TableRules {
                allow: vec![TableRule::Bare(Pattern::exact("orders"))],
                deny: vec![TableRule::Bare(Pattern::exact("orders"))],
            },
            ..Default::default()
        };
        let index = ColumnPolicyIndex::build(&[]);
        let engine = engine(&bundle, &index);
        assert_eq!(engine.check_table("public", "orders"), TableDecision::Deny);
    }

    #[test]
    fn builtin_system_table_always_blocked() {
        let bundle = RuleBundle::default();
        let index = ColumnPolicyIndex::build(&[]);
        let engine = engine(&bundle, &index);
        assert_eq!(engine.check_table("public", "schema_migrations"), TableDecision::Deny);
    }

    #[test]
    fn unmatched_column_defaults_to_allow() {
        let bundle = RuleBundle::default();
        let index = ColumnPolicyIndex::build(&[]);
        let engine = engine(&bundle, &index);
        assert!(engine.column_action("public", "users", "id").is_allow());
    }

    #[test]
    fn masked_column_hidden_from_schema_unless_overridden() {
        let rules = vec![ColumnRule {
            schema: None,
            table: Some("users".into()),
            column: "ssn".into(),
            action: CA::Omit,
            show_in_schema: None,
        }];
        let index = ColumnPolicyIndex::build(&rules);
        let bundle = RuleBundle::default();
        let engine = engine(&bundle, &index);
        assert!(!engine.column_visible_in_schema("public", "users", "ssn"));
    }

    #[test]
    fn masked_column_still_visible_in_schema() {
        let rules = vec![ColumnRule {
            schema: None,
            table: Some("users".into()),
            column: "email".into(),
            action: CA::Mask {
                strategy: MaskStrategy::Sha256,
            },
            show_in_schema: None,
        }];
        let index = ColumnPolicyIndex::build(&rules);
        let bundle = RuleBundle::default();
        let engine = engine(&bundle, &index);
        assert!(engine.column_visible_in_schema("public", "users", "email"));
    }

    #[test]
    fn blocked_relations_reports_qualified_names() {
        let bundle = RuleBundle::default();
        let index = ColumnPolicyIndex::build(&[]);
        let engine = engine(&bundle, &index);
        let relations = vec![
            ("public".to_string(), "orders".to_string()),
            ("public".to_string(), "schema_migrations".to_string()),
        ];
        let blocked = engine.blocked_relations(&relations);
        assert_eq!(blocked, vec!["public.schema_migrations".to_string()]);
    }
}
