use crate::pattern::Pattern;
use crate::rules::{SchemaRules, TableRule, TableRules};
use lotus_core::DialectKind;

/// Built-in denies that always apply and cannot be re-enabled by
/// configuration (§6 "Built-in denied schemas/tables").
pub fn builtin_schema_rules(dialect: DialectKind) -> SchemaRules {
    let deny = match dialect {
        DialectKind::Postgres => vec![
            Pattern::exact("pg_catalog"),
            Pattern::exact("information_schema"),
            Pattern::exact("pg_toast"),
            Pattern::regex("^pg_temp").expect("static pattern"),
            Pattern::regex("^pg_toast").expect("static pattern"),
        ],
        DialectKind::Mysql => vec![
            Pattern::exact("mysql"),
            Pattern::exact("information_schema"),
            Pattern::exact("performance_schema"),
            Pattern::exact("sys"),
        ],
        DialectKind::Sqlite | DialectKind::SqlServer | DialectKind::Other => vec![],
    };
    SchemaRules { allow: vec![], deny }
}

/// Built-in table denies that apply in every schema, on every backend.
pub fn builtin_table_rules(dialect: DialectKind) -> TableRules {
    let mut deny = vec![
        TableRule::Bare(Pattern::exact("schema_migrations")),
        TableRule::Bare(Pattern::regex("^schema_migrations_").expect("static pattern")),
        TableRule::Bare(Pattern::exact("lotus_queries")),
        TableRule::Bare(Pattern::regex("^lotus_dashboards").expect("static pattern")),
    ];
    if dialect == DialectKind::Sqlite {
        deny.push(TableRule::Bare(Pattern::exact("sqlite_master")));
        deny.push(TableRule::Bare(Pattern::exact("sqlite_sequence")));
        deny.push(TableRule::Bare(Pattern::regex("^sqlite_").expect("static pattern")));
    }
    TableRules { allow: vec![], deny }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_denies_system_catalogs() {
        let rules = builtin_schema_rules(DialectKind::Postgres);
        assert!(rules.is_denied("pg_catalog"));
        assert!(rules.is_denied("pg_temp_3"));
        assert!(!rules.is_denied("public"));
    }

    #[test]
    fn mysql_denies_system_databases() {
        let rules = builtin_schema_rules(DialectKind::Mysql);
        assert!(rules.is_denied("information_schema"));
        assert!(rules.is_denied("sys"));
    }

    #[test]
    fn sqlite_denies_sqlite_prefixed_tables() {
        let rules = builtin_table_rules(DialectKind::Sqlite);
        assert!(rules.is_denied("main", "sqlite_master"));
        assert!(rules.is_denied("main", "sqlite_stat1"));
    }

    #[test]
    fn lotus_framework_tables_always_denied() {
        let rules = builtin_table_rules(DialectKind::Postgres);
        assert!(rules.is_denied("public", "schema_migrations"));
        assert!(rules.is_denied("public", "lotus_queries"));
        assert!(rules.is_denied("public", "lotus_dashboards_items"));
    }
}
