use lotus_core::DialectKind;

/// Feature probes, pure over the dialect kind — `search_path | make_interval
/// | arrays | json` from §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    SearchPath,
    MakeInterval,
    Arrays,
    Json,
}

pub fn supports(dialect: DialectKind, feature: Feature) -> bool {
    match feature {
        Feature::SearchPath => dialect.supports_search_path(),
        Feature::MakeInterval => dialect.supports_make_interval(),
        Feature::Arrays => dialect.supports_arrays(),
        Feature::Json => dialect.supports_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_postgres_supports_search_path_and_make_interval() {
        assert!(supports(DialectKind::Postgres, Feature::SearchPath));
        assert!(!supports(DialectKind::Mysql, Feature::SearchPath));
        assert!(supports(DialectKind::Postgres, Feature::MakeInterval));
        assert!(!supports(DialectKind::Sqlite, Feature::MakeInterval));
    }

    #[test]
    fn json_supported_by_postgres_and_mysql_not_sqlite() {
        assert!(supports(DialectKind::Postgres, Feature::Json));
        assert!(supports(DialectKind::Mysql, Feature::Json));
        assert!(!supports(DialectKind::Sqlite, Feature::Json));
    }
}
