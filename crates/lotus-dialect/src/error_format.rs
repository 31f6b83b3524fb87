use lotus_core::DialectKind;

/// `format_error(native_error) → string` (§4.1): maps driver errors to
/// uniform, dialect-flavored prefixes so callers get a consistent string
/// shape regardless of which backend answered.
pub fn format_driver_error(dialect: DialectKind, err: &sqlx::Error) -> String {
    if matches!(err, sqlx::Error::PoolTimedOut) {
        return "SQL error: canceling statement due to user request".to_string();
    }
    let prefix = match dialect {
        DialectKind::Sqlite => "SQLite Error:",
        _ => match err {
            sqlx::Error::Database(db_err) if is_syntax_error(dialect, db_err.as_ref()) => "SQL syntax error:",
            _ => "SQL error:",
        },
    };
    format!("{prefix} {err}")
}

fn is_syntax_error(dialect: DialectKind, db_err: &dyn sqlx::error::DatabaseError) -> bool {
    match dialect {
        // PostgreSQL syntax errors are SQLSTATE class 42.
        DialectKind::Postgres => db_err.code().is_some_and(|c| c.starts_with("42")),
        // MySQL syntax errors are ER_PARSE_ERROR (1064) and friends.
        DialectKind::Mysql => db_err.code().is_some_and(|c| c == "1064"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_prefix_is_distinct() {
        let err = sqlx::Error::RowNotFound;
        assert!(format_driver_error(DialectKind::Sqlite, &err).starts_with("SQLite Error:"));
    }

    #[test]
    fn pool_timeout_maps_to_uniform_timeout_message() {
        let err = sqlx::Error::PoolTimedOut;
        assert_eq!(
            format_driver_error(DialectKind::Postgres, &err),
            "SQL error: canceling statement due to user request"
        );
    }
}
