use crate::tokenizer::scan;
use lotus_core::{LotusError, LotusResult};
use once_cell::sync::Lazy;
use regex::Regex;

const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
    "VACUUM", "REINDEX", "ATTACH", "DETACH", "COPY",
];

const ALLOWED_LEADING_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "EXPLAIN", "SHOW"];

static WRITE_KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternation = WRITE_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
});

static LEADING_KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternation = ALLOWED_LEADING_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)^\s*({alternation})\b")).unwrap()
});

/// The syntactic deny-list check (C5): rejects multi-statement input and
/// any statement containing a write keyword. By design this scans the
/// **whole** statement text, including inside quoted literals — a
/// legitimate read-only query should never need "DROP TABLE" as a
/// string value, and scoping the scan to outside literals only would
/// require the same span-aware machinery the preflight stage (C6)
/// deliberately avoids.
pub fn check(sql: &str) -> LotusResult<()> {
    let scanned = scan(sql);
    if scanned.has_interior_semicolon {
        return Err(LotusError::multiple_statements());
    }

    if WRITE_KEYWORD_PATTERN.is_match(sql) {
        return Err(LotusError::read_only_violation());
    }

    if !LEADING_KEYWORD_PATTERN.is_match(&scanned.code_only) {
        return Err(LotusError::read_only_violation());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_select_passes() {
        assert!(check("SELECT id FROM users WHERE id = $1").is_ok());
    }

    #[test]
    fn with_cte_passes() {
        assert!(check("WITH t AS (SELECT 1) SELECT * FROM t").is_ok());
    }

    #[test]
    fn trailing_semicolon_allowed() {
        assert!(check("SELECT 1;").is_ok());
    }

    #[test]
    fn multi_statement_rejected() {
        let err = check("SELECT 1; SELECT 2").unwrap_err();
        assert_eq!(err.kind, lotus_core::LotusErrorKind::MultipleStatements);
    }

    #[test]
    fn insert_rejected() {
        let err = check("INSERT INTO users (id) VALUES (1)").unwrap_err();
        assert_eq!(err.kind, lotus_core::LotusErrorKind::ReadOnlyViolation);
    }

    #[test]
    fn write_keyword_inside_literal_still_rejected() {
        let err = check("SELECT 'please DROP TABLE nothing' AS msg").unwrap_err();
        assert_eq!(err.kind, lotus_core::LotusErrorKind::ReadOnlyViolation);
    }

    #[test]
    fn leading_comment_is_skipped_for_shape_check() {
        assert!(check("-- a comment\nSELECT 1").is_ok());
    }

    #[test]
    fn statement_not_starting_with_allowed_keyword_rejected() {
        let err = check("PRAGMA table_info(users)").unwrap_err();
        assert_eq!(err.kind, lotus_core::LotusErrorKind::ReadOnlyViolation);
    }

    #[test]
    fn explain_and_show_are_allowed_shapes() {
        assert!(check("EXPLAIN SELECT 1").is_ok());
        assert!(check("SHOW search_path").is_ok());
    }
}
