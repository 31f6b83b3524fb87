use crate::visibility::VisibilityEngine;
use lotus_config::{ColumnAction, MaskStrategy};
use lotus_core::{LotusError, LotusResult, QueryResult, Value};
use sha2::{Digest, Sha256};

/// Where a result column came from, as attributed by the runner from
/// preflight-discovered relations (§4.9: "look up the effective column
/// policy using the touched relations stashed by C6"). `None` when the
/// origin can't be determined (a computed expression, an aggregate).
#[derive(Debug, Clone)]
pub struct ColumnOrigin {
    pub name: String,
    pub schema: Option<String>,
    pub table: Option<String>,
}

impl ColumnOrigin {
    pub fn unscoped(name: impl Into<String>) -> Self {
        Self { name: name.into(), schema: None, table: None }
    }

    pub fn scoped(name: impl Into<String>, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self { name: name.into(), schema: Some(schema.into()), table: Some(table.into()) }
    }
}

/// Apply column policy (omit / mask / error) to a raw result, in place,
/// left to right (§4.9). `error` aborts before any row is returned.
pub fn apply_column_policy(
    engine: &VisibilityEngine<'_>,
    origins: &[ColumnOrigin],
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
) -> LotusResult<(Vec<String>, Vec<Vec<Value>>)> {
    let actions: Vec<ColumnAction> = origins
        .iter()
        .map(|origin| engine.column_action_opt(origin.schema.as_deref(), origin.table.as_deref(), &origin.name))
        .collect();

    for (origin, action) in origins.iter().zip(actions.iter()) {
        if matches!(action, ColumnAction::Error) {
            return Err(LotusError::blocked_column(&origin.name));
        }
    }

    let keep: Vec<usize> = actions
        .iter()
        .enumerate()
        .filter(|(_, action)| !matches!(action, ColumnAction::Omit))
        .map(|(i, _)| i)
        .collect();

    let out_columns: Vec<String> = keep.iter().map(|&i| columns[i].clone()).collect();
    let out_rows: Vec<Vec<Value>> = rows
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&i| apply_mask(&actions[i], &row[i]))
                .collect()
        })
        .collect();

    Ok((out_columns, out_rows))
}

fn apply_mask(action: &ColumnAction, value: &Value) -> Value {
    match action {
        ColumnAction::Allow | ColumnAction::Omit | ColumnAction::Error => value.clone(),
        ColumnAction::Mask { strategy } => mask_value(strategy, value),
    }
}

fn mask_value(strategy: &MaskStrategy, value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match strategy {
        MaskStrategy::Null => Value::Null,
        MaskStrategy::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(value.as_hashable_string().as_bytes());
            Value::Text(hex_lower(&hasher.finalize()))
        }
        MaskStrategy::Fixed(v) => Value::Text(v.clone()),
        MaskStrategy::Partial { keep_first, keep_last, replacement } => {
            Value::Text(mask_partial(&value.as_hashable_string(), *keep_first, *keep_last, replacement))
        }
    }
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn mask_partial(source: &str, keep_first: usize, keep_last: usize, replacement: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();
    if keep_first + keep_last >= len {
        return source.to_string();
    }
    let prefix: String = chars[..keep_first].iter().collect();
    let suffix: String = chars[len - keep_last..].iter().collect();
    let middle_len = len - keep_first - keep_last;
    let filler = if replacement.is_empty() { "*".to_string() } else { replacement.repeat(middle_len) };
    let filler: String = filler.chars().take(middle_len).collect();
    format!("{prefix}{filler}{suffix}")
}

/// Normalize export-oriented `QueryResult` (CSV/JSON/JSONL handled by
/// `lotus_core::result`; this just guarantees the invariant that masked
/// sha256 output is exactly 64 lowercase hex chars, used in tests).
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotus_config::{ColumnPolicyIndex, ColumnRule, RuleBundle};
    use lotus_core::DialectKind;

    fn engine_with_rules(rules: Vec<ColumnRule>) -> (RuleBundle, ColumnPolicyIndex) {
        let index = ColumnPolicyIndex::build(&rules);
        (RuleBundle::default(), index)
    }

    #[test]
    fn omit_removes_column_and_values() {
        let (bundle, index) = engine_with_rules(vec![ColumnRule {
            schema: None,
            table: Some("users".into()),
            column: "ssn".into(),
            action: ColumnAction::Omit,
            show_in_schema: None,
        }]);
        let engine = VisibilityEngine::new(DialectKind::Postgres, &bundle, &index);
        let origins = vec![
            ColumnOrigin::scoped("id", "public", "users"),
            ColumnOrigin::scoped("ssn", "public", "users"),
        ];
        let columns = vec!["id".to_string(), "ssn".to_string()];
        let rows = vec![vec![Value::Integer(1), Value::Text("123-45-6789".into())]];
        let (out_cols, out_rows) = apply_column_policy(&engine, &origins, columns, rows).unwrap();
        assert_eq!(out_cols, vec!["id".to_string()]);
        assert_eq!(out_rows[0].len(), 1);
    }

    #[test]
    fn sha256_mask_is_64_lowercase_hex() {
        let (bundle, index) = engine_with_rules(vec![ColumnRule {
            schema: None,
            table: Some("users".into()),
            column: "email".into(),
            action: ColumnAction::Mask { strategy: MaskStrategy::Sha256 },
            show_in_schema: None,
        }]);
        let engine = VisibilityEngine::new(DialectKind::Postgres, &bundle, &index);
        let origins = vec![ColumnOrigin::scoped("email", "public", "users")];
        let columns = vec!["email".to_string()];
        let rows = vec![vec![Value::Text("ann@example.com".into())]];
        let (_, out_rows) = apply_column_policy(&engine, &origins, columns, rows).unwrap();
        let masked = out_rows[0][0].as_display_string();
        assert!(is_sha256_hex(&masked));
    }

    #[test]
    fn partial_mask_keeps_only_last_n_chars() {
        let masked = mask_partial("ann@example.com", 0, 4, "*");
        assert!(masked.ends_with(".com"));
        assert_eq!(masked.len(), "ann@example.com".len());
        assert!(!masked.starts_with("ann"));
    }

    #[test]
    fn error_policy_aborts_before_returning_rows() {
        let (bundle, index) = engine_with_rules(vec![ColumnRule {
            schema: None,
            table: Some("users".into()),
            column: "password_hash".into(),
            action: ColumnAction::Error,
            show_in_schema: None,
        }]);
        let engine = VisibilityEngine::new(DialectKind::Postgres, &bundle, &index);
        let origins = vec![ColumnOrigin::scoped("password_hash", "public", "users")];
        let columns = vec!["password_hash".to_string()];
        let rows = vec![vec![Value::Text("hash".into())]];
        let result = apply_column_policy(&engine, &origins, columns, rows);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().message, "Column 'password_hash' is not selectable");
    }

    #[test]
    fn null_value_stays_null_through_masking() {
        let (bundle, index) = engine_with_rules(vec![ColumnRule {
            schema: None,
            table: Some("users".into()),
            column: "email".into(),
            action: ColumnAction::Mask { strategy: MaskStrategy::Sha256 },
            show_in_schema: None,
        }]);
        let engine = VisibilityEngine::new(DialectKind::Postgres, &bundle, &index);
        let origins = vec![ColumnOrigin::scoped("email", "public", "users")];
        let columns = vec!["email".to_string()];
        let rows = vec![vec![Value::Null]];
        let (_, out_rows) = apply_column_policy(&engine, &origins, columns, rows).unwrap();
        assert!(out_rows[0][0].is_null());
    }
}
