use lotus_core::{ColumnTypeLookup, VarType};
use once_cell::sync::Lazy;
use regex::Regex;

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_.]*";

/// Scan the (still-templated) statement for `column = {{v}}`,
/// `column IN ({{v}})` and `column > {{v}}`-shaped comparisons, so a
/// variable with no declared type can still get one from the schema
/// cache (§4.4, "Type inference").
///
/// Returns the first inferred type found for `var_name`, looking the
/// matched column up against `lookup` with the schema/table split out of
/// a dotted `schema.table.column` or `table.column` reference when
/// present.
pub fn infer_type(sql: &str, var_name: &str, lookup: &dyn ColumnTypeLookup) -> Option<VarType> {
    static COMPARISON: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(
            r"(?i)({IDENT})\s*(?:=|>|<|>=|<=|<>|!=|\bIN\s*\(\s*)\{{\{{([A-Za-z_][A-Za-z0-9_]*)\}}\}}"
        ))
        .unwrap()
    });

    for caps in COMPARISON.captures_iter(sql) {
        if &caps[2] == var_name {
            let (schema, table, column) = split_column_ref(&caps[1]);
            if let Some(ty) = lookup.column_type(schema, table, column) {
                return Some(ty);
            }
        }
    }
    None
}

fn split_column_ref(reference: &str) -> (Option<&str>, Option<&str>, &str) {
    let parts: Vec<&str> = reference.split('.').collect();
    match parts.as_slice() {
        [column] => (None, None, column),
        [table, column] => (None, Some(table), column),
        [schema, table, column] => (Some(schema), Some(table), column),
        _ => (None, None, reference),
    }
}
