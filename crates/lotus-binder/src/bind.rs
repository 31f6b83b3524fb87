use crate::cast::cast_value;
use crate::infer::infer_type;
use crate::stages::{remaining_placeholders_in_order, stage_a_wildcards, stage_b_intervals, stage_c_quote_strip, stage_d_substitute};
use lotus_core::{ColumnTypeLookup, DialectKind, LotusError, LotusResult, QuerySpec, VarType, Value};
use lotus_dialect::{placeholder, PlaceholderType};
use std::collections::HashMap;

/// Result of binding a `QuerySpec` against caller-supplied variable
/// values: the fully transformed SQL (dialect-native placeholders, no
/// `{{name}}` left) plus the positional parameter list in placeholder
/// order (§4.4).
#[derive(Debug, Clone)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Bind `spec` against `inputs` (raw JSON values keyed by variable name)
/// for `dialect`, consulting `lookup` for types left undeclared. Runs
/// the full C4 pipeline: wildcard rewriting, interval rewriting, quote
/// stripping, type resolution, value casting, and placeholder
/// substitution, in that order.
pub fn bind(
    spec: &QuerySpec,
    inputs: &HashMap<String, serde_json::Value>,
    dialect: DialectKind,
    lookup: &dyn ColumnTypeLookup,
) -> LotusResult<BoundQuery> {
    let original = spec.statement.as_str();

    let transformed = stage_a_wildcards(original, dialect);
    let transformed = stage_b_intervals(&transformed, dialect);
    let transformed = stage_c_quote_strip(&transformed);

    let order = remaining_placeholders_in_order(&transformed);

    let mut params = Vec::with_capacity(order.len());
    let mut slot_of: HashMap<String, (usize, VarType)> = HashMap::new();

    for name in &order {
        let var_spec = spec.variable(name);
        let raw = resolve_raw_value(name, var_spec, inputs)?;
        let var_type = var_spec
            .map(|v| v.var_type.clone())
            .or_else(|| infer_type(original, name, lookup))
            .unwrap_or(VarType::Text);
        let value = cast_value(&var_type, &raw)?;
        let index = params.len() + 1;
        slot_of.insert(name.clone(), (index, var_type));
        params.push(value);
    }

    let sql = stage_d_substitute(&transformed, |name| {
        let (index, var_type) = slot_of
            .get(name)
            .expect("every remaining placeholder was assigned a slot above");
        placeholder(dialect, *index, PlaceholderType::from_var_type(var_type))
    });

    Ok(BoundQuery { sql, params })
}

fn resolve_raw_value(
    name: &str,
    var_spec: Option<&lotus_core::VariableSpec>,
    inputs: &HashMap<String, serde_json::Value>,
) -> LotusResult<serde_json::Value> {
    if let Some(value) = inputs.get(name) {
        return Ok(value.clone());
    }
    if let Some(spec) = var_spec {
        if let Some(default) = &spec.default {
            return Ok(default.clone());
        }
    }
    Err(LotusError::missing_variable(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotus_core::NoColumnTypes;
    use serde_json::json;

    fn spec(statement: &str, vars: Vec<lotus_core::VariableSpec>) -> QuerySpec {
        QuerySpec {
            statement: statement.to_string(),
            variables: vars,
            data_repo: "primary".to_string(),
            search_path: None,
        }
    }

    #[test]
    fn binds_simple_equality() {
        let q = spec(
            "SELECT id FROM users WHERE id = {{id}}",
            vec![lotus_core::VariableSpec::new("id", VarType::Integer)],
        );
        let mut inputs = HashMap::new();
        inputs.insert("id".to_string(), json!(7));
        let bound = bind(&q, &inputs, DialectKind::Postgres, &NoColumnTypes).unwrap();
        assert_eq!(bound.sql, "SELECT id FROM users WHERE id = $1::integer");
        assert_eq!(bound.params, vec![Value::Integer(7)]);
    }

    #[test]
    fn reused_variable_gets_one_slot() {
        let q = spec(
            "WHERE a = {{id}} OR b = {{id}}",
            vec![lotus_core::VariableSpec::new("id", VarType::Integer)],
        );
        let mut inputs = HashMap::new();
        inputs.insert("id".to_string(), json!(1));
        let bound = bind(&q, &inputs, DialectKind::Postgres, &NoColumnTypes).unwrap();
        assert_eq!(bound.sql, "WHERE a = $1::integer OR b = $1::integer");
        assert_eq!(bound.params.len(), 1);
    }

    #[test]
    fn wildcard_search_binds_through_stage_a() {
        let q = spec(
            "SELECT id FROM u WHERE name LIKE '%{{q}}%'",
            vec![lotus_core::VariableSpec::new("q", VarType::Text)],
        );
        let mut inputs = HashMap::new();
        inputs.insert("q".to_string(), json!("ann"));
        let bound = bind(&q, &inputs, DialectKind::Postgres, &NoColumnTypes).unwrap();
        assert_eq!(bound.sql, "SELECT id FROM u WHERE name LIKE '%' || $1 || '%'");
        assert_eq!(bound.params, vec![Value::Text("ann".into())]);
    }

    #[test]
    fn missing_required_variable_errors() {
        let q = spec(
            "WHERE id = {{id}}",
            vec![lotus_core::VariableSpec::new("id", VarType::Integer)],
        );
        let err = bind(&q, &HashMap::new(), DialectKind::Postgres, &NoColumnTypes).unwrap_err();
        assert_eq!(err.kind, lotus_core::LotusErrorKind::MissingVariable);
    }

    #[test]
    fn default_value_used_when_input_absent() {
        let q = spec(
            "WHERE active = {{active}}",
            vec![lotus_core::VariableSpec::new("active", VarType::Boolean).with_default(json!(true))],
        );
        let bound = bind(&q, &HashMap::new(), DialectKind::Postgres, &NoColumnTypes).unwrap();
        assert_eq!(bound.params, vec![Value::Boolean(true)]);
    }

    #[test]
    fn undeclared_variable_falls_back_to_inferred_or_text() {
        let q = spec("WHERE note = {{n}}", vec![]);
        let mut inputs = HashMap::new();
        inputs.insert("n".to_string(), json!("hi"));
        let bound = bind(&q, &inputs, DialectKind::Postgres, &NoColumnTypes).unwrap();
        assert_eq!(bound.params, vec![Value::Text("hi".into())]);
    }

    #[test]
    fn interval_pipeline_feeds_into_placeholder_substitution() {
        let q = spec(
            "SELECT NOW() - INTERVAL '{{d}} days'",
            vec![lotus_core::VariableSpec::new("d", VarType::Integer)],
        );
        let mut inputs = HashMap::new();
        inputs.insert("d".to_string(), json!(3));
        let bound = bind(&q, &inputs, DialectKind::Postgres, &NoColumnTypes).unwrap();
        assert_eq!(bound.sql, "SELECT NOW() - make_interval(days => $1::integer)");
    }
}
