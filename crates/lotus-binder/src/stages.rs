use lotus_core::DialectKind;
use once_cell::sync::Lazy;
use regex::Regex;

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";

fn placeholder_pattern() -> String {
    format!(r"\{{\{{({IDENT})\}}\}}")
}

/// Stage A — wildcard rewriting (§4.4). Must run before Stage C so that
/// wildcard literals never get mistaken for plain quoted placeholders.
pub fn stage_a_wildcards(sql: &str, dialect: DialectKind) -> String {
    static BOTH: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"'%\{{\{{({IDENT})\}}\}}%'")).unwrap());
    static PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"'%\{{\{{({IDENT})\}}\}}'")).unwrap());
    static SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"'\{{\{{({IDENT})\}}\}}%'")).unwrap());

    let sql = BOTH.replace_all(sql, |caps: &regex::Captures| {
        let var = &caps[1];
        match dialect {
            DialectKind::Mysql => format!("CONCAT('%', {{{{{var}}}}}, '%')"),
            _ => format!("'%' || {{{{{var}}}}} || '%'"),
        }
    });
    let sql = PREFIX.replace_all(&sql, |caps: &regex::Captures| {
        let var = &caps[1];
        match dialect {
            DialectKind::Mysql => format!("CONCAT('%', {{{{{var}}}}})"),
            _ => format!("'%' || {{{{{var}}}}}"),
        }
    });
    let sql = SUFFIX.replace_all(&sql, |caps: &regex::Captures| {
        let var = &caps[1];
        match dialect {
            DialectKind::Mysql => format!("CONCAT({{{{{var}}}}}, '%')"),
            _ => format!("{{{{{var}}}}} || '%'"),
        }
    });
    sql.into_owned()
}

const INTERVAL_UNITS: &[&str] = &["days", "hours", "minutes", "seconds", "months", "years", "weeks"];

/// Stage B — PostgreSQL interval rewriting (§4.4), a no-op on other
/// dialects. Order matters: the two-variable and fixed-number forms must
/// be tried before the single-variable-plus-known-unit form, since both
/// share the `INTERVAL '...'` shape.
pub fn stage_b_intervals(sql: &str, dialect: DialectKind) -> String {
    if dialect != DialectKind::Postgres {
        return sql.to_string();
    }

    static TWO_VAR: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"(?i)INTERVAL\s+'\{{\{{({IDENT})\}}\}}\s+\{{\{{({IDENT})\}}\}}'")).unwrap());
    static FIXED_NUM: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"(?i)INTERVAL\s+'(\d+)\s+\{{\{{({IDENT})\}}\}}'")).unwrap());
    static KNOWN_UNIT: Lazy<Regex> = Lazy::new(|| {
        let units = INTERVAL_UNITS.join("|");
        Regex::new(&format!(r"(?i)INTERVAL\s+'\{{\{{({IDENT})\}}\}}\s+({units})'")).unwrap()
    });
    static BARE_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"(?i)INTERVAL\s+\{{\{{({IDENT})\}}\}}(?:\s|$|[^'{{])")).unwrap());

    let sql = TWO_VAR.replace_all(sql, |caps: &regex::Captures| {
        let a = &caps[1];
        let b = &caps[2];
        format!("((CAST({{{{{a}}}}} AS text) || ' ' || {{{{{b}}}}})::interval)")
    });
    let sql = FIXED_NUM.replace_all(&sql, |caps: &regex::Captures| {
        let n = &caps[1];
        let unit = &caps[2];
        format!("(('{n} ' || {{{{{unit}}}}})::interval)")
    });
    let sql = KNOWN_UNIT.replace_all(&sql, |caps: &regex::Captures| {
        let var = &caps[1];
        let unit = caps[2].to_lowercase();
        format!("make_interval({unit} => {{{{{var}}}}})")
    });
    let sql = BARE_VAR.replace_all(&sql, |caps: &regex::Captures| {
        let var = &caps[1];
        let trailing = caps.get(0).unwrap().as_str().chars().last().unwrap();
        if trailing.is_whitespace() || trailing == '{' {
            format!("({{{{{var}}}}}::text)::interval{trailing}")
        } else {
            format!("({{{{{var}}}}}::text)::interval")
        }
    });
    sql.into_owned()
}

/// Stage C — safe quote stripping (§4.4). Drops quotes around any
/// remaining `'{{v}}'` not already consumed by Stage A, preserving an
/// optional trailing `::type` cast.
pub fn stage_c_quote_strip(sql: &str) -> String {
    static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"'\{{\{{({IDENT})\}}\}}'(::\w+)?")).unwrap());
    QUOTED
        .replace_all(sql, |caps: &regex::Captures| {
            let var = &caps[1];
            let cast = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            format!("{{{{{var}}}}}{cast}")
        })
        .into_owned()
}

/// All remaining `{{name}}` placeholders in the statement, left to right,
/// in order of *first* occurrence (duplicates collapse to one entry).
pub fn remaining_placeholders_in_order(sql: &str) -> Vec<String> {
    static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(&placeholder_pattern()).unwrap());
    let mut seen = Vec::new();
    for caps in PLACEHOLDER.captures_iter(sql) {
        let name = caps[1].to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Stage D — placeholder substitution. Replaces every occurrence of
/// `{{name}}` with `replacement_for(name)`; multiple references to the
/// same variable get the same replacement text (one positional slot).
pub fn stage_d_substitute(sql: &str, replacement_for: impl Fn(&str) -> String) -> String {
    static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(&placeholder_pattern()).unwrap());
    PLACEHOLDER
        .replace_all(sql, |caps: &regex::Captures| replacement_for(&caps[1]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_both_sides_postgres() {
        let out = stage_a_wildcards("name LIKE '%{{q}}%'", DialectKind::Postgres);
        assert_eq!(out, "name LIKE '%' || {{q}} || '%'");
    }

    #[test]
    fn wildcard_both_sides_mysql_uses_concat() {
        let out = stage_a_wildcards("name LIKE '%{{q}}%'", DialectKind::Mysql);
        assert_eq!(out, "name LIKE CONCAT('%', {{q}}, '%')");
    }

    #[test]
    fn wildcard_prefix_only() {
        let out = stage_a_wildcards("name LIKE '%{{q}}'", DialectKind::Postgres);
        assert_eq!(out, "name LIKE '%' || {{q}}");
    }

    #[test]
    fn wildcard_suffix_only() {
        let out = stage_a_wildcards("name LIKE '{{q}}%'", DialectKind::Postgres);
        assert_eq!(out, "name LIKE {{q}} || '%'");
    }

    #[test]
    fn interval_known_unit() {
        let out = stage_b_intervals("t > NOW() - INTERVAL '{{d}} days'", DialectKind::Postgres);
        assert_eq!(out, "t > NOW() - make_interval(days => {{d}})");
    }

    #[test]
    fn interval_two_variables() {
        let out = stage_b_intervals("INTERVAL '{{a}} {{b}}'", DialectKind::Postgres);
        assert_eq!(out, "((CAST({{a}} AS text) || ' ' || {{b}})::interval)");
    }

    #[test]
    fn interval_fixed_number_variable_unit() {
        let out = stage_b_intervals("INTERVAL '7 {{unit}}'", DialectKind::Postgres);
        assert_eq!(out, "(('7 ' || {{unit}})::interval)");
    }

    #[test]
    fn interval_bare_variable() {
        let out = stage_b_intervals("INTERVAL {{v}}", DialectKind::Postgres);
        assert_eq!(out, "({{v}}::text)::interval");
    }

    #[test]
    fn interval_noop_on_mysql() {
        let sql = "INTERVAL '{{d}} days'";
        assert_eq!(stage_b_intervals(sql, DialectKind::Mysql), sql);
    }

    #[test]
    fn quote_strip_preserves_cast() {
        let out = stage_c_quote_strip("WHERE created = '{{d}}'::date");
        assert_eq!(out, "WHERE created = {{d}}::date");
    }

    #[test]
    fn quote_strip_plain() {
        let out = stage_c_quote_strip("WHERE id = '{{id}}'");
        assert_eq!(out, "WHERE id = {{id}}");
    }

    #[test]
    fn remaining_placeholders_dedup_and_preserve_order() {
        let names = remaining_placeholders_in_order("{{b}} = {{a}} OR {{b}} = {{c}}");
        assert_eq!(names, vec!["b".to_string(), "a".to_string(), "c".to_string()]);
    }

    #[test]
    fn stage_d_replaces_same_variable_with_same_text() {
        let out = stage_d_substitute("{{id}} = {{id}}", |name| format!("<{name}>"));
        assert_eq!(out, "<id> = <id>");
    }
}
