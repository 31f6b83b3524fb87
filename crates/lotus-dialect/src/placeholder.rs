use lotus_core::{DialectKind, VarType};

/// A type annotation hint for placeholder generation, distinct from
/// `VarType` because it's post-inference: the concrete SQL type a value
/// will be cast to, not the caller-declared or inferred variable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderType {
    Text,
    Integer,
    Numeric,
    Date,
    Timestamp,
    Time,
    Boolean,
    Jsonb,
    Uuid,
}

impl PlaceholderType {
    pub fn from_var_type(var_type: &VarType) -> Self {
        match var_type {
            VarType::Text => PlaceholderType::Text,
            VarType::Number => PlaceholderType::Numeric,
            VarType::Integer => PlaceholderType::Integer,
            VarType::Date => PlaceholderType::Date,
            VarType::Datetime => PlaceholderType::Timestamp,
            VarType::Time => PlaceholderType::Time,
            VarType::Boolean => PlaceholderType::Boolean,
            VarType::Json => PlaceholderType::Jsonb,
            VarType::Uuid => PlaceholderType::Uuid,
            VarType::Array(inner) => Self::from_var_type(inner),
        }
    }
}

/// `placeholder(index, name, type) → string` from §4.1, one impl per
/// dialect. `index` is 1-based, matching SQL's own `$1`/`?` conventions.
pub fn placeholder(dialect: DialectKind, index: usize, ty: PlaceholderType) -> String {
    match dialect {
        DialectKind::Postgres => postgres_placeholder(index, ty),
        DialectKind::Mysql => mysql_placeholder(ty),
        DialectKind::Sqlite | DialectKind::SqlServer | DialectKind::Other => "?".to_string(),
    }
}

fn postgres_placeholder(index: usize, ty: PlaceholderType) -> String {
    let cast = match ty {
        PlaceholderType::Text => "",
        PlaceholderType::Integer => "::integer",
        PlaceholderType::Numeric => "::numeric",
        PlaceholderType::Date => "::date",
        PlaceholderType::Timestamp => "::timestamp",
        PlaceholderType::Time => "::time",
        PlaceholderType::Boolean => "::boolean",
        PlaceholderType::Jsonb => "::jsonb",
        PlaceholderType::Uuid => "::uuid",
    };
    format!("${index}{cast}")
}

fn mysql_placeholder(ty: PlaceholderType) -> String {
    let sql_type = match ty {
        PlaceholderType::Text => return "?".to_string(),
        PlaceholderType::Integer => "SIGNED",
        PlaceholderType::Numeric => "DECIMAL",
        PlaceholderType::Date => "DATE",
        PlaceholderType::Timestamp => "DATETIME",
        PlaceholderType::Time => "TIME",
        PlaceholderType::Boolean => "UNSIGNED",
        PlaceholderType::Jsonb => "JSON",
        PlaceholderType::Uuid => return "?".to_string(),
    };
    format!("CAST(? AS {sql_type})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_untyped_is_bare_dollar_n() {
        assert_eq!(placeholder(DialectKind::Postgres, 1, PlaceholderType::Text), "$1");
    }

    #[test]
    fn postgres_typed_adds_cast() {
        assert_eq!(
            placeholder(DialectKind::Postgres, 3, PlaceholderType::Integer),
            "$3::integer"
        );
        assert_eq!(
            placeholder(DialectKind::Postgres, 1, PlaceholderType::Jsonb),
            "$1::jsonb"
        );
    }

    #[test]
    fn mysql_typed_wraps_in_cast() {
        assert_eq!(
            placeholder(DialectKind::Mysql, 1, PlaceholderType::Date),
            "CAST(? AS DATE)"
        );
    }

    #[test]
    fn mysql_untyped_is_bare_question_mark() {
        assert_eq!(placeholder(DialectKind::Mysql, 1, PlaceholderType::Text), "?");
    }

    #[test]
    fn sqlite_is_always_bare_question_mark() {
        assert_eq!(placeholder(DialectKind::Sqlite, 5, PlaceholderType::Jsonb), "?");
    }
}
