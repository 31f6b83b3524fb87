use lotus_core::VarType;
use lotus_policy::ColumnOrigin;

/// A single column as returned by introspection, before visibility is
/// applied (§4.3). `visibility` is filled in by `apply_visibility` once a
/// `VisibilityEngine` is available.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub native_type: String,
    pub var_type: VarType,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
    pub visibility: Option<String>,
}

impl ColumnInfo {
    pub fn origin(&self, schema: Option<&str>, table: &str) -> ColumnOrigin {
        match schema {
            Some(schema) => ColumnOrigin::scoped(self.name.clone(), schema, table),
            None => ColumnOrigin { name: self.name.clone(), schema: None, table: Some(table.to_string()) },
        }
    }
}

/// Maps a backend's native type name to the nearest `VarType`, per
/// §4.4's casting table. Unknown native types fall back to `Text`.
pub fn var_type_for_native(dialect: lotus_core::DialectKind, native_type: &str) -> VarType {
    let lower = native_type.to_ascii_lowercase();
    use lotus_core::DialectKind::*;
    match dialect {
        Postgres => match lower.as_str() {
            "uuid" => VarType::Uuid,
            "boolean" | "bool" => VarType::Boolean,
            "integer" | "bigint" | "smallint" | "int4" | "int8" | "int2" => VarType::Integer,
            "numeric" | "real" | "double precision" | "decimal" => VarType::Number,
            "date" => VarType::Date,
            "time" | "time without time zone" | "time with time zone" => VarType::Time,
            "timestamp" | "timestamp without time zone" | "timestamp with time zone" | "timestamptz" => {
                VarType::Datetime
            }
            "json" | "jsonb" => VarType::Json,
            s if s.ends_with("[]") => VarType::Array(Box::new(var_type_for_native(
                dialect,
                s.trim_end_matches("[]"),
            ))),
            _ => VarType::Text,
        },
        Mysql => match lower.as_str() {
            "tinyint(1)" => VarType::Boolean,
            "int" | "bigint" | "smallint" | "tinyint" | "mediumint" => VarType::Integer,
            "decimal" | "float" | "double" => VarType::Number,
            "date" => VarType::Date,
            "time" => VarType::Time,
            "datetime" | "timestamp" => VarType::Datetime,
            "json" => VarType::Json,
            _ => VarType::Text,
        },
        Sqlite => match lower.as_str() {
            "integer" | "int" => VarType::Integer,
            "real" | "numeric" | "double" | "float" => VarType::Number,
            _ => VarType::Text,
        },
        _ => VarType::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotus_core::DialectKind;

    #[test]
    fn postgres_uuid_maps_to_uuid() {
        assert_eq!(var_type_for_native(DialectKind::Postgres, "uuid"), VarType::Uuid);
    }

    #[test]
    fn postgres_array_suffix_maps_to_array() {
        assert_eq!(
            var_type_for_native(DialectKind::Postgres, "integer[]"),
            VarType::Array(Box::new(VarType::Integer))
        );
    }

    #[test]
    fn unknown_type_falls_back_to_text() {
        assert_eq!(var_type_for_native(DialectKind::Postgres, "tsvector"), VarType::Text);
    }

    #[test]
    fn sqlite_integer_affinity() {
        assert_eq!(var_type_for_native(DialectKind::Sqlite, "INTEGER"), VarType::Integer);
    }
}
