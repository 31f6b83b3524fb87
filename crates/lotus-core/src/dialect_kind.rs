use serde::{Deserialize, Serialize};
use std::fmt;

/// The SQL dialect a backend speaks. Drives placeholder syntax, session
/// setup, and preflight strategy; see `lotus-dialect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    Postgres,
    Mysql,
    Sqlite,
    SqlServer,
    Other,
}

impl DialectKind {
    pub fn supports_search_path(self) -> bool {
        matches!(self, DialectKind::Postgres)
    }

    pub fn supports_make_interval(self) -> bool {
        matches!(self, DialectKind::Postgres)
    }

    pub fn supports_arrays(self) -> bool {
        matches!(self, DialectKind::Postgres)
    }

    pub fn supports_json(self) -> bool {
        matches!(self, DialectKind::Postgres | DialectKind::Mysql)
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialectKind::Postgres => "postgres",
            DialectKind::Mysql => "mysql",
            DialectKind::Sqlite => "sqlite",
            DialectKind::SqlServer => "sql_server",
            DialectKind::Other => "other",
        };
        f.write_str(s)
    }
}
