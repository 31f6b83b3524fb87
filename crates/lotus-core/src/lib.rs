//! Shared domain types for Lotus: values, variables, results, dialect kind,
//! and the stable error taxonomy. Every other crate in the workspace depends
//! on this one; it depends on nothing in the workspace itself.

pub mod dialect_kind;
pub mod error;
pub mod result;
pub mod value;
pub mod var;

pub use dialect_kind::DialectKind;
pub use error::{LotusError, LotusErrorKind, LotusResult};
pub use result::{QueryResult, Window};
pub use value::Value;
pub use var::{QuerySpec, VarType, VariableSpec, Widget};

/// Consulted by the binder (C4) for automatic type inference from the
/// schema cache (C3). Defined here, rather than in either crate, so
/// neither needs to depend on the other — `lotus-schema` implements it,
/// `lotus-binder` only requires it.
pub trait ColumnTypeLookup {
    fn column_type(&self, schema: Option<&str>, table: Option<&str>, column: &str) -> Option<VarType>;
}

/// A lookup that never finds anything — the default when no schema cache
/// is wired in; binder falls back to declared/`text` types.
pub struct NoColumnTypes;

impl ColumnTypeLookup for NoColumnTypes {
    fn column_type(&self, _schema: Option<&str>, _table: Option<&str>, _column: &str) -> Option<VarType> {
        None
    }
}
