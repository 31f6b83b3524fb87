use std::fmt;

/// Discriminant for a `LotusError`. Kept separate from the message so
/// callers can match on the kind without parsing strings, while the
/// message text itself stays part of the stable external contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotusErrorKind {
    // --- SAFETY LAYER ---
    ReadOnlyViolation,
    MultipleStatements,
    BlockedTable,
    BlockedColumn,

    // --- BIND / TRANSFORM ---
    MissingVariable,
    InvalidValue,

    // --- RESOLUTION ---
    UnknownBackend,

    // --- EXECUTION ---
    Timeout,
    BackendError,
}

/// A Lotus pipeline error: a discriminated kind plus a deterministic
/// message. The exact strings produced by the constructors below are part
/// of the external contract (see the error taxonomy table) and must not be
/// reworded.
#[derive(Debug, Clone, PartialEq)]
pub struct LotusError {
    pub kind: LotusErrorKind,
    pub message: String,
}

impl LotusError {
    pub fn new(kind: LotusErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // --- SAFETY LAYER ERRORS ---

    pub fn read_only_violation() -> Self {
        Self::new(
            LotusErrorKind::ReadOnlyViolation,
            "Only read-only queries are allowed",
        )
    }

    pub fn multiple_statements() -> Self {
        Self::new(
            LotusErrorKind::MultipleStatements,
            "Only a single statement is allowed",
        )
    }

    pub fn blocked_table(relations: &[String]) -> Self {
        Self::new(
            LotusErrorKind::BlockedTable,
            format!("Query touches blocked table(s): {}", relations.join(", ")),
        )
    }

    pub fn blocked_column(column: &str) -> Self {
        Self::new(
            LotusErrorKind::BlockedColumn,
            format!("Column '{column}' is not selectable"),
        )
    }

    // --- BIND / TRANSFORM ERRORS ---

    pub fn missing_variable(name: &str) -> Self {
        Self::new(
            LotusErrorKind::MissingVariable,
            format!("Missing required variable: {name}"),
        )
    }

    pub fn invalid_value(type_name: &str, raw: &str, reason: &str) -> Self {
        Self::new(
            LotusErrorKind::InvalidValue,
            format!("Invalid {type_name} format: '{raw}' ({reason})"),
        )
    }

    // --- RESOLUTION ERRORS ---

    pub fn unknown_backend(name: &str) -> Self {
        Self::new(
            LotusErrorKind::UnknownBackend,
            format!("Data repo '{name}' not configured"),
        )
    }

    // --- EXECUTION ERRORS ---

    pub fn timeout() -> Self {
        Self::new(
            LotusErrorKind::Timeout,
            "SQL error: canceling statement due to user request",
        )
    }

    pub fn backend_error(formatted: impl Into<String>) -> Self {
        Self::new(LotusErrorKind::BackendError, formatted)
    }
}

impl fmt::Display for LotusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for LotusError {}

pub type LotusResult<T> = Result<T, LotusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_stable_taxonomy() {
        assert_eq!(
            LotusError::read_only_violation().message,
            "Only read-only queries are allowed"
        );
        assert_eq!(
            LotusError::multiple_statements().message,
            "Only a single statement is allowed"
        );
        assert_eq!(
            LotusError::blocked_table(&["public.schema_migrations".to_string()]).message,
            "Query touches blocked table(s): public.schema_migrations"
        );
        assert_eq!(
            LotusError::blocked_column("email").message,
            "Column 'email' is not selectable"
        );
        assert_eq!(
            LotusError::missing_variable("id").message,
            "Missing required variable: id"
        );
        assert_eq!(
            LotusError::unknown_backend("warehouse").message,
            "Data repo 'warehouse' not configured"
        );
        assert_eq!(
            LotusError::timeout().message,
            "SQL error: canceling statement due to user request"
        );
    }

    #[test]
    fn kind_is_matchable_independent_of_message() {
        let err = LotusError::blocked_table(&["a.b".to_string()]);
        assert_eq!(err.kind, LotusErrorKind::BlockedTable);
    }
}
