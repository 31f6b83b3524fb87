//! Variable binding and SQL transformation (C4): rewrites a caller's
//! templated `QuerySpec` into dialect-native SQL with positional
//! parameters, per the ordered stage pipeline in §4.4. This is the
//! crate where most of a query's user-facing string gets rewritten, so
//! every stage is pure and independently testable in `stages`.

pub mod bind;
pub mod cast;
pub mod infer;
pub mod stages;

pub use bind::{bind, BoundQuery};
pub use cast::cast_value;
pub use infer::infer_type;
