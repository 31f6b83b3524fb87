//! The visibility engine (C2): pure evaluation of schema/table/column
//! rules, and the result post-processor (C9) that applies the resolved
//! column policy to rows before they leave the pipeline.

pub mod postprocess;
pub mod visibility;

pub use postprocess::{apply_column_policy, is_sha256_hex, ColumnOrigin};
pub use visibility::{TableDecision, VisibilityEngine};
