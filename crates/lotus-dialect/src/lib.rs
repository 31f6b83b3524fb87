//! Per-dialect primitives (C1): placeholder syntax, session snapshot and
//! restore, driver error formatting, and feature probes. No policy or
//! binding logic lives here — this crate only knows how to talk to one
//! backend's particular SQL dialect.

pub mod error_format;
pub mod features;
pub mod placeholder;
pub mod session;

pub use error_format::format_driver_error;
pub use features::{supports, Feature};
pub use placeholder::{placeholder, PlaceholderType};
pub use session::{scoped_read_only, BackendConnection, SessionOptions};
