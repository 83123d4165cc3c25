//! Utility types shared across the crate.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`Path`] - Hierarchical prim paths
//! - [`init_logging`] - Tracing subscriber setup

mod error;
mod path;
mod logging;

pub use error::*;
pub use path::*;
pub use logging::*;
