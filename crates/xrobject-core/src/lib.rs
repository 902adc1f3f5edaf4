//! xrobject Core Library
//!
//! This crate provides the scene snapshot model and the error type
//! shared across all xrobject components.

pub mod error;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
