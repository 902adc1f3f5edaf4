//! Unified error handling for xrobject
//!
//! Every fallible library operation returns this error. Optional data that is
//! simply absent (no armature, no materials) is never an error; only broken
//! references and I/O failures abort an export.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all xrobject operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Scene snapshot or options file could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ==================== Scene Errors ====================

    /// A node, material or slot reference points outside the snapshot
    #[error("Invalid reference: {reference}")]
    InvalidReference {
        reference: String,
    },

    /// Node with the requested name does not exist
    #[error("Node not found: {name}")]
    NodeNotFound {
        name: String,
    },

    /// Action named by a motion collection is missing from the registry
    #[error("Action not found: {name}")]
    MissingAction {
        name: String,
    },

    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField {
        field: String,
    },

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    // ==================== Chunk Errors ====================

    /// Chunk header or payload runs past the end of the buffer
    #[error("Truncated chunk at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedChunk {
        offset: usize,
        needed: usize,
        available: usize,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        Error::InvalidReference {
            reference: reference.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
        }
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::FileNotFound(_) | Error::NodeNotFound { .. } | Error::MissingAction { .. } => true,
            Error::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error comes from a broken scene snapshot
    pub fn is_structural(&self) -> bool {
        match self {
            Error::InvalidReference { .. }
            | Error::MissingAction { .. }
            | Error::MissingField { .. }
            | Error::InvalidData { .. } => true,
            Error::WithContext { source, .. } => source.is_structural(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_with_context() {
        let err = Error::invalid_reference("node #7");
        let contextualized = err.with_context("while walking scene");

        assert!(contextualized.to_string().contains("while walking scene"));
        assert!(contextualized.to_string().contains("node #7"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NodeNotFound { name: "root".into() }.is_not_found());
        assert!(Error::MissingAction { name: "idle".into() }.is_not_found());
        assert!(!Error::invalid_data("bad").is_not_found());
    }

    #[test]
    fn test_is_structural_through_context() {
        let err = Error::invalid_reference("material #3").with_context("surfaces");
        assert!(err.is_structural());
        assert!(!Error::FileNotFound(PathBuf::from("/x")).is_structural());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::missing_field("mesh"));
        let with_context = result.context("encoding mesh 'Cube'");

        assert!(with_context.is_err());
        assert!(with_context.unwrap_err().to_string().contains("encoding mesh 'Cube'"));
    }
}
