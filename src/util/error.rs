//! Error types for stagebind.

use thiserror::Error;

use super::Path;

/// Main error type for scene and sample operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Prim or attribute does not exist.
    ///
    /// Reads report absence as `Ok(None)`; this variant is used where a
    /// caller explicitly asked for something that must exist.
    #[error("Not found: {0}")]
    NotFound(Path),

    /// Stored value shape or type does not match the sample field.
    #[error("Schema mismatch on '{attribute}': expected {expected}, got {actual}")]
    SchemaMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Bulk read consumer waited past the bound without progress.
    #[error("Timed out after {waited_ms}ms waiting for reads ({pending} pending)")]
    Timeout { waited_ms: u64, pending: usize },

    /// Operation attempted after the scene was closed.
    #[error("Scene handle is closed")]
    HandleClosed,

    /// Backing store reported an unrecoverable condition.
    #[error("Backing store failure: {0}")]
    BackingStore(String),

    /// Malformed path text.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Argument outside its valid range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scene document could not be encoded or decoded.
    #[error("Scene document error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a backing store error from a message.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::BackingStore(msg.into())
    }

    /// Create a schema mismatch error.
    pub fn mismatch(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether this error aborts the operation, as opposed to signalling
    /// missing or partial data.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::SchemaMismatch { .. })
    }
}

/// Result type alias for stagebind operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::Timeout { waited_ms: 1000, pending: 3 };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("3 pending"));

        let e = Error::mismatch("primvars:st", "float2[]", "float3[]");
        assert!(e.to_string().contains("primvars:st"));
        assert!(e.to_string().contains("float3[]"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::HandleClosed.is_fatal());
        assert!(Error::store("disk gone").is_fatal());
        assert!(Error::Timeout { waited_ms: 1, pending: 1 }.is_fatal());
        assert!(!Error::mismatch("a", "int", "float").is_fatal());
        assert!(!Error::NotFound(Path::root()).is_fatal());
    }
}
