//! Error types for the xform stack library.

use thiserror::Error;

/// Main error type for prim, attribute and transform-op operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No prim lives at the given path
    #[error("Prim not found: {0}")]
    PrimNotFound(String),

    /// Attribute not found by name
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// Attribute already authored with a different type
    #[error("Attribute already exists: {0}")]
    AttributeExists(String),

    /// Stack has no op at the requested position
    #[error("Transform op not found: {0}")]
    OpNotFound(String),

    /// Type mismatch when reading or writing a value
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Host vetoed the edit (locked attribute, read-only layer, routing)
    #[error("Edit not permitted on {attribute}: {reason}")]
    EditNotPermitted { attribute: String, reason: String },

    /// Stage edit target is read-only
    #[error("Stage edit target is read-only")]
    ReadOnly,

    /// Attribute could not be created for a reason other than permissions
    #[error("Failed to create attribute {name}: {reason}")]
    AttributeCreation { name: String, reason: String },

    /// A notification guard was entered while another one was held
    #[error("Nested transform change guard on {path} (held for {held})")]
    NestedGuard { path: String, held: String },

    /// Rotation encoding without a conversion (quaternion orient)
    #[error("Unsupported rotation encoding: {0}")]
    UnsupportedRotation(String),

    /// Attribute name does not follow the xformOp grammar
    #[error("Invalid xformOp name: {0}")]
    InvalidOpName(String),

    /// Settings file could not be parsed or written
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create a type mismatch error.
    pub fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an edit-not-permitted error.
    pub fn not_permitted(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EditNotPermitted {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// True for the host veto class, which factories turn into a refused edit.
    pub fn is_edit_refusal(&self) -> bool {
        matches!(self, Self::EditNotPermitted { .. } | Self::ReadOnly)
    }
}

/// Result type alias for xform stack operations.
pub type Result<T> = std::result::Result<T, Error>;
