use thiserror::Error;

/// Error types for M2 model loading
///
/// Loading never panics on asset data: every malformed reference ends up as
/// one of these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A record or array extends past the end of its buffer
    #[error("Truncated {what}: needs {needed} bytes, buffer holds {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// Invalid magic number in a file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Header version outside of what this runtime understands
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),

    /// An index or value that cannot be valid for the model
    #[error("Corrupt model data: {0}")]
    CorruptModelData(String),

    /// A `.skin` or `.anim` companion file is absent
    #[error("Missing companion file: {0}")]
    MissingCompanionFile(String),
}

impl LoadError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptModelData(message.into())
    }
}

/// Result type using LoadError
pub type Result<T> = std::result::Result<T, LoadError>;
