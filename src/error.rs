use std::io;
use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Unified error type for the container, trie and provider layers
#[derive(Debug, Error)]
pub enum ArchiveError {
    // Lookup errors (recoverable, often downgraded by the provider)
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    // Container errors
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("Unsupported archive version: {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("Duplicate entry name: {0}")]
    DuplicateEntry(String),

    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    // Configuration errors
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("TOML error: {0}")]
    Toml(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArchiveError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        ArchiveError::CorruptArchive(msg.into())
    }

    /// True for the lookup failures the provider layer converts to empty results
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            ArchiveError::NotFound(_) | ArchiveError::NotADirectory(_)
        )
    }
}

impl From<toml::de::Error> for ArchiveError {
    fn from(err: toml::de::Error) -> Self {
        ArchiveError::Toml(err.to_string())
    }
}

impl From<tempfile::PersistError> for ArchiveError {
    fn from(err: tempfile::PersistError) -> Self {
        ArchiveError::Io(err.error)
    }
}
