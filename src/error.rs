//! Error types for index loading, manifest parsing and rescans.

use std::path::PathBuf;

/// Errors surfaced by [`LibrariesIndexer`](crate::LibrariesIndexer) operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    /// The index file exists but does not decode into the expected schema.
    #[error("Malformed library index {path:?}: {source}")]
    MalformedIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The index file could not be read.
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rescan was requested before any index was loaded.
    #[error("Library index has not been loaded")]
    NotInitialized,
}

impl IndexerError {
    /// Returns true if this error came from the index decoder.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedIndex { .. })
    }
}

pub type IndexerResult<T> = std::result::Result<T, IndexerError>;

/// Reasons a folder with a `library.properties` file is not a usable library.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing '{0}' from library")]
    MissingProperty(&'static str),

    #[error("Library can't use both 'src' and 'utility' folders.")]
    SrcAndUtility,

    #[error("Library can't use 'arch' folder.")]
    ArchFolder,
}
