//! Indexer configuration.

use std::path::{Path, PathBuf};

/// Default index file name inside the preferences folder.
pub const INDEX_FILE_NAME: &str = "library_index.json";

/// Which name of a modern library is used to look it up in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchKey {
    /// The library's folder name. Existing indexes rely on this.
    #[default]
    FolderName,
    /// The `name` declared in `library.properties`.
    ManifestName,
}

/// Paths and policies used by [`LibrariesIndexer`](crate::LibrariesIndexer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub preferences_folder: PathBuf,
    pub index_file: PathBuf,
    pub staging_folder: PathBuf,
    /// Root folders scanned for libraries, in scan order.
    pub library_folders: Vec<PathBuf>,
    /// The user's writable libraries folder. Libraries outside it are read-only.
    pub sketchbook_libraries_folder: Option<PathBuf>,
    pub match_key: MatchKey,
}

impl IndexerConfig {
    /// Create a configuration with paths derived from `preferences_folder`.
    ///
    /// - index file: `<preferences>/library_index.json`
    /// - staging folder: `<preferences>/staging/libraries`
    pub fn new(preferences_folder: impl Into<PathBuf>) -> Self {
        let preferences_folder = preferences_folder.into();
        Self {
            index_file: preferences_folder.join(INDEX_FILE_NAME),
            staging_folder: preferences_folder.join("staging").join("libraries"),
            preferences_folder,
            library_folders: Vec::new(),
            sketchbook_libraries_folder: None,
            match_key: MatchKey::default(),
        }
    }

    pub fn with_index_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_file = path.into();
        self
    }

    pub fn with_library_folders(mut self, folders: Vec<PathBuf>) -> Self {
        self.library_folders = folders;
        self
    }

    pub fn with_sketchbook_libraries_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.sketchbook_libraries_folder = Some(folder.into());
        self
    }

    pub fn with_match_key(mut self, match_key: MatchKey) -> Self {
        self.match_key = match_key;
        self
    }

    pub fn preferences_folder(&self) -> &Path {
        &self.preferences_folder
    }
}

/// Platform default preferences folder (`<data dir>/libdepot`).
pub fn default_preferences_folder() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("libdepot"))
}
