//! The libraries indexer: owns the loaded index, the configured folders and
//! the installed view derived from them.
//!
//! Typical lifecycle:
//!
//! ```ignore
//! let config = IndexerConfig::new(prefs).with_sketchbook_libraries_folder(sketchbook);
//! let mut indexer = LibrariesIndexer::new(config);
//! indexer.load_index()?;
//! indexer.set_library_folders(vec![bundled, sketchbook])?;
//!
//! for lib in indexer.entries()? {
//!     println!("{} {} installed={}", lib.entry.name, lib.entry.version, lib.is_installed());
//! }
//! ```

use crate::config::IndexerConfig;
use crate::error::{IndexerError, IndexerResult};
use crate::index::{load_index, IndexDocument, IndexEntry, LibraryKey};
use crate::library::InstalledSet;
use crate::registry::{InstallStatus, InstallStatusTable, Reconciler};
use crate::warnings::{MessageSink, ScanWarning, TracingSink};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An index entry together with its install state.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedLibrary<'a> {
    pub entry: &'a IndexEntry,
    pub status: Option<&'a InstallStatus>,
}

impl IndexedLibrary<'_> {
    pub fn is_installed(&self) -> bool {
        self.status.is_some()
    }

    pub fn installed_folder(&self) -> Option<&Path> {
        self.status.map(|s| s.folder.as_path())
    }

    /// Read-only flag of the installed copy. Not-installed entries are writable.
    pub fn is_read_only(&self) -> bool {
        self.status.is_some_and(|s| s.read_only)
    }
}

/// Loads the library index and keeps it reconciled with installed libraries.
pub struct LibrariesIndexer {
    config: IndexerConfig,
    sink: Arc<dyn MessageSink>,
    index: Option<IndexDocument>,
    loaded_at: Option<DateTime<Local>>,
    installed: InstalledSet,
    status: InstallStatusTable,
    warnings: Vec<ScanWarning>,
}

impl LibrariesIndexer {
    /// Create an indexer that reports scan warnings to the `tracing` log.
    pub fn new(config: IndexerConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: IndexerConfig, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            config,
            sink,
            index: None,
            loaded_at: None,
            installed: InstalledSet::new(),
            status: InstallStatusTable::new(),
            warnings: Vec::new(),
        }
    }

    /// Load the configured index file and group it into categories.
    ///
    /// On failure the previously loaded index, if any, stays in place.
    pub fn load_index(&mut self) -> IndexerResult<()> {
        let index = load_index(&self.config.index_file)?;
        self.index = Some(index);
        self.loaded_at = Some(Local::now());
        Ok(())
    }

    /// Replace the scanned folders and rescan immediately.
    pub fn set_library_folders(&mut self, folders: Vec<PathBuf>) -> IndexerResult<()> {
        self.config.library_folders = folders;
        self.rescan()
    }

    /// Rebuild the installed set and install states from disk.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError::NotInitialized`] if no index has been loaded.
    pub fn rescan(&mut self) -> IndexerResult<()> {
        let index = self.index.as_ref().ok_or(IndexerError::NotInitialized)?;

        let outcome = Reconciler::new(self.sink.as_ref())
            .with_match_key(self.config.match_key)
            .rescan(
                &self.config.library_folders,
                index,
                self.config.sketchbook_libraries_folder.as_deref(),
            );

        self.installed = outcome.installed;
        self.status = outcome.status;
        self.warnings = outcome.warnings;
        Ok(())
    }

    /// Set the folder new libraries are installed to.
    ///
    /// Libraries outside this folder are marked read-only on the next rescan.
    pub fn set_sketchbook_libraries_folder(&mut self, folder: impl Into<PathBuf>) {
        self.config.sketchbook_libraries_folder = Some(folder.into());
    }

    pub fn sketchbook_libraries_folder(&self) -> Option<&Path> {
        self.config.sketchbook_libraries_folder.as_deref()
    }

    pub fn index(&self) -> Option<&IndexDocument> {
        self.index.as_ref()
    }

    pub fn installed_libraries(&self) -> &InstalledSet {
        &self.installed
    }

    pub fn install_status(&self, key: &LibraryKey) -> Option<&InstallStatus> {
        self.status.get(key)
    }

    pub fn is_installed(&self, entry: &IndexEntry) -> bool {
        self.status.is_installed(entry)
    }

    /// Every index entry with its install state, in index order.
    pub fn entries(&self) -> IndexerResult<Vec<IndexedLibrary<'_>>> {
        let index = self.index.as_ref().ok_or(IndexerError::NotInitialized)?;
        Ok(index
            .libraries()
            .iter()
            .map(|entry| IndexedLibrary {
                entry,
                status: self.status.status_of(entry),
            })
            .collect())
    }

    /// Warnings produced by the most recent rescan.
    pub fn last_warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn library_folders(&self) -> &[PathBuf] {
        &self.config.library_folders
    }

    pub fn staging_folder(&self) -> &Path {
        &self.config.staging_folder
    }

    pub fn index_file(&self) -> &Path {
        &self.config.index_file
    }

    /// When the current index was loaded.
    pub fn loaded_at(&self) -> Option<DateTime<Local>> {
        self.loaded_at
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }
}

/// A [`LibrariesIndexer`] behind a single lock, for callers on several threads.
#[derive(Clone)]
pub struct SharedIndexer {
    inner: Arc<Mutex<LibrariesIndexer>>,
}

impl SharedIndexer {
    pub fn new(indexer: LibrariesIndexer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(indexer)),
        }
    }

    pub fn load_index(&self) -> IndexerResult<()> {
        self.inner.lock().load_index()
    }

    pub fn set_library_folders(&self, folders: Vec<PathBuf>) -> IndexerResult<()> {
        self.inner.lock().set_library_folders(folders)
    }

    pub fn rescan(&self) -> IndexerResult<()> {
        self.inner.lock().rescan()
    }

    /// Run `f` with the lock held.
    pub fn with<R>(&self, f: impl FnOnce(&LibrariesIndexer) -> R) -> R {
        f(&self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warnings::NoOpSink;
    use std::fs;
    use tempfile::TempDir;

    fn indexer_in(prefs: &Path) -> LibrariesIndexer {
        LibrariesIndexer::with_sink(IndexerConfig::new(prefs), Arc::new(NoOpSink))
    }

    fn write_index(prefs: &Path, content: &str) {
        fs::write(prefs.join("library_index.json"), content).unwrap();
    }

    #[test]
    fn test_rescan_before_load_fails() {
        let temp = TempDir::new().unwrap();
        let mut indexer = indexer_in(temp.path());

        assert!(matches!(indexer.rescan(), Err(IndexerError::NotInitialized)));
        assert!(matches!(
            indexer.set_library_folders(vec![temp.path().to_path_buf()]),
            Err(IndexerError::NotInitialized)
        ));
        assert!(indexer.entries().is_err());
    }

    #[test]
    fn test_load_index_sets_timestamp() {
        let temp = TempDir::new().unwrap();
        write_index(temp.path(), r#"{"libraries": [{"name": "Servo", "version": "1.0.0"}]}"#);

        let mut indexer = indexer_in(temp.path());
        assert!(indexer.loaded_at().is_none());

        indexer.load_index().unwrap();
        assert!(indexer.loaded_at().is_some());
        assert_eq!(indexer.index().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_index() {
        let temp = TempDir::new().unwrap();
        write_index(temp.path(), r#"{"libraries": [{"name": "Servo", "version": "1.0.0"}]}"#);

        let mut indexer = indexer_in(temp.path());
        indexer.load_index().unwrap();

        write_index(temp.path(), r#"{"libraries": [{"name": "Servo", "unknown": 1}]}"#);
        let err = indexer.load_index().unwrap_err();
        assert!(err.is_malformed());
        assert!(indexer.index().unwrap().find("Servo", "1.0.0").is_some());
    }

    #[test]
    fn test_accessors() {
        let temp = TempDir::new().unwrap();
        let mut indexer = indexer_in(temp.path());

        assert_eq!(indexer.index_file(), temp.path().join("library_index.json"));
        assert_eq!(
            indexer.staging_folder(),
            temp.path().join("staging").join("libraries")
        );
        assert!(indexer.sketchbook_libraries_folder().is_none());

        indexer.set_sketchbook_libraries_folder(temp.path().join("sketchbook"));
        assert_eq!(
            indexer.sketchbook_libraries_folder(),
            Some(temp.path().join("sketchbook").as_path())
        );
    }

    #[test]
    fn test_shared_indexer() {
        let temp = TempDir::new().unwrap();
        write_index(temp.path(), r#"{"libraries": []}"#);

        let shared = SharedIndexer::new(indexer_in(temp.path()));
        assert!(matches!(shared.rescan(), Err(IndexerError::NotInitialized)));

        shared.load_index().unwrap();
        shared.set_library_folders(vec![temp.path().to_path_buf()]).unwrap();

        let other = shared.clone();
        let count = std::thread::spawn(move || other.with(|i| i.library_folders().len()))
            .join()
            .unwrap();
        assert_eq!(count, 1);
    }
}
