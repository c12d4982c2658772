//! Installed library discovery and reconciliation against the index.
//!
//! A rescan walks each configured root folder, classifies every immediate
//! subfolder as a legacy or modern library, and records which index entries
//! are installed.
//!
//! # Folder Classification
//!
//! - Folder names must pass the sanitary-name check, otherwise they are
//!   reported and skipped
//! - A folder with a regular `library.properties` file is a modern library;
//!   anything else is a legacy library known only by its folder name
//! - Only modern libraries are cross-referenced with the index, by name and
//!   exact version
//!
//! # Read-Only Status
//!
//! Libraries inside the sketchbook libraries folder are writable; everything
//! else (IDE bundled libraries, platform libraries) is read-only.

use crate::config::MatchKey;
use crate::index::{IndexDocument, IndexEntry, LibraryKey};
use crate::library::{InstalledLibrary, InstalledSet, LegacyLibrary, UserLibrary};
use crate::manifest::has_manifest;
use crate::names::is_sanitary_name;
use crate::warnings::{MessageSink, ScanWarning};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where an index entry is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallStatus {
    pub folder: PathBuf,
    pub read_only: bool,
}

/// Install state of index entries, keyed by name and version.
///
/// An entry is installed iff it has a row here. The table is rebuilt from
/// scratch on every rescan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallStatusTable {
    rows: HashMap<LibraryKey, InstallStatus>,
}

impl InstallStatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &LibraryKey) -> Option<&InstallStatus> {
        self.rows.get(key)
    }

    /// Look up the status of an index entry.
    pub fn status_of(&self, entry: &IndexEntry) -> Option<&InstallStatus> {
        self.rows.get(&entry.key())
    }

    pub fn is_installed(&self, entry: &IndexEntry) -> bool {
        self.status_of(entry).is_some()
    }

    pub fn mark_installed(&mut self, key: LibraryKey, status: InstallStatus) {
        self.rows.insert(key, status);
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LibraryKey, &InstallStatus)> {
        self.rows.iter()
    }
}

/// Result of one rescan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub installed: InstalledSet,
    pub status: InstallStatusTable,
    pub warnings: Vec<ScanWarning>,
}

/// Scans library folders and matches what it finds against an index.
pub struct Reconciler<'a> {
    sink: &'a dyn MessageSink,
    name_check: fn(&str) -> bool,
    match_key: MatchKey,
}

impl<'a> Reconciler<'a> {
    pub fn new(sink: &'a dyn MessageSink) -> Self {
        Self {
            sink,
            name_check: is_sanitary_name,
            match_key: MatchKey::default(),
        }
    }

    /// Replace the folder name validator.
    pub fn with_name_check(mut self, name_check: fn(&str) -> bool) -> Self {
        self.name_check = name_check;
        self
    }

    pub fn with_match_key(mut self, match_key: MatchKey) -> Self {
        self.match_key = match_key;
        self
    }

    /// Scan `folders` in order and rebuild the installed view.
    ///
    /// Missing or unreadable root folders contribute nothing. Bad library
    /// folders are reported and skipped; they never abort the scan.
    pub fn rescan(
        &self,
        folders: &[PathBuf],
        index: &IndexDocument,
        sketchbook_folder: Option<&Path>,
    ) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for folder in folders {
            self.scan_folder(folder, index, sketchbook_folder, &mut outcome);
        }

        tracing::info!(
            "Rescanned {} library folders: {} installed, {} matched in index, {} skipped",
            folders.len(),
            outcome.installed.len(),
            outcome.status.len(),
            outcome.warnings.len()
        );

        outcome
    }

    fn scan_folder(
        &self,
        folder: &Path,
        index: &IndexDocument,
        sketchbook_folder: Option<&Path>,
        outcome: &mut ScanOutcome,
    ) {
        let subfolders = match list_subdirectories(folder) {
            Ok(subfolders) => subfolders,
            Err(e) => {
                tracing::debug!("Skipping library folder {:?}: {}", folder, e);
                return;
            }
        };

        for subfolder in subfolders {
            let name = folder_name(&subfolder);
            if !(self.name_check)(&name) {
                self.report(
                    ScanWarning::BadLibraryName {
                        name,
                        folder: subfolder,
                    },
                    outcome,
                );
                continue;
            }

            let scanned = self.scan_library(&subfolder, &name, index, sketchbook_folder, outcome);
            if let Err(warning) = scanned {
                self.report(warning, outcome);
            }
        }
    }

    fn scan_library(
        &self,
        folder: &Path,
        folder_name: &str,
        index: &IndexDocument,
        sketchbook_folder: Option<&Path>,
        outcome: &mut ScanOutcome,
    ) -> Result<(), ScanWarning> {
        let read_only = !sketchbook_folder.is_some_and(|base| is_sub_directory(base, folder));

        if !has_manifest(folder) {
            let mut lib = LegacyLibrary::from_folder(folder);
            lib.read_only = read_only;
            tracing::debug!("Found legacy library {} in {:?}", lib.name, folder);
            outcome.installed.add_or_replace(InstalledLibrary::Legacy(lib));
            return Ok(());
        }

        let mut lib = UserLibrary::load(folder).map_err(|e| ScanWarning::InvalidLibrary {
            folder: folder.to_path_buf(),
            reason: e.to_string(),
        })?;
        lib.read_only = read_only;

        let lookup_name = match self.match_key {
            MatchKey::FolderName => folder_name,
            MatchKey::ManifestName => lib.manifest.name.as_str(),
        };

        if let Some(entry) = index.find(lookup_name, &lib.manifest.version) {
            tracing::debug!("Library {} is installed in {:?}", entry.key(), folder);
            outcome.status.mark_installed(
                entry.key(),
                InstallStatus {
                    folder: folder.to_path_buf(),
                    read_only,
                },
            );
        }

        outcome.installed.add_or_replace(InstalledLibrary::Modern(lib));
        Ok(())
    }

    fn report(&self, warning: ScanWarning, outcome: &mut ScanOutcome) {
        self.sink.warn(&warning);
        outcome.warnings.push(warning);
    }
}

/// Returns true if `child` is `base` or lies beneath it.
///
/// Both paths are canonicalized first; a path that cannot be canonicalized is
/// compared as given.
pub fn is_sub_directory(base: &Path, child: &Path) -> bool {
    let base = canonicalize_existing_path(base);
    let child = canonicalize_existing_path(child);
    child.starts_with(&base)
}

fn canonicalize_existing_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Immediate subdirectories of `folder`, sorted by name.
fn list_subdirectories(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(folder)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn folder_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
