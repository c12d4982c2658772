//! LibDepot Core Library
//!
//! Library catalog core for an embedded-development IDE: loads the published
//! library index and reconciles it with the libraries installed on disk.
//!
//! # Architecture
//!
//! The core is synchronous and UI-free. Frontends drive it either directly
//! through [`LibrariesIndexer`] or through the C ABI in the `ffi` module.
//!
//! # Core Features Implemented
//!
//! ## Index Decoding (`index` module)
//! - `load_index()` - Strict JSON decoding of `library_index.json`
//! - `IndexDocument::fill_categories()` - Category grouping
//! - `IndexDocument::find()` - Lookup by exact name and version
//!
//! ## Installed Libraries (`library`, `manifest` modules)
//! - `InstalledLibrary` - Legacy (no manifest) or modern (`library.properties`) library
//! - `InstalledSet` - Installed libraries keyed by name, last scanned wins
//!
//! ## Reconciliation (`registry` module)
//! - `Reconciler::rescan()` - Scan library folders and match them to the index
//! - `InstallStatusTable` - Installed folder and read-only flag per index entry
//!
//! ## Indexer (`indexer` module)
//! - `LibrariesIndexer` - Load, configure folders, rescan, read the merged view
//! - `SharedIndexer` - The same behind a single lock for multi-threaded callers

pub mod config;
pub mod error;
pub mod ffi;
pub mod index;
pub mod indexer;
pub mod library;
pub mod manifest;
pub mod names;
pub mod registry;
pub mod warnings;

pub use config::{IndexerConfig, MatchKey};
pub use error::{IndexerError, IndexerResult, ManifestError};
pub use index::{IndexDocument, IndexEntry, LibraryKey};
pub use indexer::{IndexedLibrary, LibrariesIndexer, SharedIndexer};
pub use library::{InstalledLibrary, InstalledSet, LegacyLibrary, UserLibrary};
pub use manifest::{LibraryLayout, LibraryManifest};
pub use registry::{InstallStatus, InstallStatusTable, Reconciler, ScanOutcome};
pub use warnings::{MessageSink, NoOpSink, ScanWarning, TracingSink};
