//! Library index decoding.
//!
//! The index is the published catalog of every known library version. It is
//! fetched elsewhere and stored as `library_index.json` in the preferences
//! folder; this module only turns that file into an [`IndexDocument`].
//!
//! Decoding is strict: unknown keys are rejected at every level, and a single
//! value is accepted wherever a list is expected.

use crate::error::{IndexerError, IndexerResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Category assigned to entries that do not declare one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Identity of an index entry: name plus version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LibraryKey {
    pub name: String,
    pub version: String,
}

impl LibraryKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A dependency declared by an index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryDependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// One library version published in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IndexEntry {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub architectures: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub requires: Vec<LibraryDependency>,
}

impl IndexEntry {
    /// Create a bare entry with only name and version set.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            category: None,
            author: None,
            maintainer: None,
            sentence: None,
            paragraph: None,
            website: None,
            license: None,
            architectures: Vec::new(),
            types: Vec::new(),
            url: None,
            archive_file_name: None,
            size: None,
            checksum: None,
            requires: Vec::new(),
        }
    }

    pub fn key(&self) -> LibraryKey {
        LibraryKey::new(&self.name, &self.version)
    }

    /// Category of this entry, `Uncategorized` when the index omits it.
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// Decoded library index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDocument {
    #[serde(deserialize_with = "one_or_many")]
    libraries: Vec<IndexEntry>,

    #[serde(skip)]
    categories: Vec<String>,
}

impl IndexDocument {
    pub fn new(libraries: Vec<IndexEntry>) -> Self {
        Self {
            libraries,
            categories: Vec::new(),
        }
    }

    /// Group entries into categories.
    ///
    /// Must be called after decoding; [`load_index`] does this already.
    pub fn fill_categories(&mut self) {
        let mut categories: Vec<String> = self
            .libraries
            .iter()
            .map(|lib| lib.category().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        self.categories = categories;
    }

    /// Sorted, de-duplicated category names.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn libraries(&self) -> &[IndexEntry] {
        &self.libraries
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Find the entry with exactly this name and version.
    pub fn find(&self, name: &str, version: &str) -> Option<&IndexEntry> {
        self.libraries
            .iter()
            .find(|lib| lib.name == name && lib.version == version)
    }

    /// All published versions of a library, in index order.
    pub fn find_all(&self, name: &str) -> Vec<&IndexEntry> {
        self.libraries.iter().filter(|lib| lib.name == name).collect()
    }

    pub fn entries_in_category(&self, category: &str) -> Vec<&IndexEntry> {
        self.libraries
            .iter()
            .filter(|lib| lib.category() == category)
            .collect()
    }
}

/// Decode an index from JSON text without post-processing.
pub fn parse_index(content: &str) -> Result<IndexDocument, serde_json::Error> {
    serde_json::from_str(content)
}

/// Read, decode and categorize the index file at `path`.
pub fn load_index(path: &Path) -> IndexerResult<IndexDocument> {
    let content = fs::read_to_string(path).map_err(|e| IndexerError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut index = parse_index(&content).map_err(|e| IndexerError::MalformedIndex {
        path: path.to_path_buf(),
        source: e,
    })?;
    index.fill_categories();

    tracing::info!(
        "Loaded library index {:?}: {} entries in {} categories",
        path,
        index.len(),
        index.categories().len()
    );

    Ok(index)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    })
}
