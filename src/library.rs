use crate::error::ManifestError;
use crate::manifest::{read_manifest, LibraryLayout, LibraryManifest};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A library folder without a `library.properties` file.
///
/// Only the folder name is known about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyLibrary {
    pub name: String,
    pub folder: PathBuf,
    pub read_only: bool,
}

impl LegacyLibrary {
    pub fn from_folder(folder: &Path) -> Self {
        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            name,
            folder: folder.to_path_buf(),
            read_only: false,
        }
    }
}

/// A library folder described by its `library.properties` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserLibrary {
    pub manifest: LibraryManifest,
    pub layout: LibraryLayout,
    pub folder: PathBuf,
    pub read_only: bool,
}

impl UserLibrary {
    /// Load a library from a folder holding a `library.properties` file.
    pub fn load(folder: &Path) -> Result<Self, ManifestError> {
        let (manifest, layout) = read_manifest(folder)?;
        Ok(Self {
            manifest,
            layout,
            folder: folder.to_path_buf(),
            read_only: false,
        })
    }
}

/// A library found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstalledLibrary {
    Legacy(LegacyLibrary),
    Modern(UserLibrary),
}

impl InstalledLibrary {
    pub fn name(&self) -> &str {
        match self {
            Self::Legacy(lib) => &lib.name,
            Self::Modern(lib) => &lib.manifest.name,
        }
    }

    /// Declared version. Legacy libraries have none.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Legacy(_) => None,
            Self::Modern(lib) => Some(&lib.manifest.version),
        }
    }

    pub fn folder(&self) -> &Path {
        match self {
            Self::Legacy(lib) => &lib.folder,
            Self::Modern(lib) => &lib.folder,
        }
    }

    pub fn is_read_only(&self) -> bool {
        match self {
            Self::Legacy(lib) => lib.read_only,
            Self::Modern(lib) => lib.read_only,
        }
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        match self {
            Self::Legacy(lib) => lib.read_only = read_only,
            Self::Modern(lib) => lib.read_only = read_only,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    pub fn layout(&self) -> LibraryLayout {
        match self {
            Self::Legacy(_) => LibraryLayout::Flat,
            Self::Modern(lib) => lib.layout,
        }
    }

    pub fn architectures(&self) -> Vec<&str> {
        match self {
            Self::Legacy(_) => vec!["*"],
            Self::Modern(lib) => lib.manifest.architectures.iter().map(String::as_str).collect(),
        }
    }

    pub fn manifest(&self) -> Option<&LibraryManifest> {
        match self {
            Self::Legacy(_) => None,
            Self::Modern(lib) => Some(&lib.manifest),
        }
    }
}

/// Installed libraries keyed by name, in scan order.
///
/// Adding a library whose name is already present replaces the earlier entry
/// in place, so the last folder scanned wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet {
    libraries: Vec<InstalledLibrary>,
}

impl InstalledSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `library`, returning the entry it replaced if any.
    pub fn add_or_replace(&mut self, library: InstalledLibrary) -> Option<InstalledLibrary> {
        match self.libraries.iter_mut().find(|l| l.name() == library.name()) {
            Some(existing) => Some(std::mem::replace(existing, library)),
            None => {
                self.libraries.push(library);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&InstalledLibrary> {
        self.libraries.iter().find(|l| l.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<InstalledLibrary> {
        let pos = self.libraries.iter().position(|l| l.name() == name)?;
        Some(self.libraries.remove(pos))
    }

    pub fn clear(&mut self) {
        self.libraries.clear();
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledLibrary> {
        self.libraries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.libraries.iter().map(InstalledLibrary::name).collect()
    }
}

impl<'a> IntoIterator for &'a InstalledSet {
    type Item = &'a InstalledLibrary;
    type IntoIter = std::slice::Iter<'a, InstalledLibrary>;

    fn into_iter(self) -> Self::IntoIter {
        self.libraries.iter()
    }
}
