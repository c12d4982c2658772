//! `library.properties` parsing and layout checks.
//!
//! A library folder containing a regular `library.properties` file is a
//! "modern" library. The file is a flat list of `key=value` lines; lines
//! starting with `#` and lines without `=` are ignored.

use crate::error::ManifestError;
use crate::index::UNCATEGORIZED;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File name whose presence marks a modern library.
pub const MANIFEST_FILE_NAME: &str = "library.properties";

/// Properties every modern library must declare.
pub const MANDATORY_PROPERTIES: [&str; 7] = [
    "name",
    "version",
    "author",
    "maintainer",
    "sentence",
    "paragraph",
    "url",
];

/// Categories a library may declare. Anything else falls back to `Uncategorized`.
pub const KNOWN_CATEGORIES: [&str; 10] = [
    "Display",
    "Communication",
    "Signal Input/Output",
    "Sensors",
    "Device Control",
    "Timing",
    "Data Storage",
    "Data Processing",
    "Other",
    UNCATEGORIZED,
];

/// How a library lays out its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryLayout {
    /// Sources live directly in the library root (optionally `utility/`).
    Flat,
    /// Sources live under `src/` and are compiled recursively.
    Recursive,
}

/// Declared metadata from a `library.properties` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryManifest {
    pub name: String,
    pub version: String,
    pub author: String,
    pub maintainer: String,
    pub sentence: String,
    pub paragraph: String,
    pub url: String,
    pub category: String,
    pub architectures: Vec<String>,
    pub license: String,
    pub types: Vec<String>,
    pub dot_a_linkage: bool,
    pub precompiled: bool,
    pub includes: Vec<String>,
    pub depends: Vec<String>,
}

impl LibraryManifest {
    /// Build a manifest from already-parsed properties.
    pub fn from_properties(
        mut properties: BTreeMap<String, String>,
    ) -> Result<Self, ManifestError> {
        // Older libraries used "email" before "maintainer" existed
        if !properties.contains_key("maintainer") {
            if let Some(email) = properties.get("email").cloned() {
                properties.insert("maintainer".to_string(), email);
            }
        }

        for key in MANDATORY_PROPERTIES {
            if !properties.contains_key(key) {
                return Err(ManifestError::MissingProperty(key));
            }
        }

        let mut take = |key: &str| properties.remove(key).unwrap_or_default();

        let name = take("name");
        let version = take("version");
        let author = take("author");
        let maintainer = take("maintainer");
        let sentence = take("sentence");
        let paragraph = take("paragraph");
        let url = take("url");

        let category = match properties.remove("category") {
            Some(category) if KNOWN_CATEGORIES.contains(&category.as_str()) => category,
            Some(category) => {
                tracing::warn!(
                    "Category '{}' in library {} is not valid. Setting to '{}'",
                    category,
                    name,
                    UNCATEGORIZED
                );
                UNCATEGORIZED.to_string()
            }
            None => UNCATEGORIZED.to_string(),
        };

        let architectures = split_list(properties.get("architectures").map_or("*", |s| s.as_str()));
        let license = properties
            .remove("license")
            .unwrap_or_else(|| "Unspecified".to_string());
        let types = split_list(properties.get("types").map_or("Contributed", |s| s.as_str()));

        Ok(Self {
            name,
            version,
            author,
            maintainer,
            sentence,
            paragraph,
            url,
            category,
            architectures,
            license,
            types,
            dot_a_linkage: is_true(properties.get("dot_a_linkage")),
            precompiled: is_true(properties.get("precompiled")),
            includes: split_list(properties.get("includes").map_or("", |s| s.as_str())),
            depends: split_list(properties.get("depends").map_or("", |s| s.as_str())),
        })
    }
}

/// Parse `key=value` lines into a map.
pub fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();

    for line in content.lines() {
        if line.starts_with('#') {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            properties.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    properties
}

/// Returns true if `folder` holds a regular `library.properties` file.
pub fn has_manifest(folder: &Path) -> bool {
    folder.join(MANIFEST_FILE_NAME).is_file()
}

/// Read and validate the manifest of a modern library folder.
pub fn read_manifest(folder: &Path) -> Result<(LibraryManifest, LibraryLayout), ManifestError> {
    let path = folder.join(MANIFEST_FILE_NAME);
    let bytes = fs::read(&path).map_err(|e| ManifestError::Read { path, source: e })?;
    let content = String::from_utf8_lossy(&bytes);

    if folder.join("arch").is_dir() {
        return Err(ManifestError::ArchFolder);
    }

    let manifest = LibraryManifest::from_properties(parse_properties(&content))?;
    let layout = detect_layout(folder)?;
    warn_spurious_folders(folder, &manifest.name);

    Ok((manifest, layout))
}

fn detect_layout(folder: &Path) -> Result<LibraryLayout, ManifestError> {
    if !folder.join("src").is_dir() {
        return Ok(LibraryLayout::Flat);
    }
    if folder.join("utility").is_dir() {
        return Err(ManifestError::SrcAndUtility);
    }
    Ok(LibraryLayout::Recursive)
}

/// Log hidden folders left in a library root. Version-control folders are expected.
fn warn_spurious_folders(folder: &Path, library_name: &str) {
    let Ok(entries) = fs::read_dir(folder) else {
        return;
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if entry.path().is_dir() && is_spurious_folder_name(&file_name) {
            tracing::warn!("Spurious {} folder in '{}' library", file_name, library_name);
        }
    }
}

const VCS_FOLDERS: [&str; 6] = [".git", ".svn", ".hg", ".bzr", "CVS", "RCS"];

fn is_spurious_folder_name(name: &str) -> bool {
    name.starts_with('.') && !VCS_FOLDERS.contains(&name)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn is_true(value: Option<&String>) -> bool {
    value.is_some_and(|v| v == "true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SERVO_PROPERTIES: &str = "\
# Servo library
name=Servo
version=1.0.0
author=Michael Margolis, Arduino
maintainer=Arduino <info@arduino.cc>
sentence=Allows Arduino boards to control a variety of servo motors.
paragraph=This library can control a great number of servos.
url=http://www.arduino.cc/en/Reference/Servo
category=Device Control
architectures=avr, sam
";

    #[test]
    fn test_parse_properties() {
        let props = parse_properties("a=1\n  b = two words \n#c=3\n\nnot a pair\nd=x=y\n");
        assert_eq!(props.get("a").map(String::as_str), Some("1"));
        assert_eq!(props.get("b").map(String::as_str), Some("two words"));
        assert_eq!(props.get("d").map(String::as_str), Some("x=y"));
        assert!(!props.contains_key("c"));
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn test_comment_marker_only_in_first_column() {
        let props = parse_properties("#skipped=1\n  #kept=2\n");
        assert!(!props.contains_key("#skipped"));
        assert_eq!(props.get("#kept").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_manifest_from_properties() {
        let properties = parse_properties(SERVO_PROPERTIES);
        let manifest = LibraryManifest::from_properties(properties).unwrap();
        assert_eq!(manifest.name, "Servo");
        assert_eq!(manifest.version, "1.0.0");
        assert_eq!(manifest.category, "Device Control");
        assert_eq!(manifest.architectures, vec!["avr", "sam"]);
        assert_eq!(manifest.license, "Unspecified");
        assert_eq!(manifest.types, vec!["Contributed"]);
        assert!(!manifest.dot_a_linkage);
    }

    #[test]
    fn test_missing_mandatory_property() {
        let content =
            SERVO_PROPERTIES.replace("url=http://www.arduino.cc/en/Reference/Servo\n", "");
        let result = LibraryManifest::from_properties(parse_properties(&content));
        assert!(matches!(result, Err(ManifestError::MissingProperty("url"))));
    }

    #[test]
    fn test_email_fallback_for_maintainer() {
        let content = SERVO_PROPERTIES.replace("maintainer=", "email=");
        let manifest = LibraryManifest::from_properties(parse_properties(&content)).unwrap();
        assert_eq!(manifest.maintainer, "Arduino <info@arduino.cc>");
    }

    #[test]
    fn test_defaults_and_invalid_category() {
        let content = SERVO_PROPERTIES
            .replace("category=Device Control\n", "category=Robots\n")
            .replace("architectures=avr, sam\n", "dot_a_linkage=true\n");
        let manifest = LibraryManifest::from_properties(parse_properties(&content)).unwrap();
        assert_eq!(manifest.category, UNCATEGORIZED);
        assert_eq!(manifest.architectures, vec!["*"]);
        assert!(manifest.dot_a_linkage);
    }

    #[test]
    fn test_boolean_flags_are_case_sensitive() {
        let content = format!("{}dot_a_linkage=TRUE\nprecompiled=true\n", SERVO_PROPERTIES);
        let manifest = LibraryManifest::from_properties(parse_properties(&content)).unwrap();
        assert!(!manifest.dot_a_linkage);
        assert!(manifest.precompiled);
    }

    #[test]
    fn test_read_manifest_tolerates_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let mut content = SERVO_PROPERTIES
            .replace("author=Michael Margolis, Arduino\n", "")
            .into_bytes();
        content.extend_from_slice(b"author=J\xFCrgen\n");
        fs::write(temp.path().join(MANIFEST_FILE_NAME), content).unwrap();

        let (manifest, _) = read_manifest(temp.path()).unwrap();
        assert_eq!(manifest.name, "Servo");
        assert_eq!(manifest.author, "J\u{FFFD}rgen");
    }

    #[test]
    fn test_spurious_folder_names() {
        assert!(is_spurious_folder_name(".vscode"));
        assert!(!is_spurious_folder_name(".git"));
        assert!(!is_spurious_folder_name(".svn"));
        assert!(!is_spurious_folder_name("CVS"));
        assert!(!is_spurious_folder_name("examples"));
    }

    #[test]
    fn test_read_manifest_layouts() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("Servo");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(MANIFEST_FILE_NAME), SERVO_PROPERTIES).unwrap();

        let (_, layout) = read_manifest(&folder).unwrap();
        assert_eq!(layout, LibraryLayout::Flat);

        fs::create_dir(folder.join("src")).unwrap();
        let (manifest, layout) = read_manifest(&folder).unwrap();
        assert_eq!(manifest.name, "Servo");
        assert_eq!(layout, LibraryLayout::Recursive);

        fs::create_dir(folder.join("utility")).unwrap();
        assert!(matches!(read_manifest(&folder), Err(ManifestError::SrcAndUtility)));
    }

    #[test]
    fn test_read_manifest_rejects_arch_folder() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE_NAME), SERVO_PROPERTIES).unwrap();
        fs::create_dir(temp.path().join("arch")).unwrap();

        assert!(matches!(read_manifest(temp.path()), Err(ManifestError::ArchFolder)));
    }

    #[test]
    fn test_has_manifest_requires_regular_file() {
        let temp = TempDir::new().unwrap();
        assert!(!has_manifest(temp.path()));

        fs::create_dir(temp.path().join(MANIFEST_FILE_NAME)).unwrap();
        assert!(!has_manifest(temp.path()));
    }
}
