//! Non-fatal scan warnings and where they are reported.
//!
//! A rescan never aborts because of one bad library folder. Each problem is
//! turned into a [`ScanWarning`], handed to a [`MessageSink`] as it happens and
//! collected into the scan outcome.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A library folder that was skipped during a rescan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    /// The folder name is not a sanitary library name.
    BadLibraryName { name: String, folder: PathBuf },
    /// The folder has a manifest but is not a valid library.
    InvalidLibrary { folder: PathBuf, reason: String },
}

impl ScanWarning {
    /// Short heading suitable for a dialog title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::BadLibraryName { .. } => "Ignoring bad library name",
            Self::InvalidLibrary { .. } => "Invalid library",
        }
    }

    pub fn folder(&self) -> &Path {
        match self {
            Self::BadLibraryName { folder, .. } => folder,
            Self::InvalidLibrary { folder, .. } => folder,
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLibraryName { name, .. } => write!(
                f,
                "The library \"{}\" cannot be used.\n\
                 Library names must contain only basic letters and numbers.\n\
                 (ASCII only and no spaces, and it cannot start with a number)",
                name
            ),
            Self::InvalidLibrary { folder, reason } => {
                write!(f, "Invalid library found in {}: {}", folder.display(), reason)
            }
        }
    }
}

/// Receives scan warnings for presentation to the user.
///
/// Implementations decide how (and in which language) a warning is shown;
/// the typed [`ScanWarning`] carries everything needed to format it.
pub trait MessageSink: Send + Sync {
    fn warn(&self, warning: &ScanWarning);
}

/// Sink that writes warnings to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn warn(&self, warning: &ScanWarning) {
        tracing::warn!(folder = ?warning.folder(), "{}: {}", warning.title(), warning);
    }
}

/// Sink that drops every warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl MessageSink for NoOpSink {
    fn warn(&self, _warning: &ScanWarning) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_name_message() {
        let warning = ScanWarning::BadLibraryName {
            name: "1BadName".to_string(),
            folder: PathBuf::from("/libs/1BadName"),
        };
        assert_eq!(warning.title(), "Ignoring bad library name");
        assert!(warning.to_string().starts_with("The library \"1BadName\" cannot be used."));
    }

    #[test]
    fn test_invalid_library_message() {
        let warning = ScanWarning::InvalidLibrary {
            folder: PathBuf::from("/libs/Broken"),
            reason: "Missing 'version' from library".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "Invalid library found in /libs/Broken: Missing 'version' from library"
        );
        assert_eq!(warning.folder(), Path::new("/libs/Broken"));
    }

    #[test]
    fn test_sinks_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TracingSink>();
        assert_send_sync::<NoOpSink>();
    }
}
