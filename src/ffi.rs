//! FFI (Foreign Function Interface) bindings for the IDE frontend.
//!
//! This module exposes the libraries indexer through C-compatible functions so
//! a native frontend can load the index, configure folders, rescan and read
//! the merged library view.
//!
//! # Memory Management
//!
//! - Rust allocates memory and returns pointers to the caller
//! - The calling code MUST call the corresponding `_free` functions to prevent leaks
//! - Strings are null-terminated UTF-8
//!
//! # Usage
//!
//! ```c
//! LibdepotIndexer *indexer = libdepot_indexer_new("/home/me/.ide");
//! libdepot_set_sketchbook_folder(indexer, "/home/me/Sketchbook/libraries");
//! if (libdepot_load_index(indexer) == 0) {
//!     const char *folders[] = { "/opt/ide/libraries", "/home/me/Sketchbook/libraries" };
//!     libdepot_set_library_folders(indexer, folders, 2);
//!     char *json = libdepot_entries_json(indexer);
//!     /* ... */
//!     libdepot_free_string(json);
//! }
//! libdepot_indexer_free(indexer);
//! ```

use crate::{IndexerConfig, LibrariesIndexer, LibraryKey};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::PathBuf;
use std::ptr;
use std::slice;

// ============================================================================
// C-Compatible Types
// ============================================================================

/// Opaque handle to an indexer
pub struct LibdepotIndexer {
    indexer: LibrariesIndexer,
}

/// C-compatible installed library information
#[repr(C)]
pub struct CInstalledLibrary {
    pub name: *mut c_char,
    /// Null for legacy libraries
    pub version: *mut c_char,
    pub folder: *mut c_char,
    pub legacy: c_int,
    pub read_only: c_int,
}

/// Result code for operations
#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub enum CResultCode {
    Success = 0,
    Error = 1,
    MalformedIndex = 2,
    NotInitialized = 3,
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Create an indexer using paths derived from the preferences folder.
/// Caller MUST call libdepot_indexer_free() when done.
#[no_mangle]
pub extern "C" fn libdepot_indexer_new(preferences_folder: *const c_char) -> *mut LibdepotIndexer {
    let Some(prefs) = c_char_to_string(preferences_folder) else {
        return ptr::null_mut();
    };

    let indexer = LibrariesIndexer::new(IndexerConfig::new(prefs));
    Box::into_raw(Box::new(LibdepotIndexer { indexer }))
}

/// Free an indexer returned by libdepot_indexer_new().
#[no_mangle]
pub extern "C" fn libdepot_indexer_free(handle: *mut LibdepotIndexer) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle);
        }
    }
}

/// Set the user's writable libraries folder.
#[no_mangle]
pub extern "C" fn libdepot_set_sketchbook_folder(
    handle: *mut LibdepotIndexer,
    folder: *const c_char,
) -> CResultCode {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return CResultCode::Error;
    };
    let Some(folder) = c_char_to_string(folder) else {
        return CResultCode::Error;
    };

    handle.indexer.set_sketchbook_libraries_folder(folder);
    CResultCode::Success
}

// ============================================================================
// Index Operations
// ============================================================================

/// Load the index file from the preferences folder.
#[no_mangle]
pub extern "C" fn libdepot_load_index(handle: *mut LibdepotIndexer) -> CResultCode {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return CResultCode::Error;
    };

    to_result_code(handle.indexer.load_index())
}

/// Replace the scanned library folders and rescan.
#[no_mangle]
pub extern "C" fn libdepot_set_library_folders(
    handle: *mut LibdepotIndexer,
    folders: *const *const c_char,
    count: c_int,
) -> CResultCode {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return CResultCode::Error;
    };
    if count < 0 || (folders.is_null() && count > 0) {
        return CResultCode::Error;
    }

    let raw = if count == 0 {
        &[][..]
    } else {
        unsafe { slice::from_raw_parts(folders, count as usize) }
    };

    let mut paths = Vec::with_capacity(raw.len());
    for folder in raw {
        match c_char_to_string(*folder) {
            Some(path) => paths.push(PathBuf::from(path)),
            None => return CResultCode::Error,
        }
    }

    to_result_code(handle.indexer.set_library_folders(paths))
}

/// Rescan the configured library folders.
#[no_mangle]
pub extern "C" fn libdepot_rescan(handle: *mut LibdepotIndexer) -> CResultCode {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return CResultCode::Error;
    };

    to_result_code(handle.indexer.rescan())
}

/// Serialize every index entry with its install state as a JSON array.
/// Returns null if no index is loaded.
/// Caller MUST call libdepot_free_string() when done.
#[no_mangle]
pub extern "C" fn libdepot_entries_json(handle: *const LibdepotIndexer) -> *mut c_char {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return ptr::null_mut();
    };

    let entries = match handle.indexer.entries() {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Error listing library entries: {}", e);
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&entries) {
        Ok(json) => string_to_c_char(&json),
        Err(e) => {
            tracing::error!("Error serializing library entries: {}", e);
            ptr::null_mut()
        }
    }
}

/// Get the installed folder of an index entry.
/// Returns null if the entry is not installed.
/// Caller MUST call libdepot_free_string() when done.
#[no_mangle]
pub extern "C" fn libdepot_installed_folder(
    handle: *const LibdepotIndexer,
    name: *const c_char,
    version: *const c_char,
) -> *mut c_char {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return ptr::null_mut();
    };
    let (Some(name), Some(version)) = (c_char_to_string(name), c_char_to_string(version)) else {
        return ptr::null_mut();
    };

    match handle.indexer.install_status(&LibraryKey::new(name, version)) {
        Some(status) => string_to_c_char(&status.folder.to_string_lossy()),
        None => ptr::null_mut(),
    }
}

// ============================================================================
// Installed Libraries
// ============================================================================

/// Get the number of installed libraries found by the last rescan.
#[no_mangle]
pub extern "C" fn libdepot_installed_count(handle: *const LibdepotIndexer) -> c_int {
    match unsafe { handle.as_ref() } {
        Some(handle) => handle.indexer.installed_libraries().len() as c_int,
        None => 0,
    }
}

/// Get installed library information at a specific position.
/// Caller MUST call libdepot_free_installed_library() when done.
#[no_mangle]
pub extern "C" fn libdepot_installed_get(
    handle: *const LibdepotIndexer,
    index: c_int,
) -> *mut CInstalledLibrary {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return ptr::null_mut();
    };
    if index < 0 {
        return ptr::null_mut();
    }

    let Some(lib) = handle.indexer.installed_libraries().iter().nth(index as usize) else {
        return ptr::null_mut();
    };

    let c_lib = Box::new(CInstalledLibrary {
        name: string_to_c_char(lib.name()),
        version: lib.version().map(string_to_c_char).unwrap_or(ptr::null_mut()),
        folder: string_to_c_char(&lib.folder().to_string_lossy()),
        legacy: lib.is_legacy() as c_int,
        read_only: lib.is_read_only() as c_int,
    });

    Box::into_raw(c_lib)
}

/// Free a CInstalledLibrary returned by libdepot_installed_get().
#[no_mangle]
pub extern "C" fn libdepot_free_installed_library(lib: *mut CInstalledLibrary) {
    if !lib.is_null() {
        unsafe {
            let lib = Box::from_raw(lib);
            free_c_char(lib.name);
            free_c_char(lib.version);
            free_c_char(lib.folder);
        }
    }
}

// ============================================================================
// String Management
// ============================================================================

/// Free a string returned by FFI functions.
#[no_mangle]
pub extern "C" fn libdepot_free_string(s: *mut c_char) {
    free_c_char(s);
}

// ============================================================================
// Helper Functions
// ============================================================================

fn to_result_code(result: crate::IndexerResult<()>) -> CResultCode {
    match result {
        Ok(()) => CResultCode::Success,
        Err(e) => {
            tracing::error!("Libraries indexer error: {}", e);
            match e {
                crate::IndexerError::MalformedIndex { .. } => CResultCode::MalformedIndex,
                crate::IndexerError::NotInitialized => CResultCode::NotInitialized,
                crate::IndexerError::Io { .. } => CResultCode::Error,
            }
        }
    }
}

fn c_char_to_string(s: *const c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s).to_str().ok().map(String::from) }
}

fn string_to_c_char(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn free_c_char(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            let _ = CString::from_raw(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn test_lifecycle_through_ffi() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("library_index.json"),
            r#"{"libraries": [{"name": "Servo", "version": "1.0.0"}]}"#,
        )
        .unwrap();
        let libs = temp.path().join("libraries");
        fs::create_dir_all(libs.join("MyLib")).unwrap();

        let prefs = c(temp.path().to_str().unwrap());
        let handle = libdepot_indexer_new(prefs.as_ptr());
        assert!(!handle.is_null());

        assert_eq!(libdepot_rescan(handle), CResultCode::NotInitialized);
        assert_eq!(libdepot_load_index(handle), CResultCode::Success);

        let folder = c(libs.to_str().unwrap());
        let folders = [folder.as_ptr()];
        assert_eq!(
            libdepot_set_library_folders(handle, folders.as_ptr(), 1),
            CResultCode::Success
        );
        assert_eq!(libdepot_installed_count(handle), 1);

        let lib = libdepot_installed_get(handle, 0);
        assert!(!lib.is_null());
        unsafe {
            assert_eq!(CStr::from_ptr((*lib).name).to_str().unwrap(), "MyLib");
            assert!((*lib).version.is_null());
            assert_eq!((*lib).legacy, 1);
            assert_eq!((*lib).read_only, 1);
        }
        libdepot_free_installed_library(lib);
        assert!(libdepot_installed_get(handle, 1).is_null());

        let json = libdepot_entries_json(handle);
        assert!(!json.is_null());
        let text = unsafe { CStr::from_ptr(json).to_str().unwrap().to_string() };
        assert!(text.contains("\"Servo\""));
        libdepot_free_string(json);

        let name = c("Servo");
        let version = c("1.0.0");
        assert!(libdepot_installed_folder(handle, name.as_ptr(), version.as_ptr()).is_null());

        libdepot_indexer_free(handle);
    }

    #[test]
    fn test_null_handles() {
        assert!(libdepot_indexer_new(ptr::null()).is_null());
        assert_eq!(libdepot_load_index(ptr::null_mut()), CResultCode::Error);
        assert_eq!(libdepot_installed_count(ptr::null()), 0);
        assert!(libdepot_entries_json(ptr::null()).is_null());
        libdepot_free_string(ptr::null_mut());
    }

    #[test]
    fn test_malformed_index_code() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("library_index.json"), "{ not json").unwrap();

        let prefs = c(temp.path().to_str().unwrap());
        let handle = libdepot_indexer_new(prefs.as_ptr());
        assert_eq!(libdepot_load_index(handle), CResultCode::MalformedIndex);
        libdepot_indexer_free(handle);
    }
}
