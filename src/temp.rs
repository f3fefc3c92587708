//! Temporary file management module
//!
//! This module provides RAII-based temporary file handling with automatic cleanup.

use std::fs::{self, File};
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Guard for temporary resources that automatically cleans up on drop
#[derive(Debug)]
pub(crate) enum TempGuard {
    /// Temporary file that will be deleted when dropped
    File(PathBuf),
}

impl TempGuard {
    /// Get the path to the temporary resource
    pub(crate) fn path(&self) -> &Path {
        match self {
            TempGuard::File(path) => path,
        }
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        match self {
            TempGuard::File(path) => {
                // The file is gone already once it has been published
                let _ = fs::remove_file(path);
            }
        }
    }
}

impl Deref for TempGuard {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path()
    }
}

/// Creates a temporary file in `dir` and returns a guard that will clean it up on drop
///
/// The file gets a unique name generated using ULID (monotonic, sortable
/// unique identifier). It is created exclusively, so a name clash is reported
/// as an error instead of reusing someone else's file.
///
/// # Examples
///
/// ```ignore
/// let temp = create_temp_file(&std::env::temp_dir(), "capture", "flv")?;
/// // Use temp.path() to access the file
/// // File is automatically deleted when temp goes out of scope
/// ```
pub(crate) fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> io::Result<TempGuard> {
    let ulid = ulid::Ulid::new();
    let filename = format!("{}_{}.{}", prefix, ulid, extension);

    let path = dir.join(filename);

    File::create_new(&path)?;

    Ok(TempGuard::File(path))
}
