//! Utility functions for renshu.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{CoachError, Result};

/// Maximum file size that can be read into memory (10 MB).
///
/// State and history files are a few kilobytes in normal use.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

/// Read a file into a string, refusing files over `MAX_FILE_SIZE`.
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
///
/// # Errors
///
/// Returns a storage error if the file cannot be read or exceeds `max_size`.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| CoachError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(CoachError::storage(
            path,
            io::Error::other(format!(
                "file is too large ({} bytes, max {} bytes)",
                size, max_size
            )),
        ));
    }

    fs::read_to_string(path).map_err(|e| CoachError::storage(path, e))
}

/// Write `contents` to `path` atomically via a sibling temp file + rename.
///
/// The temp file name starts with `.` so directory scans can skip it.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut file = fs::File::create(&temp_path).map_err(|e| CoachError::storage(&temp_path, e))?;
        file.write_all(contents)
            .map_err(|e| CoachError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| CoachError::storage(&temp_path, e))?;
    }

    // Rename is atomic on POSIX
    fs::rename(&temp_path, path).map_err(|e| CoachError::storage(path, e))
}
