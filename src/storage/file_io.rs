//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure. Both the
//! record store and exported envelopes go through `write_atomic`, so a reader
//! never observes a half-written file. Exports use `write_new`, which never
//! replaces a file that is already there.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::CapsuleError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, CapsuleError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| CapsuleError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| CapsuleError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), CapsuleError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let bytes = serde_json::to_vec_pretty(data)
        .map_err(|e| CapsuleError::Storage(format!("Failed to serialize data: {}", e)))?;
    write_atomic(path, &bytes)
}

/// Write bytes to a file atomically (write to temp, sync, then rename)
///
/// The file is either completely written or not modified at all.
pub fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), CapsuleError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            CapsuleError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Temp file must live in the same directory for the rename to be atomic
    let temp_path = temp_path_for(path);

    let mut file = File::create(&temp_path)
        .map_err(|e| CapsuleError::Storage(format!("Failed to create temp file: {}", e)))?;

    let written = file
        .write_all(bytes)
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_all());

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(CapsuleError::Storage(format!("Failed to write data: {}", e)));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CapsuleError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Upper bound on `-N` suffixes tried by `write_new`
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Atomically write bytes to a new file in `dir`, never replacing one
///
/// `file_name` is tried first, then `stem-1.ext`, `stem-2.ext` and so on.
/// The chosen name is claimed with `create_new` before the atomic write, so
/// two writers cannot end up with the same path. Returns the path written.
pub fn write_new(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, CapsuleError> {
    fs::create_dir_all(dir).map_err(|e| {
        CapsuleError::Storage(format!("Failed to create directory {}: {}", dir.display(), e))
    })?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(numbered_name(file_name, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                if let Err(e) = write_atomic(&path, bytes) {
                    let _ = fs::remove_file(&path);
                    return Err(e);
                }
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(CapsuleError::Storage(format!(
                    "Failed to create {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    Err(CapsuleError::Storage(format!(
        "No free file name for {} in {}",
        file_name,
        dir.display()
    )))
}

/// `name.ext` for 0, `name-N.ext` otherwise
fn numbered_name(file_name: &str, n: usize) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", file_name, n),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
