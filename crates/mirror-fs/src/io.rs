//! Atomic I/O with file locking, plus typed JSON helpers

use std::fs::{self, OpenOptions};
use std::io::Write;

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, NormalizedPath, Result};

/// Write bytes atomically: temp file in the target directory, exclusive
/// advisory lock, fsync, then rename over the destination.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native = path.to_native();

    if let Some(parent) = native.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file lives next to the destination so the rename stays on one
    // filesystem.
    let temp_name = format!(
        ".{}.{}.tmp",
        native
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native.clone(),
        })?;

    let written = temp_file
        .write_all(content)
        .and_then(|_| temp_file.sync_all());
    if let Err(e) = written {
        // Leave nothing half-written behind.
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native.clone(),
    })?;

    fs::rename(&temp_path, &native).map_err(|e| Error::io(&native, e))?;

    Ok(())
}

/// Serialize a value as pretty-printed JSON and write it atomically.
pub fn write_json<T: Serialize>(path: &NormalizedPath, value: &T) -> Result<()> {
    let mut body =
        serde_json::to_vec_pretty(value).map_err(|e| Error::json(path.to_native(), e))?;
    body.push(b'\n');
    write_atomic(path, &body)
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &NormalizedPath) -> Result<T> {
    let native = path.to_native();
    let body = fs::read(&native).map_err(|e| Error::io(&native, e))?;
    serde_json::from_slice(&body).map_err(|e| Error::json(&native, e))
}

/// Read a file as UTF-8 text.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(&native, e))
}
