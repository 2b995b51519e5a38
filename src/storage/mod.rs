//! File-based JSON storage
//!
//! Every entity is one JSON document under the data directory:
//!
//! - `topics/{id}.json`
//! - `sessions/{session_id}.json` (snapshot, messages and reports embedded)
//! - `sessions/index.json` (listing metadata plus the internal id counter)
//!
//! Writes go through `atomic_write` (temp file + rename) so a concurrent
//! reader sees the old or the new document in full, never a torn write.

pub mod sessions;
pub mod topics;

use fs2::FileExt;
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for low-level file operations
pub type FileResult<T> = Result<T, String>;

/// Create a directory (and parents) if missing
pub fn ensure_dir(path: &Path) -> FileResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| format!("Failed to create directory {:?}: {}", path, e))?;
    }
    Ok(())
}

/// Initialize the data directory layout
pub fn init_data_dir(data_dir: &Path) -> FileResult<()> {
    ensure_dir(&data_dir.join("topics"))?;
    ensure_dir(&data_dir.join("sessions"))?;
    Ok(())
}

/// Atomically replace a file's contents (write temp, then rename)
pub fn atomic_write(path: &Path, content: &str) -> FileResult<()> {
    let tmp_path: PathBuf = {
        let mut os = path.as_os_str().to_owned();
        os.push(".tmp");
        os.into()
    };

    fs::write(&tmp_path, content).map_err(|e| format!("Failed to write {:?}: {}", tmp_path, e))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| format!("Failed to replace {:?}: {}", path, e))?;
    Ok(())
}

/// Read and deserialize a JSON file
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> FileResult<T> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {:?}: {}", path, e))
}

/// Run a closure while holding an exclusive advisory lock on `{dir}/.lock`.
/// Serializes index read-modify-write cycles across processes.
pub fn with_dir_lock<T, F>(dir: &Path, f: F) -> FileResult<T>
where
    F: FnOnce() -> FileResult<T>,
{
    ensure_dir(dir)?;
    let lock_path = dir.join(".lock");
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| format!("Failed to open lock file {:?}: {}", lock_path, e))?;

    lock_file
        .lock_exclusive()
        .map_err(|e| format!("Failed to lock {:?}: {}", lock_path, e))?;

    let result = f();

    // Unlock on drop would suffice, but be explicit
    let _ = fs2::FileExt::unlock(&lock_file);

    result
}
