//! JSON persistence of the in-memory store between invocations.
//!
//! Concurrent `slots` processes may share one state file. Mutating commands run
//! their whole load, check and save sequence under an exclusive advisory lock
//! on a sidecar `<state>.lock` file.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use slot_engine::{EngineError, InMemoryStore, Snapshot, StoreError};
use tempfile::NamedTempFile;

/// Run `f` while holding the exclusive lock for the state file at `path`.
///
/// Blocks until every other holder has finished.
pub fn with_lock<T>(path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    fs::create_dir_all(parent_dir(path))
        .with_context(|| format!("Failed to create directory: {}", parent_dir(path).display()))?;

    let lock_path = lock_path(path);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(backend)
        .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
    let mut lock = fd_lock::RwLock::new(file);
    let _guard = lock
        .write()
        .map_err(backend)
        .with_context(|| format!("Failed to lock state file: {}", path.display()))?;
    tracing::debug!(path = %lock_path.display(), "state lock acquired");

    f()
}

/// Load the store from `path`. A missing file is an empty store.
pub fn load(path: &Path) -> Result<InMemoryStore> {
    if !path.exists() {
        return Ok(InMemoryStore::new());
    }
    let raw = fs::read_to_string(path)
        .map_err(backend)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .map_err(|e| EngineError::from(StoreError::Corrupt(e.to_string())))
        .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
    InMemoryStore::from_snapshot(snapshot)
        .map_err(EngineError::from)
        .with_context(|| format!("Inconsistent state file: {}", path.display()))
}

/// Write the store to `path`, replacing it only once the new content is complete.
pub fn save(path: &Path, store: &InMemoryStore) -> Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let json = serde_json::to_string_pretty(&store.snapshot())?;
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(backend)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .map_err(backend)
        .with_context(|| format!("Failed to write file: {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| backend(e.error))
        .with_context(|| format!("Failed to replace state file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}

fn backend(err: std::io::Error) -> EngineError {
    StoreError::Backend(err.to_string()).into()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}
