//! Index file I/O.
//!
//! Reads are plain whole-file reads. Writes go to a `<name>.tmp` sibling,
//! are fsynced, then renamed over the target, so a reader sees either the
//! old file or the new one. An advisory exclusive lock on a `<name>.lock`
//! sidecar serializes writers across processes.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{NotFoundError, Result, StorageError};

/// Reads the whole index file.
pub(crate) fn read_index_file(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => {
            debug!(bytes = bytes.len(), "Index file read");
            Ok(bytes)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(NotFoundError::index(path).into()),
        Err(e) => Err(e.into()),
    }
}

/// Atomically replaces the index file with `bytes`.
pub(crate) fn write_index_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let lock_path = sibling(path, "lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    if lock.try_lock_exclusive().is_err() {
        return Err(StorageError::Locked(path.to_path_buf()).into());
    }

    let result = write_then_rename(path, bytes);

    if let Err(e) = lock.unlock() {
        warn!(error = %e, lock = %lock_path.display(), "Failed to release index lock");
    }
    result
}

fn write_then_rename(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = sibling(path, "tmp");
    let outcome = (|| -> io::Result<()> {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = outcome {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!(error = %cleanup, tmp = %tmp_path.display(), "Failed to remove temporary index file");
            }
        }
        return Err(e.into());
    }
    Ok(())
}

/// `dir/name.ext` → `dir/name.ext.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
