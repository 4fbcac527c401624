use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use tokio::task::spawn_blocking;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Failed to lock cached repository `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Lock task failed: {0}")]
    Join(String),
}

/// Acquire an exclusive lock guarding one cached working tree.
///
/// Blocks until any other method instance working on the same tree releases
/// its lock. Returns the lock file handle, which must be kept alive while the
/// tree is used; the OS releases the lock when it is dropped or the process
/// exits.
///
/// # Errors
/// Returns an error if the lock file cannot be created, cannot be locked, or
/// lock state cannot be written.
pub async fn acquire_lock(path: PathBuf) -> Result<File, LockError> {
    spawn_blocking(move || acquire_lock_sync(&path))
        .await
        .map_err(|error| LockError::Join(error.to_string()))?
}

fn acquire_lock_sync(path: &Path) -> Result<File, LockError> {
    let io_error = |source| LockError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(io_error)?;
    file.lock().map_err(io_error)?;

    // Record the holder for whoever inspects a stuck lock.
    file.set_len(0).map_err(io_error)?;
    file.seek(io::SeekFrom::Start(0)).map_err(io_error)?;
    write!(&file, "{}", std::process::id()).map_err(io_error)?;

    Ok(file)
}
