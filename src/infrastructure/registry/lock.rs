//! Cross-process advisory lock over the registry.
//!
//! Uses an exclusive `flock` on a dedicated lock file. The lock is held by
//! the open file handle, so a crashed process releases it automatically when
//! the kernel closes its descriptors.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::{debug, trace};

use crate::domain::errors::{DomainError, DomainResult};

const INITIAL_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(200);

/// Held registry lock. Released on [`RegistryLock::release`] or drop.
#[derive(Debug)]
pub struct RegistryLock {
    path: PathBuf,
    file: Option<File>,
}

impl RegistryLock {
    /// Acquire the lock at `path`, waiting up to `timeout`.
    ///
    /// The file is created if needed; its contents are never read.
    pub async fn acquire(path: impl Into<PathBuf>, timeout: Duration) -> DomainResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let start = Instant::now();
        let mut backoff = INITIAL_BACKOFF;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if let Some(file) = try_lock(&path)? {
                debug!(path = %path.display(), attempts, "acquired registry lock");
                return Ok(Self {
                    path,
                    file: Some(file),
                });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(DomainError::LockTimeout { path, waited });
            }

            trace!(path = %path.display(), attempts, "registry lock busy, retrying");
            let remaining = timeout.saturating_sub(waited);
            tokio::time::sleep(backoff.min(remaining)).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Release the lock. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            // Closing the descriptor drops the flock even if unlock fails.
            let _ = FileExt::unlock(&file);
            debug!(path = %self.path.display(), "released registry lock");
        }
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn try_lock(path: &Path) -> DomainResult<Option<File>> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(file)),
        Err(err) if is_contended(&err) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
