//! On-disk registry persistence.
//!
//! One JSON file per worktree root, replaced atomically on every save
//! (write to a temp file in the same directory, fsync, rename), so a crash or
//! a full disk mid-write never corrupts the previous version.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use super::lock::RegistryLock;
use crate::domain::errors::DomainResult;
use crate::domain::models::{Registry, REGISTRY_VERSION};

/// Registry file name inside the worktree root.
pub const REGISTRY_FILE: &str = ".arbor-registry.json";

/// Lock file name inside the worktree root.
pub const LOCK_FILE: &str = ".arbor-registry.lock";

/// Loads and saves the registry of one worktree root.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl RegistryStore {
    pub fn new(dir: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(REGISTRY_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Read the registry. A missing or empty file yields an empty registry.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn load(&self) -> DomainResult<Registry> {
        let path = self.registry_path();
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no registry file yet, starting empty");
                return Ok(Registry::new());
            }
            Err(err) => return Err(err.into()),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            debug!("registry file is empty, starting empty");
            return Ok(Registry::new());
        }

        let mut registry: Registry = serde_json::from_slice(&raw)?;
        if registry.version > REGISTRY_VERSION {
            warn!(
                found = registry.version,
                supported = REGISTRY_VERSION,
                "registry was written by a newer arbor; unknown fields will be preserved"
            );
        }
        if registry.repair_next_id() {
            warn!(next_id = registry.next_id, "registry next_id was behind its entries, raised");
        }
        debug!(entries = registry.entries.len(), next_id = registry.next_id, "registry loaded");
        Ok(registry)
    }

    /// Atomically replace the registry file.
    #[instrument(skip(self, registry), fields(dir = %self.dir.display(), entries = registry.entries.len()))]
    pub fn save(&self, registry: &Registry) -> DomainResult<()> {
        fs::create_dir_all(&self.dir)?;

        let mut payload = serde_json::to_vec_pretty(registry)?;
        payload.push(b'\n');

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.registry_path())?;

        debug!("registry saved");
        Ok(())
    }

    /// Acquire the advisory lock, then load.
    ///
    /// Hold the returned lock until after [`RegistryStore::save`].
    pub async fn load_with_lock(&self) -> DomainResult<(Registry, RegistryLock)> {
        let lock = RegistryLock::acquire(self.lock_path(), self.lock_timeout).await?;
        let registry = self.load()?;
        Ok((registry, lock))
    }

    /// Replace the on-disk registry with an empty one (IDs restart at 1).
    pub async fn reset(&self) -> DomainResult<Registry> {
        let (mut registry, mut lock) = self.load_with_lock().await?;
        let dropped = registry.entries.len();
        registry.reset();
        self.save(&registry)?;
        lock.release();
        info!(dropped, "registry reset");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::WorktreeEntry;

    fn store(dir: &Path) -> RegistryStore {
        RegistryStore::new(dir, Duration::from_secs(2))
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let reg = store(dir.path()).load().unwrap();
        assert!(reg.entries.is_empty());
        assert_eq!(reg.next_id, 1);
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(REGISTRY_FILE), "  \n").unwrap();
        let reg = store(dir.path()).load().unwrap();
        assert_eq!(reg, Registry::new());
    }

    #[test]
    fn test_corrupt_file_is_an_error_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE);
        fs::write(&path, "{ not json").unwrap();

        let err = store(dir.path()).load().unwrap_err();
        assert!(matches!(err, DomainError::Serialization(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());

        let mut reg = Registry::new();
        let id = reg.allocate_id();
        let mut entry = WorktreeEntry::new(id, "/code/api", "feat", "git@github.com:o/api.git");
        entry.note = Some("wip".to_string());
        reg.entries.insert("api-feat".to_string(), entry);
        s.save(&reg).unwrap();

        let loaded = s.load().unwrap();
        assert_eq!(loaded, reg);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != REGISTRY_FILE)
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        store(&nested).save(&Registry::new()).unwrap();
        assert!(nested.join(REGISTRY_FILE).exists());
    }

    #[test]
    fn test_load_raises_lagging_next_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(REGISTRY_FILE),
            r#"{"version":1,"next_id":1,"entries":{"a":{"id":5}}}"#,
        )
        .unwrap();
        let reg = store(dir.path()).load().unwrap();
        assert_eq!(reg.next_id, 6);
    }

    #[tokio::test]
    async fn test_reset_persists_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path());
        let mut reg = Registry::new();
        let id = reg.allocate_id();
        reg.entries
            .insert("a".to_string(), WorktreeEntry::new(id, "/r", "x", ""));
        s.save(&reg).unwrap();

        let reset = s.reset().await.unwrap();
        assert!(reset.entries.is_empty());
        assert_eq!(s.load().unwrap().next_id, 1);
    }
}
