// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Keeps the last confirmed update across daemon restarts, one file per host.
//
// ## Crash Recovery
//
// - Atomic writes: write `<file>.tmp`, then rename over the target
// - Backup: the previous good file is copied to `<file>.backup` before each rename
// - Corruption: an unparseable file is replaced by the backup, or by the empty
//   record when the backup is unusable too. The empty record makes the next
//   cycle push an update, which is the safe direction.
//
// ## File Format
//
// ```json
// {
//   "hostname": "home.example.com",
//   "ip": "1.2.3.4",
//   "timestamp": "2026-01-09T12:00:00.000000Z"
// }
// ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{PersistedState, StateStore};

/// File-based state store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::FileStateStore;
/// use ddns_core::traits::{PersistedState, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     // Creates the file with empty values if it does not exist yet
///     let store = FileStateStore::new("/data/home.example.com.json").await?;
///
///     let state = PersistedState::confirmed("home.example.com", "1.2.3.4", chrono::Utc::now());
///     store.save(&state).await?;
///
///     assert_eq!(store.load().await?.ip, "1.2.3.4");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    current: PersistedState,
    dirty: bool,
}

/// Where the loaded record came from
#[derive(Debug, PartialEq, Eq)]
enum Loaded {
    /// Main file parsed
    Main(PersistedState),
    /// Main file absent
    Missing,
    /// Main file corrupt, backup parsed
    Backup(PersistedState),
    /// Main file corrupt, no usable backup
    Reset,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Load the existing file, falling back to the backup if it is corrupt
    /// 3. Write the file if it was missing or had to be repaired, so the file
    ///    on disk is always a well-formed record after this returns
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::state_store(format!(
                        "Failed to create state directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let loaded = Self::load_state_with_recovery(&path).await?;
        let (current, needs_write) = match loaded {
            Loaded::Main(state) => (state, false),
            Loaded::Missing => {
                tracing::info!("Initializing state file {}", path.display());
                (PersistedState::empty(), true)
            }
            Loaded::Backup(state) => (state, true),
            Loaded::Reset => (PersistedState::empty(), true),
        };

        let store = Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                current,
                dirty: needs_write,
            })),
        };

        if needs_write {
            store.write_state().await?;
        }

        Ok(store)
    }

    /// Path of the main state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the main file, recovering from backup on corruption
    async fn load_state_with_recovery(path: &Path) -> Result<Loaded, Error> {
        let err = match Self::load_state(path).await {
            Ok(Some(state)) => {
                tracing::debug!("Loaded state from {}", path.display());
                return Ok(Loaded::Main(state));
            }
            Ok(None) => return Ok(Loaded::Missing),
            Err(e) if Self::is_corruption(&e) => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "State file {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            err
        );

        let backup_path = Self::backup_path(path);
        match Self::load_state(&backup_path).await {
            Ok(Some(state)) => {
                tracing::info!("Recovered state from backup {}", backup_path.display());
                Ok(Loaded::Backup(state))
            }
            Ok(None) => {
                tracing::warn!("No backup file found. Re-initializing empty state.");
                Ok(Loaded::Reset)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also unusable: {}. Re-initializing empty state.",
                    backup_err
                );
                Ok(Loaded::Reset)
            }
        }
    }

    /// Unparseable content, as opposed to an I/O failure worth surfacing
    fn is_corruption(err: &Error) -> bool {
        match err {
            Error::Json(_) => true,
            Error::Io(io) => io.kind() == ErrorKind::InvalidData,
            _ => false,
        }
    }

    /// Read one file; `Ok(None)` when it does not exist
    async fn load_state(path: &Path) -> Result<Option<PersistedState>, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("State file does not exist: {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let state: PersistedState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Write state to file atomically
    async fn write_state(&self) -> Result<(), Error> {
        let json = {
            let guard = self.state.read().await;
            serde_json::to_string_pretty(&guard.current)
                .map_err(|e| Error::state_store(format!("Failed to serialize state: {}", e)))?
        };

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Only a parseable main file is worth keeping as the backup
        if matches!(Self::load_state(&self.path).await, Ok(Some(_))) {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        self.state.write().await.dirty = false;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        Self::sibling(&self.path, "tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        Self::sibling(path, "backup")
    }

    /// `<file>.<suffix>`, keeping the original extension so
    /// `a.example.com.json` becomes `a.example.com.json.backup`
    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<PersistedState, Error> {
        Ok(self.state.read().await.current.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), Error> {
        let previous = {
            let mut guard = self.state.write().await;
            guard.dirty = true;
            std::mem::replace(&mut guard.current, state.clone())
        };

        // Immediate write for durability
        if let Err(e) = self.write_state().await {
            // The cache must keep matching what is on disk
            let mut guard = self.state.write().await;
            guard.current = previous;
            guard.dirty = false;
            return Err(e);
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty {
            self.write_state().await
        } else {
            Ok(())
        }
    }
}
