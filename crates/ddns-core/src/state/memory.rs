// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Holds the record for the lifetime of the process only. Useful for tests and
// for embedding the engine where the caller persists state itself.
//
// ## Crash Behavior
//
// - State is lost on restart
// - The first cycle after a restart sees an empty record and pushes an update

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{PersistedState, StateStore};

/// In-memory state store implementation
///
/// Clones share the same record, so a test can keep a handle and inspect what
/// the engine saved.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::state::MemoryStateStore;
/// use ddns_core::traits::{PersistedState, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     store.save(&PersistedState::confirmed("h.example.com", "1.2.3.4", chrono::Utc::now())).await?;
///     assert_eq!(store.load().await?.ip, "1.2.3.4");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<PersistedState>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStateStore {
    /// Create a store holding the empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `state`
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current record
    pub async fn snapshot(&self) -> PersistedState {
        self.inner.read().await.clone()
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<PersistedState, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<(), Error> {
        *self.inner.write().await = state.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}
