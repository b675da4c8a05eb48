// # ddns-core
//
// Core library for the OVH DynHost polling updater.
//
// ## Architecture Overview
//
// - **IpLookup**: Trait for asking one "what is my IP" service
// - **DnsProvider**: Trait for pushing a dynamic-DNS update
// - **StateStore**: Trait for the persisted `{hostname, ip, timestamp}` record
// - **engine::decide**: Pure update decision (IP changed, or force threshold due)
// - **engine::RetryController**: Bounded attempts with a fixed, interruptible gap
// - **engine::resolve**: Round-robin resolution with a caller-owned rotation index
// - **DdnsEngine**: The polling loop tying the above together
// - **shutdown**: Cooperative stop token checked at loop checkpoints
//
// ## Design Principles
//
// 1. **Pure core**: The decision is a function of its inputs; I/O sits behind traits
// 2. **Bounded everything**: Attempts are counted, network calls time out, sleeps are interruptible
// 3. **Single loop**: One cycle at a time, no concurrent updates
// 4. **Library-First**: The daemon is a thin wrapper over this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod shutdown;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, Password, UpdateMode, UpdaterConfig};
pub use engine::{CycleOutcome, DdnsEngine, EngineEvent};
pub use error::{Error, Result};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{DnsProvider, IpLookup, PersistedState, ProviderResponse, StateStore};
