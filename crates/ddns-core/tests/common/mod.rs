//! Test doubles and common utilities for engine contract tests
//!
//! Every double is `Clone` and shares its counters through `Arc`, so a test
//! can box one copy into the engine and keep another to inspect afterwards.

#![allow(dead_code)]

use ddns_core::config::EngineConfig;
use ddns_core::engine::{DdnsEngine, EngineEvent};
use ddns_core::error::{Error, Result};
use ddns_core::state::MemoryStateStore;
use ddns_core::traits::{DnsProvider, IpLookup, PersistedState, ProviderResponse, StateStore};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const HOSTNAME: &str = "home.example.com";

/// Service URLs `https://ip-0.test` .. `https://ip-{n-1}.test`
pub fn services(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://ip-{i}.test")).collect()
}

/// Engine settings with the default timings and `max_attempts` attempts
pub fn engine_config(max_attempts: u32) -> EngineConfig {
    EngineConfig {
        max_attempts,
        ..EngineConfig::default()
    }
}

/// IP lookup answering one IP for every service except those marked failing
#[derive(Clone)]
pub struct ScriptedLookup {
    ip: Arc<Mutex<String>>,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedLookup {
    pub fn answering(ip: &str) -> Self {
        Self {
            ip: Arc::new(Mutex::new(ip.to_string())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change the answer for subsequent lookups
    pub fn set_ip(&self, ip: &str) {
        *self.ip.lock().unwrap() = ip.to_string();
    }

    /// Make `service` fail from now on
    pub fn fail(&self, service: &str) {
        self.failing.lock().unwrap().insert(service.to_string());
    }

    /// Services queried so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IpLookup for ScriptedLookup {
    async fn lookup(&self, service: &str) -> Result<String> {
        self.calls.lock().unwrap().push(service.to_string());
        if self.failing.lock().unwrap().contains(service) {
            return Err(Error::ip_source(format!("{service} unavailable")));
        }
        Ok(self.ip.lock().unwrap().clone())
    }
}

/// One scripted provider answer
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with this body
    Body(String),
    /// Fail as if the endpoint were unreachable
    Unreachable,
}

impl Reply {
    pub fn body(body: &str) -> Self {
        Self::Body(body.to_string())
    }
}

/// One recorded provider call
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub hostname: String,
    pub ip: String,
    pub at: tokio::time::Instant,
}

/// Provider that replays a queue of replies, then answers `good <ip>`
#[derive(Clone)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn accepting() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(replies: Vec<Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer `body` to every call
    pub fn always(body: &str) -> Self {
        Self::scripted(vec![Reply::body(body); 64])
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for ScriptedProvider {
    async fn update_record(&self, hostname: &str, ip: &str) -> Result<ProviderResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(ProviderCall {
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            at: tokio::time::Instant::now(),
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Body(body)) => Ok(ProviderResponse::new(Some(200), body)),
            Some(Reply::Unreachable) => Err(Error::provider("scripted", "connection refused")),
            None => Ok(ProviderResponse::new(Some(200), format!("good {ip}"))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Memory store that also counts flushes and can refuse saves
#[derive(Clone, Default)]
pub struct TrackingStateStore {
    inner: MemoryStateStore,
    flush_count: Arc<AtomicUsize>,
    refuse_saves: bool,
}

impl TrackingStateStore {
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            inner: MemoryStateStore::with_state(state),
            ..Self::default()
        }
    }

    /// A store whose `save` always fails
    pub fn read_only(state: PersistedState) -> Self {
        Self {
            refuse_saves: true,
            ..Self::with_state(state)
        }
    }

    pub async fn snapshot(&self) -> PersistedState {
        self.inner.snapshot().await
    }

    pub fn save_count(&self) -> usize {
        self.inner.save_count()
    }

    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StateStore for TrackingStateStore {
    async fn load(&self) -> Result<PersistedState> {
        self.inner.load().await
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        if self.refuse_saves {
            return Err(Error::state_store("disk full"));
        }
        self.inner.save(state).await
    }

    async fn flush(&self) -> Result<()> {
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        self.inner.flush().await
    }
}

/// Build an engine over the given doubles
pub fn build_engine(
    lookup: &ScriptedLookup,
    provider: &ScriptedProvider,
    store: &TrackingStateStore,
    ip_services: Vec<String>,
    config: EngineConfig,
) -> (DdnsEngine, mpsc::Receiver<EngineEvent>) {
    DdnsEngine::new(
        Box::new(lookup.clone()),
        Box::new(provider.clone()),
        Box::new(store.clone()),
        HOSTNAME,
        ip_services,
        config,
    )
    .expect("engine construction succeeds")
}

/// Drain every event currently buffered
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
