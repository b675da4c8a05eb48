//! Core DDNS engine
//!
//! The DdnsEngine is the polling loop. Each cycle it:
//! - Resolves the public IP across the rotating service list
//! - Loads the persisted record and decides whether to update
//! - Pushes the update through the retry controller
//! - Persists the new record after the provider accepts it
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────┐
//!            │  DdnsEngine  │── EngineEvent ──▶ (monitoring)
//!            └──────┬───────┘
//!                   │
//!   ┌───────────────┼──────────────────┬──────────────────┐
//!   ▼               ▼                  ▼                  ▼
//! ┌──────────┐ ┌────────────┐ ┌──────────────────┐ ┌────────────┐
//! │ resolve  │ │  decide    │ │ RetryController  │ │ StateStore │
//! │(IpLookup)│ │  (pure)    │ │  (DnsProvider)   │ │  (save)    │
//! └──────────┘ └────────────┘ └──────────────────┘ └────────────┘
//! ```
//!
//! ## Cycle States
//!
//! `Idle → Resolving → Deciding → Updating → Persisting → Sleeping → Idle`,
//! with `Stopped` reached only through the shutdown token. Resolution failure
//! and "no update needed" both go straight to `Sleeping`; a failed update
//! never reaches `Persisting`.

pub mod decision;
pub mod resolver;
pub mod retry;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::shutdown::Shutdown;
use crate::traits::{DnsProvider, IpLookup, PersistedState, StateStore};

pub use decision::{UpdateDecision, decide, format_elapsed};
pub use resolver::{Resolution, resolve};
pub use retry::{AttemptFailure, RetryAttempt, RetryController, RetryOutcome};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { hostname: String },

    /// Public IP resolved
    IpResolved { ip: String, service: String },

    /// Every IP service failed
    ResolveFailed,

    /// No update needed this cycle
    UpdateSkipped { ip: String, elapsed_secs: i64 },

    /// Provider update started
    UpdateStarted {
        previous_ip: String,
        new_ip: String,
        forced: bool,
    },

    /// Provider accepted the update and state was saved
    UpdateSucceeded {
        ip: String,
        response: String,
        attempts: u32,
    },

    /// Provider update failed for this cycle
    UpdateFailed {
        ip: String,
        error: String,
        attempts: u32,
    },

    /// Engine stopped
    Stopped { reason: String },
}

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No IP service answered
    ResolveFailed,
    /// IP unchanged and force threshold not due
    Unchanged { ip: String },
    /// Provider accepted and state saved
    Updated { ip: String, forced: bool, attempts: u32 },
    /// Attempts ran out (rejection or transport)
    UpdateFailed { ip: String, attempts: u32 },
    /// Provider accepted but writing state failed
    PersistFailed { ip: String },
    /// Shutdown cut the retry sequence short
    Interrupted,
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`], passing a shutdown token
/// 3. Engine polls until the token fires, then flushes state and returns
///
/// ## Threading
///
/// One cycle at a time on the calling task. The rotation index is plain
/// engine state; nothing else touches it.
pub struct DdnsEngine {
    /// Queries one IP service
    ip_lookup: Box<dyn IpLookup>,

    /// DynDNS endpoint client
    provider: Box<dyn DnsProvider>,

    /// Persisted `{hostname, ip, timestamp}`
    state_store: Box<dyn StateStore>,

    /// Host being kept up to date
    hostname: String,

    /// IP services in rotation order
    ip_services: Vec<String>,

    /// Where the next resolution starts
    rotation_index: usize,

    retry: RetryController,

    config: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_lookup: Box<dyn IpLookup>,
        provider: Box<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        hostname: impl Into<String>,
        ip_services: Vec<String>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            ip_lookup,
            provider,
            state_store,
            hostname: hostname.into(),
            ip_services,
            rotation_index: 0,
            retry: RetryController::new(config.attempts(), config.retry_interval()),
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Index of the IP service the next cycle starts with
    pub fn rotation_index(&self) -> usize {
        self.rotation_index
    }

    /// Run the polling loop until `shutdown` fires
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Final state flush failed
    pub async fn run(&mut self, mut shutdown: Shutdown) -> Result<()> {
        info!("Starting OVH DynHost updater for: {}", self.hostname);
        self.emit_event(EngineEvent::Started {
            hostname: self.hostname.clone(),
        });

        while !shutdown.is_requested() {
            let outcome = self.run_cycle(&mut shutdown).await;
            debug!("Cycle finished: {:?}", outcome);

            if outcome == CycleOutcome::Interrupted {
                break;
            }

            if !shutdown.sleep(self.config.check_interval()).await {
                break;
            }
        }

        info!("Shutdown signal received");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        self.state_store.flush().await?;
        info!("Exited.");

        Ok(())
    }

    /// Run exactly one poll cycle, without the trailing sleep
    pub async fn run_cycle(&mut self, shutdown: &mut Shutdown) -> CycleOutcome {
        let resolution = resolve(
            self.ip_lookup.as_ref(),
            &self.ip_services,
            self.rotation_index,
        )
        .await;
        self.rotation_index = resolution.next_index;

        let Some(current_ip) = resolution.ip else {
            error!("Unable to retrieve public IP from any service");
            self.emit_event(EngineEvent::ResolveFailed);
            return CycleOutcome::ResolveFailed;
        };

        info!("Current public IP: {}", current_ip);
        self.emit_event(EngineEvent::IpResolved {
            ip: current_ip.clone(),
            service: resolution.service.unwrap_or_default(),
        });

        let state = match self.state_store.load().await {
            Ok(state) => state,
            Err(e) => {
                error!("Failed to load state, treating as never updated: {}", e);
                PersistedState::empty()
            }
        };

        let decision = decide(
            &current_ip,
            &state,
            Utc::now(),
            self.config.force_update_threshold(),
        );

        if !decision.should_update {
            let elapsed = decision.elapsed.unwrap_or_else(chrono::Duration::zero);
            info!(
                "IP unchanged ({}) and last update was {} ago at {}.",
                current_ip,
                format_elapsed(elapsed),
                state.timestamp
            );
            self.emit_event(EngineEvent::UpdateSkipped {
                ip: current_ip.clone(),
                elapsed_secs: elapsed.num_seconds(),
            });
            return CycleOutcome::Unchanged { ip: current_ip };
        }

        self.update(&state, &decision, shutdown).await
    }

    /// Push the update through the retry controller and persist on success
    async fn update(
        &self,
        state: &PersistedState,
        decision: &UpdateDecision,
        shutdown: &mut Shutdown,
    ) -> CycleOutcome {
        let current_ip = decision.current_ip.clone();

        if decision.is_forced && !decision.ip_changed {
            info!(
                "Force update triggered after {}h even if IP unchanged.",
                self.config.force_update_hours
            );
        }
        info!(
            "IP changed: {} -> {}. Updating {}…",
            display_ip(&state.ip),
            current_ip,
            self.provider.provider_name()
        );

        self.emit_event(EngineEvent::UpdateStarted {
            previous_ip: state.ip.clone(),
            new_ip: current_ip.clone(),
            forced: decision.is_forced,
        });

        let provider = self.provider.as_ref();
        let hostname = self.hostname.as_str();
        let attempt = self
            .retry
            .perform(&current_ip, shutdown, move |ip| async move {
                provider.update_record(hostname, &ip).await
            })
            .await;

        let failure = match attempt.outcome {
            RetryOutcome::Success { response } => {
                let record = PersistedState::confirmed(&self.hostname, &current_ip, Utc::now());
                if let Err(e) = self.state_store.save(&record).await {
                    error!("Provider accepted {} but saving state failed: {}", current_ip, e);
                    self.emit_event(EngineEvent::UpdateFailed {
                        ip: current_ip.clone(),
                        error: e.to_string(),
                        attempts: attempt.attempt_number,
                    });
                    return CycleOutcome::PersistFailed { ip: current_ip };
                }

                self.emit_event(EngineEvent::UpdateSucceeded {
                    ip: current_ip.clone(),
                    response,
                    attempts: attempt.attempt_number,
                });
                return CycleOutcome::Updated {
                    ip: current_ip,
                    forced: decision.is_forced,
                    attempts: attempt.attempt_number,
                };
            }
            RetryOutcome::Exhausted { last_failure } => last_failure,
            RetryOutcome::Interrupted { last_failure } => {
                self.emit_event(EngineEvent::UpdateFailed {
                    ip: current_ip,
                    error: last_failure.to_string(),
                    attempts: attempt.attempt_number,
                });
                return CycleOutcome::Interrupted;
            }
        };

        match &failure {
            AttemptFailure::Rejected(_) => {
                warn!("Provider kept rejecting {}; deferring to next cycle", current_ip)
            }
            AttemptFailure::Transport(_) => {
                warn!("Provider unreachable for {}; deferring to next cycle", current_ip)
            }
        }

        self.emit_event(EngineEvent::UpdateFailed {
            ip: current_ip.clone(),
            error: failure.to_string(),
            attempts: attempt.attempt_number,
        });

        CycleOutcome::UpdateFailed {
            ip: current_ip,
            attempts: attempt.attempt_number,
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Full or closed channel: drop the event, never block the loop
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

fn display_ip(ip: &str) -> &str {
    if ip.is_empty() { "(none)" } else { ip }
}
