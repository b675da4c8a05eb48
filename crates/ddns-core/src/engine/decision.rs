//! Update decision
//!
//! Pure function of the resolved IP, the persisted record, the current instant
//! and the force threshold. No I/O, so every branch is testable directly.

use chrono::{DateTime, Utc};

use crate::traits::PersistedState;

/// Outcome of [`decide`] for one poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDecision {
    /// IP resolved this cycle
    pub current_ip: String,
    /// Whether the provider must be called
    pub should_update: bool,
    /// The force threshold is due (or the age of the last update is unknown)
    pub is_forced: bool,
    /// The resolved IP differs from the persisted one
    pub ip_changed: bool,
    /// Age of the last confirmed update, when the timestamp parsed
    pub elapsed: Option<chrono::Duration>,
}

/// Decide whether this cycle must push an update
///
/// - Empty or unparseable timestamp: force is due
/// - Otherwise force is due iff `now - timestamp >= force_threshold`
/// - `should_update = ip changed || force due`
pub fn decide(
    current_ip: &str,
    state: &PersistedState,
    now: DateTime<Utc>,
    force_threshold: chrono::Duration,
) -> UpdateDecision {
    let elapsed = state.last_updated().map(|at| now.signed_duration_since(at));
    let is_forced = match elapsed {
        Some(elapsed) => elapsed >= force_threshold,
        None => true,
    };
    let ip_changed = current_ip != state.ip;

    UpdateDecision {
        current_ip: current_ip.to_string(),
        should_update: ip_changed || is_forced,
        is_forced,
        ip_changed,
        elapsed,
    }
}

/// `HH:MM:SS`; hours are not wrapped at 24. Negative ages render as zero.
pub fn format_elapsed(elapsed: chrono::Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
