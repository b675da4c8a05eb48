// # State Store Trait
//
// Defines the interface for persisting the last confirmed update.
//
// ## Purpose
//
// The state store remembers, across restarts:
// - The hostname being managed
// - The last IP the provider confirmed
// - When that confirmation happened
//
// The decision engine compares the freshly resolved IP and the age of the
// last confirmation against this record.
//
// ## Implementations
//
// - File-based: one JSON document per host (`FileStateStore`)
// - In-memory: `MemoryStateStore`, for tests and embedding

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// The persisted `{hostname, ip, timestamp}` record
///
/// Empty strings mean "never updated". The on-disk JSON shape is exactly these
/// three string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// The DNS host being managed
    #[serde(default)]
    pub hostname: String,
    /// Last IP the provider confirmed
    #[serde(default)]
    pub ip: String,
    /// ISO-8601 UTC instant of that confirmation
    #[serde(default)]
    pub timestamp: String,
}

impl PersistedState {
    /// The record written before the first successful update
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record a confirmed update of `hostname` to `ip` at `at`
    pub fn confirmed(hostname: impl Into<String>, ip: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            hostname: hostname.into(),
            ip: ip.into(),
            timestamp: format_timestamp(at),
        }
    }

    /// Parsed timestamp, `None` if empty or malformed
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Format an instant as RFC 3339 UTC with a `Z` suffix
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a persisted timestamp
///
/// Accepts RFC 3339 with any offset, and the naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` form (optionally `Z`-suffixed) read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Trait for state store implementations
///
/// # Allowed
/// - I/O against its own backing storage
/// - Caching the current record in memory
///
/// # Forbidden
/// - Deciding when to update (owned by `decide`)
/// - Talking to the provider
///
/// A store must hand out a well-formed record from the moment it is
/// constructed: a missing backing file is initialized to
/// [`PersistedState::empty`].
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the current record
    ///
    /// # Returns
    ///
    /// - `Ok(PersistedState)`: The record (possibly empty)
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<PersistedState, crate::Error>;

    /// Replace the record
    ///
    /// Must be atomic: a reader never observes a partially written record.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully persisted
    /// - `Err(Error)`: Storage error
    async fn save(&self, state: &PersistedState) -> Result<(), crate::Error>;

    /// Persist any pending changes
    ///
    /// Called once on shutdown.
    async fn flush(&self) -> Result<(), crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn confirmed_record_round_trips_its_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap();
        let state = PersistedState::confirmed("home.example.com", "1.2.3.4", at);

        assert_eq!(state.timestamp, "2026-01-09T12:00:00.000000Z");
        assert_eq!(state.last_updated(), Some(at));
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 15).unwrap();

        assert_eq!(parse_timestamp("2025-06-01T08:30:15"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01T08:30:15Z"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-06-01T08:30:15.250000Z").map(|t| t.timestamp()),
            Some(expected.timestamp())
        );
    }

    #[test]
    fn offsets_are_normalised_to_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 6, 30, 15).unwrap();
        assert_eq!(parse_timestamp("2025-06-01T08:30:15+02:00"), Some(expected));
    }

    #[test]
    fn empty_or_garbage_timestamps_do_not_parse() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(PersistedState::empty().last_updated(), None);
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let state: PersistedState = serde_json::from_str(r#"{"ip": "1.2.3.4"}"#).unwrap();
        assert_eq!(state.hostname, "");
        assert_eq!(state.ip, "1.2.3.4");
        assert_eq!(state.timestamp, "");
    }
}
