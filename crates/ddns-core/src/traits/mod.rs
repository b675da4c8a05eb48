//! Core traits for the DDNS updater
//!
//! This module defines the abstract interfaces the polling loop drives.
//!
//! - [`IpLookup`]: Ask one "what is my IP" service for the public address
//! - [`DnsProvider`]: Push a dynamic-DNS update and hand back the raw answer
//! - [`StateStore`]: Persist the last confirmed `{hostname, ip, timestamp}`

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::IpLookup;
pub use dns_provider::{DnsProvider, ProviderResponse, ResponseClass};
pub use state_store::{PersistedState, StateStore};
