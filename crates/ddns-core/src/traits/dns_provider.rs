// # DNS Provider Trait
//
// Defines the interface for pushing a dynamic-DNS update.
//
// ## Implementations
//
// - OVH DynHost: `ddns-provider-ovh` crate
//
// ## Response Protocol
//
// DynDNS-style endpoints answer with a short text line. `good <ip>` and
// `nochg <ip>` mean the record now holds the requested address; anything else
// (`badauth`, `nohost`, `notfqdn`, `abuse`, `911`, ...) is a rejection.
//
// Providers return the raw answer. Classification happens in core so every
// provider is judged by the same rule.

use async_trait::async_trait;

/// How the provider answered an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// `good` or `nochg`: the record holds the requested IP
    Accepted,
    /// Any other answer
    Rejected,
}

/// Raw answer of one update call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    /// HTTP status, when the transport reports one
    pub status: Option<u16>,
    /// Response body, trimmed
    pub body: String,
}

impl ProviderResponse {
    /// Create a response from a status and raw body
    pub fn new(status: Option<u16>, body: impl AsRef<str>) -> Self {
        Self {
            status,
            body: body.as_ref().trim().to_string(),
        }
    }

    /// Create a response that carries only a body
    pub fn from_body(body: impl AsRef<str>) -> Self {
        Self::new(None, body)
    }

    /// Classify the answer by its leading keyword
    pub fn classify(&self) -> ResponseClass {
        if self.body.starts_with("good") || self.body.starts_with("nochg") {
            ResponseClass::Accepted
        } else {
            ResponseClass::Rejected
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.classify() == ResponseClass::Accepted
    }
}

/// Trait for DNS provider implementations
///
/// # Allowed
/// - One HTTP call to the provider's endpoint per invocation
/// - Reporting the endpoint's answer verbatim
///
/// # Forbidden
/// - Retry or backoff (owned by `RetryController`)
/// - Touching the state store (owned by `DdnsEngine`)
/// - Deciding whether an update is needed (owned by `decide`)
///
/// Return `Err` only for transport-level failures (connect, timeout, body
/// read). A rejection such as `badauth` is a successful call with an
/// unaccepted answer and must come back as `Ok`.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point `hostname` at `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderResponse)`: The endpoint answered (accepted or not)
    /// - `Err(Error)`: The endpoint could not be reached
    async fn update_record(
        &self,
        hostname: &str,
        ip: &str,
    ) -> Result<ProviderResponse, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
