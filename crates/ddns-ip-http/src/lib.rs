// # HTTP IP Lookup
//
// Queries plain-text "what is my IP" services (ipify, icanhazip, ident.me,
// checkip.amazonaws.com, ipinfo.io) for the machine's public address.
//
// ## Architecture
//
// One GET per call, bounded by a short timeout. The body is trimmed and,
// when non-empty, must parse as an IP address; a service that answers with
// an HTML error page is treated as failed rather than handed to the
// provider. Rotation across services lives in `ddns_core::engine::resolve`.

use async_trait::async_trait;
use ddns_core::traits::IpLookup;
use ddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Per-request timeout for IP services
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP-based public IP lookup
#[derive(Debug, Clone)]
pub struct HttpIpLookup {
    client: reqwest::Client,
}

impl HttpIpLookup {
    /// Create a lookup with the default 5 second timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_LOOKUP_TIMEOUT)
    }

    /// Create a lookup with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl IpLookup for HttpIpLookup {
    async fn lookup(&self, service: &str) -> Result<String> {
        let response = self
            .client
            .get(service)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", service, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} answered HTTP {}",
                service,
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response from {}: {}", service, e)))?;
        let text = text.trim();

        if text.is_empty() {
            tracing::debug!("{} answered with an empty body", service);
            return Ok(String::new());
        }

        let ip: IpAddr = text
            .parse()
            .map_err(|_| Error::ip_source(format!("{} returned an invalid IP address: {}", service, text)))?;

        Ok(ip.to_string())
    }
}
