// # OVH DynHost Provider
//
// DynDNS-protocol client for OVH DynHost records.
//
// ## Protocol
//
// One authenticated GET per update:
//
// ```http
// GET /nic/update?system=dyndns&hostname=<host>&myip=<ip>
// Authorization: Basic <user:pass>
// ```
//
// The endpoint answers with a single text line (`good <ip>`, `nochg <ip>`,
// `badauth`, `nohost`, ...). This provider hands that line back untouched;
// classification and retry belong to the engine.
//
// ## Security Requirements
//
// - The password NEVER appears in logs or `Debug` output
// - Only the masked form is ever printed
//
// ## Dry-Run Mode
//
// In dry-run mode the request URL is logged and the provider answers
// `nochg <ip>` without contacting the endpoint.

use async_trait::async_trait;
use ddns_core::config::{Password, UpdateMode, UpdaterConfig};
use ddns_core::traits::{DnsProvider, ProviderResponse};
use ddns_core::{Error, Result};
use std::time::Duration;

/// HTTP timeout for one update request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDER_NAME: &str = "ovh";

/// OVH DynHost provider
///
/// Stateless and single-shot: every [`DnsProvider::update_record`] call is
/// exactly one HTTP request.
pub struct OvhProvider {
    /// DynHost login
    username: String,

    /// DynHost password
    /// ⚠️ NEVER log this value
    password: Password,

    /// Update endpoint URL
    endpoint: String,

    client: reqwest::Client,

    /// Log instead of sending
    dry_run: bool,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for OvhProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OvhProvider")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl OvhProvider {
    /// Create a new OVH provider
    ///
    /// # Errors
    ///
    /// Returns a config error if the username or password is empty, or if
    /// the HTTP client cannot be built.
    pub fn new(
        username: impl Into<String>,
        password: Password,
        endpoint: impl Into<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let username = username.into();
        if username.is_empty() {
            return Err(Error::config("OVH username cannot be empty"));
        }
        if password.is_empty() {
            return Err(Error::config("OVH password cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            username,
            password,
            endpoint: endpoint.into(),
            client,
            dry_run,
        })
    }

    /// Build the provider from the updater configuration
    pub fn from_config(config: &UpdaterConfig) -> Result<Self> {
        Self::new(
            config.username.clone(),
            config.password.clone(),
            config.endpoint.clone(),
            config.mode == UpdateMode::DryRun,
        )
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn query<'a>(hostname: &'a str, ip: &'a str) -> [(&'static str, &'a str); 3] {
        [("system", "dyndns"), ("hostname", hostname), ("myip", ip)]
    }
}

#[async_trait]
impl DnsProvider for OvhProvider {
    async fn update_record(&self, hostname: &str, ip: &str) -> Result<ProviderResponse> {
        if self.dry_run {
            let url = reqwest::Url::parse_with_params(&self.endpoint, Self::query(hostname, ip))
                .map_err(|e| Error::provider(PROVIDER_NAME, format!("Invalid endpoint: {}", e)))?;
            tracing::info!("DRY-RUN: would send GET {} as {}", url, self.username);
            return Ok(ProviderResponse::from_body(format!("nochg {}", ip)));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&Self::query(hostname, ip))
            .basic_auth(&self.username, Some(self.password.expose()))
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("Failed to read response: {}", e)))?;

        tracing::info!("OVH response: {} {}", status.as_u16(), body.trim());

        Ok(ProviderResponse::new(Some(status.as_u16()), body))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
