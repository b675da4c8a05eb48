// # IP Lookup Trait
//
// Defines the interface for asking a single external service for the
// machine's public IP address.
//
// ## Implementations
//
// - HTTP plain-text services: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpLookup;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let lookup = /* IpLookup implementation */;
//
//     let ip = lookup.lookup("https://api.ipify.org").await?;
//     println!("public IP: {ip}");
//
//     Ok(())
// }
// ```
//
// Rotation across services is not the lookup's concern: see
// `engine::resolver::resolve`, which owns the order and the rotation index.

use async_trait::async_trait;

/// Trait for IP lookup implementations
///
/// One call queries exactly one service, once.
///
/// # Allowed
/// - A single outbound request to `service`, bounded by a timeout
///
/// # Forbidden
/// - Retrying or falling back to another service (owned by the resolver)
/// - Caching answers between calls
#[async_trait]
pub trait IpLookup: Send + Sync {
    /// Query `service` for the public IP
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The trimmed response body (may be empty)
    /// - `Err(Error)`: Transport failure, timeout, or non-success status
    async fn lookup(&self, service: &str) -> Result<String, crate::Error>;
}
