//! Public IP resolution across a rotating service list
//!
//! The rotation index is passed in and handed back rather than kept in the
//! resolver, so the caller owns it across cycles and the function stays a
//! plain `(services, start) -> (ip, next)` mapping over the lookup.

use tracing::{debug, info, warn};

use crate::traits::IpLookup;

/// Result of one [`resolve`] pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved IP, `None` when every service failed or answered empty
    pub ip: Option<String>,
    /// Where the next pass should start
    pub next_index: usize,
    /// Service that answered
    pub service: Option<String>,
}

/// Try each service once, starting at `start_index` and wrapping around
///
/// On the first non-empty answer, returns it and sets `next_index` to the
/// service after the one that answered. If no service answers, `next_index`
/// is `start_index` (reduced modulo the list length).
pub async fn resolve(lookup: &dyn IpLookup, services: &[String], start_index: usize) -> Resolution {
    let count = services.len();
    if count == 0 {
        warn!("No IP services configured");
        return Resolution {
            ip: None,
            next_index: 0,
            service: None,
        };
    }

    let start = start_index % count;

    for offset in 0..count {
        let index = (start + offset) % count;
        let url = &services[index];

        match lookup.lookup(url).await {
            Ok(ip) => {
                let ip = ip.trim();
                info!("Retrieved public IP {} from {}", ip, url);
                if !ip.is_empty() {
                    return Resolution {
                        ip: Some(ip.to_string()),
                        next_index: (index + 1) % count,
                        service: Some(url.clone()),
                    };
                }
                debug!("Empty answer from {}, trying next service", url);
            }
            Err(e) => {
                warn!("IP lookup via {} failed: {}", url, e);
            }
        }
    }

    Resolution {
        ip: None,
        next_index: start,
        service: None,
    }
}
