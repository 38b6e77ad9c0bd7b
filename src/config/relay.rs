//! Relay configuration types
//!
//! Defines the root configuration and one section per ingress mode.

use super::TcpConfig;
use crate::helper::DEFAULT_HANDSHAKE_TIMEOUT_SECS;
use crate::socks::TargetAddr;
use serde::{Deserialize, Serialize};

/// Default handshake deadline in seconds
fn default_handshake_timeout() -> u64 {
    DEFAULT_HANDSHAKE_TIMEOUT_SECS
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Deadline for negotiation and request parsing, in seconds (0 disables)
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout: u64,

    /// Outbound socket options
    #[serde(default)]
    pub tcp: TcpConfig,

    /// SOCKS5 server, also accepting pre-framed requests
    #[serde(default)]
    pub socks5: Option<Socks5Config>,

    /// Local SOCKS5 front-end forwarding to a remote relay
    #[serde(default)]
    pub local: Option<LocalConfig>,

    /// Transparent redirect listener
    #[serde(default)]
    pub redirect: Option<RedirectConfig>,
}

/// SOCKS5 server configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Socks5Config {
    /// Listen address (e.g., "0.0.0.0:12948")
    pub listen: String,
}

/// Local forwarder configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LocalConfig {
    /// Listen address for local SOCKS5 clients
    pub listen: String,

    /// Remote relay that accepts pre-framed requests
    pub remote_addr: String,
}

/// Transparent redirect configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RedirectConfig {
    /// Listen address targeted by the kernel redirect rule
    pub listen: String,

    /// Upstream SOCKS5 proxy used to reach original destinations
    pub proxy_addr: String,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.socks5.is_none() && self.local.is_none() && self.redirect.is_none() {
            return Err(
                "No ingress configured; add a [socks5], [local] or [redirect] section".to_string(),
            );
        }

        let mut fields = Vec::new();
        if let Some(socks5) = &self.socks5 {
            fields.push(("socks5.listen", &socks5.listen));
        }
        if let Some(local) = &self.local {
            fields.push(("local.listen", &local.listen));
            fields.push(("local.remote_addr", &local.remote_addr));
        }
        if let Some(redirect) = &self.redirect {
            fields.push(("redirect.listen", &redirect.listen));
            fields.push(("redirect.proxy_addr", &redirect.proxy_addr));
        }

        for (name, value) in fields {
            TargetAddr::parse(value)
                .map_err(|e| format!("{} must be host:port, got {:?}: {}", name, value, e))?;
        }

        Ok(())
    }
}
