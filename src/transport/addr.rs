//! Upstream address with cached resolution
//!
//! Remote relays and upstream proxies are configured once as `host:port`
//! strings and dialed for every connection; the first successful lookup is
//! kept so later dials skip DNS.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configured `host:port` of an upstream hop, resolved lazily
#[derive(Debug, Clone)]
pub struct UpstreamAddr {
    /// The address string as configured
    addr: String,
    /// Cached resolved address
    cached: Arc<RwLock<Option<SocketAddr>>>,
}

impl UpstreamAddr {
    /// Create a new address without cached resolution
    pub fn new(addr: &str) -> Self {
        UpstreamAddr {
            addr: addr.to_string(),
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the configured address string
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Get the cached address if available
    pub async fn cached(&self) -> Option<SocketAddr> {
        *self.cached.read().await
    }

    /// Forget the cached address, forcing a fresh lookup on the next dial
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// Resolve the address, using the cache if populated
    pub async fn resolve(&self) -> io::Result<SocketAddr> {
        if let Some(cached) = self.cached().await {
            return Ok(cached);
        }

        let resolved = tokio::net::lookup_host(self.addr.as_str())
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("No addresses found for: {}", self.addr),
                )
            })?;

        *self.cached.write().await = Some(resolved);
        Ok(resolved)
    }
}

impl From<SocketAddr> for UpstreamAddr {
    fn from(addr: SocketAddr) -> Self {
        UpstreamAddr {
            addr: addr.to_string(),
            cached: Arc::new(RwLock::new(Some(addr))),
        }
    }
}
