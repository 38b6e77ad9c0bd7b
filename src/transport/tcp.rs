//! Direct TCP dialer
//!
//! Connects straight to the destination, or to a configured upstream hop.

use super::{Dialer, SocketOpts, UpstreamAddr};
use crate::config::TcpConfig;
use crate::error::RelayError;
use crate::socks::TargetAddr;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// Dials plain TCP connections with a timeout and socket options
#[derive(Debug, Clone)]
pub struct TcpDialer {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout
    connect_timeout: Duration,
}

impl TcpDialer {
    /// Create a new TCP dialer from configuration
    pub fn new(config: &TcpConfig) -> Self {
        TcpDialer {
            socket_opts: SocketOpts::from_tcp_config(config),
            connect_timeout: Duration::from_secs(config.connect_timeout),
        }
    }

    /// Create a new TCP dialer with default options
    pub fn with_defaults() -> Self {
        TcpDialer::new(&TcpConfig::default())
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connect to a resolved address
    pub async fn connect(&self, addr: SocketAddr) -> Result<TcpStream, RelayError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| RelayError::Timeout(format!("connecting to {}", addr)))??;

        if let Err(e) = self.socket_opts.apply(&stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }

        tracing::debug!("TCP connection established to {}", addr);

        Ok(stream)
    }

    /// Connect to a configured upstream hop
    pub async fn connect_upstream(&self, upstream: &UpstreamAddr) -> Result<TcpStream, RelayError> {
        let resolved = upstream.resolve().await?;
        match self.connect(resolved).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                // The hop may have moved; look it up again next time
                upstream.invalidate().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, target: &TargetAddr) -> Result<Self::Stream, RelayError> {
        let resolved = target.resolve().await?;
        self.connect(resolved).await
    }
}
