//! Dialer through an upstream SOCKS5 proxy

use super::{Dialer, TcpDialer, UpstreamAddr};
use crate::error::RelayError;
use crate::socks::{connect_through, TargetAddr};
use async_trait::async_trait;
use tokio::net::TcpStream;

/// Reaches destinations by asking an upstream SOCKS5 proxy to CONNECT
///
/// Built once at startup and shared read-only by every handler.
#[derive(Debug, Clone)]
pub struct Socks5Dialer {
    proxy: UpstreamAddr,
    tcp: TcpDialer,
}

impl Socks5Dialer {
    /// Create a dialer for the proxy at `proxy`
    pub fn new(proxy: UpstreamAddr, tcp: TcpDialer) -> Self {
        Socks5Dialer { proxy, tcp }
    }
}

#[async_trait]
impl Dialer for Socks5Dialer {
    type Stream = TcpStream;

    async fn dial(&self, target: &TargetAddr) -> Result<Self::Stream, RelayError> {
        let mut stream = self.tcp.connect_upstream(&self.proxy).await?;
        connect_through(&mut stream, target).await?;
        tracing::debug!("Connected to {} via {}", target, self.proxy.addr());
        Ok(stream)
    }
}
