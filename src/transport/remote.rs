//! Dialer for a fixed remote relay
//!
//! Every connection goes to the same relay regardless of destination; the
//! caller forwards the destination itself as pre-framed address bytes.

use super::{Dialer, TcpDialer, UpstreamAddr};
use crate::error::RelayError;
use crate::socks::TargetAddr;
use async_trait::async_trait;
use tokio::net::TcpStream;

/// Connects to the configured remote relay
#[derive(Debug, Clone)]
pub struct RemoteDialer {
    remote: UpstreamAddr,
    tcp: TcpDialer,
}

impl RemoteDialer {
    /// Create a dialer for the relay at `remote`
    pub fn new(remote: UpstreamAddr, tcp: TcpDialer) -> Self {
        RemoteDialer { remote, tcp }
    }
}

#[async_trait]
impl Dialer for RemoteDialer {
    type Stream = TcpStream;

    async fn dial(&self, target: &TargetAddr) -> Result<Self::Stream, RelayError> {
        let stream = self.tcp.connect_upstream(&self.remote).await?;
        tracing::debug!("Forwarding {} to relay {}", target, self.remote.addr());
        Ok(stream)
    }
}
