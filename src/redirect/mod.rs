//! Original destination recovery for transparently redirected connections
//!
//! When the kernel redirects an outbound connection to the relay (for
//! example with an iptables `REDIRECT` rule), the accepted socket's local
//! address is the relay itself. The destination the client actually asked
//! for is kept by the connection tracker and has to be queried explicitly.
//!
//! Only IPv4 destinations can be recovered.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod unsupported;

use crate::error::RelayError;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::TcpStream;

/// Looks up where a redirected connection was originally headed
pub trait OriginalDstResolver: std::fmt::Debug + Send + Sync + 'static {
    /// Recover the original destination of `stream`
    fn original_dst(&self, stream: &TcpStream) -> Result<SocketAddr, RelayError>;
}

/// Resolver backed by the operating system's redirect facility
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl OriginalDstResolver for SystemResolver {
    fn original_dst(&self, stream: &TcpStream) -> Result<SocketAddr, RelayError> {
        #[cfg(target_os = "linux")]
        {
            linux::original_dst(stream)
        }

        #[cfg(not(target_os = "linux"))]
        {
            unsupported::original_dst(stream)
        }
    }
}

/// Decode the `sockaddr_in` returned by `SO_ORIGINAL_DST`
///
/// Layout: family (2 bytes, host order), port (2 bytes, network order),
/// IPv4 address (4 bytes), padding.
pub fn parse_original_dst(raw: &[u8; 16]) -> SocketAddrV4 {
    let port = u16::from_be_bytes([raw[2], raw[3]]);
    let ip = Ipv4Addr::new(raw[4], raw[5], raw[6], raw[7]);
    SocketAddrV4::new(ip, port)
}
