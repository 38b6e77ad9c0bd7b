//! Fallback for platforms without a redirect lookup

use crate::error::RelayError;
use std::net::SocketAddr;
use tokio::net::TcpStream;

pub(super) fn original_dst(_stream: &TcpStream) -> Result<SocketAddr, RelayError> {
    Err(RelayError::RedirectUnsupported)
}
