//! `SO_ORIGINAL_DST` lookup through netfilter

use super::parse_original_dst;
use crate::error::RelayError;
use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::os::unix::io::AsRawFd;
use tokio::net::TcpStream;

/// From `linux/netfilter_ipv4.h`
const SO_ORIGINAL_DST: libc::c_int = 80;

pub(super) fn original_dst(stream: &TcpStream) -> Result<SocketAddr, RelayError> {
    let socket = socket2::SockRef::from(stream);
    socket
        .set_nonblocking(true)
        .map_err(RelayError::RedirectLookup)?;

    let mut raw = [0u8; 16];
    let mut len = raw.len() as libc::socklen_t;

    // SAFETY: `raw` outlives the call and `len` holds its exact size
    let rc = unsafe {
        libc::getsockopt(
            stream.as_raw_fd(),
            libc::IPPROTO_IP,
            SO_ORIGINAL_DST,
            raw.as_mut_ptr() as *mut libc::c_void,
            &mut len,
        )
    };
    if rc != 0 {
        return Err(RelayError::RedirectLookup(io::Error::last_os_error()));
    }

    let addr = decode_sockaddr_in(&raw, len as usize)?;
    tracing::trace!("Original destination of {:?} is {}", stream.peer_addr(), addr);

    Ok(SocketAddr::V4(addr))
}

/// Check that the kernel answered with an IPv4 `sockaddr_in` before parsing
fn decode_sockaddr_in(raw: &[u8; 16], len: usize) -> Result<SocketAddrV4, RelayError> {
    // family + port + address
    if len < 8 {
        return Err(RelayError::RedirectLookup(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("short original destination: {} bytes", len),
        )));
    }

    let family = u16::from_ne_bytes([raw[0], raw[1]]);
    if family != libc::AF_INET as u16 {
        return Err(RelayError::RedirectLookup(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("original destination is not IPv4 (family {})", family),
        )));
    }

    Ok(parse_original_dst(raw))
}
