//! SOCKS5 request parser
//!
//! Parses CONNECT requests in two framings. A full request carries the
//! version/command/reserved header:
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```
//!
//! A pre-framed request starts directly at `ATYP` and is implicitly a
//! version 5 CONNECT.

use crate::error::{RelayError, Socks5Error};
use crate::helper::read_at_least;
use crate::socks::consts::*;
use crate::socks::types::TargetAddr;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Where the address starts in a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFraming {
    /// `VER CMD RSV ATYP ...`
    Full,
    /// `ATYP ...`
    PreFramed,
}

impl RequestFraming {
    /// Index of the address type byte
    pub fn addr_offset(self) -> usize {
        match self {
            RequestFraming::Full => REQUEST_HEADER_LEN,
            RequestFraming::PreFramed => 0,
        }
    }
}

/// A parsed CONNECT request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocksRequest {
    /// Address framing exactly as received: ATYP, address and port
    pub raw_addr: Bytes,
    /// Decoded destination
    pub target: TargetAddr,
    /// Payload bytes that arrived in the same read as the request
    pub extra: Bytes,
}

impl SocksRequest {
    /// Destination in `host:port` form
    pub fn host_port(&self) -> String {
        self.target.host_port()
    }
}

/// Read and parse a CONNECT request
///
/// `buf` must hold at least [`REQUEST_BUF_LEN`] bytes; its first `filled`
/// bytes have already been read from `stream`. Anything read past the end
/// of the request is returned as [`SocksRequest::extra`].
pub async fn read_request<S>(
    stream: &mut S,
    buf: &mut [u8],
    filled: usize,
    framing: RequestFraming,
) -> Result<SocksRequest, RelayError>
where
    S: AsyncRead + Unpin,
{
    let buf = &mut buf[..REQUEST_BUF_LEN];
    let offset = framing.addr_offset();

    // Through ATYP and, for domains, the length byte
    let n = read_at_least(stream, buf, filled, offset + 2).await?;

    if framing == RequestFraming::Full {
        if buf[0] != SOCKS5_VERSION {
            return Err(Socks5Error::UnsupportedVersion(buf[0]).into());
        }
        if buf[1] != SOCKS5_CMD_TCP_CONNECT {
            return Err(Socks5Error::CommandNotSupported(buf[1]).into());
        }
    }

    let request_len = offset + TargetAddr::wire_len_at(buf, offset)?;

    if n < request_len {
        stream.read_exact(&mut buf[n..request_len]).await?;
    }

    let extra = if n > request_len {
        Bytes::copy_from_slice(&buf[request_len..n])
    } else {
        Bytes::new()
    };

    let (target, _) = TargetAddr::decode(&buf[..request_len], offset)?;
    let raw_addr = Bytes::copy_from_slice(&buf[offset..request_len]);

    debug!(
        "Parsed CONNECT to {} ({} extra bytes)",
        target,
        extra.len()
    );

    Ok(SocksRequest {
        raw_addr,
        target,
        extra,
    })
}
