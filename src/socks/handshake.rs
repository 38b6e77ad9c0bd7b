//! SOCKS5 method negotiation
//!
//! Handles the version identifier / method selection message. Only the
//! "no authentication" method is offered; a client that insists on another
//! method fails later when its request does not parse.
//!
//! ```text
//! +----+----------+----------+        +----+--------+
//! |VER | NMETHODS | METHODS  |   ->   |VER | METHOD |
//! +----+----------+----------+        +----+--------+
//! | 1  |    1     | 1 to 255 |        | 1  |   1    |
//! +----+----------+----------+        +----+--------+
//! ```

use super::consts::*;
use crate::error::{RelayError, Socks5Error};
use crate::helper::read_at_least;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// What the first bytes on a combined-mode port look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstPacket {
    /// A regular SOCKS5 client greeting
    Greeting,
    /// A bare address request from a peer that skips the greeting
    PreFramedRequest,
}

/// Classify the first bytes read from a combined-mode connection
///
/// A greeting starts with the protocol version; a pre-framed request starts
/// with an address type tag, none of which equals the version byte.
pub fn classify(peeked: &[u8]) -> FirstPacket {
    match peeked.first() {
        Some(&SOCKS5_VERSION) => FirstPacket::Greeting,
        _ => FirstPacket::PreFramedRequest,
    }
}

/// Negotiate the authentication method with a SOCKS5 client
///
/// `buf` must hold at least [`HANDSHAKE_BUF_LEN`] bytes; its first `filled`
/// bytes have already been read from `stream`. The greeting must arrive
/// alone: bytes beyond the announced method list are a protocol violation.
pub async fn negotiate<S>(stream: &mut S, buf: &mut [u8], filled: usize) -> Result<(), RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let buf = &mut buf[..HANDSHAKE_BUF_LEN];

    let n = read_at_least(stream, buf, filled, 2).await?;

    let version = buf[0];
    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version).into());
    }

    let expected = 2 + buf[1] as usize;
    if n < expected {
        stream.read_exact(&mut buf[n..expected]).await?;
    } else if n > expected {
        return Err(Socks5Error::ExtraHandshakeData {
            expected,
            received: n,
        }
        .into());
    }

    trace!("Client offered methods {:?}", &buf[2..expected]);

    stream
        .write_all(&[SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE])
        .await?;
    stream.flush().await?;

    Ok(())
}
