//! SOCKS5 client side
//!
//! Speaks the client half of the protocol on an already connected stream,
//! so the relay can reach a destination through an upstream SOCKS5 proxy.

use super::consts::*;
use super::types::TargetAddr;
use crate::error::{RelayError, Socks5Error, Socks5ReplyCode};
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Ask the proxy on `stream` to CONNECT to `target`
///
/// Offers only the no-auth method, sends the request with the target
/// re-encoded from its parsed form, and consumes the reply including its
/// bound address. On success the stream is ready for payload.
pub async fn connect_through<S>(stream: &mut S, target: &TargetAddr) -> Result<(), RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // Encode first so an unencodable target fails before anything is sent
    let mut request = BytesMut::with_capacity(REQUEST_HEADER_LEN + target.wire_len());
    request.put_slice(&[SOCKS5_VERSION, SOCKS5_CMD_TCP_CONNECT, SOCKS5_RESERVED]);
    target.encode_into(&mut request)?;

    // The request waits for the method selection; servers may reject a
    // greeting followed by unsolicited bytes.
    stream
        .write_all(&[SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE])
        .await?;
    stream.flush().await?;

    let mut selection = [0u8; 2];
    stream.read_exact(&mut selection).await?;
    if selection[0] != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(selection[0]).into());
    }
    if selection[1] != SOCKS5_AUTH_METHOD_NONE {
        return Err(Socks5Error::NoAcceptableMethod.into());
    }

    stream.write_all(&request).await?;
    stream.flush().await?;

    // VER REP RSV ATYP, then the rest of the bound address
    let mut reply = [0u8; REQUEST_BUF_LEN];
    stream.read_exact(&mut reply[..REQUEST_HEADER_LEN + 2]).await?;

    if reply[0] != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(reply[0]).into());
    }
    let code = Socks5ReplyCode::try_from(reply[1]).unwrap_or(Socks5ReplyCode::GeneralFailure);
    if code != Socks5ReplyCode::Succeeded {
        return Err(Socks5Error::RequestRejected(code).into());
    }

    let reply_len = REQUEST_HEADER_LEN + TargetAddr::wire_len_at(&reply, REQUEST_HEADER_LEN)?;
    stream
        .read_exact(&mut reply[REQUEST_HEADER_LEN + 2..reply_len])
        .await?;

    debug!("Upstream proxy accepted CONNECT to {}", target);

    Ok(())
}
