//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages. The relay never reports a real bound
//! address; replies carry `0.0.0.0:0`.

use crate::error::Socks5ReplyCode;
use crate::socks::consts::*;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encode a reply with the stub bound address
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn build_reply(code: Socks5ReplyCode) -> [u8; 10] {
    let mut reply = SOCKS5_SUCCESS_REPLY;
    reply[1] = code.into();
    reply
}

/// Send a success reply
pub async fn send_success<S>(stream: &mut S) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    send_reply(stream, Socks5ReplyCode::Succeeded).await
}

/// Send a reply with the given code
pub async fn send_reply<S>(stream: &mut S, code: Socks5ReplyCode) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&build_reply(code)).await?;
    stream.flush().await
}
