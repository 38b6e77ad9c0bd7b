//! Local forwarder ingress
//!
//! Acts as a SOCKS5 server for local clients but does not reach the
//! destination itself. The client is told the connection succeeded right
//! away, and the request's address bytes plus any early payload are sent
//! pre-framed to a remote relay, which dials on the client's behalf.

use crate::helper::with_deadline;
use crate::socks::{negotiate, read_request, relay_tcp, send_success, RequestFraming, REQUEST_BUF_LEN};
use crate::transport::Dialer;
use anyhow::{Context, Result};
use bytes::{BufMut, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Handle one local SOCKS5 client
pub async fn handle_local_conn<S, D>(
    mut stream: S,
    dialer: &D,
    handshake_deadline: Option<Duration>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    D: Dialer,
{
    let mut buf = [0u8; REQUEST_BUF_LEN];

    let request = with_deadline(handshake_deadline, "SOCKS5 handshake", async {
        negotiate(&mut stream, &mut buf, 0).await?;
        read_request(&mut stream, &mut buf, 0, RequestFraming::Full).await
    })
    .await
    .context("SOCKS5 handshake failed")?;

    // The remote relay reports failures by closing the tunnel
    send_success(&mut stream)
        .await
        .context("Failed to send SOCKS5 reply")?;

    info!("Forwarding CONNECT {}", request.target);

    let mut remote = dialer
        .dial(&request.target)
        .await
        .with_context(|| format!("Failed to reach relay for {}", request.target))?;

    let mut preamble = BytesMut::with_capacity(request.raw_addr.len() + request.extra.len());
    preamble.put_slice(&request.raw_addr);
    preamble.put_slice(&request.extra);
    remote
        .write_all(&preamble)
        .await
        .context("Failed to send request to relay")?;

    let stats = relay_tcp(stream, remote).await;
    debug!(
        "Closed forwarded tunnel to {}: {} bytes up, {} bytes down",
        request.target, stats.a_to_b, stats.b_to_a
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::MockDialer;
    use crate::socks::{TargetAddr, SOCKS5_SUCCESS_REPLY};
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_forwards_raw_address_then_payload() {
        let (mut client, server) = duplex(1024);
        let (mut relay, near) = duplex(1024);
        let dialer = MockDialer::new(near);

        let handler = tokio::spawn(async move {
            let result = handle_local_conn(server, &dialer, None).await;
            (result, dialer.dialed())
        });

        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        let mut selection = [0u8; 2];
        client.read_exact(&mut selection).await.unwrap();
        assert_eq!(selection, [0x05, 0x00]);

        let request = [
            0x05, 0x01, 0x00, 0x01, 10, 0, 0, 7, 0x00, 0x50, 0xAA, 0xBB, 0xCC,
        ];
        client.write_all(&request).await.unwrap();

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, SOCKS5_SUCCESS_REPLY);

        let mut preamble = [0u8; 10];
        relay.read_exact(&mut preamble).await.unwrap();
        assert_eq!(preamble, [0x01, 10, 0, 0, 7, 0x00, 0x50, 0xAA, 0xBB, 0xCC]);

        relay.write_all(b"pong").await.unwrap();
        let mut pong = [0u8; 4];
        client.read_exact(&mut pong).await.unwrap();
        assert_eq!(&pong, b"pong");

        drop(client);

        let (result, dialed) = handler.await.unwrap();
        result.unwrap();
        assert_eq!(dialed, vec![TargetAddr::parse("10.0.0.7:80").unwrap()]);
    }

    #[tokio::test]
    async fn test_reply_precedes_relay_failure() {
        let (mut client, server) = duplex(1024);
        let dialer = MockDialer::refusing();

        let handler = tokio::spawn(async move { handle_local_conn(server, &dialer, None).await });

        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        let mut selection = [0u8; 2];
        client.read_exact(&mut selection).await.unwrap();

        let mut request = vec![0x05, 0x01, 0x00, 0x03, 11];
        request.extend_from_slice(b"example.com");
        request.extend_from_slice(&443u16.to_be_bytes());
        client.write_all(&request).await.unwrap();

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, SOCKS5_SUCCESS_REPLY);

        assert!(handler.await.unwrap().is_err());

        // Nothing follows the success reply; the connection just closes
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_version() {
        let (mut client, server) = duplex(1024);
        let dialer = MockDialer::refusing();

        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();

        let err = handle_local_conn(server, &dialer, None).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Unsupported SOCKS version: 4"));
    }
}
