//! Direct SOCKS5 ingress
//!
//! Serves regular SOCKS5 clients and, on the same port, peers that skip the
//! greeting and send a bare address followed by payload (see the local
//! forwarder). Destinations are dialed with the configured dialer.

use crate::error::{RelayError, Socks5ReplyCode};
use crate::helper::{read_at_least, with_deadline};
use crate::socks::{
    classify, negotiate, read_request, relay_tcp, send_reply, send_success, FirstPacket,
    RequestFraming, REQUEST_BUF_LEN,
};
use crate::transport::Dialer;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Handle one connection on the combined SOCKS5 port
pub async fn handle_socks5_conn<S, D>(
    mut stream: S,
    dialer: &D,
    handshake_deadline: Option<Duration>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    D: Dialer,
{
    let mut buf = [0u8; REQUEST_BUF_LEN];

    let (first, request) = with_deadline(handshake_deadline, "SOCKS5 handshake", async {
        let filled = read_at_least(&mut stream, &mut buf, 0, 2).await?;
        let first = classify(&buf[..filled]);

        let request = match first {
            FirstPacket::Greeting => {
                negotiate(&mut stream, &mut buf, filled).await?;
                read_request(&mut stream, &mut buf, 0, RequestFraming::Full).await?
            }
            FirstPacket::PreFramedRequest => {
                read_request(&mut stream, &mut buf, filled, RequestFraming::PreFramed).await?
            }
        };

        Ok::<_, RelayError>((first, request))
    })
    .await
    .context("SOCKS5 handshake failed")?;

    info!("CONNECT {} ({:?})", request.target, first);

    let mut upstream = match dialer.dial(&request.target).await {
        Ok(upstream) => upstream,
        Err(e) => {
            if first == FirstPacket::Greeting {
                let code = Socks5ReplyCode::from(&e);
                if let Err(reply_err) = send_reply(&mut stream, code).await {
                    debug!("Failed to send {:?} reply: {}", code, reply_err);
                }
            }
            return Err(e).with_context(|| format!("Failed to connect to {}", request.target));
        }
    };

    if first == FirstPacket::Greeting {
        send_success(&mut stream)
            .await
            .context("Failed to send SOCKS5 reply")?;
    }

    if !request.extra.is_empty() {
        upstream
            .write_all(&request.extra)
            .await
            .context("Failed to forward buffered payload")?;
    }

    let stats = relay_tcp(stream, upstream).await;
    debug!(
        "Closed tunnel to {}: {} bytes up, {} bytes down",
        request.target, stats.a_to_b, stats.b_to_a
    );

    Ok(())
}
