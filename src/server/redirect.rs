//! Transparent redirect ingress
//!
//! Connections arrive here because a firewall rule rewrote their
//! destination. The original destination is recovered from the kernel and
//! reached through the upstream SOCKS5 dialer.

use crate::redirect::OriginalDstResolver;
use crate::socks::{relay_tcp, TargetAddr};
use crate::transport::Dialer;
use anyhow::{Context, Result};
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Handle one redirected connection
pub async fn handle_redirect_conn<R, D>(stream: TcpStream, resolver: &R, dialer: &D) -> Result<()>
where
    R: OriginalDstResolver,
    D: Dialer,
{
    let original = resolver
        .original_dst(&stream)
        .context("Failed to recover original destination")?;
    let target = TargetAddr::from(original);

    info!("Redirected connection to {}", target);

    let upstream = dialer
        .dial(&target)
        .await
        .with_context(|| format!("Failed to connect to {}", target))?;

    let stats = relay_tcp(stream, upstream).await;
    debug!(
        "Closed redirected tunnel to {}: {} bytes up, {} bytes down",
        target, stats.a_to_b, stats.b_to_a
    );

    Ok(())
}
