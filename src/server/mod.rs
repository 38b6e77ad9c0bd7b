//! Server runtime for Socksrelay
//!
//! Binds one listener per configured ingress mode and hands every accepted
//! connection to its mode's handler on a task of its own. A broadcast
//! shutdown signal stops all accept loops; connections already being
//! relayed run until their peers close them.

mod local;
mod redirect;
mod socks5;

pub use local::handle_local_conn;
pub use redirect::handle_redirect_conn;
pub use socks5::handle_socks5_conn;

use crate::config::Config;
use crate::error::RelayError;
use crate::helper::deadline_from_secs;
use crate::redirect::{OriginalDstResolver, SystemResolver};
use crate::transport::{Dialer, RemoteDialer, Socks5Dialer, TcpDialer, UpstreamAddr};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Pause after a failed accept, e.g. when out of file descriptors
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Run every configured ingress until shutdown
///
/// All listeners are bound before any accept loop starts, so a bind
/// failure leaves nothing running behind the returned error.
pub async fn run_relay(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    config.validate().map_err(RelayError::Config)?;

    let socks5_listener = match &config.socks5 {
        Some(socks5) => Some(bind(&socks5.listen).await?),
        None => None,
    };
    let local_listener = match &config.local {
        Some(local) => Some(bind(&local.listen).await?),
        None => None,
    };
    let redirect_listener = match &config.redirect {
        Some(redirect) => Some(bind(&redirect.listen).await?),
        None => None,
    };

    let handshake_deadline = deadline_from_secs(config.handshake_timeout);
    let tcp = TcpDialer::new(&config.tcp);
    let mut listeners = Vec::new();

    if let Some(listener) = socks5_listener {
        info!("SOCKS5 server listening on {}", listener.local_addr()?);

        let dialer = Arc::new(tcp.clone());
        listeners.push(tokio::spawn(serve_socks5(
            listener,
            dialer,
            handshake_deadline,
            shutdown_rx.resubscribe(),
        )));
    }

    if let (Some(listener), Some(local)) = (local_listener, &config.local) {
        info!(
            "Local forwarder listening on {}, relaying to {}",
            listener.local_addr()?,
            local.remote_addr
        );

        let dialer = Arc::new(RemoteDialer::new(
            UpstreamAddr::new(&local.remote_addr),
            tcp.clone(),
        ));
        listeners.push(tokio::spawn(serve_local(
            listener,
            dialer,
            handshake_deadline,
            shutdown_rx.resubscribe(),
        )));
    }

    if let (Some(listener), Some(redirect)) = (redirect_listener, &config.redirect) {
        info!(
            "Redirect listener on {}, proxying through {}",
            listener.local_addr()?,
            redirect.proxy_addr
        );

        let dialer = Arc::new(Socks5Dialer::new(
            UpstreamAddr::new(&redirect.proxy_addr),
            tcp.clone(),
        ));
        listeners.push(tokio::spawn(serve_redirect(
            listener,
            Arc::new(SystemResolver),
            dialer,
            shutdown_rx.resubscribe(),
        )));
    }

    drop(shutdown_rx);

    for listener in listeners {
        listener.await.context("Listener task panicked")?;
    }

    info!("Relay stopped");
    Ok(())
}

/// Accept SOCKS5 clients, including pre-framed requests, and dial directly
pub async fn serve_socks5<D: Dialer>(
    listener: TcpListener,
    dialer: Arc<D>,
    handshake_deadline: Option<Duration>,
    shutdown_rx: broadcast::Receiver<bool>,
) {
    serve(listener, "socks5", shutdown_rx, move |stream| {
        let dialer = dialer.clone();
        async move { handle_socks5_conn(stream, dialer.as_ref(), handshake_deadline).await }
    })
    .await
}

/// Accept SOCKS5 clients and forward their requests to a remote relay
pub async fn serve_local<D: Dialer>(
    listener: TcpListener,
    dialer: Arc<D>,
    handshake_deadline: Option<Duration>,
    shutdown_rx: broadcast::Receiver<bool>,
) {
    serve(listener, "local", shutdown_rx, move |stream| {
        let dialer = dialer.clone();
        async move { handle_local_conn(stream, dialer.as_ref(), handshake_deadline).await }
    })
    .await
}

/// Accept redirected connections and reach their original destinations
pub async fn serve_redirect<R: OriginalDstResolver, D: Dialer>(
    listener: TcpListener,
    resolver: Arc<R>,
    dialer: Arc<D>,
    shutdown_rx: broadcast::Receiver<bool>,
) {
    serve(listener, "redirect", shutdown_rx, move |stream| {
        let resolver = resolver.clone();
        let dialer = dialer.clone();
        async move { handle_redirect_conn(stream, resolver.as_ref(), dialer.as_ref()).await }
    })
    .await
}

async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))
}

/// Accept loop shared by all modes
async fn serve<F, Fut>(
    listener: TcpListener,
    mode: &'static str,
    mut shutdown_rx: broadcast::Receiver<bool>,
    handler: F,
) where
    F: Fn(TcpStream) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted {} connection from {}", mode, peer);
                    let conn = handler(stream);
                    tokio::spawn(async move {
                        if let Err(e) = conn.await {
                            warn!("{} connection from {} failed: {:#}", mode, peer, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept {} connection: {}", mode, e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, closing {} listener", mode);
                break;
            }
        }
    }
}
