//! Test utilities for Socksrelay
//!
//! This module provides common test utilities used across integration tests.

use socksrelay::redirect::OriginalDstResolver;
use socksrelay::server::{serve_local, serve_redirect, serve_socks5};
use socksrelay::transport::{RemoteDialer, Socks5Dialer, TcpDialer, UpstreamAddr};
use socksrelay::RelayError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Handshake deadline used by test relays
pub const TEST_HANDSHAKE_DEADLINE: Option<Duration> = Some(Duration::from_secs(5));

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a server that echoes everything back on every connection
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    addr
}

/// Start a direct SOCKS5 relay
pub async fn spawn_socks5_relay(shutdown_rx: broadcast::Receiver<bool>) -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    let dialer = Arc::new(TcpDialer::with_defaults());
    tokio::spawn(serve_socks5(
        listener,
        dialer,
        TEST_HANDSHAKE_DEADLINE,
        shutdown_rx,
    ));
    addr
}

/// Start a local forwarder relaying to `remote`
pub async fn spawn_local_forwarder(
    remote: SocketAddr,
    shutdown_rx: broadcast::Receiver<bool>,
) -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    let dialer = Arc::new(RemoteDialer::new(
        UpstreamAddr::from(remote),
        TcpDialer::with_defaults(),
    ));
    tokio::spawn(serve_local(
        listener,
        dialer,
        TEST_HANDSHAKE_DEADLINE,
        shutdown_rx,
    ));
    addr
}

/// Start a redirect listener that proxies through `proxy`
pub async fn spawn_redirect_listener<R: OriginalDstResolver>(
    resolver: R,
    proxy: SocketAddr,
    shutdown_rx: broadcast::Receiver<bool>,
) -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    let dialer = Arc::new(Socks5Dialer::new(
        UpstreamAddr::from(proxy),
        TcpDialer::with_defaults(),
    ));
    tokio::spawn(serve_redirect(
        listener,
        Arc::new(resolver),
        dialer,
        shutdown_rx,
    ));
    addr
}

/// Resolver that reports the same destination for every connection
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub SocketAddr);

impl OriginalDstResolver for FixedResolver {
    fn original_dst(&self, _stream: &TcpStream) -> Result<SocketAddr, RelayError> {
        Ok(self.0)
    }
}

/// Encode a CONNECT request for an IPv4 destination
pub fn connect_request(target: SocketAddr) -> Vec<u8> {
    let mut request = vec![0x05, 0x01, 0x00];
    request.extend_from_slice(&pre_framed_addr(target));
    request
}

/// Encode a bare address as sent by a local forwarder
pub fn pre_framed_addr(target: SocketAddr) -> Vec<u8> {
    match target {
        SocketAddr::V4(v4) => {
            let mut addr = vec![0x01];
            addr.extend_from_slice(&v4.ip().octets());
            addr.extend_from_slice(&v4.port().to_be_bytes());
            addr
        }
        SocketAddr::V6(v6) => {
            let mut addr = vec![0x04];
            addr.extend_from_slice(&v6.ip().octets());
            addr.extend_from_slice(&v6.port().to_be_bytes());
            addr
        }
    }
}

/// Run the no-auth greeting as a client
pub async fn socks5_greet(stream: &mut TcpStream) {
    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut selection = [0u8; 2];
    stream.read_exact(&mut selection).await.unwrap();
    assert_eq!(selection, [0x05, 0x00]);
}

/// Read a 10-byte IPv4 reply and return its code
pub async fn read_reply_code(stream: &mut TcpStream) -> u8 {
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], 0x05);
    reply[1]
}

/// Write `data` and expect it echoed back
pub async fn assert_echo(stream: &mut TcpStream, data: &[u8]) {
    stream.write_all(data).await.unwrap();
    let mut echoed = vec![0u8; data.len()];
    stream.read_exact(&mut echoed).await.unwrap();
    assert_eq!(echoed, data);
}
