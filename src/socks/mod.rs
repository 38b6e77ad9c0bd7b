//! SOCKS5 module for Socksrelay
//!
//! This module implements the SOCKS5 wire protocol pieces used by the
//! ingress handlers: method negotiation, CONNECT request framing, replies,
//! the client side used toward upstream proxies, and the tunnel pump.

mod client;
mod command;
mod consts;
mod handshake;
mod tcp_relay;
mod types;

pub use client::connect_through;
pub use command::{build_reply, read_request, send_reply, send_success, RequestFraming, SocksRequest};
pub use consts::*;
pub use handshake::{classify, negotiate, FirstPacket};
pub use tcp_relay::{relay_tcp, RelayStats};
pub use types::TargetAddr;
