//! # Socksrelay - SOCKS5 Relay and Transparent Proxy
//!
//! Socksrelay accepts TCP connections in one of three ingress modes and
//! splices them to their destinations:
//!
//! - **SOCKS5 server**: a no-auth SOCKS5 CONNECT server that dials
//!   destinations directly. The same port also accepts pre-framed requests
//!   (a bare SOCKS5 address followed by payload) from a local forwarder.
//! - **Local forwarder**: a SOCKS5 front-end that answers clients at once
//!   and ships each request pre-framed to a remote relay.
//! - **Transparent redirect**: recovers the original destination of
//!   kernel-redirected connections and reaches it through an upstream
//!   SOCKS5 proxy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksrelay::config::load_config;
//! use socksrelay::server::run_relay;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_relay(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! App -> [local] ==pre-framed==> [socks5] -> Target
//! App -> iptables REDIRECT -> [redirect] -> SOCKS5 proxy -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod helper;
pub mod redirect;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{RelayError, Socks5Error};
pub use server::run_relay;

/// Version of the Socksrelay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
