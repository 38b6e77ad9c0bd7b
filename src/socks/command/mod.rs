//! SOCKS5 command handling
//!
//! Parses CONNECT requests and builds replies.

mod parser;
mod reply;

pub use parser::{read_request, RequestFraming, SocksRequest};
pub use reply::{build_reply, send_reply, send_success};
