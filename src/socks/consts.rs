//! SOCKS5 protocol constants
//!
//! Defines the wire constants and buffer sizes used by the relay.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Address framing lengths, including the type tag and port
/// ATYP + 4 + PORT
pub const IPV4_WIRE_LEN: usize = 1 + 4 + 2;
/// ATYP + 16 + PORT
pub const IPV6_WIRE_LEN: usize = 1 + 16 + 2;
/// ATYP + LEN + PORT, plus the domain itself
pub const DOMAIN_WIRE_BASE_LEN: usize = 1 + 1 + 2;

/// VER + CMD + RSV in front of a full request
pub const REQUEST_HEADER_LEN: usize = 3;

/// Maximum domain name length
pub const MAX_DOMAIN_LEN: usize = 255;

/// VER + NMETHODS + up to 256 methods
pub const HANDSHAKE_BUF_LEN: usize = 2 + 256;

/// Header + ATYP + LEN + 256 + PORT; large enough for any request
pub const REQUEST_BUF_LEN: usize = REQUEST_HEADER_LEN + 1 + 1 + 256 + 2;

/// Reply sent after a successful CONNECT; the bound address is a stub
pub const SOCKS5_SUCCESS_REPLY: [u8; 10] = [
    SOCKS5_VERSION,
    0x00,
    SOCKS5_RESERVED,
    SOCKS5_ADDR_TYPE_IPV4,
    0,
    0,
    0,
    0,
    0,
    0,
];
