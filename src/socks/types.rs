//! SOCKS5 address codec
//!
//! Defines [`TargetAddr`] and its wire representation:
//!
//! ```text
//! +------+----------+----------+
//! | ATYP | DST.ADDR | DST.PORT |
//! +------+----------+----------+
//! |  1   | Variable |    2     |
//! +------+----------+----------+
//! ```
//!
//! A domain address is prefixed with a single length byte, so names longer
//! than 255 bytes cannot be represented.

use super::consts::*;
use crate::error::Socks5Error;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4};

/// Destination address of a CONNECT request
///
/// Can be an IP address (v4 or v6) or a domain name. The canonical textual
/// form is `host:port` with IPv6 literals bracketed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a new TargetAddr from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        TargetAddr::Domain(domain.into(), port)
    }

    /// Parse a `host:port` string
    ///
    /// IP literals (IPv6 in brackets) become [`TargetAddr::Ip`], anything
    /// else is kept as a domain name.
    pub fn parse(host_port: &str) -> Result<Self, Socks5Error> {
        if let Ok(addr) = host_port.parse::<SocketAddr>() {
            return Ok(TargetAddr::Ip(addr));
        }

        let (host, port) = host_port
            .rsplit_once(':')
            .ok_or_else(|| Socks5Error::InvalidAddress(host_port.to_string()))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| Socks5Error::InvalidAddress(host_port.to_string()))?;

        if host.is_empty() || host.contains(':') {
            return Err(Socks5Error::InvalidAddress(host_port.to_string()));
        }
        if host.len() > MAX_DOMAIN_LEN {
            return Err(Socks5Error::DomainTooLong(host.len()));
        }

        Ok(TargetAddr::Domain(host.to_string(), port))
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Get the host part: the numeric address or the literal domain
    pub fn host(&self) -> String {
        match self {
            TargetAddr::Ip(addr) => addr.ip().to_string(),
            TargetAddr::Domain(domain, _) => domain.clone(),
        }
    }

    /// Canonical `host:port` form
    pub fn host_port(&self) -> String {
        self.to_string()
    }

    /// Get the address type byte for SOCKS5 protocol
    pub fn addr_type(&self) -> u8 {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => SOCKS5_ADDR_TYPE_IPV4,
            TargetAddr::Ip(SocketAddr::V6(_)) => SOCKS5_ADDR_TYPE_IPV6,
            TargetAddr::Domain(_, _) => SOCKS5_ADDR_TYPE_DOMAIN,
        }
    }

    /// Length of the encoded address, type tag and port included
    pub fn wire_len(&self) -> usize {
        match self {
            TargetAddr::Ip(SocketAddr::V4(_)) => IPV4_WIRE_LEN,
            TargetAddr::Ip(SocketAddr::V6(_)) => IPV6_WIRE_LEN,
            TargetAddr::Domain(domain, _) => DOMAIN_WIRE_BASE_LEN + domain.len(),
        }
    }

    /// Framing length of the address starting at `buf[offset]`
    ///
    /// Only the type tag, and for domains the length byte, need to be
    /// present.
    pub fn wire_len_at(buf: &[u8], offset: usize) -> Result<usize, Socks5Error> {
        let addr_type = *buf.get(offset).ok_or(Socks5Error::Truncated {
            needed: offset + 1,
            available: buf.len(),
        })?;

        match addr_type {
            SOCKS5_ADDR_TYPE_IPV4 => Ok(IPV4_WIRE_LEN),
            SOCKS5_ADDR_TYPE_IPV6 => Ok(IPV6_WIRE_LEN),
            SOCKS5_ADDR_TYPE_DOMAIN => {
                let domain_len = *buf.get(offset + 1).ok_or(Socks5Error::Truncated {
                    needed: offset + 2,
                    available: buf.len(),
                })?;
                Ok(DOMAIN_WIRE_BASE_LEN + domain_len as usize)
            }
            other => Err(Socks5Error::AddressTypeNotSupported(other)),
        }
    }

    /// Decode the address starting at `buf[offset]`
    ///
    /// Returns the address together with its wire length.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize), Socks5Error> {
        let len = Self::wire_len_at(buf, offset)?;
        let end = offset + len;
        if buf.len() < end {
            return Err(Socks5Error::Truncated {
                needed: end,
                available: buf.len(),
            });
        }

        let frame = &buf[offset..end];
        let port = u16::from_be_bytes([frame[len - 2], frame[len - 1]]);

        let addr = match frame[0] {
            SOCKS5_ADDR_TYPE_IPV4 => {
                TargetAddr::ipv4(Ipv4Addr::new(frame[1], frame[2], frame[3], frame[4]), port)
            }
            SOCKS5_ADDR_TYPE_IPV6 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(&frame[1..17]);
                TargetAddr::ipv6(Ipv6Addr::from(octets), port)
            }
            SOCKS5_ADDR_TYPE_DOMAIN => {
                let name = &frame[2..len - 2];
                if name.is_empty() {
                    return Err(Socks5Error::InvalidDomain(String::new()));
                }
                let domain = std::str::from_utf8(name).map_err(|_| {
                    Socks5Error::InvalidDomain(String::from_utf8_lossy(name).into_owned())
                })?;
                TargetAddr::Domain(domain.to_string(), port)
            }
            other => return Err(Socks5Error::AddressTypeNotSupported(other)),
        };

        Ok((addr, len))
    }

    /// Append the wire form of the address to `buf`
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<(), Socks5Error> {
        match self {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                buf.put_u8(SOCKS5_ADDR_TYPE_IPV4);
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                buf.put_u8(SOCKS5_ADDR_TYPE_IPV6);
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            TargetAddr::Domain(domain, port) => {
                if domain.is_empty() {
                    return Err(Socks5Error::InvalidDomain(String::new()));
                }
                if domain.len() > MAX_DOMAIN_LEN {
                    return Err(Socks5Error::DomainTooLong(domain.len()));
                }
                buf.put_u8(SOCKS5_ADDR_TYPE_DOMAIN);
                buf.put_u8(domain.len() as u8);
                buf.put_slice(domain.as_bytes());
                buf.put_u16(*port);
            }
        }
        Ok(())
    }

    /// Serialize the address to its wire form
    pub fn encode(&self) -> Result<Bytes, Socks5Error> {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Resolve the address to a SocketAddr
    ///
    /// For IP addresses, this returns immediately.
    /// For domain names, this performs DNS resolution and takes the first
    /// answer.
    pub async fn resolve(&self) -> io::Result<SocketAddr> {
        match self {
            TargetAddr::Ip(addr) => Ok(*addr),
            TargetAddr::Domain(domain, port) => tokio::net::lookup_host((domain.as_str(), *port))
                .await?
                .next()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("No addresses found for domain: {}", domain),
                    )
                }),
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}

impl From<SocketAddrV4> for TargetAddr {
    fn from(addr: SocketAddrV4) -> Self {
        TargetAddr::Ip(SocketAddr::V4(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(addr: TargetAddr) {
        let bytes = addr.encode().unwrap();
        assert_eq!(bytes.len(), addr.wire_len());

        let (decoded, len) = TargetAddr::decode(&bytes, 0).unwrap();
        assert_eq!(decoded, addr);
        assert_eq!(len, bytes.len());
    }

    #[test]
    fn test_round_trip_ipv4() {
        round_trip(TargetAddr::ipv4(Ipv4Addr::new(192, 168, 1, 1), 8080));
        round_trip(TargetAddr::ipv4(Ipv4Addr::UNSPECIFIED, 0));
    }

    #[test]
    fn test_round_trip_ipv6() {
        round_trip(TargetAddr::ipv6(Ipv6Addr::LOCALHOST, 443));
        round_trip(TargetAddr::ipv6(
            Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0x42),
            u16::MAX,
        ));
    }

    #[test]
    fn test_round_trip_domain() {
        round_trip(TargetAddr::domain("example.com", 80));
        round_trip(TargetAddr::domain("a", 1));
    }

    #[test]
    fn test_wire_len_formula() {
        assert_eq!(TargetAddr::ipv4(Ipv4Addr::LOCALHOST, 1).wire_len(), 7);
        assert_eq!(TargetAddr::ipv6(Ipv6Addr::LOCALHOST, 1).wire_len(), 19);
        assert_eq!(TargetAddr::domain("example.com", 1).wire_len(), 1 + 1 + 11 + 2);
    }

    #[test]
    fn test_domain_max_length() {
        let name = "a".repeat(MAX_DOMAIN_LEN);
        let addr = TargetAddr::domain(name.clone(), 443);
        let bytes = addr.encode().unwrap();

        assert_eq!(bytes[1], 255);
        assert_eq!(bytes.len(), 1 + 1 + 255 + 2);

        let (decoded, _) = TargetAddr::decode(&bytes, 0).unwrap();
        match decoded {
            TargetAddr::Domain(domain, port) => {
                assert_eq!(domain, name);
                assert_eq!(port, 443);
            }
            _ => panic!("Expected domain address"),
        }
    }

    #[test]
    fn test_domain_too_long_rejected() {
        let addr = TargetAddr::domain("a".repeat(256), 443);
        assert_eq!(addr.encode(), Err(Socks5Error::DomainTooLong(256)));
    }

    #[test]
    fn test_empty_domain_rejected() {
        assert!(TargetAddr::domain("", 80).encode().is_err());
        let bytes = [SOCKS5_ADDR_TYPE_DOMAIN, 0, 0, 80];
        assert!(matches!(
            TargetAddr::decode(&bytes, 0),
            Err(Socks5Error::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_decode_unsupported_type() {
        let bytes = [0x02, 127, 0, 0, 1, 0, 80];
        assert_eq!(
            TargetAddr::decode(&bytes, 0),
            Err(Socks5Error::AddressTypeNotSupported(0x02))
        );
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = [SOCKS5_ADDR_TYPE_IPV4, 127, 0, 0];
        assert_eq!(
            TargetAddr::decode(&bytes, 0),
            Err(Socks5Error::Truncated {
                needed: 7,
                available: 4
            })
        );

        assert!(matches!(
            TargetAddr::wire_len_at(&[SOCKS5_ADDR_TYPE_DOMAIN], 0),
            Err(Socks5Error::Truncated { needed: 2, .. })
        ));
    }

    #[test]
    fn test_decode_at_offset() {
        let bytes = [
            0x05, 0x01, 0x00, SOCKS5_ADDR_TYPE_IPV4, 10, 0, 0, 1, 0x00, 0x50,
        ];
        let (addr, len) = TargetAddr::decode(&bytes, 3).unwrap();
        assert_eq!(addr.to_string(), "10.0.0.1:80");
        assert_eq!(len, 7);
    }

    #[test]
    fn test_decode_invalid_utf8_domain() {
        let bytes = [SOCKS5_ADDR_TYPE_DOMAIN, 2, 0xFF, 0xFE, 0, 80];
        assert!(matches!(
            TargetAddr::decode(&bytes, 0),
            Err(Socks5Error::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_target_addr_display() {
        let addr = TargetAddr::ipv4(Ipv4Addr::new(127, 0, 0, 1), 8080);
        assert_eq!(addr.host_port(), "127.0.0.1:8080");

        let addr = TargetAddr::ipv6(Ipv6Addr::LOCALHOST, 443);
        assert_eq!(addr.host_port(), "[::1]:443");
        assert_eq!(addr.host(), "::1");

        let addr = TargetAddr::domain("test.com", 443);
        assert_eq!(addr.host_port(), "test.com:443");
    }

    #[test]
    fn test_display_is_splittable() {
        for addr in [
            TargetAddr::ipv6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1), 22),
            TargetAddr::ipv4(Ipv4Addr::new(1, 2, 3, 4), 5),
            TargetAddr::domain("example.org", 8443),
        ] {
            assert_eq!(TargetAddr::parse(&addr.host_port()).unwrap(), addr);
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TargetAddr::parse("no-port").is_err());
        assert!(TargetAddr::parse("host:99999").is_err());
        assert!(TargetAddr::parse(":80").is_err());
        assert!(TargetAddr::parse("::1:80").is_err());
    }

    #[test]
    fn test_addr_type() {
        assert_eq!(
            TargetAddr::ipv4(Ipv4Addr::LOCALHOST, 1).addr_type(),
            SOCKS5_ADDR_TYPE_IPV4
        );
        assert_eq!(
            TargetAddr::ipv6(Ipv6Addr::LOCALHOST, 1).addr_type(),
            SOCKS5_ADDR_TYPE_IPV6
        );
        assert_eq!(
            TargetAddr::domain("x", 1).addr_type(),
            SOCKS5_ADDR_TYPE_DOMAIN
        );
    }

    #[tokio::test]
    async fn test_target_addr_resolve_ip() {
        let addr = TargetAddr::ipv4(Ipv4Addr::new(127, 0, 0, 1), 8080);
        let resolved = addr.resolve().await.unwrap();
        assert_eq!(resolved.ip(), IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(resolved.port(), 8080);
    }

    #[test]
    fn test_target_addr_from_socket_addr() {
        let socket_addr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 1234);
        let target: TargetAddr = socket_addr.into();
        assert_eq!(target, TargetAddr::Ip(SocketAddr::V4(socket_addr)));
    }
}
