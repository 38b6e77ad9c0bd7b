//! Error types for Socksrelay
//!
//! This module defines all custom error types used throughout the application.

use std::io;
use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Socks5(#[from] Socks5Error),

    /// The platform has no transparent redirect facility
    #[error("Transparent redirect is not supported on this platform")]
    RedirectUnsupported,

    /// The kernel refused to report an original destination
    #[error("Original destination lookup failed: {0}")]
    RedirectLookup(#[source] io::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl RelayError {
    /// Returns the protocol error if this is one
    pub fn as_socks5(&self) -> Option<&Socks5Error> {
        match self {
            RelayError::Socks5(e) => Some(e),
            _ => None,
        }
    }
}

/// SOCKS5 wire protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Socks5Error {
    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// The greeting carried more bytes than its method count announced
    #[error("Extra data after method selection: expected {expected} bytes, got {received}")]
    ExtraHandshakeData {
        /// Length implied by the method count
        expected: usize,
        /// Bytes actually read
        received: usize,
    },

    /// Command not supported
    #[error("Command not supported: {0}")]
    CommandNotSupported(u8),

    /// Address type not supported
    #[error("Address type not supported: {0}")]
    AddressTypeNotSupported(u8),

    /// Invalid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid domain name
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Domain does not fit in the one-byte length field
    #[error("Domain name too long: {0} bytes")]
    DomainTooLong(usize),

    /// Buffer ended before the address framing did
    #[error("Truncated address: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes the framing requires
        needed: usize,
        /// Bytes present in the buffer
        available: usize,
    },

    /// Upstream proxy refused every offered method
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Upstream proxy answered the request with a failure code
    #[error("Request rejected by upstream: {0:?}")]
    RequestRejected(Socks5ReplyCode),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for Socks5ReplyCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Socks5ReplyCode::Succeeded),
            0x01 => Ok(Socks5ReplyCode::GeneralFailure),
            0x02 => Ok(Socks5ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(Socks5ReplyCode::NetworkUnreachable),
            0x04 => Ok(Socks5ReplyCode::HostUnreachable),
            0x05 => Ok(Socks5ReplyCode::ConnectionRefused),
            0x06 => Ok(Socks5ReplyCode::TtlExpired),
            0x07 => Ok(Socks5ReplyCode::CommandNotSupported),
            0x08 => Ok(Socks5ReplyCode::AddressTypeNotSupported),
            other => Err(other),
        }
    }
}

impl From<&io::Error> for Socks5ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Socks5ReplyCode::ConnectionRefused,
            io::ErrorKind::TimedOut => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => Socks5ReplyCode::ConnectionNotAllowed,
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}

impl From<&RelayError> for Socks5ReplyCode {
    fn from(err: &RelayError) -> Self {
        match err {
            RelayError::Io(e) => Socks5ReplyCode::from(e),
            RelayError::Timeout(_) => Socks5ReplyCode::HostUnreachable,
            RelayError::Socks5(Socks5Error::AddressTypeNotSupported(_)) => {
                Socks5ReplyCode::AddressTypeNotSupported
            }
            RelayError::Socks5(Socks5Error::CommandNotSupported(_)) => {
                Socks5ReplyCode::CommandNotSupported
            }
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}
