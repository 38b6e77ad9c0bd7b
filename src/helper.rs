//! Helper utilities for Socksrelay
//!
//! This module provides common I/O helpers used by the protocol handlers.

use crate::error::RelayError;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default handshake deadline in seconds
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

/// Read into `buf[filled..]` until at least `min` bytes are in `buf`
///
/// Single reads may return more than requested; the total number of bytes
/// now held in `buf` is returned. EOF before `min` is reached is reported as
/// [`io::ErrorKind::UnexpectedEof`].
pub async fn read_at_least<S>(
    stream: &mut S,
    buf: &mut [u8],
    mut filled: usize,
    min: usize,
) -> io::Result<usize>
where
    S: AsyncRead + Unpin + ?Sized,
{
    if min > buf.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("buffer of {} bytes cannot hold {}", buf.len(), min),
        ));
    }

    while filled < min {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream closed after {} of {} bytes", filled, min),
            ));
        }
        filled += n;
    }

    Ok(filled)
}

/// Convert a seconds setting into an optional deadline; zero disables it
pub fn deadline_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Run `fut` under an optional deadline
pub async fn with_deadline<F, T>(deadline: Option<Duration>, what: &str, fut: F) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RelayError::Timeout(format!("{} exceeded {:?}", what, limit)))?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn test_read_at_least_collects_partial_reads() {
        let mut stream = tokio_test::io::Builder::new()
            .read(&[1])
            .read(&[2, 3])
            .build();
        let mut buf = [0u8; 8];

        let n = read_at_least(&mut stream, &mut buf, 0, 2).await.unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_read_at_least_already_filled() {
        let mut stream = tokio_test::io::Builder::new().build();
        let mut buf = [7u8; 4];

        let n = read_at_least(&mut stream, &mut buf, 4, 2).await.unwrap();
        assert_eq!(n, 4);
    }

    #[tokio::test]
    async fn test_read_at_least_eof() {
        let (mut a, mut b) = duplex(16);
        a.write_all(&[5]).await.unwrap();
        drop(a);

        let mut buf = [0u8; 4];
        let err = read_at_least(&mut b, &mut buf, 0, 2).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_read_at_least_min_exceeds_buffer() {
        let mut stream = tokio_test::io::Builder::new().build();
        let mut buf = [0u8; 2];
        let err = read_at_least(&mut stream, &mut buf, 0, 3).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_deadline_from_secs() {
        assert_eq!(deadline_from_secs(0), None);
        assert_eq!(deadline_from_secs(5), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_with_deadline_expires() {
        let result: Result<(), RelayError> = with_deadline(
            Some(Duration::from_millis(10)),
            "handshake",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
        )
        .await;
        assert!(matches!(result, Err(RelayError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_with_deadline_disabled() {
        let result = with_deadline(None, "handshake", async { Ok::<_, RelayError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
