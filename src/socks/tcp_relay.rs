//! Bidirectional tunnel between two streams
//!
//! Copies bytes both ways until either direction finishes, then closes both
//! streams. There is no half-close: EOF or an error in one direction ends
//! the whole tunnel.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Bytes moved by a finished tunnel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes copied from `a` to `b` before teardown
    pub a_to_b: u64,
    /// Bytes copied from `b` to `a` before teardown
    pub b_to_a: u64,
}

/// Relay data bidirectionally between two streams
///
/// Both directions run concurrently. As soon as one reaches EOF or fails,
/// the other is abandoned and both streams are shut down and dropped.
/// Shutdown errors are ignored since the peer may already be gone.
pub async fn relay_tcp<A, B>(a: A, b: B) -> RelayStats
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);

    let mut stats = RelayStats::default();

    {
        let a_to_b = copy_counted(&mut a_read, &mut b_write, &mut stats.a_to_b);
        let b_to_a = copy_counted(&mut b_read, &mut a_write, &mut stats.b_to_a);

        tokio::select! {
            result = a_to_b => match result {
                Ok(()) => debug!("A->B reached EOF"),
                Err(e) => debug!("A->B error: {}", e),
            },
            result = b_to_a => match result {
                Ok(()) => debug!("B->A reached EOF"),
                Err(e) => debug!("B->A error: {}", e),
            },
        }
    }

    let mut a = a_read.unsplit(a_write);
    let mut b = b_read.unsplit(b_write);
    let _ = a.shutdown().await;
    let _ = b.shutdown().await;

    debug!(
        "Tunnel closed: {} bytes A->B, {} bytes B->A",
        stats.a_to_b, stats.b_to_a
    );

    stats
}

/// Copy until EOF, keeping a running total that survives cancellation
///
/// `tokio::io::copy` only reports its count on completion, and the losing
/// direction of the `select!` in [`relay_tcp`] never completes.
async fn copy_counted<R, W>(reader: &mut R, writer: &mut W, total: &mut u64) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        *total += n as u64;
    }
}

/// Buffer size for each relay direction
const RELAY_BUFFER_SIZE: usize = 16 * 1024;
