use crate::net::Listener;
use crate::perf::report::TransferSummary;
use crate::perf::{ACK, CHUNK_SIZE, MARKER};
use anyhow::{Context, Result, bail};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

/// Accepts THE client on `port` and measures everything it sends.
pub async fn run<L: Listener>(port: u16) -> Result<TransferSummary> {
    let listener = L::bind((IpAddr::from(Ipv4Addr::UNSPECIFIED), port))
        .await
        .with_context(|| format!("failed to listen on port {}", port))?;
    info!("listening on port {}", port);

    let (mut stream, peer) = listener
        .accept()
        .await
        .context("failed to accept connection")?;
    info!("accepted connection from {}", peer);

    measure(&mut stream).await
}

/// Drains payload off an accepted connection and runs the termination
/// handshake. The clock starts before the first read and stops once the
/// peer's close is observed, so the measurement covers the sender's full
/// close sequence.
pub async fn measure<S>(stream: &mut S) -> Result<TransferSummary>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let start = Instant::now();
    let bytes = drain_payload(stream).await?;
    info!("termination marker observed after {} payload bytes", bytes);

    stream
        .write_all(&[ACK])
        .await
        .context("failed to send ack")?;

    // The sender closes only after it has the ack; one more read must
    // therefore return EOF and nothing else.
    let mut buf = [0u8; 1];
    let n = stream
        .read(&mut buf)
        .await
        .context("failed to wait for peer close")?;
    if n != 0 {
        bail!("peer sent data after the termination marker");
    }
    let elapsed = start.elapsed();
    info!("peer closed, session took {:?}", elapsed);

    Ok(TransferSummary { bytes, elapsed })
}

/// Counts payload bytes until the marker byte shows up. Payload is all-zero
/// by contract, so the marker is recognized at any position in a read and a
/// marker split off or coalesced by TCP buffering is handled the same way.
async fn drain_payload<S: AsyncRead + Unpin>(stream: &mut S) -> Result<u64> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = stream
            .read(&mut buf)
            .await
            .context("failed to read from stream")?;
        if n == 0 {
            bail!("connection closed before the termination marker");
        }
        match buf[..n].iter().position(|&b| b == MARKER) {
            Some(i) => {
                if i + 1 != n {
                    bail!(
                        "{} byte(s) followed the termination marker in one read",
                        n - i - 1
                    );
                }
                total += i as u64;
                return Ok(total);
            }
            None => total += n as u64,
        }
    }
}
