use crate::net::ConnectStream;
use crate::perf::report::TransferSummary;
use crate::perf::{ACK, CHUNK_SIZE, MARKER};
use anyhow::{Context, Result, bail};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

/// Connects to `host:port` and pushes payload for `duration`. The connection
/// closes when the stream drops on return, which is the close the receiver's
/// final read waits for. That close therefore precedes the caller printing
/// the summary; the wire only requires it to follow the ack.
pub async fn run<S: ConnectStream>(
    host: &str,
    port: u16,
    duration: Duration,
) -> Result<TransferSummary> {
    let addr = format!("{}:{}", host, port);
    let mut stream = S::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;
    info!("connected to {}", addr);

    transfer(&mut stream, duration).await
}

/// Writes zero-filled chunks until `duration` elapses, then runs the
/// termination handshake. The duration bound is only checked after each
/// completed write, so at least one chunk always goes out.
pub async fn transfer<S>(stream: &mut S, duration: Duration) -> Result<TransferSummary>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let chunk = [0u8; CHUNK_SIZE];
    let mut bytes: u64 = 0;
    let start = Instant::now();
    loop {
        stream
            .write_all(&chunk)
            .await
            .context("failed to write chunk")?;
        bytes += chunk.len() as u64;
        if start.elapsed() >= duration {
            break;
        }
    }
    info!("sent {} payload bytes, sending termination marker", bytes);

    stream
        .write_all(&[MARKER])
        .await
        .context("failed to write termination marker")?;

    let mut ack = [0u8; 1];
    stream
        .read_exact(&mut ack)
        .await
        .context("failed to read ack")?;
    let elapsed = start.elapsed();
    if ack[0] != ACK {
        bail!("unexpected ack byte {:#04x}", ack[0]);
    }
    info!("ack received, session took {:?}", elapsed);

    Ok(TransferSummary { bytes, elapsed })
}
