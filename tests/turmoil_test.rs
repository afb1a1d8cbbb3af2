// The transfer loops are generic over the transport seam, so the exact role
// code the binary runs can be exercised on turmoil's simulated network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;
use oneperf::perf::{ACK, MARKER, receiver, sender};
use serial_test::serial;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::sleep;
use tracing::info;
use turmoil::{
    Builder, Result,
    net::{TcpListener, TcpStream},
};

const PORT: u16 = 5201;

static INIT: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
});

#[test]
#[serial]
fn single_chunk_session() -> Result {
    Lazy::force(&INIT);
    let mut sim = Builder::new().build();

    let received = Arc::new(Mutex::new(None));
    let received_in_host = received.clone();

    sim.host("server", move || {
        let received = received_in_host.clone();
        async move {
            let summary = receiver::run::<TcpListener>(PORT).await?;
            *received.lock().unwrap() = Some(summary.bytes);
            Ok(())
        }
    });

    sim.client("client", async move {
        // a zero duration trips the time bound after the first write
        let summary = sender::run::<TcpStream>("server", PORT, Duration::ZERO).await?;
        assert_eq!(summary.bytes, 1000);
        assert_eq!(summary.kilobytes(), 1);

        // let the server observe our close before the sim stops
        sleep(Duration::from_secs(1)).await;
        Ok(())
    });

    sim.run()?;
    assert_eq!(*received.lock().unwrap(), Some(1000));
    Ok(())
}

#[test]
#[serial]
fn hundred_chunk_session_reports_one_hundred_kb() -> Result {
    Lazy::force(&INIT);

    // A wall-clock duration bound sends a nondeterministic number of chunks,
    // so drive the wire protocol with a fixed count here. The buffer must
    // hold all of them: the client's writes complete before the server host
    // gets scheduled to drain.
    const CHUNKS: usize = 100;
    let mut sim = Builder::new().tcp_capacity(2 * CHUNKS).build();

    let received = Arc::new(Mutex::new(None));
    let received_in_host = received.clone();

    sim.host("server", move || {
        let received = received_in_host.clone();
        async move {
            let summary = receiver::run::<TcpListener>(PORT).await?;
            *received.lock().unwrap() = Some(summary.bytes);
            Ok(())
        }
    });

    sim.client("client", async move {
        let mut stream = TcpStream::connect(("server", PORT)).await?;
        for _ in 0..CHUNKS {
            stream.write_all(&[0u8; 1000]).await?;
        }
        stream.write_all(&[MARKER]).await?;

        let mut ack = [0u8; 1];
        stream.read_exact(&mut ack).await?;
        assert_eq!(ack[0], ACK);
        info!("ack received after {} chunks", CHUNKS);
        drop(stream);

        // let the server observe our close before the sim stops
        sleep(Duration::from_secs(1)).await;
        Ok(())
    });

    sim.run()?;

    // everything written before the marker, and nothing else, is payload
    let received = received.lock().unwrap().expect("receiver never finished");
    assert_eq!(received, 100_000);
    Ok(())
}

#[test]
#[serial]
fn receiver_fails_when_sender_drops_mid_transfer() -> Result {
    Lazy::force(&INIT);
    let mut sim = Builder::new().build();

    let failed = Arc::new(AtomicBool::new(false));
    let failed_in_host = failed.clone();

    sim.host("server", move || {
        let failed = failed_in_host.clone();
        async move {
            let res = receiver::run::<TcpListener>(PORT).await;
            assert!(res.is_err(), "receiver must not report a dropped session");
            failed.store(true, Ordering::SeqCst);
            Ok(())
        }
    });

    sim.client("client", async move {
        let mut stream = TcpStream::connect(("server", PORT)).await?;
        stream.write_all(&[0u8; 500]).await?;
        drop(stream); // gone before any marker

        sleep(Duration::from_secs(1)).await;
        Ok(())
    });

    sim.run()?;
    assert!(failed.load(Ordering::SeqCst));
    Ok(())
}

#[test]
#[serial]
fn receiver_fails_on_payload_after_marker() -> Result {
    Lazy::force(&INIT);
    let mut sim = Builder::new().build();

    let failed = Arc::new(AtomicBool::new(false));
    let failed_in_host = failed.clone();

    sim.host("server", move || {
        let failed = failed_in_host.clone();
        async move {
            let res = receiver::run::<TcpListener>(PORT).await;
            assert!(res.is_err(), "data after the marker must fail the session");
            failed.store(true, Ordering::SeqCst);
            Ok(())
        }
    });

    sim.client("client", async move {
        let mut stream = TcpStream::connect(("server", PORT)).await?;
        stream.write_all(&[0u8; 1000]).await?;
        stream.write_all(&[MARKER]).await?;
        stream.write_all(&[0u8; 10]).await?;

        sleep(Duration::from_secs(1)).await;
        Ok(())
    });

    sim.run()?;
    assert!(failed.load(Ordering::SeqCst));
    Ok(())
}
