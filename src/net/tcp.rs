use async_trait::async_trait;
use core::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::ToSocketAddrs as TokioToSocketAddrs;
use tokio::net::{TcpListener as TokioTcpListener, TcpStream as TokioTcpStream};
use turmoil::ToSocketAddrs as TurmoilToSocketAddrs;
use turmoil::net::{TcpListener as TurmoilTcpListener, TcpStream as TurmoilTcpStream};

/// Outbound half of the transport seam. The transfer loops are generic over
/// this so the same role code runs on real sockets and inside a turmoil
/// simulation.
#[async_trait]
pub trait ConnectStream: AsyncRead + AsyncWrite + Unpin + Send + Sized {
    async fn connect(addr: &str) -> std::io::Result<Self>;
}

#[async_trait]
impl ConnectStream for TokioTcpStream {
    async fn connect(addr: &str) -> std::io::Result<Self> {
        TokioTcpStream::connect(addr).await
    }
}

#[async_trait]
impl ConnectStream for TurmoilTcpStream {
    async fn connect(addr: &str) -> std::io::Result<Self> {
        TurmoilTcpStream::connect(addr).await
    }
}

/// Inbound half of the transport seam.
#[async_trait]
pub trait Listener: Send + Sync + Unpin + Sized {
    type Stream: ConnectStream;

    async fn bind<T: TokioToSocketAddrs + TurmoilToSocketAddrs + Send>(
        addr: T,
    ) -> std::io::Result<Self>;
    async fn accept(&self) -> std::io::Result<(Self::Stream, SocketAddr)>;
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

#[async_trait]
impl Listener for TokioTcpListener {
    type Stream = TokioTcpStream;

    async fn bind<T: TokioToSocketAddrs + TurmoilToSocketAddrs + Send>(
        addr: T,
    ) -> std::io::Result<Self> {
        TokioTcpListener::bind(addr).await
    }

    async fn accept(&self) -> std::io::Result<(Self::Stream, SocketAddr)> {
        self.accept().await
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.local_addr()
    }
}

#[async_trait]
impl Listener for TurmoilTcpListener {
    type Stream = TurmoilTcpStream;

    async fn bind<T: TokioToSocketAddrs + TurmoilToSocketAddrs + Send>(
        addr: T,
    ) -> std::io::Result<Self> {
        TurmoilTcpListener::bind(addr).await
    }

    async fn accept(&self) -> std::io::Result<(Self::Stream, SocketAddr)> {
        self.accept().await
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.local_addr()
    }
}
