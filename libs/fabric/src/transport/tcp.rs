use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::transport::{read_frame, write_frame, FrameSettings, Transport};

/// TCP transport with length-prefix framing
///
/// Messages are sent with a 4-byte big-endian length prefix
pub struct TcpTransport {
    stream: TcpStream,
    settings: FrameSettings,
}

impl TcpTransport {
    /// Connect to a `host:port` address with no timeouts
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::builder().address(addr).connect().await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Create from an existing TcpStream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            settings: FrameSettings::default(),
        }
    }

    /// Get the remote address of this connection
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.stream.peer_addr().map_err(Into::into)
    }

    /// Get the local address of this connection
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.local_addr().map_err(Into::into)
    }

    /// Split into halves that can be driven from different tasks
    ///
    /// Both halves keep this transport's timeouts and frame limit. The socket
    /// closes once both halves are dropped.
    pub fn into_split(self) -> (TcpTransportReader, TcpTransportWriter) {
        let (reader, writer) = self.stream.into_split();
        (
            TcpTransportReader {
                reader,
                settings: self.settings,
            },
            TcpTransportWriter {
                writer,
                settings: self.settings,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        write_frame(&mut self.stream, bytes, &self.settings).await
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        read_frame(&mut self.stream, &self.settings).await
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Receiving half of a split [`TcpTransport`]
pub struct TcpTransportReader {
    reader: OwnedReadHalf,
    settings: FrameSettings,
}

impl TcpTransportReader {
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        read_frame(&mut self.reader, &self.settings).await
    }
}

/// Sending half of a split [`TcpTransport`]
pub struct TcpTransportWriter {
    writer: OwnedWriteHalf,
    settings: FrameSettings,
}

impl TcpTransportWriter {
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        write_frame(&mut self.writer, bytes, &self.settings).await
    }

    /// Shut down the write direction; the peer sees end of stream
    pub async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        Ok((TcpTransport::from_stream(stream), addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }
}

/// Builder for configuring TCP transport
#[derive(Default)]
pub struct TcpTransportBuilder {
    address: Option<String>,
    connect_timeout: Option<Duration>,
    settings: FrameSettings,
}

impl TcpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `host:port` address to dial; host names are resolved on connect
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.address = Some(addr.into());
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.settings.send_timeout = Some(timeout);
        self
    }

    /// Set the receive timeout
    ///
    /// A peer that sends nothing for this long is treated as gone.
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.settings.receive_timeout = Some(timeout);
        self
    }

    /// Set the largest frame payload accepted in either direction
    pub fn max_frame_len(mut self, len: u32) -> Self {
        self.settings.max_frame_len = len;
        self
    }

    /// Connect with the configured settings
    pub async fn connect(self) -> Result<TcpTransport> {
        let addr = self
            .address
            .ok_or_else(|| Error::custom("Address not set"))?;

        let connect_op = TcpStream::connect(addr.as_str());

        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect_op)
                .await
                .map_err(|_| Error::Timeout("Connect"))??,
            None => connect_op.await?,
        };
        stream.set_nodelay(true)?;

        Ok(TcpTransport {
            stream,
            settings: self.settings,
        })
    }
}
