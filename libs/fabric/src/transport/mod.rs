use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

pub mod tcp;

pub use self::tcp::{
    TcpTransport, TcpTransportBuilder, TcpTransportListener, TcpTransportReader,
    TcpTransportWriter,
};

/// Default maximum frame payload (16 MiB)
pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Transport trait for sending and receiving raw frames
///
/// Each transport instance represents a single connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame over the transport
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive one frame from the transport
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;
}

/// Settings shared by a transport and both of its split halves
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameSettings {
    pub send_timeout: Option<Duration>,
    pub receive_timeout: Option<Duration>,
    pub max_frame_len: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            send_timeout: None,
            receive_timeout: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

fn closed_on_eof(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        err.into()
    }
}

/// Write one frame: 4-byte big-endian length prefix, then the payload
pub(crate) async fn write_frame<W>(
    writer: &mut W,
    bytes: &[u8],
    settings: &FrameSettings,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let len = u32::try_from(bytes.len())
        .ok()
        .filter(|len| *len <= settings.max_frame_len)
        .ok_or_else(|| {
            Error::InvalidFrame(format!("Message too large: {} bytes", bytes.len()))
        })?;

    let send_op = async {
        writer.write_u32(len).await?;
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok::<(), Error>(())
    };

    match settings.send_timeout {
        Some(timeout) => tokio::time::timeout(timeout, send_op)
            .await
            .map_err(|_| Error::Timeout("Send"))?,
        None => send_op.await,
    }
}

/// Read one frame written by [`write_frame`]
pub(crate) async fn read_frame<R>(reader: &mut R, settings: &FrameSettings) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + Send,
{
    let receive_op = async {
        let len = reader.read_u32().await.map_err(closed_on_eof)?;

        if len > settings.max_frame_len {
            return Err(Error::InvalidFrame(format!(
                "Message too large: {} bytes",
                len
            )));
        }

        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf).await.map_err(closed_on_eof)?;

        Ok::<Vec<u8>, Error>(buf)
    };

    match settings.receive_timeout {
        Some(timeout) => tokio::time::timeout(timeout, receive_op)
            .await
            .map_err(|_| Error::Timeout("Receive"))?,
        None => receive_op.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn length_prefix_is_big_endian() {
        let (mut client, mut server) = duplex(64);
        let settings = FrameSettings::default();

        write_frame(&mut client, b"hello", &settings).await.unwrap();

        let mut raw = [0u8; 9];
        server.read_exact(&mut raw).await.unwrap();
        assert_eq!(&raw[..4], &[0, 0, 0, 5]);
        assert_eq!(&raw[4..], b"hello");
    }

    #[tokio::test]
    async fn empty_frame_is_valid() {
        let (mut client, mut server) = duplex(64);
        let settings = FrameSettings::default();

        write_frame(&mut client, &[], &settings).await.unwrap();
        let received = read_frame(&mut server, &settings).await.unwrap();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn oversized_write_is_refused_before_touching_the_stream() {
        let (mut client, _server) = duplex(64);
        let settings = FrameSettings {
            max_frame_len: 4,
            ..FrameSettings::default()
        };

        let result = write_frame(&mut client, b"too long", &settings).await;
        assert!(matches!(result, Err(Error::InvalidFrame(_))));
    }

    #[tokio::test]
    async fn truncated_payload_reports_closed() {
        let (mut client, mut server) = duplex(64);
        client.write_u32(10).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);

        let result = read_frame(&mut server, &FrameSettings::default()).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }
}
