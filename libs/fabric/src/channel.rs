use connect_core::Packet;

use crate::codec::{Codec, PacketCodec, RequestKindLookup};
use crate::error::Result;
use crate::transport::{TcpTransport, Transport};

/// High-level channel exchanging whole packets
///
/// Combines a transport and a packet codec for persistent connections. Used by
/// peers that drive a connection from a single task, such as the authority side
/// of a link.
pub struct Channel<C> {
    transport: Box<dyn Transport>,
    codec: PacketCodec<C>,
}

impl<C: Codec> Channel<C> {
    /// Create a channel from an existing transport
    pub fn from_transport(transport: impl Transport + 'static, codec: C) -> Self {
        Self {
            transport: Box::new(transport),
            codec: PacketCodec::new(codec),
        }
    }

    /// Open a TCP channel to a `host:port` address
    pub async fn tcp(addr: impl Into<String>, codec: C) -> Result<Self> {
        let transport = TcpTransport::connect(addr).await?;
        Ok(Self::from_transport(transport, codec))
    }

    /// Send a packet over the channel
    pub async fn send(&mut self, packet: &Packet) -> Result<()> {
        let bytes = self.codec.encode(packet)?;
        self.transport.send(&bytes).await
    }

    /// Receive a packet from the channel
    ///
    /// `lookup` resolves result bodies; peers that never send requests pass
    /// [`NoPendingRequests`](crate::codec::packet::NoPendingRequests).
    pub async fn receive<L>(&mut self, lookup: &L) -> Result<Packet>
    where
        L: RequestKindLookup + ?Sized,
    {
        let bytes = self.transport.receive().await?;
        self.codec.decode(&bytes, lookup)
    }

    /// Close the channel
    pub async fn close(mut self) -> Result<()> {
        self.transport.close().await
    }
}
