//! Connect Fabric - Transport and codec layer of the Connect protocol
//!
//! Provides length-prefixed TCP framing (whole or split into independently
//! owned halves), a bincode codec, and the packet codec that turns frames into
//! [`connect_core::Packet`]s.
//!
//! # Example
//!
//! ```no_run
//! use connect_core::{Packet, Request};
//! use connect_fabric::{Channel, codec::BincodeCodec, codec::packet::NoPendingRequests};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut channel = Channel::tcp("127.0.0.1:5091", BincodeCodec::new()).await?;
//! channel
//!     .send(&Packet::Request { sequence_id: 1, request: Request::GetSalt })
//!     .await?;
//! let _reply = channel.receive(&NoPendingRequests).await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod transport;

// Re-exports for convenience
pub use channel::Channel;
pub use error::{Error, Result};
