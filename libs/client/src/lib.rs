//! Connect Client - Request correlation engine for the Connect protocol
//!
//! A single multiplexed socket to the authority carries requests, their
//! results, pushed events and keepalives. [`Connect`] pairs every request with
//! exactly one result and fails everything still pending, with status 255,
//! when the link dies.
//!
//! # Example
//!
//! ```no_run
//! use connect_client::{Connect, Event};
//! use connect_core::Request;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connect = Connect::new();
//! connect.connect("127.0.0.1:5091").await?;
//!
//! connect.subscribe("redirect", |event: &Event| println!("{:?}", event));
//!
//! let status = connect.login("example", "example").await?;
//! println!("login status {}", status);
//!
//! let (status, players) = connect.request(Request::GetPlayers { list: true }).await?;
//! println!("{} {:?}", status, players);
//!
//! connect.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod correlation;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod request;
pub mod router;

// Re-exports for convenience
pub use connection::{Connect, ConnectOptions, DEFAULT_IDLE_TIMEOUT};
pub use correlation::{CorrelationTable, RequestRecord, ResultCallback};
pub use dispatcher::{EventDispatcher, SubscriptionId};
pub use error::{Error, Result};
pub use event::{Event, TOPIC_MESSAGE, TOPIC_REDIRECT, TOPIC_SERVER};
