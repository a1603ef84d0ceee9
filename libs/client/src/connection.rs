use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use connect_core::{Packet, STATUS_DISCONNECTED};
use connect_fabric::codec::bincode::DEFAULT_DECODE_LIMIT;
use connect_fabric::codec::{BincodeCodec, PacketCodec};
use connect_fabric::transport::{
    TcpTransport, TcpTransportReader, TcpTransportWriter, DEFAULT_MAX_FRAME_LEN,
};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::correlation::CorrelationTable;
use crate::dispatcher::{EventDispatcher, SubscriptionId};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::router::{self, Routed};

/// Silence after which the authority is considered gone
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings applied to every connection a [`Connect`] opens
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Bound on the TCP dial; `None` waits for the OS
    pub connect_timeout: Option<Duration>,
    /// Longest gap between inbound frames before the link is torn down.
    /// The authority's keepalives keep a healthy link under this.
    pub idle_timeout: Duration,
    /// Bound on a single frame write
    pub send_timeout: Option<Duration>,
    /// Largest frame accepted or sent
    pub max_frame_len: u32,
    /// Largest value the bincode decoder will materialize
    pub decode_limit: u64,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            send_timeout: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            decode_limit: DEFAULT_DECODE_LIMIT,
        }
    }
}

/// A frame handed to the writer task
struct Outbound {
    bytes: Vec<u8>,
    done: oneshot::Sender<connect_fabric::Result<()>>,
}

/// Completion of a queued frame
pub(crate) struct Written(oneshot::Receiver<connect_fabric::Result<()>>);

impl Written {
    /// Wait until the frame is on the wire
    ///
    /// Dropping this does not cut the frame short; the writer task finishes it.
    pub(crate) async fn wait(self) -> Result<()> {
        match self.0.await {
            Ok(result) => result.map_err(Error::Io),
            // Writer task gone: the generation was torn down.
            Err(_) => Err(Error::NotConnected),
        }
    }
}

/// Sending side of a link; frames are written whole, one at a time, by the
/// generation's writer task
pub(crate) struct PacketWriter {
    queue: mpsc::UnboundedSender<Outbound>,
    codec: PacketCodec,
}

impl PacketWriter {
    pub(crate) fn encode(&self, packet: &Packet) -> connect_fabric::Result<Vec<u8>> {
        self.codec.encode(packet)
    }

    /// Queue an encoded frame behind every frame queued before it
    pub(crate) fn submit(&self, bytes: Vec<u8>) -> Result<Written> {
        let (done, written) = oneshot::channel();
        self.queue
            .send(Outbound { bytes, done })
            .map_err(|_| Error::NotConnected)?;
        Ok(Written(written))
    }

    pub(crate) async fn write(&self, packet: &Packet) -> Result<()> {
        let bytes = self.encode(packet).map_err(Error::Io)?;
        self.submit(bytes)?.wait().await
    }
}

/// What a caller needs to talk over the active connection
#[derive(Clone)]
pub(crate) struct Link {
    pub(crate) table: Arc<CorrelationTable>,
    pub(crate) writer: Arc<PacketWriter>,
    pub(crate) runtime: Handle,
}

/// One successful `connect`, up to its teardown
struct Generation {
    id: u64,
    link: Link,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Generation {
    /// Stop both socket tasks and fail everything still pending
    ///
    /// The tasks own the only socket halves, so aborting them closes the
    /// socket even while a write is blocked on a peer that stopped reading.
    fn teardown(self) -> usize {
        self.reader.abort();
        self.writer.abort();
        self.link.table.drain_all(STATUS_DISCONNECTED, None)
    }
}

struct Inner {
    options: ConnectOptions,
    events: EventDispatcher<Event>,
    current: Mutex<Option<Generation>>,
    generations: AtomicU64,
}

impl Inner {
    /// Take the active generation; with `only`, only if it is that generation
    fn take_generation(&self, only: Option<u64>) -> Option<Generation> {
        let mut current = self.current.lock();
        let stale = matches!(
            (current.as_ref(), only),
            (Some(generation), Some(id)) if generation.id != id
        );
        if stale {
            None
        } else {
            current.take()
        }
    }
}

/// Tear down generation `id` if it is still the active one
fn teardown_own(inner: &Weak<Inner>, id: u64) -> Option<usize> {
    let inner = inner.upgrade()?;
    let generation = inner.take_generation(Some(id))?;
    Some(generation.teardown())
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(generation) = self.current.get_mut().take() {
            generation.teardown();
        }
    }
}

/// Client end of a Connect link
///
/// Cheap to clone; every clone drives the same connection. Requests may be
/// issued from any number of tasks or threads at once.
#[derive(Clone)]
pub struct Connect {
    inner: Arc<Inner>,
}

impl Default for Connect {
    fn default() -> Self {
        Self::new()
    }
}

impl Connect {
    pub fn new() -> Self {
        Self::with_options(ConnectOptions::default())
    }

    pub fn with_options(options: ConnectOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                events: EventDispatcher::new(),
                current: Mutex::new(None),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.inner.options
    }

    /// Dial `address` (`host:port`) and start reading from it
    ///
    /// Any existing connection is torn down first, whether or not the dial
    /// succeeds. On failure the client stays disconnected.
    pub async fn connect(&self, address: &str) -> Result<()> {
        self.disconnect();

        let options = &self.inner.options;
        let mut builder = TcpTransport::builder()
            .address(address)
            .receive_timeout(options.idle_timeout)
            .max_frame_len(options.max_frame_len);
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = options.send_timeout {
            builder = builder.send_timeout(timeout);
        }

        let transport = builder.connect().await.map_err(|err| {
            warn!(address, error = %err, "dial failed");
            Error::Dial(err)
        })?;

        let (reader, writer) = transport.into_split();
        let codec = PacketCodec::new(BincodeCodec::with_limit(options.decode_limit));
        let (queue, outbound) = mpsc::unbounded_channel();
        let link = Link {
            table: Arc::new(CorrelationTable::new()),
            writer: Arc::new(PacketWriter { queue, codec }),
            runtime: Handle::current(),
        };
        let id = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;

        // Spawned under the guard so a task that fails at once still finds
        // its own generation installed.
        let replaced = {
            let mut current = self.inner.current.lock();
            let reader = tokio::spawn(read_loop(
                Arc::downgrade(&self.inner),
                id,
                reader,
                codec,
                link.clone(),
                self.inner.events.clone(),
            ));
            let writer = tokio::spawn(write_loop(
                Arc::downgrade(&self.inner),
                id,
                writer,
                outbound,
            ));
            current.replace(Generation {
                id,
                link,
                reader,
                writer,
            })
        };

        // A concurrent connect won the race to install first.
        if let Some(generation) = replaced {
            generation.teardown();
        }

        info!(address, generation = id, "connected");
        Ok(())
    }

    /// Tear down the active connection, if any
    ///
    /// Every pending request completes with status 255 and no result before
    /// this returns; results that arrive later are never delivered.
    pub fn disconnect(&self) {
        if let Some(generation) = self.inner.take_generation(None) {
            let id = generation.id;
            let drained = generation.teardown();
            info!(generation = id, drained, "disconnected");
        }
    }

    pub fn connected(&self) -> bool {
        self.inner.current.lock().is_some()
    }

    /// Send a packet as-is over the active connection
    ///
    /// A failed write tears the connection down, since the stream may hold a
    /// partial frame.
    pub async fn write(&self, packet: &Packet) -> Result<()> {
        let link = self.link()?;
        link.writer.write(packet).await
    }

    /// Requests of the active connection still waiting for a result
    pub fn pending_requests(&self) -> usize {
        self.inner
            .current
            .lock()
            .as_ref()
            .map_or(0, |generation| generation.link.table.len())
    }

    /// Dispatcher for events pushed by the authority
    ///
    /// Subscriptions survive reconnects.
    pub fn events(&self) -> &EventDispatcher<Event> {
        &self.inner.events
    }

    /// Subscribe to one of the event topics (`"message"`, `"redirect"`, `"server"`)
    ///
    /// Handlers run on the read loop; a slow handler delays every packet behind it.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(topic, handler)
    }

    pub(crate) fn link(&self) -> Result<Link> {
        self.inner
            .current
            .lock()
            .as_ref()
            .map(|generation| generation.link.clone())
            .ok_or(Error::NotConnected)
    }
}

async fn read_loop(
    inner: Weak<Inner>,
    id: u64,
    mut reader: TcpTransportReader,
    codec: PacketCodec,
    link: Link,
    events: EventDispatcher<Event>,
) {
    let reason = loop {
        let bytes = match reader.receive().await {
            Ok(bytes) => bytes,
            Err(err) => break err,
        };
        let packet = match codec.decode(&bytes, link.table.as_ref()) {
            Ok(packet) => packet,
            Err(err) => break err,
        };
        trace!(generation = id, ?packet, "packet received");

        if let Routed::Reply(reply) = router::route(packet, &link.table, &events) {
            let bytes = match link.writer.encode(&reply) {
                Ok(bytes) => bytes,
                Err(err) => break err,
            };
            // Not awaited; a failed write tears the generation down on its own.
            let _ = link.writer.submit(bytes);
        }
    };

    match reason {
        connect_fabric::Error::ConnectionClosed => {
            info!(generation = id, "connection closed by peer")
        }
        err => warn!(generation = id, error = %err, "connection lost"),
    }

    // Only this loop's own generation; a newer connect may already be active.
    if let Some(drained) = teardown_own(&inner, id) {
        debug!(generation = id, drained, "torn down after read failure");
    }
}

async fn write_loop(
    inner: Weak<Inner>,
    id: u64,
    mut writer: TcpTransportWriter,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(Outbound { bytes, done }) = outbound.recv().await {
        match writer.send(&bytes).await {
            Ok(()) => {
                let _ = done.send(Ok(()));
            }
            // Rejected before anything was written; the stream is intact.
            Err(err @ connect_fabric::Error::InvalidFrame(_)) => {
                let _ = done.send(Err(err));
            }
            Err(err) => {
                warn!(generation = id, error = %err, "write failed");
                // The stream may end in a partial frame; nothing after it would parse.
                if let Some(drained) = teardown_own(&inner, id) {
                    debug!(generation = id, drained, "torn down after write failure");
                }
                let _ = done.send(Err(err));
                return;
            }
        }
    }
}
