use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Handle returned by [`EventDispatcher::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Subscriber<E> {
    id: SubscriptionId,
    handler: Handler<E>,
}

struct Shared<E> {
    topics: RwLock<HashMap<String, Vec<Subscriber<E>>>>,
    next_id: AtomicU64,
}

/// Topic-keyed publish/subscribe broadcaster
///
/// Clones share the same subscriber lists. Handlers run synchronously on the
/// thread that calls [`dispatch`](Self::dispatch).
pub struct EventDispatcher<E> {
    shared: Arc<Shared<E>>,
}

impl<E> Clone for EventDispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                topics: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a handler for `topic`
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared
            .topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber {
                id,
                handler: Arc::new(handler),
            });
        id
    }

    /// Remove a handler; returns whether it was registered under `topic`
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut topics = self.shared.topics.write();
        let Some(subscribers) = topics.get_mut(topic) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        let removed = subscribers.len() != before;

        if subscribers.is_empty() {
            topics.remove(topic);
        }
        removed
    }

    /// Deliver `event` to every handler of `topic`, returning how many ran
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe without deadlocking.
    pub fn dispatch(&self, topic: &str, event: &E) -> usize {
        let handlers: Vec<Handler<E>> = match self.shared.topics.read().get(topic) {
            Some(subscribers) => subscribers
                .iter()
                .map(|subscriber| Arc::clone(&subscriber.handler))
                .collect(),
            None => return 0,
        };

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.shared
            .topics
            .read()
            .get(topic)
            .map_or(0, |subscribers| subscribers.len())
    }
}
