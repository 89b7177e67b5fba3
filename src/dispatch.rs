//! Delivery of reassembled payloads to application code.
//!
//! Each completed payload becomes one [`Delivery`] named
//! `received.<topic>`. A [`Dispatcher`] receives it; closures implement the
//! trait directly and [`TopicRouter`] fans deliveries out to per-topic
//! subscribers.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use bytes::Bytes;
use dashmap::DashMap;
use derive_more::{Display, From};
use tracing::debug;

/// Namespace prefixed to every delivered event name.
pub const EVENT_NAMESPACE: &str = "received";

/// Build the event name announced for `topic`.
///
/// ```
/// assert_eq!(chunkwire::dispatch::event_name("chat"), "received.chat");
/// ```
#[must_use]
pub fn event_name(topic: &str) -> String { format!("{EVENT_NAMESPACE}.{topic}") }

/// Opaque identity of the peer a payload came from.
///
/// The transport supplies this value; `chunkwire` only passes it through.
#[derive(Clone, Debug, Display, From, PartialEq, Eq, Hash)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap a transport-level sender identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self { Self(value.to_owned()) }
}

/// A reassembled payload ready for application code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    event: String,
    topic: String,
    payload: Bytes,
    sender: PeerId,
}

impl Delivery {
    /// Build a delivery, deriving the event name from `topic`.
    #[must_use]
    pub fn new(topic: String, payload: Bytes, sender: PeerId) -> Self {
        Self {
            event: event_name(&topic),
            topic,
            payload,
            sender,
        }
    }

    #[must_use]
    pub fn event(&self) -> &str { &self.event }

    #[must_use]
    pub fn topic(&self) -> &str { &self.topic }

    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    #[must_use]
    pub fn sender(&self) -> &PeerId { &self.sender }
}

/// Receives every completed payload exactly once.
///
/// # Examples
///
/// ```
/// use chunkwire::dispatch::{Delivery, Dispatcher, PeerId};
///
/// let dispatcher = |delivery: Delivery| println!("{}", delivery.event());
/// dispatcher.dispatch(Delivery::new("t".into(), "hi".into(), PeerId::new("p")));
/// ```
pub trait Dispatcher: Send + Sync {
    /// Hand `delivery` to application code.
    fn dispatch(&self, delivery: Delivery);
}

impl<F> Dispatcher for F
where
    F: Fn(Delivery) + Send + Sync,
{
    fn dispatch(&self, delivery: Delivery) { self(delivery); }
}

/// Handle returned by [`TopicRouter::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Delivery) + Send + Sync>;

/// Concurrent registry of per-topic subscribers.
///
/// Handlers run on the thread that called
/// [`PayloadReceiver::receive`](crate::receiver::PayloadReceiver::receive).
/// They may subscribe or unsubscribe from within a callback.
#[derive(Default)]
pub struct TopicRouter {
    handlers: DashMap<String, Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl TopicRouter {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `handler` for deliveries on `topic`.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&Delivery) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .entry(topic.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, subscribers| {
            let before = subscribers.len();
            subscribers.retain(|(sub, _)| *sub != id);
            removed |= subscribers.len() != before;
            !subscribers.is_empty()
        });
        removed
    }

    /// Number of handlers registered for `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.handlers.get(topic).map_or(0, |subs| subs.len())
    }
}

impl Dispatcher for TopicRouter {
    fn dispatch(&self, delivery: Delivery) {
        let handlers: Vec<Handler> = self
            .handlers
            .get(delivery.topic())
            .map(|subs| subs.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        if handlers.is_empty() {
            debug!(topic = delivery.topic(), "no subscribers for delivery");
            return;
        }
        for handler in handlers {
            handler(&delivery);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rstest::rstest;

    use super::*;

    fn delivery(topic: &str, body: &'static [u8]) -> Delivery {
        Delivery::new(topic.to_owned(), Bytes::from_static(body), PeerId::from("peer-1"))
    }

    #[rstest]
    #[case("chat", "received.chat")]
    #[case("", "received.")]
    #[case("a.b", "received.a.b")]
    fn event_names_are_namespaced(#[case] topic: &str, #[case] expected: &str) {
        assert_eq!(delivery(topic, b"").event(), expected);
    }

    #[test]
    fn closures_dispatch() {
        let seen = Mutex::new(Vec::new());
        let dispatcher = |d: Delivery| seen.lock().expect("lock").push(d.topic().to_owned());
        dispatcher.dispatch(delivery("x", b"1"));
        dispatcher.dispatch(delivery("y", b"2"));
        assert_eq!(*seen.lock().expect("lock"), vec!["x", "y"]);
    }

    #[test]
    fn router_only_calls_matching_topic() {
        let router = TopicRouter::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&hits);
        router.subscribe("chat", move |d| {
            sink.lock().expect("lock").push(d.payload().clone());
        });

        router.dispatch(delivery("chat", b"hello"));
        router.dispatch(delivery("other", b"ignored"));

        assert_eq!(*hits.lock().expect("lock"), vec![Bytes::from_static(b"hello")]);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let router = TopicRouter::new();
        let first = router.subscribe("t", |_| {});
        let second = router.subscribe("t", |_| {});
        assert_eq!(router.subscriber_count("t"), 2);

        assert!(router.unsubscribe(first));
        assert!(!router.unsubscribe(first));
        assert_eq!(router.subscriber_count("t"), 1);
        assert!(router.unsubscribe(second));
        assert_eq!(router.subscriber_count("t"), 0);
    }

    #[test]
    fn handlers_may_resubscribe_during_dispatch() {
        let router = Arc::new(TopicRouter::new());
        let inner = Arc::clone(&router);
        router.subscribe("t", move |_| {
            inner.subscribe("t", |_| {});
        });
        router.dispatch(delivery("t", b""));
        assert_eq!(router.subscriber_count("t"), 2);
    }
}
