//! Event system for async message handling.
//!
//! Every session broadcasts lifecycle changes and inbound packets to any
//! number of independent subscribers. Each [`Subscription`] has its own
//! cursor into a bounded buffer; one that falls behind loses its oldest
//! events instead of stalling the session or the other subscribers.
//!
//! A [`PacketStream`] is lossless: every stream owns an unbounded queue and
//! sees every packet dispatched after it was created, however slowly it is
//! read.

use std::sync::{Arc, Mutex, PoisonError};

use futures::Stream;
use tokio::sync::{broadcast, mpsc};
use tracing::{trace, warn};

use crate::proto::{LogRecord, PortNum, QueueStatus};
use crate::types::Packet;

/// Event types that can be dispatched.
#[derive(Debug, Clone)]
pub enum Event {
    /// Transport connected; the configuration handshake is starting.
    Connected,
    /// Configuration handshake complete.
    Ready { node_num: u32 },
    /// A node registry entry was created or changed.
    NodeUpdated(u32),
    /// A mesh packet was received.
    Packet(Arc<Packet>),
    /// The radio forwarded a log line.
    Log(LogRecord),
    /// Transmit queue status.
    QueueStatus(QueueStatus),
    /// The radio reported a reboot.
    Rebooted,
    /// Connection lost or closed.
    Disconnected,
}

/// Discriminant of an [`Event`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Ready,
    NodeUpdated,
    Packet,
    Log,
    QueueStatus,
    Rebooted,
    Disconnected,
}

impl Event {
    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Ready { .. } => EventKind::Ready,
            Self::NodeUpdated(_) => EventKind::NodeUpdated,
            Self::Packet(_) => EventKind::Packet,
            Self::Log(_) => EventKind::Log,
            Self::QueueStatus(_) => EventKind::QueueStatus,
            Self::Rebooted => EventKind::Rebooted,
            Self::Disconnected => EventKind::Disconnected,
        }
    }
}

/// Subscription filter for specific event types.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Filter by event kinds.
    pub kinds: Option<Vec<EventKind>>,
    /// Only packets on this port.
    pub port: Option<PortNum>,
}

impl EventFilter {
    /// Creates a filter for specific event kinds.
    #[must_use]
    pub const fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds: Some(kinds),
            port: None,
        }
    }

    /// Creates a filter for packets on one port.
    #[must_use]
    pub fn port(port: PortNum) -> Self {
        Self {
            kinds: Some(vec![EventKind::Packet]),
            port: Some(port),
        }
    }

    /// Checks if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind()) {
                return false;
            }
        }

        if let Some(port) = self.port {
            match event {
                Event::Packet(packet) => packet.port_num() == Some(port),
                _ => false,
            }
        } else {
            true
        }
    }
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
    filter: Option<EventFilter>,
}

impl Subscription {
    /// Receives the next matching event.
    ///
    /// Returns `None` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.as_ref().is_none_or(|f| f.matches(&event)) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// A stream of every mesh packet received after subscribing.
pub struct PacketStream {
    receiver: mpsc::UnboundedReceiver<Arc<Packet>>,
}

impl PacketStream {
    /// Receives the next packet.
    ///
    /// Returns `None` once the session that produced the stream is gone.
    pub async fn recv(&mut self) -> Option<Arc<Packet>> {
        self.receiver.recv().await
    }

    /// Converts into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Arc<Packet>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            let packet = stream.recv().await?;
            Some((packet, stream))
        })
    }
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    sender: broadcast::Sender<Event>,
    packet_streams: Arc<Mutex<Vec<mpsc::UnboundedSender<Arc<Packet>>>>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher buffering up to `capacity` events per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            packet_streams: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: Event) {
        if let Event::Packet(ref packet) = event {
            let mut streams = self
                .packet_streams
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let before = streams.len();
            streams.retain(|tx| tx.send(Arc::clone(packet)).is_ok());
            if streams.len() < before {
                trace!(closed = before - streams.len(), "pruned packet streams");
            }
        }

        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    /// Subscribes to events with an optional filter.
    #[must_use]
    pub fn subscribe(&self, filter: Option<EventFilter>) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    /// Subscribes to mesh packets.
    #[must_use]
    pub fn packets(&self) -> PacketStream {
        let (tx, receiver) = mpsc::unbounded_channel();
        self.packet_streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        PacketStream { receiver }
    }

    /// Waits for an event matching the filter with timeout.
    ///
    /// Returns `None` if the timeout expires or the channel is closed.
    pub async fn wait_for(
        &self,
        filter: EventFilter,
        timeout: std::time::Duration,
    ) -> Option<Event> {
        let mut subscription = self.subscribe(Some(filter));
        tokio::time::timeout(timeout, subscription.recv())
            .await
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;

    use super::*;
    use crate::proto::{Data, MeshPacket, mesh_packet};

    fn packet(id: u32, port: PortNum) -> Arc<Packet> {
        Arc::new(Packet::new(MeshPacket {
            id,
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: port as i32,
                ..Default::default()
            })),
            ..Default::default()
        }))
    }

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe(None);

        dispatcher.dispatch(Event::Connected);

        let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();

        assert!(matches!(event, Some(Event::Connected)));
    }

    #[test]
    fn test_event_filter() {
        let filter = EventFilter::kinds(vec![EventKind::Ready, EventKind::Disconnected]);

        assert!(filter.matches(&Event::Ready { node_num: 1 }));
        assert!(filter.matches(&Event::Disconnected));
        assert!(!filter.matches(&Event::Connected));
    }

    #[test]
    fn test_port_filter() {
        let filter = EventFilter::port(PortNum::TextMessageApp);

        assert!(filter.matches(&Event::Packet(packet(1, PortNum::TextMessageApp))));
        assert!(!filter.matches(&Event::Packet(packet(1, PortNum::TelemetryApp))));
        assert!(!filter.matches(&Event::NodeUpdated(1)));
    }

    #[tokio::test]
    async fn test_independent_packet_streams() {
        let dispatcher = EventDispatcher::new(4);
        let mut fast = dispatcher.packets();
        let slow = dispatcher.packets();

        for id in 1..=3 {
            dispatcher.dispatch(Event::Packet(packet(id, PortNum::TextMessageApp)));
            dispatcher.dispatch(Event::NodeUpdated(id));
            assert_eq!(fast.recv().await.map(|p| p.id()), Some(id));
        }

        drop(dispatcher);
        let ids: Vec<u32> = slow.into_stream().map(|p| p.id()).collect().await;
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_packet_stream_outlasts_event_buffer() {
        let dispatcher = EventDispatcher::new(2);
        let stream = dispatcher.packets();

        for id in 1..=300 {
            dispatcher.dispatch(Event::Packet(packet(id, PortNum::TextMessageApp)));
            dispatcher.dispatch(Event::NodeUpdated(id));
        }

        drop(dispatcher);
        let ids: Vec<u32> = stream.into_stream().map(|p| p.id()).collect().await;
        assert_eq!(ids, (1..=300).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_dropped_packet_stream_is_pruned() {
        let dispatcher = EventDispatcher::new(4);
        let mut kept = dispatcher.packets();
        drop(dispatcher.packets());

        dispatcher.dispatch(Event::Packet(packet(1, PortNum::TextMessageApp)));
        assert_eq!(dispatcher.packet_streams.lock().unwrap().len(), 1);
        assert_eq!(kept.recv().await.map(|p| p.id()), Some(1));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_loses_oldest() {
        let dispatcher = EventDispatcher::new(2);
        let mut sub = dispatcher.subscribe(Some(EventFilter::kinds(vec![EventKind::Packet])));

        for id in 1..=5 {
            dispatcher.dispatch(Event::Packet(packet(id, PortNum::TextMessageApp)));
        }

        let next = |event: Option<Event>| match event {
            Some(Event::Packet(packet)) => Some(packet.id()),
            _ => None,
        };
        assert_eq!(next(sub.recv().await), Some(4));
        assert_eq!(next(sub.recv().await), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_timeout() {
        let dispatcher = EventDispatcher::new(4);
        let waited = dispatcher
            .wait_for(
                EventFilter::kinds(vec![EventKind::Ready]),
                Duration::from_secs(1),
            )
            .await;
        assert!(waited.is_none());
    }
}
