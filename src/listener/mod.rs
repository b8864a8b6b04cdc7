//! Per-port packet listeners.
//!
//! Listeners are plain closures registered against a port number. A packet
//! is delivered to every listener registered on its port, in no particular
//! order. A listener that returns an error or panics is logged and skipped;
//! the remaining listeners still run.
//!
//! Delivery happens on a dedicated task fed by the session's read loop, so a
//! slow listener delays other listeners but never the read loop itself.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::proto::PortNum;
use crate::types::{ApplicationPayload, MeshNode, Packet};

/// Error type listeners may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type listeners return.
pub type ListenerResult = Result<(), BoxError>;

type RawFn = dyn Fn(&Packet, &[u8]) -> ListenerResult + Send + Sync;
type DecodedFn = dyn Fn(&Packet, &ApplicationPayload) -> ListenerResult + Send + Sync;
type WithNodeFn =
    dyn Fn(&Packet, &ApplicationPayload, Option<&MeshNode>) -> ListenerResult + Send + Sync;

/// A callback and the form in which it wants the payload.
#[derive(Clone)]
pub enum PacketListener {
    /// Receives the raw application bytes.
    Raw(Arc<RawFn>),
    /// Receives the decoded payload.
    Decoded(Arc<DecodedFn>),
    /// Receives the decoded payload and the sender's registry entry.
    WithNode(Arc<WithNodeFn>),
}

impl PacketListener {
    /// Creates a listener receiving raw application bytes.
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&Packet, &[u8]) -> ListenerResult + Send + Sync + 'static,
    {
        Self::Raw(Arc::new(f))
    }

    /// Creates a listener receiving the decoded payload.
    pub fn decoded<F>(f: F) -> Self
    where
        F: Fn(&Packet, &ApplicationPayload) -> ListenerResult + Send + Sync + 'static,
    {
        Self::Decoded(Arc::new(f))
    }

    /// Creates a listener receiving the decoded payload and the sending node.
    pub fn with_node<F>(f: F) -> Self
    where
        F: Fn(&Packet, &ApplicationPayload, Option<&MeshNode>) -> ListenerResult
            + Send
            + Sync
            + 'static,
    {
        Self::WithNode(Arc::new(f))
    }

    fn invoke(&self, packet: &Packet, node: Option<&MeshNode>) -> ListenerResult {
        match self {
            Self::Raw(f) => packet.raw_payload().map_or(Ok(()), |raw| f(packet, raw)),
            Self::Decoded(f) => packet
                .app_payload()
                .map_or(Ok(()), |payload| f(packet, payload)),
            Self::WithNode(f) => packet
                .app_payload()
                .map_or(Ok(()), |payload| f(packet, payload, node)),
        }
    }
}

impl fmt::Debug for PacketListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Self::Raw(_) => "Raw",
            Self::Decoded(_) => "Decoded",
            Self::WithNode(_) => "WithNode",
        };
        write!(f, "PacketListener::{mode}")
    }
}

/// Handle returned by registration, used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listeners of one session, keyed by port number.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<HashMap<i32, Vec<(ListenerId, PacketListener)>>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for a port.
    pub fn add(&self, port: PortNum, listener: PacketListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(port as i32)
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        entries.retain(|_, listeners| {
            let before = listeners.len();
            listeners.retain(|(existing, _)| *existing != id);
            removed |= listeners.len() != before;
            !listeners.is_empty()
        });
        removed
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any listener on `port` wants the sending node.
    #[must_use]
    pub fn wants_node(&self, port: i32) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&port)
            .is_some_and(|listeners| {
                listeners
                    .iter()
                    .any(|(_, l)| matches!(l, PacketListener::WithNode(_)))
            })
    }

    fn listeners_for(&self, port: i32) -> Vec<PacketListener> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&port)
            .map(|listeners| listeners.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default()
    }

    /// Delivers a packet to every listener on its port.
    ///
    /// Returns the number of listeners that completed without error.
    pub fn dispatch(&self, packet: &Packet, node: Option<&MeshNode>) -> usize {
        let Some(port) = packet.port() else {
            return 0;
        };

        // Callbacks run outside the lock so they may add or remove listeners.
        let listeners = self.listeners_for(port);
        let mut delivered = 0;
        for listener in &listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.invoke(packet, node))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(port, packet_id = packet.id(), error = %e, "listener failed");
                }
                Err(panic) => {
                    warn!(
                        port,
                        packet_id = packet.id(),
                        panic = panic_message(panic.as_ref()),
                        "listener panicked"
                    );
                }
            }
        }
        trace!(port, delivered, total = listeners.len(), "dispatched packet");
        delivered
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// A packet queued for listener delivery.
pub(crate) struct Delivery {
    pub packet: Arc<Packet>,
    pub node: Option<MeshNode>,
}

/// Spawns the task that delivers queued packets to the registry.
pub(crate) fn spawn_dispatcher(
    registry: Arc<ListenerRegistry>,
) -> (mpsc::UnboundedSender<Delivery>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
    let handle = tokio::spawn(async move {
        while let Some(delivery) = rx.recv().await {
            registry.dispatch(&delivery.packet, delivery.node.as_ref());
        }
    });
    (tx, handle)
}
