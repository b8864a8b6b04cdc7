//! In-memory transport.
//!
//! [`MemoryTransport::pair`] returns a transport and the [`MemoryDevice`]
//! handle that plays the radio side: it injects inbound frames, observes
//! what the client wrote, and can drop the link or make connects and writes
//! fail. Messages cross the link unframed, like on a BLE characteristic.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use super::{FrameSink, FrameStream, Transport};
use crate::error::{Error, Result};
use crate::protocol::{Framing, InboundMessage, OutboundMessage, decode_outbound, encode_inbound};

#[derive(Default)]
struct LinkState {
    connected: bool,
    inbound: Option<FrameSink>,
    frames: Option<FrameStream>,
    connect_error: Option<String>,
    connect_delay: Option<Duration>,
    failing_writes: usize,
    connects: usize,
}

struct Shared {
    state: Mutex<LinkState>,
    sent_tx: mpsc::UnboundedSender<Bytes>,
    sent_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Bytes>>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Transport backed by in-process channels.
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

/// Radio side of a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryDevice {
    shared: Arc<Shared>,
}

impl MemoryTransport {
    /// Creates a transport and the device handle controlling it.
    #[must_use]
    pub fn pair() -> (Self, MemoryDevice) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(LinkState::default()),
            sent_tx,
            sent_rx: tokio::sync::Mutex::new(sent_rx),
            connect_lock: tokio::sync::Mutex::new(()),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MemoryDevice { shared },
        )
    }
}

impl Transport for MemoryTransport {
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let _guard = self.shared.connect_lock.lock().await;

            let delay = self.shared.state().connect_delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut state = self.shared.state();
            state.connects += 1;
            if let Some(reason) = state.connect_error.take() {
                return Err(Error::TransportConnect { reason });
            }
            if state.connected {
                return Ok(());
            }

            let (tx, frames) = FrameStream::channel();
            state.inbound = Some(tx);
            state.frames = Some(frames);
            state.connected = true;
            debug!("memory link connected");
            Ok(())
        })
    }

    fn disconnect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.shared.state();
            state.connected = false;
            state.inbound = None;
            state.frames = None;
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.shared.state().connected
    }

    fn frames(&self) -> Result<FrameStream> {
        let mut state = self.shared.state();
        match state.frames.take() {
            Some(frames) => Ok(frames),
            None if state.connected => Err(Error::Transport {
                reason: "frame stream already taken".into(),
            }),
            None => Err(Error::NotConnected),
        }
    }

    fn send(&self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async move {
            {
                let mut state = self.shared.state();
                if !state.connected {
                    return Err(Error::NotConnected);
                }
                if state.failing_writes > 0 {
                    state.failing_writes -= 1;
                    return Ok(false);
                }
            }
            Ok(self.shared.sent_tx.send(data).is_ok())
        })
    }

    fn framing(&self) -> Framing {
        Framing::Datagram
    }
}

impl MemoryDevice {
    /// Delivers one raw frame payload to the client.
    ///
    /// Returns false if the link is down.
    pub async fn push_frame(&self, frame: impl Into<Bytes>) -> bool {
        let inbound = self.shared.state().inbound.clone();
        match inbound {
            Some(tx) => tx.send(Ok(frame.into())).await.is_ok(),
            None => false,
        }
    }

    /// Encodes and delivers one radio message.
    pub async fn push(&self, msg: InboundMessage) -> bool {
        match encode_inbound(&msg, Framing::Datagram) {
            Ok(frame) => self.push_frame(frame).await,
            Err(_) => false,
        }
    }

    /// Fails the link with a transport error, then closes it.
    pub async fn fail(&self, reason: impl Into<String>) {
        let inbound = self.shared.state().inbound.clone();
        if let Some(tx) = inbound {
            let _ = tx
                .send(Err(Error::Transport {
                    reason: reason.into(),
                }))
                .await;
        }
        self.close();
    }

    /// Drops the link as if the radio was unplugged.
    pub fn close(&self) {
        let mut state = self.shared.state();
        state.connected = false;
        state.inbound = None;
    }

    /// Receives the next raw payload written by the client.
    pub async fn recv_frame(&self) -> Option<Bytes> {
        self.shared.sent_rx.lock().await.recv().await
    }

    /// Receives and decodes the next message written by the client.
    ///
    /// Frames that do not decode are skipped.
    pub async fn recv(&self) -> Option<OutboundMessage> {
        loop {
            let frame = self.recv_frame().await?;
            if let Ok(Some(msg)) = decode_outbound(&frame) {
                return Some(msg);
            }
        }
    }

    /// Returns a message the client already wrote, without waiting.
    pub fn try_recv(&self) -> Option<OutboundMessage> {
        let mut rx = self.shared.sent_rx.try_lock().ok()?;
        while let Ok(frame) = rx.try_recv() {
            if let Ok(Some(msg)) = decode_outbound(&frame) {
                return Some(msg);
            }
        }
        None
    }

    /// Makes the next connect attempt fail.
    pub fn fail_next_connect(&self, reason: impl Into<String>) {
        self.shared.state().connect_error = Some(reason.into());
    }

    /// Delays every connect attempt.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.shared.state().connect_delay = Some(delay);
    }

    /// Makes the next `count` writes report a transient failure.
    pub fn fail_writes(&self, count: usize) {
        self.shared.state().failing_writes = count;
    }

    /// Whether the client side is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.state().connected
    }

    /// Number of connect attempts so far.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.shared.state().connects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_inbound, encode_outbound};

    #[tokio::test]
    async fn test_push_and_send() {
        let (transport, device) = MemoryTransport::pair();
        assert!(!device.push(InboundMessage::ConfigComplete(1)).await);

        transport.connect().await.unwrap();
        let mut frames = transport.frames().unwrap();

        assert!(device.push(InboundMessage::ConfigComplete(1)).await);
        let frame = frames.next_frame().await.unwrap().unwrap();
        assert_eq!(decode_inbound(&frame), Some(InboundMessage::ConfigComplete(1)));

        let out = encode_outbound(&OutboundMessage::WantConfig(9), transport.framing()).unwrap();
        assert!(transport.send(out).await.unwrap());
        assert_eq!(device.recv().await, Some(OutboundMessage::WantConfig(9)));
    }

    #[tokio::test]
    async fn test_close_ends_frames() {
        let (transport, device) = MemoryTransport::pair();
        transport.connect().await.unwrap();
        let mut frames = transport.frames().unwrap();

        device.close();
        assert!(frames.next_frame().await.is_none());
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.send(Bytes::new()).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_fail_yields_error_then_end() {
        let (transport, device) = MemoryTransport::pair();
        transport.connect().await.unwrap();
        let mut frames = transport.frames().unwrap();

        device.fail("link reset").await;
        assert!(matches!(
            frames.next_frame().await,
            Some(Err(Error::Transport { .. }))
        ));
        assert!(frames.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_failure_and_write_failure() {
        let (transport, device) = MemoryTransport::pair();
        device.fail_next_connect("refused");
        assert!(matches!(
            transport.connect().await,
            Err(Error::TransportConnect { .. })
        ));
        assert!(!transport.is_connected());

        transport.connect().await.unwrap();
        assert_eq!(device.connect_count(), 2);

        device.fail_writes(1);
        assert!(!transport.send(Bytes::from_static(b"a")).await.unwrap());
        assert!(transport.send(Bytes::from_static(b"b")).await.unwrap());
        assert_eq!(device.recv_frame().await, Some(Bytes::from_static(b"b")));
    }
}
