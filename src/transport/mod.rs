//! Transport layer for Meshtastic communication.
//!
//! A [`Transport`] owns one physical link to a radio. It hands out a stream
//! of raw protobuf payloads (one per radio message) and accepts already
//! encoded outbound bytes. TCP and serial links share the byte-stream
//! plumbing in [`stream`]; Bluetooth is available behind the `ble` feature.

pub mod ble;
pub mod memory;
pub mod serial;
pub(crate) mod stream;
pub mod tcp;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::protocol::Framing;

/// Number of decoded frames buffered between a transport and its reader.
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Trait for transport implementations.
///
/// Implementations are shared between the session task and callers sending
/// packets, so every method takes `&self`.
pub trait Transport: Send + Sync {
    /// Connects to the device.
    ///
    /// Fails with `Error::TransportConnect` on timeout, refusal or a missing
    /// service, after releasing anything partially opened. Concurrent calls
    /// are serialised; connecting an already connected transport is a no-op.
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Disconnects from the device. Idempotent.
    fn disconnect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Returns true if the medium is live.
    fn is_connected(&self) -> bool;

    /// Returns the inbound frames of the current connection.
    ///
    /// The stream ends when the medium closes. A mid-session failure is
    /// yielded as one `Error::Transport` item before the end. Each
    /// connection hands out its stream once.
    fn frames(&self) -> Result<FrameStream>;

    /// Writes one encoded message.
    ///
    /// Returns `Ok(false)` on a transient write failure and
    /// `Err(Error::NotConnected)` while disconnected. Writes are serialised
    /// across callers.
    fn send(&self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>>;

    /// How messages are delimited on this medium.
    fn framing(&self) -> Framing;
}

/// Sending half feeding a [`FrameStream`].
pub type FrameSink = mpsc::Sender<Result<Bytes>>;

/// Inbound frames from a transport.
#[derive(Debug)]
pub struct FrameStream {
    rx: mpsc::Receiver<Result<Bytes>>,
}

impl FrameStream {
    /// Creates a connected sink and stream pair.
    #[must_use]
    pub fn channel() -> (FrameSink, Self) {
        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        (tx, Self { rx })
    }

    /// Receives the next frame, or `None` once the medium has closed.
    pub async fn next_frame(&mut self) -> Option<Result<Bytes>> {
        self.rx.recv().await
    }
}

impl Stream for FrameStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

pub use ble::BluetoothConfig;
#[cfg(feature = "ble")]
pub use ble::BluetoothTransport;
pub use memory::{MemoryDevice, MemoryTransport};
pub use serial::{SerialConfig, SerialTransport};
pub use tcp::{TcpConfig, TcpTransport};

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_frame_stream_ends_when_sink_dropped() {
        let (tx, mut frames) = FrameStream::channel();
        tx.send(Ok(Bytes::from_static(b"one"))).await.unwrap();
        tx.send(Err(Error::Transport {
            reason: "reset".into(),
        }))
        .await
        .unwrap();
        drop(tx);

        assert_eq!(
            frames.next().await.unwrap().unwrap(),
            Bytes::from_static(b"one")
        );
        assert!(matches!(
            frames.next_frame().await,
            Some(Err(Error::Transport { .. }))
        ));
        assert!(frames.next().await.is_none());
    }
}
