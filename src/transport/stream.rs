//! Byte-stream plumbing shared by the TCP and serial transports.
//!
//! A [`StreamLink`] holds the two halves of a connected stream. The write
//! half sits behind an async mutex so writes never interleave; the read half
//! is handed to a pump task that runs the frame decoder and forwards
//! payloads to a [`FrameStream`].

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{FrameSink, FrameStream};
use crate::error::{Error, Result};
use crate::protocol::FrameDecoder;
use crate::protocol::frame::START2;

/// Bytes written after opening a stream to wake a sleeping radio.
const WAKE_LEN: usize = 32;

/// Pause after the wake-up bytes so the radio can switch to protobuf mode.
const WAKE_DELAY: Duration = Duration::from_millis(100);

/// Read buffer size.
const READ_BUF_SIZE: usize = 1024;

pub(crate) type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Connected halves of a byte-stream transport.
#[derive(Default)]
pub(crate) struct StreamLink {
    writer: Mutex<Option<BoxWriter>>,
    reader: std::sync::Mutex<Option<BoxReader>>,
    pump: std::sync::Mutex<Option<JoinHandle<()>>>,
    connected: Arc<AtomicBool>,
    /// Serialises connect attempts.
    pub(crate) connect_lock: Mutex<()>,
}

impl StreamLink {
    /// Stores freshly opened halves and marks the link live.
    pub(crate) async fn attach(&self, reader: BoxReader, writer: BoxWriter) {
        *self.writer.lock().await = Some(writer);
        if let Ok(mut slot) = self.reader.lock() {
            *slot = Some(reader);
        }
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Writes the wake-up preamble and waits for the radio to settle.
    pub(crate) async fn wake(&self) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(Error::NotConnected)?;
        writer.write_all(&[START2; WAKE_LEN]).await?;
        writer.flush().await?;
        drop(guard);
        tokio::time::sleep(WAKE_DELAY).await;
        Ok(())
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Starts the pump task for the current connection.
    pub(crate) fn frames(&self) -> Result<FrameStream> {
        let reader = self.reader.lock().ok().and_then(|mut slot| slot.take());
        let Some(reader) = reader else {
            return Err(if self.is_connected() {
                Error::Transport {
                    reason: "frame stream already taken".into(),
                }
            } else {
                Error::NotConnected
            });
        };

        let (tx, stream) = FrameStream::channel();
        let handle = tokio::spawn(pump(reader, tx, Arc::clone(&self.connected)));
        let previous = self.pump.lock().ok().and_then(|mut slot| slot.replace(handle));
        if let Some(old) = previous {
            old.abort();
        }
        Ok(stream)
    }

    /// Writes one message, reporting I/O failures as `Ok(false)`.
    pub(crate) async fn send(&self, data: Bytes) -> Result<bool> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(Error::NotConnected)?;

        trace!(len = data.len(), "sending frame");
        let result = async {
            writer.write_all(&data).await?;
            writer.flush().await
        }
        .await;

        match result {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(error = %e, "write failed");
                Ok(false)
            }
        }
    }

    /// Releases both halves and stops the pump. Idempotent.
    pub(crate) async fn detach(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "shutdown failed");
            }
        }
        if let Ok(mut slot) = self.reader.lock() {
            slot.take();
        }
        if let Some(handle) = self.pump.lock().ok().and_then(|mut slot| slot.take()) {
            handle.abort();
        }
    }
}

/// Reads from the stream, decodes frames and forwards their payloads until
/// the stream closes or the consumer goes away.
async fn pump(mut reader: BoxReader, tx: FrameSink, connected: Arc<AtomicBool>) {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; READ_BUF_SIZE];

    let outcome = loop {
        let n = tokio::select! {
            () = tx.closed() => break Ok(()),
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    debug!("stream closed by peer");
                    break Ok(());
                }
                Ok(n) => n,
                Err(e) => break Err(e),
            },
        };

        trace!(n, "received bytes");
        decoder.feed(&buf[..n]);

        loop {
            match decoder.decode() {
                Ok(Some(frame)) => {
                    trace!(len = frame.len(), "decoded frame");
                    if tx.send(Ok(frame)).await.is_err() {
                        debug!("frame receiver dropped");
                        connected.store(false, Ordering::SeqCst);
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // The decoder has already skipped past the bad header.
                    warn!(error = %e, "frame decode error");
                }
            }
        }
    };

    connected.store(false, Ordering::SeqCst);
    if let Err(e) = outcome {
        warn!(error = %e, "stream read failed");
        let _ = tx
            .send(Err(Error::Transport {
                reason: io_reason(&e),
            }))
            .await;
    }
}

fn io_reason(e: &io::Error) -> String {
    format!("{}: {e}", e.kind())
}

#[cfg(test)]
mod tests {
    use tokio::io::duplex;

    use super::*;
    use crate::protocol::encode_frame;

    async fn linked() -> (StreamLink, tokio::io::DuplexStream) {
        let (local, remote) = duplex(4096);
        let (r, w) = tokio::io::split(local);
        let link = StreamLink::default();
        link.attach(Box::new(r), Box::new(w)).await;
        (link, remote)
    }

    #[tokio::test]
    async fn test_pump_yields_frames() {
        let (link, mut remote) = linked().await;
        let mut frames = link.frames().unwrap();

        remote.write_all(b"garbage").await.unwrap();
        remote.write_all(&encode_frame(b"one").unwrap()).await.unwrap();
        remote.write_all(&encode_frame(b"two").unwrap()).await.unwrap();

        assert_eq!(frames.next_frame().await.unwrap().unwrap(), &b"one"[..]);
        assert_eq!(frames.next_frame().await.unwrap().unwrap(), &b"two"[..]);
        assert!(link.is_connected());

        drop(remote);
        assert!(frames.next_frame().await.is_none());
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn test_frames_taken_once() {
        let (link, _remote) = linked().await;
        let _frames = link.frames().unwrap();
        assert!(matches!(link.frames(), Err(Error::Transport { .. })));
    }

    #[tokio::test]
    async fn test_send_and_wake() {
        let (link, mut remote) = linked().await;

        link.wake().await.unwrap();
        assert!(link.send(Bytes::from_static(b"\x94\xc3\x00\x00")).await.unwrap());

        let mut buf = [0u8; WAKE_LEN + 4];
        remote.read_exact(&mut buf).await.unwrap();
        assert!(buf[..WAKE_LEN].iter().all(|&b| b == START2));
        assert_eq!(&buf[WAKE_LEN..], b"\x94\xc3\x00\x00");
    }

    #[tokio::test]
    async fn test_detach() {
        let (link, _remote) = linked().await;
        link.detach().await;
        link.detach().await;

        assert!(!link.is_connected());
        assert!(matches!(
            link.send(Bytes::from_static(b"x")).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(link.frames(), Err(Error::NotConnected)));
    }
}
