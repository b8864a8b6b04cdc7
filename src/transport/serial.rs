//! Serial/USB transport implementation.
//!
//! This module provides serial port communication for Meshtastic radios
//! connected via USB.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tokio_serial::SerialPortBuilderExt;
use tracing::{info, warn};

use super::stream::StreamLink;
use super::{FrameStream, Transport};
use crate::error::{Error, Result};
use crate::protocol::Framing;

/// Default baud rate for Meshtastic radios.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default delay after opening the port.
pub const DEFAULT_CONNECTION_DELAY: Duration = Duration::from_millis(300);

/// Configuration for serial transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0" or "COM3").
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Delay after opening the port before anything is written.
    pub connection_delay: Duration,
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            connection_delay: DEFAULT_CONNECTION_DELAY,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }

    /// Sets the connection delay.
    #[must_use]
    pub const fn connection_delay(mut self, delay: Duration) -> Self {
        self.connection_delay = delay;
        self
    }
}

/// Serial transport for Meshtastic communication.
pub struct SerialTransport {
    config: SerialConfig,
    link: StreamLink,
}

impl SerialTransport {
    /// Creates a new serial transport with the given configuration.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            link: StreamLink::default(),
        }
    }

    /// Creates a new serial transport for the given port with default settings.
    #[must_use]
    pub fn with_port(port: impl Into<String>) -> Self {
        Self::new(SerialConfig::new(port))
    }

    async fn open(&self) -> Result<()> {
        let mut stream = tokio_serial::new(&self.config.port, self.config.baud_rate)
            .open_native_async()
            .map_err(|e| Error::TransportConnect {
                reason: format!("{}: {e}", self.config.port),
            })?;

        // Holding RTS low keeps ESP32 boards out of reset.
        if let Err(e) = tokio_serial::SerialPort::write_request_to_send(&mut stream, false) {
            warn!(error = %e, "failed to clear RTS");
        }

        tokio::time::sleep(self.config.connection_delay).await;

        let (reader, writer) = tokio::io::split(stream);
        self.link.attach(Box::new(reader), Box::new(writer)).await;
        Ok(())
    }
}

impl Transport for SerialTransport {
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let _guard = self.link.connect_lock.lock().await;
            if self.link.is_connected() {
                return Ok(());
            }

            info!(port = %self.config.port, "connecting to serial port");
            self.open().await?;

            if let Err(e) = self.link.wake().await {
                self.link.detach().await;
                return Err(Error::TransportConnect {
                    reason: format!("failed to wake radio: {e}"),
                });
            }

            info!(port = %self.config.port, "connected to serial port");
            Ok(())
        })
    }

    fn disconnect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.link.is_connected() {
                info!(port = %self.config.port, "disconnecting from serial port");
            }
            self.link.detach().await;
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    fn frames(&self) -> Result<FrameStream> {
        self.link.frames()
    }

    fn send(&self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(self.link.send(data))
    }

    fn framing(&self) -> Framing {
        Framing::Stream
    }
}

/// Lists available serial ports.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::Serial)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
