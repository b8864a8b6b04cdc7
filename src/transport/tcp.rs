//! TCP transport implementation.
//!
//! Network-attached radios (ESP32 boards with Wi-Fi or Ethernet) expose the
//! same framed stream as the serial console on TCP port 4403.

use std::fmt;
use std::future::Future;
use std::num::ParseIntError;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::stream::StreamLink;
use super::{FrameStream, Transport};
use crate::error::{Error, Result};
use crate::protocol::Framing;

/// Default TCP port of the radio API.
pub const DEFAULT_PORT: u16 = 4403;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for TCP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Time allowed for the TCP connect.
    pub connect_timeout: Duration,
}

impl TcpConfig {
    /// Creates a new TCP configuration with default settings.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl FromStr for TcpConfig {
    type Err = ParseIntError;

    /// Parses `host`, `host:port`, `[v6addr]` or `[v6addr]:port`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some((host, tail)) = s.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
            let config = Self::new(host);
            return match tail.strip_prefix(':') {
                Some(port) => Ok(config.port(port.parse()?)),
                None => Ok(config),
            };
        }

        match s.rsplit_once(':') {
            // A bare IPv6 address contains several colons and no port.
            Some((host, port)) if !host.contains(':') => Ok(Self::new(host).port(port.parse()?)),
            _ => Ok(Self::new(s)),
        }
    }
}

impl fmt::Display for TcpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// TCP transport for Meshtastic communication.
pub struct TcpTransport {
    config: TcpConfig,
    link: StreamLink,
}

impl TcpTransport {
    /// Creates a new TCP transport with the given configuration.
    #[must_use]
    pub fn new(config: TcpConfig) -> Self {
        Self {
            config,
            link: StreamLink::default(),
        }
    }

    /// Creates a new TCP transport for the given host with default settings.
    #[must_use]
    pub fn with_host(host: impl Into<String>) -> Self {
        Self::new(TcpConfig::new(host))
    }

    async fn open(&self) -> Result<()> {
        let addr = (self.config.host.as_str(), self.config.port);
        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::TransportConnect {
                reason: format!(
                    "timed out connecting to {} after {:?}",
                    self.config, self.config.connect_timeout
                ),
            })?
            .map_err(|e| Error::TransportConnect {
                reason: format!("{}: {e}", self.config),
            })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        self.link.attach(Box::new(reader), Box::new(writer)).await;
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let _guard = self.link.connect_lock.lock().await;
            if self.link.is_connected() {
                return Ok(());
            }

            info!(addr = %self.config, "connecting over TCP");
            self.open().await?;

            if let Err(e) = self.link.wake().await {
                self.link.detach().await;
                return Err(Error::TransportConnect {
                    reason: format!("failed to wake radio: {e}"),
                });
            }

            info!(addr = %self.config, "connected over TCP");
            Ok(())
        })
    }

    fn disconnect(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.link.is_connected() {
                info!(addr = %self.config, "disconnecting TCP");
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
