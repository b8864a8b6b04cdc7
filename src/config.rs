//! Connection and session configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::commands::{DEFAULT_HOP_LIMIT, DEFAULT_SEND_RETRIES};
use crate::error::Result;
use crate::transport::{
    BluetoothConfig, SerialConfig, SerialTransport, TcpConfig, TcpTransport, Transport,
};

/// Default interval between keepalive time syncs.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default time to wait for a delivery acknowledgement.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Which link to open to the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionConfig {
    /// Network API on port 4403.
    Tcp(TcpConfig),
    /// USB serial.
    Serial(SerialConfig),
    /// Bluetooth Low Energy; needs the `ble` feature.
    Bluetooth(BluetoothConfig),
}

impl ConnectionConfig {
    /// TCP connection with default settings.
    #[must_use]
    pub fn tcp(host: impl Into<String>) -> Self {
        Self::Tcp(TcpConfig::new(host))
    }

    /// Serial connection with default settings.
    #[must_use]
    pub fn serial(port: impl Into<String>) -> Self {
        Self::Serial(SerialConfig::new(port))
    }

    /// Bluetooth connection with default settings.
    #[must_use]
    pub fn bluetooth(address: impl Into<String>) -> Self {
        Self::Bluetooth(BluetoothConfig::new(address))
    }

    /// Creates the transport for this connection.
    ///
    /// Fails with `Error::Unsupported` for Bluetooth when the crate was
    /// built without the `ble` feature.
    pub fn into_transport(self) -> Result<Arc<dyn Transport>> {
        match self {
            Self::Tcp(config) => Ok(Arc::new(TcpTransport::new(config))),
            Self::Serial(config) => Ok(Arc::new(SerialTransport::new(config))),
            #[cfg(feature = "ble")]
            Self::Bluetooth(config) => Ok(Arc::new(crate::transport::BluetoothTransport::new(
                config,
            ))),
            #[cfg(not(feature = "ble"))]
            Self::Bluetooth(config) => Err(crate::error::Error::Unsupported {
                reason: format!(
                    "bluetooth support not compiled in, cannot reach {}",
                    config.address
                ),
            }),
        }
    }
}

impl From<TcpConfig> for ConnectionConfig {
    fn from(config: TcpConfig) -> Self {
        Self::Tcp(config)
    }
}

impl From<SerialConfig> for ConnectionConfig {
    fn from(config: SerialConfig) -> Self {
        Self::Serial(config)
    }
}

impl From<BluetoothConfig> for ConnectionConfig {
    fn from(config: BluetoothConfig) -> Self {
        Self::Bluetooth(config)
    }
}

/// How the session recognises the end of the configuration handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandshakeCompletion {
    /// The config-complete id must equal the nonce this session sent.
    #[default]
    MatchNonce,
    /// Any config-complete marker ends the handshake.
    AnySentinel,
}

/// Session tuning, independent of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Interval between keepalive time syncs.
    pub keepalive_interval: Duration,
    /// Default time to wait for a delivery acknowledgement.
    pub ack_timeout: Duration,
    /// Extra write attempts after a transient failure.
    pub send_retries: usize,
    /// Events buffered per subscriber before the oldest are dropped.
    pub event_capacity: usize,
    /// Handshake completion strategy.
    pub handshake: HandshakeCompletion,
    /// Hop limit stamped on outbound packets.
    pub hop_limit: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            send_retries: DEFAULT_SEND_RETRIES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            handshake: HandshakeCompletion::MatchNonce,
            hop_limit: DEFAULT_HOP_LIMIT,
        }
    }
}

impl SessionConfig {
    /// Sets the keepalive interval.
    #[must_use]
    pub const fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sets the default acknowledgement timeout.
    #[must_use]
    pub const fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Sets the number of write retries.
    #[must_use]
    pub const fn send_retries(mut self, retries: usize) -> Self {
        self.send_retries = retries;
        self
    }

    /// Sets the per-subscriber event buffer.
    #[must_use]
    pub const fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the handshake completion strategy.
    #[must_use]
    pub const fn handshake(mut self, handshake: HandshakeCompletion) -> Self {
        self.handshake = handshake;
        self
    }

    /// Sets the outbound hop limit.
    #[must_use]
    pub const fn hop_limit(mut self, hop_limit: u32) -> Self {
        self.hop_limit = hop_limit;
        self
    }
}

/// Complete client configuration: the link plus session tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub connection: ConnectionConfig,
    pub session: SessionConfig,
}

impl InterfaceConfig {
    /// Creates a configuration with default session settings.
    #[must_use]
    pub fn new(connection: impl Into<ConnectionConfig>) -> Self {
        Self {
            connection: connection.into(),
            session: SessionConfig::default(),
        }
    }

    /// Replaces the session settings.
    #[must_use]
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.keepalive_interval, Duration::from_secs(300));
        assert_eq!(config.ack_timeout, Duration::from_secs(30));
        assert_eq!(config.send_retries, 1);
        assert_eq!(config.event_capacity, 256);
        assert_eq!(config.handshake, HandshakeCompletion::MatchNonce);
        assert_eq!(config.hop_limit, 3);
    }

    #[test]
    fn test_interface_config_builder() {
        let config = InterfaceConfig::new(TcpConfig::new("meshtastic.local").port(4500)).session(
            SessionConfig::default()
                .ack_timeout(Duration::from_secs(5))
                .handshake(HandshakeCompletion::AnySentinel),
        );

        assert_eq!(
            config.connection,
            ConnectionConfig::Tcp(TcpConfig::new("meshtastic.local").port(4500))
        );
        assert_eq!(config.session.ack_timeout, Duration::from_secs(5));
        assert_eq!(config.session.handshake, HandshakeCompletion::AnySentinel);
    }

    #[test]
    fn test_into_transport() {
        let transport = ConnectionConfig::tcp("127.0.0.1").into_transport().unwrap();
        assert!(!transport.is_connected());

        let transport = ConnectionConfig::serial("/dev/ttyUSB0")
            .into_transport()
            .unwrap();
        assert!(!transport.is_connected());
    }

    #[cfg(not(feature = "ble"))]
    #[test]
    fn test_bluetooth_requires_feature() {
        assert!(matches!(
            ConnectionConfig::bluetooth("AA:BB:CC:DD:EE:FF").into_transport(),
            Err(crate::error::Error::Unsupported { .. })
        ));
    }
}
