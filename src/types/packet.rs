//! Mesh packets with lazily decoded application payloads.

use std::sync::OnceLock;

use bytes::Bytes;
use prost::Message;
use tracing::{debug, warn};

use crate::error::RoutingReason;
use crate::proto::{
    AdminMessage, BROADCAST_ADDR, Data, MeshPacket, PortNum, Position, Routing, Telemetry, User,
    mesh_packet, routing,
};

/// Application payload of a packet, interpreted according to its port.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationPayload {
    /// `TEXT_MESSAGE_APP`; invalid UTF-8 is replaced.
    Text(String),
    /// `TELEMETRY_APP`.
    Telemetry(Telemetry),
    /// `ROUTING_APP`; acknowledgements and delivery failures.
    Routing(Routing),
    /// `ADMIN_APP`.
    Admin(AdminMessage),
    /// `POSITION_APP`.
    Position(Position),
    /// `NODEINFO_APP`.
    NodeInfo(User),
    /// Any other port, or a payload that failed to decode.
    Unknown(Bytes),
}

impl ApplicationPayload {
    /// Interprets `payload` according to the port number `port`.
    ///
    /// Decoding is pure; the same input always produces the same variant.
    #[must_use]
    pub fn decode(port: i32, payload: &[u8]) -> Self {
        let Ok(port_num) = PortNum::try_from(port) else {
            debug!(port, "unhandled port number");
            return Self::Unknown(Bytes::copy_from_slice(payload));
        };

        let decoded = match port_num {
            PortNum::TextMessageApp => {
                return Self::Text(String::from_utf8_lossy(payload).into_owned());
            }
            PortNum::RoutingApp => Routing::decode(payload).map(Self::Routing),
            PortNum::TelemetryApp => Telemetry::decode(payload).map(Self::Telemetry),
            PortNum::AdminApp => AdminMessage::decode(payload).map(Self::Admin),
            PortNum::PositionApp => Position::decode(payload).map(Self::Position),
            PortNum::NodeinfoApp => User::decode(payload).map(Self::NodeInfo),
            other => {
                debug!(port = other.as_str_name(), "unhandled port number");
                return Self::Unknown(Bytes::copy_from_slice(payload));
            }
        };

        decoded.unwrap_or_else(|e| {
            warn!(port = port_num.as_str_name(), error = %e, "failed to decode payload");
            Self::Unknown(Bytes::copy_from_slice(payload))
        })
    }

    /// Returns the text if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the telemetry report if this is one.
    #[must_use]
    pub fn as_telemetry(&self) -> Option<&Telemetry> {
        match self {
            Self::Telemetry(telemetry) => Some(telemetry),
            _ => None,
        }
    }

    /// Returns the routing error code if this is a routing message carrying one.
    ///
    /// A successful acknowledgement carries `routing::Error::None`. Codes
    /// outside the known set come back as [`RoutingReason::Unknown`].
    #[must_use]
    pub fn routing_error(&self) -> Option<RoutingReason> {
        match self {
            Self::Routing(Routing {
                variant: Some(routing::Variant::ErrorReason(code)),
            }) => Some(RoutingReason::from_code(*code)),
            _ => None,
        }
    }
}

/// A mesh packet received from the radio.
///
/// The application payload is decoded on first access and cached for the
/// lifetime of the packet.
#[derive(Debug, Clone)]
pub struct Packet {
    inner: MeshPacket,
    payload: OnceLock<Option<ApplicationPayload>>,
}

impl Packet {
    /// Wraps a mesh packet.
    #[must_use]
    pub const fn new(inner: MeshPacket) -> Self {
        Self {
            inner,
            payload: OnceLock::new(),
        }
    }

    /// Returns the underlying protobuf packet.
    #[must_use]
    pub const fn mesh_packet(&self) -> &MeshPacket {
        &self.inner
    }

    /// Sender node number.
    #[must_use]
    pub const fn sender(&self) -> u32 {
        self.inner.from
    }

    /// Destination node number.
    #[must_use]
    pub const fn destination(&self) -> u32 {
        self.inner.to
    }

    /// Packet id assigned by the sender.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.inner.id
    }

    /// Channel index (outbound) or channel hash (inbound).
    #[must_use]
    pub const fn channel(&self) -> u32 {
        self.inner.channel
    }

    /// Whether the packet was addressed to every node.
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.inner.to == BROADCAST_ADDR
    }

    /// Signal-to-noise ratio at reception, if the radio reported one.
    #[must_use]
    pub fn rx_snr(&self) -> Option<f32> {
        (self.inner.rx_snr != 0.0).then_some(self.inner.rx_snr)
    }

    /// Received signal strength, if the radio reported one.
    #[must_use]
    pub const fn rx_rssi(&self) -> Option<i32> {
        if self.inner.rx_rssi == 0 {
            None
        } else {
            Some(self.inner.rx_rssi)
        }
    }

    /// Unix time of reception, if known.
    #[must_use]
    pub const fn rx_time(&self) -> Option<u32> {
        if self.inner.rx_time == 0 {
            None
        } else {
            Some(self.inner.rx_time)
        }
    }

    /// Number of hops the packet travelled, when the sender set `hop_start`.
    #[must_use]
    pub const fn hops_away(&self) -> Option<u32> {
        if self.inner.hop_start == 0 || self.inner.hop_start < self.inner.hop_limit {
            None
        } else {
            Some(self.inner.hop_start - self.inner.hop_limit)
        }
    }

    /// The decoded `Data` section, absent for packets encrypted to a key
    /// this radio does not hold.
    #[must_use]
    pub fn data(&self) -> Option<&Data> {
        match &self.inner.payload_variant {
            Some(mesh_packet::PayloadVariant::Decoded(data)) => Some(data),
            _ => None,
        }
    }

    /// Whether the payload is still encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        matches!(
            self.inner.payload_variant,
            Some(mesh_packet::PayloadVariant::Encrypted(_))
        )
    }

    /// Raw port number of the decoded payload.
    #[must_use]
    pub fn port(&self) -> Option<i32> {
        self.data().map(|data| data.portnum)
    }

    /// Port number of the decoded payload, if it is a known one.
    #[must_use]
    pub fn port_num(&self) -> Option<PortNum> {
        self.port().and_then(|port| PortNum::try_from(port).ok())
    }

    /// Raw application bytes.
    #[must_use]
    pub fn raw_payload(&self) -> Option<&[u8]> {
        self.data().map(|data| data.payload.as_slice())
    }

    /// Id of the packet this one responds to, or 0.
    #[must_use]
    pub fn request_id(&self) -> u32 {
        self.data().map_or(0, |data| data.request_id)
    }

    /// Decoded application payload, computed at most once.
    ///
    /// Returns `None` for encrypted packets.
    pub fn app_payload(&self) -> Option<&ApplicationPayload> {
        self.payload
            .get_or_init(|| {
                self.data()
                    .map(|data| ApplicationPayload::decode(data.portnum, &data.payload))
            })
            .as_ref()
    }
}

impl From<MeshPacket> for Packet {
    fn from(inner: MeshPacket) -> Self {
        Self::new(inner)
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{DeviceMetrics, telemetry};

    fn packet(port: PortNum, payload: Vec<u8>) -> Packet {
        Packet::new(MeshPacket {
            from: 0x0a0b_0c0d,
            to: BROADCAST_ADDR,
            id: 7,
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: port as i32,
                payload,
                ..Default::default()
            })),
            ..Default::default()
        })
    }

    #[test]
    fn test_text_payload() {
        let p = packet(PortNum::TextMessageApp, b"hello".to_vec());
        assert_eq!(p.port_num(), Some(PortNum::TextMessageApp));
        assert_eq!(p.app_payload().and_then(ApplicationPayload::as_text), Some("hello"));
        assert!(p.is_broadcast());
    }

    #[test]
    fn test_text_payload_invalid_utf8_is_lossy() {
        let p = packet(PortNum::TextMessageApp, vec![b'o', 0xff, b'k']);
        assert_eq!(
            p.app_payload().and_then(ApplicationPayload::as_text),
            Some("o\u{fffd}k")
        );
    }

    #[test]
    fn test_telemetry_payload() {
        let report = Telemetry {
            time: 1_700_000_000,
            variant: Some(telemetry::Variant::DeviceMetrics(DeviceMetrics {
                battery_level: Some(87),
                voltage: Some(4.1),
                ..Default::default()
            })),
        };
        let p = packet(PortNum::TelemetryApp, report.encode_to_vec());
        assert_eq!(
            p.app_payload(),
            Some(&ApplicationPayload::Telemetry(report))
        );
    }

    #[test]
    fn test_routing_payload() {
        let routing = Routing {
            variant: Some(routing::Variant::ErrorReason(routing::Error::NoRoute as i32)),
        };
        let p = packet(PortNum::RoutingApp, routing.encode_to_vec());
        assert_eq!(
            p.app_payload().and_then(ApplicationPayload::routing_error),
            Some(RoutingReason::Known(routing::Error::NoRoute))
        );

        // Codes from newer firmware are reported as sent.
        let future = Routing {
            variant: Some(routing::Variant::ErrorReason(250)),
        };
        let p = packet(PortNum::RoutingApp, future.encode_to_vec());
        assert_eq!(
            p.app_payload().and_then(ApplicationPayload::routing_error),
            Some(RoutingReason::Unknown(250))
        );

        // An empty routing payload is a bare acknowledgement.
        let ack = packet(PortNum::RoutingApp, Vec::new());
        assert_eq!(
            ack.app_payload().and_then(ApplicationPayload::routing_error),
            None
        );
    }

    #[test]
    fn test_unknown_port() {
        let p = packet(PortNum::RangeTestApp, b"seq 1".to_vec());
        assert_eq!(
            p.app_payload(),
            Some(&ApplicationPayload::Unknown(Bytes::from_static(b"seq 1")))
        );

        assert_eq!(
            ApplicationPayload::decode(9999, &[1, 2]),
            ApplicationPayload::Unknown(Bytes::from_static(&[1, 2]))
        );
    }

    #[test]
    fn test_malformed_known_port_is_unknown() {
        let p = packet(PortNum::TelemetryApp, vec![0x0f, 0x0f]);
        assert!(matches!(p.app_payload(), Some(ApplicationPayload::Unknown(_))));
    }

    #[test]
    fn test_encrypted_packet_has_no_payload() {
        let p = Packet::new(MeshPacket {
            payload_variant: Some(mesh_packet::PayloadVariant::Encrypted(vec![1, 2, 3])),
            ..Default::default()
        });
        assert!(p.is_encrypted());
        assert_eq!(p.port(), None);
        assert_eq!(p.app_payload(), None);
    }

    #[test]
    fn test_payload_decoded_once() {
        let p = packet(PortNum::TextMessageApp, b"cached".to_vec());
        let first: *const ApplicationPayload = p.app_payload().unwrap();
        let second: *const ApplicationPayload = p.app_payload().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_hops_away() {
        let mut inner = MeshPacket {
            hop_start: 3,
            hop_limit: 1,
            ..Default::default()
        };
        assert_eq!(Packet::new(inner.clone()).hops_away(), Some(2));
        inner.hop_start = 0;
        assert_eq!(Packet::new(inner).hops_away(), None);
    }
}
