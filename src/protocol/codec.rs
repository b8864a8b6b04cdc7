//! Protobuf codec for radio messages.
//!
//! Converts between raw frame payloads and the typed [`InboundMessage`] and
//! [`OutboundMessage`] enums. The codec is stateless; stream framing is
//! applied on the way out according to the transport's [`Framing`].

use bytes::Bytes;
use prost::Message;
use tracing::{debug, warn};

use super::frame::{self, MAX_PAYLOAD_SIZE};
use crate::error::{FrameError, Result};
use crate::proto::{
    Channel, Config, DeviceMetadata, FromRadio, Heartbeat, LogRecord, MeshPacket, ModuleConfig,
    MyNodeInfo, NodeInfo, QueueStatus, ToRadio, from_radio, to_radio,
};

/// How a transport delimits messages on its medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Continuous byte stream; each message carries the 4-byte header.
    Stream,
    /// The medium delimits messages itself (BLE characteristics).
    Datagram,
}

/// A message received from the radio.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A packet received from (or echoed back to) the mesh.
    Packet(MeshPacket),
    /// Identity of the connected node.
    MyInfo(MyNodeInfo),
    /// One entry of the node database.
    NodeInfo(NodeInfo),
    /// One local configuration section.
    Config(Config),
    /// One module configuration section.
    ModuleConfig(ModuleConfig),
    /// One channel slot.
    Channel(Channel),
    /// Firmware metadata.
    Metadata(DeviceMetadata),
    /// Debug log line.
    Log(LogRecord),
    /// End of the configuration dump, carrying the requested id.
    ConfigComplete(u32),
    /// Transmit queue status.
    QueueStatus(QueueStatus),
    /// The radio rebooted; any session state is stale.
    Rebooted,
    /// A message kind this client does not model.
    Other,
}

impl From<FromRadio> for InboundMessage {
    fn from(msg: FromRadio) -> Self {
        use from_radio::PayloadVariant as V;

        match msg.payload_variant {
            Some(V::Packet(p)) => Self::Packet(p),
            Some(V::MyInfo(info)) => Self::MyInfo(info),
            Some(V::NodeInfo(info)) => Self::NodeInfo(info),
            Some(V::Config(config)) => Self::Config(config),
            Some(V::ModuleConfig(config)) => Self::ModuleConfig(config),
            Some(V::Channel(channel)) => Self::Channel(channel),
            Some(V::Metadata(metadata)) => Self::Metadata(metadata),
            Some(V::LogRecord(record)) => Self::Log(record),
            Some(V::ConfigCompleteId(id)) => Self::ConfigComplete(id),
            Some(V::QueueStatus(status)) => Self::QueueStatus(status),
            Some(V::Rebooted(_)) => Self::Rebooted,
            None => Self::Other,
        }
    }
}

impl From<InboundMessage> for FromRadio {
    fn from(msg: InboundMessage) -> Self {
        use from_radio::PayloadVariant as V;

        let payload_variant = match msg {
            InboundMessage::Packet(p) => Some(V::Packet(p)),
            InboundMessage::MyInfo(info) => Some(V::MyInfo(info)),
            InboundMessage::NodeInfo(info) => Some(V::NodeInfo(info)),
            InboundMessage::Config(config) => Some(V::Config(config)),
            InboundMessage::ModuleConfig(config) => Some(V::ModuleConfig(config)),
            InboundMessage::Channel(channel) => Some(V::Channel(channel)),
            InboundMessage::Metadata(metadata) => Some(V::Metadata(metadata)),
            InboundMessage::Log(record) => Some(V::LogRecord(record)),
            InboundMessage::ConfigComplete(id) => Some(V::ConfigCompleteId(id)),
            InboundMessage::QueueStatus(status) => Some(V::QueueStatus(status)),
            InboundMessage::Rebooted => Some(V::Rebooted(true)),
            InboundMessage::Other => None,
        };
        Self {
            id: 0,
            payload_variant,
        }
    }
}

/// A message sent to the radio.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// A packet to transmit on the mesh.
    Packet(MeshPacket),
    /// Request the full configuration dump, tagged with a nonce.
    WantConfig(u32),
    /// Tell the radio the client is going away.
    Disconnect,
    /// Keep the link alive.
    Heartbeat(u32),
}

impl From<OutboundMessage> for ToRadio {
    fn from(msg: OutboundMessage) -> Self {
        use to_radio::PayloadVariant as V;

        let payload_variant = match msg {
            OutboundMessage::Packet(p) => V::Packet(p),
            OutboundMessage::WantConfig(nonce) => V::WantConfigId(nonce),
            OutboundMessage::Disconnect => V::Disconnect(true),
            OutboundMessage::Heartbeat(nonce) => V::Heartbeat(Heartbeat { nonce }),
        };
        Self {
            payload_variant: Some(payload_variant),
        }
    }
}

impl TryFrom<ToRadio> for OutboundMessage {
    type Error = ToRadio;

    fn try_from(msg: ToRadio) -> std::result::Result<Self, ToRadio> {
        use to_radio::PayloadVariant as V;

        match msg.payload_variant {
            Some(V::Packet(p)) => Ok(Self::Packet(p)),
            Some(V::WantConfigId(nonce)) => Ok(Self::WantConfig(nonce)),
            Some(V::Disconnect(_)) => Ok(Self::Disconnect),
            Some(V::Heartbeat(hb)) => Ok(Self::Heartbeat(hb.nonce)),
            None => Err(msg),
        }
    }
}

/// Decodes one frame payload from the radio.
///
/// # Errors
///
/// Returns `FrameError::Malformed` if the bytes are not a valid `FromRadio`.
pub fn try_decode_inbound(payload: &[u8]) -> std::result::Result<InboundMessage, FrameError> {
    Ok(FromRadio::decode(payload)?.into())
}

/// Decodes one frame payload from the radio, logging and discarding
/// malformed input.
#[must_use]
pub fn decode_inbound(payload: &[u8]) -> Option<InboundMessage> {
    match try_decode_inbound(payload) {
        Ok(InboundMessage::Other) => {
            debug!(len = payload.len(), "ignoring unmodelled radio message");
            Some(InboundMessage::Other)
        }
        Ok(msg) => Some(msg),
        Err(e) => {
            warn!(error = %e, len = payload.len(), "discarding malformed frame");
            None
        }
    }
}

/// Encodes a message for the radio in the transport's wire representation.
///
/// # Errors
///
/// Returns `Error::Frame` if the encoded message is larger than one frame.
pub fn encode_outbound(msg: &OutboundMessage, framing: Framing) -> Result<Bytes> {
    let payload = ToRadio::from(msg.clone()).encode_to_vec();
    wrap(payload, framing)
}

/// Encodes a radio-side message. Used by simulated devices.
///
/// # Errors
///
/// Returns `Error::Frame` if the encoded message is larger than one frame.
pub fn encode_inbound(msg: &InboundMessage, framing: Framing) -> Result<Bytes> {
    let payload = FromRadio::from(msg.clone()).encode_to_vec();
    wrap(payload, framing)
}

/// Decodes one frame payload written by the client. Used by simulated devices.
///
/// # Errors
///
/// Returns `FrameError::Malformed` if the bytes are not a valid `ToRadio`.
/// An empty `ToRadio` decodes to `None`.
pub fn decode_outbound(payload: &[u8]) -> std::result::Result<Option<OutboundMessage>, FrameError> {
    Ok(OutboundMessage::try_from(ToRadio::decode(payload)?).ok())
}

fn wrap(payload: Vec<u8>, framing: Framing) -> Result<Bytes> {
    match framing {
        Framing::Stream => Ok(frame::encode(&payload)?),
        Framing::Datagram if payload.len() > MAX_PAYLOAD_SIZE => Err(FrameError::TooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        }
        .into()),
        Framing::Datagram => Ok(Bytes::from(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{Data, PortNum, User, mesh_packet};
    use crate::protocol::frame::FrameDecoder;

    fn text_packet() -> MeshPacket {
        MeshPacket {
            from: 0x1234_5678,
            to: crate::proto::BROADCAST_ADDR,
            id: 42,
            hop_limit: 3,
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: PortNum::TextMessageApp as i32,
                payload: b"hello mesh".to_vec(),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    fn inbound_samples() -> Vec<InboundMessage> {
        vec![
            InboundMessage::Packet(text_packet()),
            InboundMessage::MyInfo(MyNodeInfo {
                my_node_num: 7,
                ..Default::default()
            }),
            InboundMessage::NodeInfo(NodeInfo {
                num: 99,
                user: Some(User {
                    id: "!00000063".into(),
                    long_name: "Base".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            InboundMessage::Config(Config::default()),
            InboundMessage::ModuleConfig(ModuleConfig::default()),
            InboundMessage::Channel(Channel {
                index: 1,
                ..Default::default()
            }),
            InboundMessage::Metadata(DeviceMetadata {
                firmware_version: "2.5.0".into(),
                ..Default::default()
            }),
            InboundMessage::Log(LogRecord {
                message: "hi".into(),
                ..Default::default()
            }),
            InboundMessage::ConfigComplete(1234),
            InboundMessage::QueueStatus(QueueStatus {
                free: 10,
                maxlen: 16,
                ..Default::default()
            }),
            InboundMessage::Rebooted,
            InboundMessage::Other,
        ]
    }

    #[test]
    fn test_inbound_roundtrip_datagram() {
        for msg in inbound_samples() {
            let bytes = encode_inbound(&msg, Framing::Datagram).unwrap();
            assert_eq!(decode_inbound(&bytes), Some(msg));
        }
    }

    #[test]
    fn test_outbound_roundtrip_stream() {
        let samples = [
            OutboundMessage::Packet(text_packet()),
            OutboundMessage::WantConfig(0xdead_beef),
            OutboundMessage::Disconnect,
            OutboundMessage::Heartbeat(5),
        ];

        let mut decoder = FrameDecoder::new();
        for msg in &samples {
            decoder.feed(&encode_outbound(msg, Framing::Stream).unwrap());
        }
        for msg in samples {
            let payload = decoder.decode().unwrap().unwrap();
            assert_eq!(decode_outbound(&payload).unwrap(), Some(msg));
        }
    }

    #[test]
    fn test_stream_framing_header() {
        let bytes = encode_outbound(&OutboundMessage::WantConfig(1), Framing::Stream).unwrap();
        assert_eq!(&bytes[..2], &[frame::START1, frame::START2]);
        assert_eq!(usize::from(u16::from_be_bytes([bytes[2], bytes[3]])), bytes.len() - 4);

        let raw = encode_outbound(&OutboundMessage::WantConfig(1), Framing::Datagram).unwrap();
        assert_eq!(&bytes[4..], &raw[..]);
    }

    #[test]
    fn test_malformed_frame_discarded() {
        assert_eq!(decode_inbound(&[0x0f, 0x0f]), None);
        assert!(matches!(
            try_decode_inbound(&[0x0f, 0x0f]),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_malformed_frame_between_valid_frames() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame::encode(&[0x0f, 0x0f]).unwrap());
        for id in 1..=3 {
            stream.extend_from_slice(
                &encode_inbound(&InboundMessage::ConfigComplete(id), Framing::Stream).unwrap(),
            );
        }

        let mut decoder = FrameDecoder::new();
        decoder.feed(&stream);
        let mut decoded = Vec::new();
        while let Some(payload) = decoder.decode().unwrap() {
            decoded.extend(decode_inbound(&payload));
        }

        assert_eq!(
            decoded,
            vec![
                InboundMessage::ConfigComplete(1),
                InboundMessage::ConfigComplete(2),
                InboundMessage::ConfigComplete(3),
            ]
        );
    }

    #[test]
    fn test_oversized_message_rejected() {
        let mut packet = text_packet();
        if let Some(mesh_packet::PayloadVariant::Decoded(data)) = &mut packet.payload_variant {
            data.payload = vec![0x41; 600];
        }
        let msg = OutboundMessage::Packet(packet);
        assert!(encode_outbound(&msg, Framing::Stream).is_err());
        assert!(encode_outbound(&msg, Framing::Datagram).is_err());
    }
}
