//! Outbound commands for Meshtastic radios.
//!
//! The [`CommandHandler`] builds `ToRadio` messages and mesh packets,
//! assigns packet ids and writes them through the transport. It does not
//! wait for replies; correlating acknowledgements is the session's job.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use prost::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::proto::{
    AdminMessage, BROADCAST_ADDR, DATA_PAYLOAD_LEN, Data, MeshPacket, PortNum, admin_message,
    mesh_packet,
};
use crate::protocol::{OutboundMessage, encode_outbound};
use crate::transport::Transport;

/// Default number of hops a packet may travel.
pub const DEFAULT_HOP_LIMIT: u32 = 3;

/// Default number of extra write attempts after a transient failure.
pub const DEFAULT_SEND_RETRIES: usize = 1;

/// Addressing and delivery options for an outbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Destination node number.
    pub destination: u32,
    /// Channel slot index.
    pub channel: u32,
    /// Ask the mesh for a delivery acknowledgement.
    pub want_ack: bool,
    /// Ask the destination application for a reply.
    pub want_response: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self::broadcast()
    }
}

impl SendOptions {
    /// Options for a broadcast on the primary channel.
    #[must_use]
    pub const fn broadcast() -> Self {
        Self::to(BROADCAST_ADDR)
    }

    /// Options for a packet addressed to one node.
    #[must_use]
    pub const fn to(destination: u32) -> Self {
        Self {
            destination,
            channel: 0,
            want_ack: false,
            want_response: false,
        }
    }

    /// Sets the channel slot index.
    #[must_use]
    pub const fn channel(mut self, channel: u32) -> Self {
        self.channel = channel;
        self
    }

    /// Requests a delivery acknowledgement.
    #[must_use]
    pub const fn want_ack(mut self, want_ack: bool) -> Self {
        self.want_ack = want_ack;
        self
    }

    /// Requests an application reply.
    #[must_use]
    pub const fn want_response(mut self, want_response: bool) -> Self {
        self.want_response = want_response;
        self
    }
}

/// Command handler for Meshtastic operations.
pub struct CommandHandler {
    transport: Arc<dyn Transport>,
    send_retries: usize,
    hop_limit: u32,
    packet_id: AtomicU32,
}

impl CommandHandler {
    /// Creates a new command handler writing through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            send_retries: DEFAULT_SEND_RETRIES,
            hop_limit: DEFAULT_HOP_LIMIT,
            packet_id: AtomicU32::new(initial_packet_id()),
        }
    }

    /// Sets how often a transiently failed write is retried.
    #[must_use]
    pub fn with_send_retries(mut self, retries: usize) -> Self {
        self.send_retries = retries;
        self
    }

    /// Sets the hop limit stamped on outbound packets.
    #[must_use]
    pub fn with_hop_limit(mut self, hop_limit: u32) -> Self {
        self.hop_limit = hop_limit;
        self
    }

    /// Returns the next packet id. Zero is reserved and never returned.
    pub fn next_packet_id(&self) -> u32 {
        loop {
            let id = self.packet_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }

    /// Encodes and writes one message.
    ///
    /// A transient write failure is retried; once the retries are used up
    /// the call fails with [`Error::SendFailed`].
    pub async fn send(&self, msg: &OutboundMessage) -> Result<()> {
        let frame = encode_outbound(msg, self.transport.framing())?;
        trace!(len = frame.len(), "writing frame");

        for attempt in 0..=self.send_retries {
            if self.transport.send(frame.clone()).await? {
                return Ok(());
            }
            warn!(attempt, "transient write failure");
        }
        Err(Error::SendFailed)
    }

    // ==================== Session Commands ====================

    /// Asks the radio to stream its configuration, tagged with `nonce`.
    pub async fn want_config(&self, nonce: u32) -> Result<()> {
        debug!(nonce, "requesting configuration");
        self.send(&OutboundMessage::WantConfig(nonce)).await
    }

    /// Sends a heartbeat so the radio keeps the client link open.
    pub async fn heartbeat(&self) -> Result<()> {
        self.send(&OutboundMessage::Heartbeat(self.next_packet_id()))
            .await
    }

    /// Tells the radio the client is going away.
    pub async fn disconnect_notice(&self) -> Result<()> {
        self.send(&OutboundMessage::Disconnect).await
    }

    // ==================== Packet Builders ====================

    /// Builds a data packet on `port` with a fresh packet id.
    ///
    /// Fails with [`Error::PayloadTooLarge`] if the payload does not fit in
    /// one packet.
    pub fn data_packet(
        &self,
        port: PortNum,
        payload: Vec<u8>,
        options: SendOptions,
    ) -> Result<MeshPacket> {
        if payload.len() > DATA_PAYLOAD_LEN {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: DATA_PAYLOAD_LEN,
            });
        }

        Ok(MeshPacket {
            to: options.destination,
            channel: options.channel,
            id: self.next_packet_id(),
            hop_limit: self.hop_limit,
            want_ack: options.want_ack,
            priority: if options.want_ack {
                mesh_packet::Priority::Reliable as i32
            } else {
                mesh_packet::Priority::Unset as i32
            },
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: port as i32,
                payload,
                want_response: options.want_response,
                ..Default::default()
            })),
            ..Default::default()
        })
    }

    /// Builds a text message packet.
    pub fn text_packet(&self, text: &str, options: SendOptions) -> Result<MeshPacket> {
        self.data_packet(PortNum::TextMessageApp, text.as_bytes().to_vec(), options)
    }

    /// Builds an admin packet addressed to `node`.
    pub fn admin_packet(&self, node: u32, message: &AdminMessage) -> Result<MeshPacket> {
        self.data_packet(
            PortNum::AdminApp,
            message.encode_to_vec(),
            SendOptions::to(node),
        )
    }

    /// Builds the admin packet that sets `node`'s clock to `unix_time`.
    pub fn set_time_packet(&self, node: u32, unix_time: u32) -> Result<MeshPacket> {
        let message = AdminMessage {
            payload_variant: Some(admin_message::PayloadVariant::SetTimeOnly(unix_time)),
            ..Default::default()
        };
        self.admin_packet(node, &message)
    }

    /// Writes a mesh packet and returns its id.
    pub async fn send_packet(&self, packet: MeshPacket) -> Result<u32> {
        let id = packet.id;
        debug!(
            packet_id = id,
            to = packet.to,
            want_ack = packet.want_ack,
            "sending packet"
        );
        self.send(&OutboundMessage::Packet(packet)).await?;
        Ok(id)
    }
}

/// Seeds packet ids from the clock so restarts do not reuse recent ids.
fn initial_packet_id() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32).rotate_left(16))
        .unwrap_or(1)
}
