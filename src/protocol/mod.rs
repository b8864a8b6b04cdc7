//! Wire protocol for Meshtastic radios.
//!
//! This module contains the low-level protocol handling:
//! - Stream frame encoding/decoding with resynchronisation
//! - Protobuf decoding of radio messages into typed enums

pub mod codec;
pub mod frame;

pub use codec::{
    Framing, InboundMessage, OutboundMessage, decode_inbound, decode_outbound, encode_inbound,
    encode_outbound, try_decode_inbound,
};
pub use frame::{FrameDecoder, HEADER_SIZE, MAX_PAYLOAD_SIZE, encode as encode_frame};
