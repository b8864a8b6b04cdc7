//! # meshtastic-client
//!
//! A Rust client library for Meshtastic mesh radios.
//!
//! This library provides async communication with Meshtastic devices over
//! TCP, USB/Serial and (with the `ble` feature) Bluetooth Low Energy.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Session handshake, keepalive and delivery acknowledgements
//! - Live node registry and connected-node configuration snapshot
//! - Per-port packet listeners and broadcast packet streams
//! - Comprehensive error handling
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use meshtastic_client::{ConnectionConfig, InterfaceConfig, MeshInterface};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), meshtastic_client::Error> {
//!     // Connect to a radio on the local network
//!     let config = InterfaceConfig::new(ConnectionConfig::tcp("meshtastic.local"));
//!     let client = MeshInterface::new(config)?;
//!     client.start().await?;
//!
//!     let node = client.await_ready(Duration::from_secs(30)).await?;
//!     println!("Connected to: {}", node.id());
//!
//!     client.on_text_message(|packet, text| {
//!         println!("{:08x}: {text}", packet.sender());
//!         Ok(())
//!     });
//!
//!     // Broadcast on the primary channel
//!     client
//!         .send_text_message("hello mesh", meshtastic_client::proto::BROADCAST_ADDR, false, 0, None)
//!         .await?;
//!
//!     client.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`proto`] - Protobuf wire schema
//! - [`protocol`] - Stream framing and radio message codec
//! - [`types`] - Packets, nodes and the connected-node snapshot
//! - [`transport`] - TCP, serial, Bluetooth and in-memory transports
//! - [`event`] - Broadcast of session events and packets
//! - [`listener`] - Per-port packet callbacks
//! - [`commands`] - Outbound packet builders
//! - [`config`] - Connection and session configuration
//! - [`client`] - High-level [`MeshInterface`] client

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod proto;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::{AckOutcome, MeshInterface, SendReceipt, SessionState};
pub use commands::SendOptions;
pub use config::{ConnectionConfig, HandshakeCompletion, InterfaceConfig, SessionConfig};
pub use error::{Error, FrameError, Result, RoutingReason};
pub use event::{Event, EventFilter, EventKind, PacketStream, Subscription};
pub use listener::{BoxError, ListenerId, ListenerResult, PacketListener};
pub use proto::PortNum;
pub use protocol::{InboundMessage, OutboundMessage};
pub use transport::{
    BluetoothConfig, MemoryDevice, MemoryTransport, SerialConfig, SerialTransport, TcpConfig,
    TcpTransport, Transport, serial::list_ports,
};
#[cfg(feature = "ble")]
pub use transport::BluetoothTransport;
pub use types::{ApplicationPayload, ConnectedNode, MeshNode, Packet};
