//! Data types for Meshtastic entities.
//!
//! This module contains the core data structures used throughout the library:
//! - Mesh packets and their decoded application payloads
//! - Node registry entries
//! - The connected node snapshot

pub mod node;
pub mod packet;
pub mod snapshot;

pub use node::{MeshNode, NodePosition, NodeUser};
pub use packet::{ApplicationPayload, Packet};
pub use snapshot::{ConnectedNode, LocalConfig, ModuleConfigSet};
