//! Node registry entries.

use crate::proto::{
    DeviceMetrics, EnvironmentMetrics, LocalStats, NodeInfo, Position, PowerMetrics, Telemetry,
    User, telemetry,
};

use super::packet::{ApplicationPayload, Packet};

/// Coordinate scaling factor (protocol stores degrees * 1e7).
const COORD_SCALE: f64 = 1e-7;

/// Number of public key bytes shown in a fingerprint.
const FINGERPRINT_LEN: usize = 8;

/// Identity a node broadcasts about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeUser {
    /// Node id string, e.g. `!a1b2c3d4`.
    pub id: String,
    pub long_name: String,
    pub short_name: String,
    /// Hardware model enum value.
    pub hw_model: i32,
    /// Device role enum value.
    pub role: i32,
    pub is_licensed: bool,
    pub public_key: Vec<u8>,
}

impl NodeUser {
    /// Returns a short hex fingerprint of the node's public key.
    #[must_use]
    pub fn public_key_fingerprint(&self) -> Option<String> {
        if self.public_key.is_empty() {
            return None;
        }
        let len = self.public_key.len().min(FINGERPRINT_LEN);
        Some(hex::encode(&self.public_key[..len]))
    }
}

impl From<&User> for NodeUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            long_name: user.long_name.clone(),
            short_name: user.short_name.clone(),
            hw_model: user.hw_model,
            role: user.role,
            is_licensed: user.is_licensed,
            public_key: user.public_key.clone(),
        }
    }
}

/// Last reported position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodePosition {
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Altitude in metres above sea level.
    pub altitude: Option<i32>,
    /// Unix time of the fix.
    pub time: Option<u32>,
}

impl From<&Position> for NodePosition {
    fn from(position: &Position) -> Self {
        Self {
            latitude: position.latitude_i.map(|v| f64::from(v) * COORD_SCALE),
            longitude: position.longitude_i.map(|v| f64::from(v) * COORD_SCALE),
            altitude: position.altitude,
            time: (position.time != 0).then_some(position.time),
        }
    }
}

/// A node known to the connected radio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshNode {
    /// Node number; unique within the mesh.
    pub num: u32,
    pub user: Option<NodeUser>,
    pub position: Option<NodePosition>,
    pub device_metrics: Option<DeviceMetrics>,
    pub environment_metrics: Option<EnvironmentMetrics>,
    pub power_metrics: Option<PowerMetrics>,
    pub local_stats: Option<LocalStats>,
    /// SNR of the last packet heard from this node.
    pub snr: Option<f32>,
    /// RSSI of the last packet heard from this node.
    pub rssi: Option<i32>,
    /// Unix time the node was last heard.
    pub last_heard: Option<u32>,
    /// Hops between this node and the connected node.
    pub hops_away: Option<u32>,
    pub channel: u32,
    pub via_mqtt: bool,
    pub is_favorite: bool,
}

impl MeshNode {
    /// Creates an empty entry for a node number.
    #[must_use]
    pub fn new(num: u32) -> Self {
        Self {
            num,
            ..Self::default()
        }
    }

    /// Creates an entry from a node database record.
    #[must_use]
    pub fn from_node_info(info: &NodeInfo) -> Self {
        let mut node = Self::new(info.num);
        node.update_from_node_info(info);
        node
    }

    /// Node id string; falls back to `!` plus the number in hex.
    #[must_use]
    pub fn id(&self) -> String {
        self.user
            .as_ref()
            .filter(|user| !user.id.is_empty())
            .map_or_else(|| format!("!{:08x}", self.num), |user| user.id.clone())
    }

    /// Long name, if the node has announced one.
    #[must_use]
    pub fn long_name(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.long_name.as_str())
    }

    /// Short name, if the node has announced one.
    #[must_use]
    pub fn short_name(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.short_name.as_str())
    }

    /// Battery level in percent; above 100 means externally powered.
    #[must_use]
    pub fn battery_level(&self) -> Option<u32> {
        self.device_metrics.as_ref().and_then(|m| m.battery_level)
    }

    /// Battery voltage.
    #[must_use]
    pub fn voltage(&self) -> Option<f32> {
        self.device_metrics.as_ref().and_then(|m| m.voltage)
    }

    /// Channel utilisation in percent.
    #[must_use]
    pub fn channel_utilization(&self) -> Option<f32> {
        self.device_metrics.as_ref().and_then(|m| m.channel_utilization)
    }

    /// Transmit airtime utilisation in percent.
    #[must_use]
    pub fn air_util_tx(&self) -> Option<f32> {
        self.device_metrics.as_ref().and_then(|m| m.air_util_tx)
    }

    /// Merges a node database record into this entry.
    pub fn update_from_node_info(&mut self, info: &NodeInfo) {
        if let Some(user) = &info.user {
            self.user = Some(user.into());
        }
        if let Some(position) = &info.position {
            self.position = Some(position.into());
        }
        if let Some(metrics) = &info.device_metrics {
            merge_device_metrics(&mut self.device_metrics, metrics);
        }
        if info.snr != 0.0 {
            self.snr = Some(info.snr);
        }
        if info.last_heard != 0 {
            self.last_heard = Some(info.last_heard);
        }
        if info.hops_away.is_some() {
            self.hops_away = info.hops_away;
        }
        self.channel = info.channel;
        self.via_mqtt = info.via_mqtt;
        self.is_favorite = info.is_favorite;
    }

    /// Merges the metadata and payload of a packet sent by this node.
    ///
    /// `now` is used as the last-heard time when the radio did not stamp
    /// the packet.
    pub fn update_from_packet(&mut self, packet: &Packet, now: u32) {
        self.last_heard = Some(packet.rx_time().unwrap_or(now));
        if let Some(snr) = packet.rx_snr() {
            self.snr = Some(snr);
        }
        if let Some(rssi) = packet.rx_rssi() {
            self.rssi = Some(rssi);
        }
        if let Some(hops) = packet.hops_away() {
            self.hops_away = Some(hops);
        }
        self.via_mqtt = packet.mesh_packet().via_mqtt;

        match packet.app_payload() {
            Some(ApplicationPayload::NodeInfo(user)) => self.user = Some(user.into()),
            Some(ApplicationPayload::Position(position)) => {
                self.position = Some(position.into());
            }
            Some(ApplicationPayload::Telemetry(telemetry)) => self.apply_telemetry(telemetry),
            _ => {}
        }
    }

    /// Stores a telemetry report in the matching metrics slot.
    pub fn apply_telemetry(&mut self, report: &Telemetry) {
        match &report.variant {
            Some(telemetry::Variant::DeviceMetrics(metrics)) => {
                merge_device_metrics(&mut self.device_metrics, metrics);
            }
            Some(telemetry::Variant::EnvironmentMetrics(metrics)) => {
                self.environment_metrics = Some(metrics.clone());
            }
            Some(telemetry::Variant::PowerMetrics(metrics)) => {
                self.power_metrics = Some(metrics.clone());
            }
            Some(telemetry::Variant::LocalStats(stats)) => {
                self.local_stats = Some(stats.clone());
            }
            None => {}
        }
    }
}

/// Overwrites the fields present in `update`, keeping the rest.
fn merge_device_metrics(current: &mut Option<DeviceMetrics>, update: &DeviceMetrics) {
    let metrics = current.get_or_insert_with(DeviceMetrics::default);
    metrics.battery_level = update.battery_level.or(metrics.battery_level);
    metrics.voltage = update.voltage.or(metrics.voltage);
    metrics.channel_utilization = update.channel_utilization.or(metrics.channel_utilization);
    metrics.air_util_tx = update.air_util_tx.or(metrics.air_util_tx);
    metrics.uptime_seconds = update.uptime_seconds.or(metrics.uptime_seconds);
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;
    use crate::proto::{Data, MeshPacket, PortNum, mesh_packet};

    fn node_info() -> NodeInfo {
        NodeInfo {
            num: 0x63,
            user: Some(User {
                id: "!00000063".into(),
                long_name: "Hilltop".into(),
                short_name: "HT".into(),
                public_key: vec![0xab; 32],
                ..Default::default()
            }),
            position: Some(Position {
                latitude_i: Some(525_200_000),
                longitude_i: Some(134_050_000),
                altitude: Some(34),
                time: 0,
            }),
            device_metrics: Some(DeviceMetrics {
                battery_level: Some(80),
                voltage: Some(3.9),
                ..Default::default()
            }),
            snr: 6.5,
            last_heard: 1_700_000_000,
            hops_away: Some(2),
            ..Default::default()
        }
    }

    fn packet_from(from: u32, port: PortNum, payload: Vec<u8>) -> Packet {
        Packet::new(MeshPacket {
            from,
            rx_snr: -3.25,
            rx_rssi: -101,
            hop_start: 3,
            hop_limit: 3,
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: port as i32,
                payload,
                ..Default::default()
            })),
            ..Default::default()
        })
    }

    #[test]
    fn test_from_node_info() {
        let node = MeshNode::from_node_info(&node_info());

        assert_eq!(node.num, 0x63);
        assert_eq!(node.id(), "!00000063");
        assert_eq!(node.long_name(), Some("Hilltop"));
        assert_eq!(node.battery_level(), Some(80));
        assert_eq!(node.snr, Some(6.5));
        assert_eq!(node.hops_away, Some(2));

        let position = node.position.unwrap();
        assert!((position.latitude.unwrap() - 52.52).abs() < 1e-6);
        assert!((position.longitude.unwrap() - 13.405).abs() < 1e-6);
        assert_eq!(position.time, None);
    }

    #[test]
    fn test_fallback_id() {
        assert_eq!(MeshNode::new(0xa1b2).id(), "!0000a1b2");
    }

    #[test]
    fn test_public_key_fingerprint() {
        let node = MeshNode::from_node_info(&node_info());
        let user = node.user.unwrap();
        assert_eq!(
            user.public_key_fingerprint().as_deref(),
            Some("abababababababab")
        );
        assert_eq!(NodeUser::default().public_key_fingerprint(), None);
    }

    #[test]
    fn test_device_metrics_merge() {
        let mut node = MeshNode::from_node_info(&node_info());
        node.apply_telemetry(&Telemetry {
            time: 0,
            variant: Some(telemetry::Variant::DeviceMetrics(DeviceMetrics {
                channel_utilization: Some(12.5),
                battery_level: Some(75),
                ..Default::default()
            })),
        });

        assert_eq!(node.battery_level(), Some(75));
        assert_eq!(node.voltage(), Some(3.9));
        assert_eq!(node.channel_utilization(), Some(12.5));
    }

    #[test]
    fn test_update_from_telemetry_packet() {
        let report = Telemetry {
            time: 0,
            variant: Some(telemetry::Variant::EnvironmentMetrics(EnvironmentMetrics {
                temperature: Some(21.5),
                ..Default::default()
            })),
        };
        let packet = packet_from(0x63, PortNum::TelemetryApp, report.encode_to_vec());

        let mut node = MeshNode::new(0x63);
        node.update_from_packet(&packet, 1_700_000_100);

        assert_eq!(
            node.environment_metrics.and_then(|m| m.temperature),
            Some(21.5)
        );
        assert_eq!(node.last_heard, Some(1_700_000_100));
        assert_eq!(node.snr, Some(-3.25));
        assert_eq!(node.rssi, Some(-101));
        assert_eq!(node.hops_away, Some(0));
    }

    #[test]
    fn test_update_from_nodeinfo_packet() {
        let user = User {
            id: "!00000063".into(),
            long_name: "Renamed".into(),
            ..Default::default()
        };
        let packet = packet_from(0x63, PortNum::NodeinfoApp, user.encode_to_vec());

        let mut node = MeshNode::from_node_info(&node_info());
        node.update_from_packet(&packet, 0);

        assert_eq!(node.long_name(), Some("Renamed"));
        assert!(node.position.is_some());
    }
}
