//! Snapshot of the connected node's identity and configuration.

use crate::proto::{
    Channel, Config, DeviceMetadata, ModuleConfig, MyNodeInfo, channel, config, module_config,
};

use super::node::MeshNode;

/// Local configuration sections of the connected node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalConfig {
    pub device: Option<config::DeviceConfig>,
    pub position: Option<config::PositionConfig>,
    pub power: Option<config::PowerConfig>,
    pub network: Option<config::NetworkConfig>,
    pub display: Option<config::DisplayConfig>,
    pub lora: Option<config::LoRaConfig>,
    pub bluetooth: Option<config::BluetoothConfig>,
    pub security: Option<config::SecurityConfig>,
}

impl LocalConfig {
    /// Stores one configuration section, replacing any previous value.
    pub fn apply(&mut self, section: &Config) {
        use config::PayloadVariant as V;

        match &section.payload_variant {
            Some(V::Device(c)) => self.device = Some(c.clone()),
            Some(V::Position(c)) => self.position = Some(c.clone()),
            Some(V::Power(c)) => self.power = Some(c.clone()),
            Some(V::Network(c)) => self.network = Some(c.clone()),
            Some(V::Display(c)) => self.display = Some(c.clone()),
            Some(V::Lora(c)) => self.lora = Some(c.clone()),
            Some(V::Bluetooth(c)) => self.bluetooth = Some(c.clone()),
            Some(V::Security(c)) => self.security = Some(c.clone()),
            None => {}
        }
    }
}

/// Module configuration sections of the connected node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleConfigSet {
    pub mqtt: Option<module_config::MqttConfig>,
    pub serial: Option<module_config::SerialConfig>,
    pub external_notification: Option<module_config::ExternalNotificationConfig>,
    pub store_forward: Option<module_config::StoreForwardConfig>,
    pub range_test: Option<module_config::RangeTestConfig>,
    pub telemetry: Option<module_config::TelemetryConfig>,
    pub neighbor_info: Option<module_config::NeighborInfoConfig>,
    pub paxcounter: Option<module_config::PaxcounterConfig>,
}

impl ModuleConfigSet {
    /// Stores one module section, replacing any previous value.
    pub fn apply(&mut self, section: &ModuleConfig) {
        use module_config::PayloadVariant as V;

        match &section.payload_variant {
            Some(V::Mqtt(c)) => self.mqtt = Some(c.clone()),
            Some(V::Serial(c)) => self.serial = Some(c.clone()),
            Some(V::ExternalNotification(c)) => self.external_notification = Some(c.clone()),
            Some(V::StoreForward(c)) => self.store_forward = Some(c.clone()),
            Some(V::RangeTest(c)) => self.range_test = Some(c.clone()),
            Some(V::Telemetry(c)) => self.telemetry = Some(c.clone()),
            Some(V::NeighborInfo(c)) => self.neighbor_info = Some(c.clone()),
            Some(V::Paxcounter(c)) => self.paxcounter = Some(c.clone()),
            None => {}
        }
    }
}

/// Everything the radio reported about itself during the handshake.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectedNode {
    /// Own node number.
    pub num: u32,
    pub my_info: Option<MyNodeInfo>,
    /// Own entry from the node registry at the time of the query.
    pub node: Option<MeshNode>,
    pub local_config: LocalConfig,
    pub module_config: ModuleConfigSet,
    /// Channel slots ordered by index.
    pub channels: Vec<Channel>,
    pub metadata: Option<DeviceMetadata>,
}

impl ConnectedNode {
    /// Node id string, `!` plus the node number in hex.
    #[must_use]
    pub fn id(&self) -> String {
        format!("!{:08x}", self.num)
    }

    /// Records the connected node's identity.
    pub fn set_my_info(&mut self, info: MyNodeInfo) {
        self.num = info.my_node_num;
        self.my_info = Some(info);
    }

    /// Inserts or replaces a channel slot, keeping the list ordered.
    pub fn upsert_channel(&mut self, channel: Channel) {
        match self
            .channels
            .binary_search_by_key(&channel.index, |c| c.index)
        {
            Ok(pos) => self.channels[pos] = channel,
            Err(pos) => self.channels.insert(pos, channel),
        }
    }

    /// The primary channel, if configured.
    #[must_use]
    pub fn primary_channel(&self) -> Option<&Channel> {
        self.channels
            .iter()
            .find(|c| c.role == channel::Role::Primary as i32)
    }

    /// Channels that are not disabled.
    pub fn active_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels
            .iter()
            .filter(|c| c.role != channel::Role::Disabled as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::ChannelSettings;

    fn channel(index: i32, role: channel::Role, name: &str) -> Channel {
        Channel {
            index,
            role: role as i32,
            settings: Some(ChannelSettings {
                name: name.into(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_channels_ordered_by_index() {
        let mut node = ConnectedNode::default();
        node.upsert_channel(channel(2, channel::Role::Disabled, ""));
        node.upsert_channel(channel(0, channel::Role::Primary, "LongFast"));
        node.upsert_channel(channel(1, channel::Role::Secondary, "ops"));
        node.upsert_channel(channel(1, channel::Role::Secondary, "ops2"));

        let indexes: Vec<_> = node.channels.iter().map(|c| c.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(
            node.channels[1].settings.as_ref().map(|s| s.name.as_str()),
            Some("ops2")
        );
        assert_eq!(node.primary_channel().map(|c| c.index), Some(0));
        assert_eq!(node.active_channels().count(), 2);
    }

    #[test]
    fn test_local_config_sections() {
        let mut local = LocalConfig::default();
        local.apply(&Config {
            payload_variant: Some(config::PayloadVariant::Lora(config::LoRaConfig {
                hop_limit: 5,
                ..Default::default()
            })),
        });
        local.apply(&Config {
            payload_variant: Some(config::PayloadVariant::Device(config::DeviceConfig {
                role: 2,
                ..Default::default()
            })),
        });

        assert_eq!(local.lora.map(|l| l.hop_limit), Some(5));
        assert_eq!(local.device.map(|d| d.role), Some(2));
        assert!(local.security.is_none());
    }

    #[test]
    fn test_module_config_sections() {
        let mut modules = ModuleConfigSet::default();
        modules.apply(&ModuleConfig {
            payload_variant: Some(module_config::PayloadVariant::Mqtt(
                module_config::MqttConfig {
                    enabled: true,
                    address: "mqtt.meshtastic.org".into(),
                    ..Default::default()
                },
            )),
        });

        assert!(modules.mqtt.is_some_and(|m| m.enabled));
        assert!(modules.telemetry.is_none());
    }

    #[test]
    fn test_my_info_sets_num() {
        let mut node = ConnectedNode::default();
        node.set_my_info(MyNodeInfo {
            my_node_num: 0xdead_beef,
            ..Default::default()
        });
        assert_eq!(node.num, 0xdead_beef);
        assert_eq!(node.id(), "!deadbeef");
    }
}
