//! Meshtastic protobuf schema.
//!
//! The subset of the `meshtastic` protobuf package used by the client-API,
//! laid out the way `prost-build` generates it. Fields this client does not
//! read are omitted; `prost` skips unknown fields and unknown `oneof` tags
//! when decoding, so newer firmware remains readable.

/// Destination address for broadcast packets.
pub const BROADCAST_ADDR: u32 = 0xFFFF_FFFF;

/// Maximum size of a `Data.payload`.
pub const DATA_PAYLOAD_LEN: usize = 233;

// ==================== Radio Envelope ====================

/// Packets from the radio to the client.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FromRadio {
    /// Monotonic id assigned by the radio.
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(
        oneof = "from_radio::PayloadVariant",
        tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13"
    )]
    pub payload_variant: ::core::option::Option<from_radio::PayloadVariant>,
}

/// Nested message and enum types in `FromRadio`.
pub mod from_radio {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "2")]
        Packet(super::MeshPacket),
        #[prost(message, tag = "3")]
        MyInfo(super::MyNodeInfo),
        #[prost(message, tag = "4")]
        NodeInfo(super::NodeInfo),
        #[prost(message, tag = "5")]
        Config(super::Config),
        #[prost(message, tag = "6")]
        LogRecord(super::LogRecord),
        #[prost(uint32, tag = "7")]
        ConfigCompleteId(u32),
        #[prost(bool, tag = "8")]
        Rebooted(bool),
        #[prost(message, tag = "9")]
        ModuleConfig(super::ModuleConfig),
        #[prost(message, tag = "10")]
        Channel(super::Channel),
        #[prost(message, tag = "11")]
        QueueStatus(super::QueueStatus),
        #[prost(message, tag = "13")]
        Metadata(super::DeviceMetadata),
    }
}

/// Packets from the client to the radio.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToRadio {
    #[prost(oneof = "to_radio::PayloadVariant", tags = "1, 3, 4, 7")]
    pub payload_variant: ::core::option::Option<to_radio::PayloadVariant>,
}

/// Nested message and enum types in `ToRadio`.
pub mod to_radio {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "1")]
        Packet(super::MeshPacket),
        #[prost(uint32, tag = "3")]
        WantConfigId(u32),
        #[prost(bool, tag = "4")]
        Disconnect(bool),
        #[prost(message, tag = "7")]
        Heartbeat(super::Heartbeat),
    }
}

/// Keeps the serial link alive.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Heartbeat {
    #[prost(uint32, tag = "1")]
    pub nonce: u32,
}

// ==================== Mesh Packets ====================

/// A packet envelope sent or received over the mesh.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeshPacket {
    #[prost(fixed32, tag = "1")]
    pub from: u32,
    #[prost(fixed32, tag = "2")]
    pub to: u32,
    /// Channel index for outbound packets, channel hash for inbound ones.
    #[prost(uint32, tag = "3")]
    pub channel: u32,
    #[prost(fixed32, tag = "6")]
    pub id: u32,
    #[prost(fixed32, tag = "7")]
    pub rx_time: u32,
    #[prost(float, tag = "8")]
    pub rx_snr: f32,
    #[prost(uint32, tag = "9")]
    pub hop_limit: u32,
    #[prost(bool, tag = "10")]
    pub want_ack: bool,
    #[prost(enumeration = "mesh_packet::Priority", tag = "11")]
    pub priority: i32,
    #[prost(int32, tag = "12")]
    pub rx_rssi: i32,
    #[prost(bool, tag = "14")]
    pub via_mqtt: bool,
    #[prost(uint32, tag = "15")]
    pub hop_start: u32,
    #[prost(bytes = "vec", tag = "16")]
    pub public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bool, tag = "17")]
    pub pki_encrypted: bool,
    #[prost(oneof = "mesh_packet::PayloadVariant", tags = "4, 5")]
    pub payload_variant: ::core::option::Option<mesh_packet::PayloadVariant>,
}

/// Nested message and enum types in `MeshPacket`.
pub mod mesh_packet {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Priority {
        Unset = 0,
        Min = 1,
        Background = 10,
        Default = 64,
        Reliable = 70,
        Response = 80,
        High = 100,
        Ack = 120,
        Max = 127,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "4")]
        Decoded(super::Data),
        #[prost(bytes, tag = "5")]
        Encrypted(::prost::alloc::vec::Vec<u8>),
    }
}

/// Decoded application payload of a mesh packet.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Data {
    #[prost(enumeration = "PortNum", tag = "1")]
    pub portnum: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
    #[prost(bool, tag = "3")]
    pub want_response: bool,
    #[prost(fixed32, tag = "4")]
    pub dest: u32,
    #[prost(fixed32, tag = "5")]
    pub source: u32,
    #[prost(fixed32, tag = "6")]
    pub request_id: u32,
    #[prost(fixed32, tag = "7")]
    pub reply_id: u32,
    #[prost(fixed32, tag = "8")]
    pub emoji: u32,
    #[prost(uint32, optional, tag = "9")]
    pub bitfield: ::core::option::Option<u32>,
}

/// Application identifiers carried in `Data.portnum`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PortNum {
    UnknownApp = 0,
    TextMessageApp = 1,
    RemoteHardwareApp = 2,
    PositionApp = 3,
    NodeinfoApp = 4,
    RoutingApp = 5,
    AdminApp = 6,
    TextMessageCompressedApp = 7,
    WaypointApp = 8,
    AudioApp = 9,
    DetectionSensorApp = 10,
    ReplyApp = 32,
    IpTunnelApp = 33,
    PaxcounterApp = 34,
    SerialApp = 64,
    StoreForwardApp = 65,
    RangeTestApp = 66,
    TelemetryApp = 67,
    ZpsApp = 68,
    SimulatorApp = 69,
    TracerouteApp = 70,
    NeighborinfoApp = 71,
    AtakPlugin = 72,
    MapReportApp = 73,
    PowerstressApp = 74,
    PrivateApp = 256,
    AtakForwarder = 257,
    Max = 511,
}

impl PortNum {
    /// String value of the enum field names used in the protobuf definition.
    #[must_use]
    pub const fn as_str_name(&self) -> &'static str {
        match self {
            Self::UnknownApp => "UNKNOWN_APP",
            Self::TextMessageApp => "TEXT_MESSAGE_APP",
            Self::RemoteHardwareApp => "REMOTE_HARDWARE_APP",
            Self::PositionApp => "POSITION_APP",
            Self::NodeinfoApp => "NODEINFO_APP",
            Self::RoutingApp => "ROUTING_APP",
            Self::AdminApp => "ADMIN_APP",
            Self::TextMessageCompressedApp => "TEXT_MESSAGE_COMPRESSED_APP",
            Self::WaypointApp => "WAYPOINT_APP",
            Self::AudioApp => "AUDIO_APP",
            Self::DetectionSensorApp => "DETECTION_SENSOR_APP",
            Self::ReplyApp => "REPLY_APP",
            Self::IpTunnelApp => "IP_TUNNEL_APP",
            Self::PaxcounterApp => "PAXCOUNTER_APP",
            Self::SerialApp => "SERIAL_APP",
            Self::StoreForwardApp => "STORE_FORWARD_APP",
            Self::RangeTestApp => "RANGE_TEST_APP",
            Self::TelemetryApp => "TELEMETRY_APP",
            Self::ZpsApp => "ZPS_APP",
            Self::SimulatorApp => "SIMULATOR_APP",
            Self::TracerouteApp => "TRACEROUTE_APP",
            Self::NeighborinfoApp => "NEIGHBORINFO_APP",
            Self::AtakPlugin => "ATAK_PLUGIN",
            Self::MapReportApp => "MAP_REPORT_APP",
            Self::PowerstressApp => "POWERSTRESS_APP",
            Self::PrivateApp => "PRIVATE_APP",
            Self::AtakForwarder => "ATAK_FORWARDER",
            Self::Max => "MAX",
        }
    }
}

/// Routing control messages; acknowledgements arrive as `ErrorReason(NONE)`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Routing {
    #[prost(oneof = "routing::Variant", tags = "1, 2, 3")]
    pub variant: ::core::option::Option<routing::Variant>,
}

/// Nested message and enum types in `Routing`.
pub mod routing {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Error {
        None = 0,
        NoRoute = 1,
        GotNak = 2,
        Timeout = 3,
        NoInterface = 4,
        MaxRetransmit = 5,
        NoChannel = 6,
        TooLarge = 7,
        NoResponse = 8,
        DutyCycleLimit = 9,
        BadRequest = 32,
        NotAuthorized = 33,
        PkiFailed = 34,
        PkiUnknownPubkey = 35,
        AdminBadSessionKey = 36,
        AdminPublicKeyUnauthorized = 37,
    }

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        #[prost(message, tag = "1")]
        RouteRequest(super::RouteDiscovery),
        #[prost(message, tag = "2")]
        RouteReply(super::RouteDiscovery),
        #[prost(enumeration = "Error", tag = "3")]
        ErrorReason(i32),
    }
}

/// Hops recorded by a route discovery.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RouteDiscovery {
    #[prost(fixed32, repeated, tag = "1")]
    pub route: ::prost::alloc::vec::Vec<u32>,
    #[prost(int32, repeated, tag = "2")]
    pub snr_towards: ::prost::alloc::vec::Vec<i32>,
    #[prost(fixed32, repeated, tag = "3")]
    pub route_back: ::prost::alloc::vec::Vec<u32>,
    #[prost(int32, repeated, tag = "4")]
    pub snr_back: ::prost::alloc::vec::Vec<i32>,
}

// ==================== Node Database ====================

/// Identity broadcast by a node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    /// Globally unique id, conventionally `!` followed by the node number in hex.
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub long_name: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub short_name: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "4")]
    pub macaddr: ::prost::alloc::vec::Vec<u8>,
    #[prost(int32, tag = "5")]
    pub hw_model: i32,
    #[prost(bool, tag = "6")]
    pub is_licensed: bool,
    #[prost(int32, tag = "7")]
    pub role: i32,
    #[prost(bytes = "vec", tag = "8")]
    pub public_key: ::prost::alloc::vec::Vec<u8>,
}

/// A position report. Coordinates are degrees scaled by 1e7.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Position {
    #[prost(sfixed32, optional, tag = "1")]
    pub latitude_i: ::core::option::Option<i32>,
    #[prost(sfixed32, optional, tag = "2")]
    pub longitude_i: ::core::option::Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub altitude: ::core::option::Option<i32>,
    #[prost(fixed32, tag = "4")]
    pub time: u32,
}

/// A node database entry pushed during the configuration handshake.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeInfo {
    #[prost(uint32, tag = "1")]
    pub num: u32,
    #[prost(message, optional, tag = "2")]
    pub user: ::core::option::Option<User>,
    #[prost(message, optional, tag = "3")]
    pub position: ::core::option::Option<Position>,
    #[prost(float, tag = "4")]
    pub snr: f32,
    #[prost(fixed32, tag = "5")]
    pub last_heard: u32,
    #[prost(message, optional, tag = "6")]
    pub device_metrics: ::core::option::Option<DeviceMetrics>,
    #[prost(uint32, tag = "7")]
    pub channel: u32,
    #[prost(bool, tag = "8")]
    pub via_mqtt: bool,
    #[prost(uint32, optional, tag = "9")]
    pub hops_away: ::core::option::Option<u32>,
    #[prost(bool, tag = "10")]
    pub is_favorite: bool,
}

/// Information about the node the client is attached to.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MyNodeInfo {
    #[prost(uint32, tag = "1")]
    pub my_node_num: u32,
    #[prost(uint32, tag = "8")]
    pub reboot_count: u32,
    #[prost(uint32, tag = "11")]
    pub min_app_version: u32,
    #[prost(bytes = "vec", tag = "12")]
    pub device_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "13")]
    pub pio_env: ::prost::alloc::string::String,
}

/// Firmware metadata of the connected node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceMetadata {
    #[prost(string, tag = "1")]
    pub firmware_version: ::prost::alloc::string::String,
    #[prost(uint32, tag = "2")]
    pub device_state_version: u32,
    #[prost(bool, tag = "3")]
    pub can_shutdown: bool,
    #[prost(bool, tag = "4")]
    pub has_wifi: bool,
    #[prost(bool, tag = "5")]
    pub has_bluetooth: bool,
    #[prost(bool, tag = "6")]
    pub has_ethernet: bool,
    #[prost(int32, tag = "7")]
    pub role: i32,
    #[prost(uint32, tag = "8")]
    pub position_flags: u32,
    #[prost(int32, tag = "9")]
    pub hw_model: i32,
    #[prost(bool, tag = "10")]
    pub has_remote_hardware: bool,
    #[prost(bool, tag = "11")]
    pub has_pkc: bool,
}

/// A debug log line forwarded by the radio.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogRecord {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
    #[prost(fixed32, tag = "2")]
    pub time: u32,
    #[prost(string, tag = "3")]
    pub source: ::prost::alloc::string::String,
    #[prost(enumeration = "log_record::Level", tag = "4")]
    pub level: i32,
}

/// Nested message and enum types in `LogRecord`.
pub mod log_record {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Level {
        Unset = 0,
        Trace = 5,
        Debug = 10,
        Info = 20,
        Warning = 30,
        Error = 40,
        Critical = 50,
    }
}

/// Transmit queue state after a packet was enqueued.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueueStatus {
    #[prost(int32, tag = "1")]
    pub res: i32,
    #[prost(uint32, tag = "2")]
    pub free: u32,
    #[prost(uint32, tag = "3")]
    pub maxlen: u32,
    #[prost(uint32, tag = "4")]
    pub mesh_packet_id: u32,
}

// ==================== Channels ====================

/// A channel slot of the connected node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Channel {
    #[prost(int32, tag = "1")]
    pub index: i32,
    #[prost(message, optional, tag = "2")]
    pub settings: ::core::option::Option<ChannelSettings>,
    #[prost(enumeration = "channel::Role", tag = "3")]
    pub role: i32,
}

/// Nested message and enum types in `Channel`.
pub mod channel {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Role {
        Disabled = 0,
        Primary = 1,
        Secondary = 2,
    }
}

/// Settings of one channel.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelSettings {
    #[prost(bytes = "vec", tag = "2")]
    pub psk: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "3")]
    pub name: ::prost::alloc::string::String,
    #[prost(fixed32, tag = "4")]
    pub id: u32,
    #[prost(bool, tag = "5")]
    pub uplink_enabled: bool,
    #[prost(bool, tag = "6")]
    pub downlink_enabled: bool,
}

// ==================== Telemetry ====================

/// A telemetry report; exactly one metrics family per message.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Telemetry {
    #[prost(fixed32, tag = "1")]
    pub time: u32,
    #[prost(oneof = "telemetry::Variant", tags = "2, 3, 5, 6")]
    pub variant: ::core::option::Option<telemetry::Variant>,
}

/// Nested message and enum types in `Telemetry`.
pub mod telemetry {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Variant {
        #[prost(message, tag = "2")]
        DeviceMetrics(super::DeviceMetrics),
        #[prost(message, tag = "3")]
        EnvironmentMetrics(super::EnvironmentMetrics),
        #[prost(message, tag = "5")]
        PowerMetrics(super::PowerMetrics),
        #[prost(message, tag = "6")]
        LocalStats(super::LocalStats),
    }
}

/// Health of the reporting device.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceMetrics {
    /// 0-100, or above 100 when externally powered.
    #[prost(uint32, optional, tag = "1")]
    pub battery_level: ::core::option::Option<u32>,
    #[prost(float, optional, tag = "2")]
    pub voltage: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub channel_utilization: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "4")]
    pub air_util_tx: ::core::option::Option<f32>,
    #[prost(uint32, optional, tag = "5")]
    pub uptime_seconds: ::core::option::Option<u32>,
}

/// Environment sensor readings.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnvironmentMetrics {
    #[prost(float, optional, tag = "1")]
    pub temperature: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "2")]
    pub relative_humidity: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub barometric_pressure: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "4")]
    pub gas_resistance: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "5")]
    pub voltage: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "6")]
    pub current: ::core::option::Option<f32>,
    #[prost(uint32, optional, tag = "7")]
    pub iaq: ::core::option::Option<u32>,
}

/// Readings of an external power monitor.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PowerMetrics {
    #[prost(float, optional, tag = "1")]
    pub ch1_voltage: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "2")]
    pub ch1_current: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "3")]
    pub ch2_voltage: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "4")]
    pub ch2_current: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "5")]
    pub ch3_voltage: ::core::option::Option<f32>,
    #[prost(float, optional, tag = "6")]
    pub ch3_current: ::core::option::Option<f32>,
}

/// Mesh statistics of the reporting node.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocalStats {
    #[prost(uint32, tag = "1")]
    pub uptime_seconds: u32,
    #[prost(float, tag = "2")]
    pub channel_utilization: f32,
    #[prost(float, tag = "3")]
    pub air_util_tx: f32,
    #[prost(uint32, tag = "4")]
    pub num_packets_tx: u32,
    #[prost(uint32, tag = "5")]
    pub num_packets_rx: u32,
    #[prost(uint32, tag = "6")]
    pub num_packets_rx_bad: u32,
    #[prost(uint32, tag = "7")]
    pub num_online_nodes: u32,
    #[prost(uint32, tag = "8")]
    pub num_total_nodes: u32,
    #[prost(uint32, tag = "9")]
    pub num_rx_dupe: u32,
    #[prost(uint32, tag = "10")]
    pub num_tx_relay: u32,
    #[prost(uint32, tag = "11")]
    pub num_tx_relay_canceled: u32,
}

// ==================== Local Configuration ====================

/// One section of the node's local configuration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Config {
    #[prost(oneof = "config::PayloadVariant", tags = "1, 2, 3, 4, 5, 6, 7, 8")]
    pub payload_variant: ::core::option::Option<config::PayloadVariant>,
}

/// Nested message and enum types in `Config`.
pub mod config {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "1")]
        Device(DeviceConfig),
        #[prost(message, tag = "2")]
        Position(PositionConfig),
        #[prost(message, tag = "3")]
        Power(PowerConfig),
        #[prost(message, tag = "4")]
        Network(NetworkConfig),
        #[prost(message, tag = "5")]
        Display(DisplayConfig),
        #[prost(message, tag = "6")]
        Lora(LoRaConfig),
        #[prost(message, tag = "7")]
        Bluetooth(BluetoothConfig),
        #[prost(message, tag = "8")]
        Security(SecurityConfig),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeviceConfig {
        #[prost(int32, tag = "1")]
        pub role: i32,
        #[prost(uint32, tag = "7")]
        pub node_info_broadcast_secs: u32,
        #[prost(bool, tag = "9")]
        pub is_managed: bool,
        #[prost(string, tag = "11")]
        pub tzdef: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PositionConfig {
        #[prost(uint32, tag = "1")]
        pub position_broadcast_secs: u32,
        #[prost(bool, tag = "2")]
        pub position_broadcast_smart_enabled: bool,
        #[prost(bool, tag = "3")]
        pub fixed_position: bool,
        #[prost(uint32, tag = "5")]
        pub gps_update_interval: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PowerConfig {
        #[prost(bool, tag = "1")]
        pub is_power_saving: bool,
        #[prost(uint32, tag = "2")]
        pub on_battery_shutdown_after_secs: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct NetworkConfig {
        #[prost(bool, tag = "1")]
        pub wifi_enabled: bool,
        #[prost(string, tag = "3")]
        pub wifi_ssid: ::prost::alloc::string::String,
        #[prost(string, tag = "5")]
        pub ntp_server: ::prost::alloc::string::String,
        #[prost(bool, tag = "6")]
        pub eth_enabled: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DisplayConfig {
        #[prost(uint32, tag = "1")]
        pub screen_on_secs: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct LoRaConfig {
        #[prost(bool, tag = "1")]
        pub use_preset: bool,
        #[prost(int32, tag = "2")]
        pub modem_preset: i32,
        #[prost(uint32, tag = "3")]
        pub bandwidth: u32,
        #[prost(uint32, tag = "4")]
        pub spread_factor: u32,
        #[prost(uint32, tag = "5")]
        pub coding_rate: u32,
        #[prost(float, tag = "6")]
        pub frequency_offset: f32,
        #[prost(int32, tag = "7")]
        pub region: i32,
        #[prost(uint32, tag = "8")]
        pub hop_limit: u32,
        #[prost(bool, tag = "9")]
        pub tx_enabled: bool,
        #[prost(int32, tag = "10")]
        pub tx_power: i32,
        #[prost(uint32, tag = "11")]
        pub channel_num: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct BluetoothConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(int32, tag = "2")]
        pub mode: i32,
        #[prost(uint32, tag = "3")]
        pub fixed_pin: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SecurityConfig {
        #[prost(bytes = "vec", tag = "1")]
        pub public_key: ::prost::alloc::vec::Vec<u8>,
        #[prost(bool, tag = "4")]
        pub is_managed: bool,
        #[prost(bool, tag = "5")]
        pub serial_enabled: bool,
        #[prost(bool, tag = "6")]
        pub debug_log_api_enabled: bool,
        #[prost(bool, tag = "8")]
        pub admin_channel_enabled: bool,
    }
}

/// One section of the node's module configuration.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModuleConfig {
    #[prost(oneof = "module_config::PayloadVariant", tags = "1, 2, 3, 4, 5, 6, 10, 13")]
    pub payload_variant: ::core::option::Option<module_config::PayloadVariant>,
}

/// Nested message and enum types in `ModuleConfig`.
pub mod module_config {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "1")]
        Mqtt(MqttConfig),
        #[prost(message, tag = "2")]
        Serial(SerialConfig),
        #[prost(message, tag = "3")]
        ExternalNotification(ExternalNotificationConfig),
        #[prost(message, tag = "4")]
        StoreForward(StoreForwardConfig),
        #[prost(message, tag = "5")]
        RangeTest(RangeTestConfig),
        #[prost(message, tag = "6")]
        Telemetry(TelemetryConfig),
        #[prost(message, tag = "10")]
        NeighborInfo(NeighborInfoConfig),
        #[prost(message, tag = "13")]
        Paxcounter(PaxcounterConfig),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct MqttConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(string, tag = "2")]
        pub address: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub username: ::prost::alloc::string::String,
        #[prost(bool, tag = "5")]
        pub encryption_enabled: bool,
        #[prost(bool, tag = "6")]
        pub json_enabled: bool,
        #[prost(bool, tag = "7")]
        pub tls_enabled: bool,
        #[prost(string, tag = "8")]
        pub root: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SerialConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(bool, tag = "2")]
        pub echo: bool,
        #[prost(int32, tag = "5")]
        pub baud: i32,
        #[prost(uint32, tag = "6")]
        pub timeout: u32,
        #[prost(int32, tag = "7")]
        pub mode: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ExternalNotificationConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(uint32, tag = "2")]
        pub output_ms: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StoreForwardConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(bool, tag = "2")]
        pub heartbeat: bool,
        #[prost(uint32, tag = "3")]
        pub records: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RangeTestConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(uint32, tag = "2")]
        pub sender: u32,
        #[prost(bool, tag = "3")]
        pub save: bool,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct TelemetryConfig {
        #[prost(uint32, tag = "1")]
        pub device_update_interval: u32,
        #[prost(uint32, tag = "2")]
        pub environment_update_interval: u32,
        #[prost(bool, tag = "3")]
        pub environment_measurement_enabled: bool,
        #[prost(bool, tag = "4")]
        pub environment_screen_enabled: bool,
        #[prost(bool, tag = "8")]
        pub power_measurement_enabled: bool,
        #[prost(uint32, tag = "9")]
        pub power_update_interval: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct NeighborInfoConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(uint32, tag = "2")]
        pub update_interval: u32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PaxcounterConfig {
        #[prost(bool, tag = "1")]
        pub enabled: bool,
        #[prost(uint32, tag = "2")]
        pub paxcounter_update_interval: u32,
    }
}

// ==================== Administration ====================

/// Remote administration of a node, carried on `ADMIN_APP`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdminMessage {
    #[prost(bytes = "vec", tag = "101")]
    pub session_passkey: ::prost::alloc::vec::Vec<u8>,
    #[prost(
        oneof = "admin_message::PayloadVariant",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 12, 13, 32, 33, 34, 35, 43, 97"
    )]
    pub payload_variant: ::core::option::Option<admin_message::PayloadVariant>,
}

/// Nested message and enum types in `AdminMessage`.
pub mod admin_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(uint32, tag = "1")]
        GetChannelRequest(u32),
        #[prost(message, tag = "2")]
        GetChannelResponse(super::Channel),
        #[prost(bool, tag = "3")]
        GetOwnerRequest(bool),
        #[prost(message, tag = "4")]
        GetOwnerResponse(super::User),
        #[prost(int32, tag = "5")]
        GetConfigRequest(i32),
        #[prost(message, tag = "6")]
        GetConfigResponse(super::Config),
        #[prost(int32, tag = "7")]
        GetModuleConfigRequest(i32),
        #[prost(message, tag = "8")]
        GetModuleConfigResponse(super::ModuleConfig),
        #[prost(bool, tag = "12")]
        GetDeviceMetadataRequest(bool),
        #[prost(message, tag = "13")]
        GetDeviceMetadataResponse(super::DeviceMetadata),
        #[prost(message, tag = "32")]
        SetOwner(super::User),
        #[prost(message, tag = "33")]
        SetChannel(super::Channel),
        #[prost(message, tag = "34")]
        SetConfig(super::Config),
        #[prost(message, tag = "35")]
        SetModuleConfig(super::ModuleConfig),
        #[prost(fixed32, tag = "43")]
        SetTimeOnly(u32),
        #[prost(int32, tag = "97")]
        RebootSeconds(i32),
    }
}
