use crate::config;
use secrecy::SecretString;

/// Whether the peripheral reports itself as joined to a network
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Device state from the latest successfully parsed status line
///
/// Optional fields stay `None` when the device did not report them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub connection_state: ConnectionState,
    pub ssid: Option<String>,
    pub ip_address: Option<String>,
    pub rssi: Option<i32>,
    pub gateway: Option<String>,
    pub subnet_mask: Option<String>,
    pub mac: Option<String>,
}

impl DeviceStatus {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }
}

/// One access point from a scan report
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NetworkEntry {
    pub ssid: String,
    pub rssi: i32,
    pub channel: u32,
    /// BSSID text as reported by the device (may be empty)
    pub bssid: String,
    pub security: String,
}

/// Strongest reading of the tracked network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSample {
    pub rssi: i32,
    pub channel: u32,
    pub bssid: String,
}

impl TrackSample {
    /// The device keeps sending heartbeats while the target is out of sight
    pub fn is_lost(&self) -> bool {
        self.rssi <= config::NO_SIGNAL_RSSI
    }
}

/// Request to join a network from the scan list
#[derive(Debug)]
pub struct ConnectIntent {
    pub ssid: String,
    pub password: SecretString,
}

impl ConnectIntent {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Request to ping a host from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingIntent {
    pub target: String,
    pub count: u32,
}

impl Default for PingIntent {
    fn default() -> Self {
        Self {
            target: config::DEFAULT_PING_TARGET.to_string(),
            count: config::DEFAULT_PING_COUNT,
        }
    }
}

/// Everything the front end can ask the device to do
#[derive(Debug)]
pub enum Intent {
    Connect(ConnectIntent),
    Ping(PingIntent),
    Scan,
    RequestStatus,
    Track { ssid: String, channel: u32 },
    Stop,
}
