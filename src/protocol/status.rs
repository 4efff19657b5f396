use crate::config::prefix;
use crate::error::ParseError;
use crate::protocol::types::{ConnectionState, DeviceStatus};
use tokio::sync::watch;

const CONNECTED_TOKEN: &str = "CONNECTED";

/// Parse a `STATUS:DEVICE:` line into a fresh device status.
///
/// After a `CONNECTED` token the fields are positional:
/// `ssid, ip[, rssi[, gateway[, subnet_mask[, mac]]]]`. Empty optional fields
/// count as absent. Any other state token yields a bare disconnected status.
pub fn parse_status_line(line: &str) -> Result<DeviceStatus, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let payload =
        line.strip_prefix(prefix::STATUS_DEVICE)
            .ok_or_else(|| ParseError::MalformedPrefix {
                expected: prefix::STATUS_DEVICE,
                line: line.to_string(),
            })?;

    let mut fields = payload.split(',');
    if fields.next() != Some(CONNECTED_TOKEN) {
        return Ok(DeviceStatus::disconnected());
    }

    let ssid = fields
        .next()
        .ok_or(ParseError::MissingRequiredField { field: "ssid" })?;
    let ip_address = present(fields.next())
        .ok_or(ParseError::MissingRequiredField { field: "ip" })?;
    let rssi = present(fields.next())
        .map(|raw| {
            raw.trim().parse::<i32>().map_err(|_| ParseError::InvalidField {
                field: "rssi",
                value: raw.to_string(),
            })
        })
        .transpose()?;

    Ok(DeviceStatus {
        connection_state: ConnectionState::Connected,
        ssid: Some(ssid.to_string()),
        ip_address: Some(ip_address.to_string()),
        rssi,
        gateway: present(fields.next()).map(str::to_string),
        subnet_mask: present(fields.next()).map(str::to_string),
        mac: present(fields.next()).map(str::to_string),
    })
}

fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|value| !value.is_empty())
}

/// Holds the current device status; every update swaps the whole value.
#[derive(Debug)]
pub struct StatusBoard {
    tx: watch::Sender<DeviceStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DeviceStatus::disconnected());
        Self { tx }
    }

    pub fn publish(&self, status: DeviceStatus) {
        self.tx.send_replace(status);
    }

    pub fn current(&self) -> DeviceStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceStatus> {
        self.tx.subscribe()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}
