use crate::config::prefix;
use crate::error::ParseError;
use crate::protocol::status::parse_status_line;
use crate::protocol::types::{DeviceStatus, NetworkEntry, TrackSample};

/// A classified line received from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    Status(DeviceStatus),
    ScanStarted,
    ScanFinished,
    Network(NetworkEntry),
    Sample(TrackSample),
    DeviceLog { level: String, message: String },
    Unrecognized(String),
}

impl InboundLine {
    /// Classify one trimmed line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let parsed = if line.starts_with(prefix::STATUS_DEVICE) {
            Self::Status(parse_status_line(line)?)
        } else if line.starts_with(prefix::SCAN_START) {
            Self::ScanStarted
        } else if line.starts_with(prefix::SCAN_END) {
            Self::ScanFinished
        } else if let Some(payload) = line.strip_prefix(prefix::LIST) {
            Self::Network(parse_network(payload)?)
        } else if let Some(payload) = line.strip_prefix(prefix::DATA) {
            Self::Sample(parse_sample(payload)?)
        } else if let Some(payload) = line.strip_prefix(prefix::LOG) {
            let (level, message) = payload.split_once(':').unwrap_or(("", payload));
            Self::DeviceLog {
                level: level.to_string(),
                message: message.to_string(),
            }
        } else {
            Self::Unrecognized(line.to_string())
        };
        Ok(Some(parsed))
    }
}

// LIST:<ssid>,<rssi>,<channel>[,<bssid>[,<security>]]
fn parse_network(payload: &str) -> Result<NetworkEntry, ParseError> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() < 3 {
        return Err(ParseError::MissingRequiredField { field: "channel" });
    }

    Ok(NetworkEntry {
        ssid: fields[0].to_string(),
        rssi: number(fields[1], "rssi")?,
        channel: number(fields[2], "channel")?,
        bssid: fields.get(3).copied().unwrap_or_default().to_string(),
        security: fields.get(4).copied().unwrap_or_default().to_string(),
    })
}

// DATA:<rssi>,<channel>,<bssid>
fn parse_sample(payload: &str) -> Result<TrackSample, ParseError> {
    let mut fields = payload.split(',');
    let rssi = match fields.next() {
        Some(raw) if !raw.is_empty() => number(raw, "rssi")?,
        _ => return Err(ParseError::MissingRequiredField { field: "rssi" }),
    };
    let channel = match fields.next() {
        Some(raw) if !raw.is_empty() => number(raw, "channel")?,
        _ => 0,
    };

    Ok(TrackSample {
        rssi,
        channel,
        bssid: fields.next().unwrap_or_default().to_string(),
    })
}

fn number<T: std::str::FromStr>(raw: &str, field: &'static str) -> Result<T, ParseError> {
    raw.trim().parse().map_err(|_| ParseError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> InboundLine {
        InboundLine::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(InboundLine::parse("").unwrap(), None);
        assert_eq!(InboundLine::parse("  \r").unwrap(), None);
    }

    #[test]
    fn routes_status_lines_through_the_status_parser() {
        match parse("STATUS:DEVICE:CONNECTED,MyWiFi,192.168.1.10,-45,gw,mask,mac\r") {
            InboundLine::Status(status) => {
                assert_eq!(status.ssid.as_deref(), Some("MyWiFi"));
                assert_eq!(status.mac.as_deref(), Some("mac"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(InboundLine::parse("STATUS:DEVICE:CONNECTED,MyWiFi").is_err());
    }

    #[test]
    fn scan_markers() {
        assert_eq!(parse("STATUS:SCAN_START"), InboundLine::ScanStarted);
        assert_eq!(parse("STATUS:SCAN_END"), InboundLine::ScanFinished);
    }

    #[test]
    fn list_line_becomes_network_entry() {
        assert_eq!(
            parse("LIST:TestSSID,-60,6,AA:BB:CC:DD:EE:FF,WPA2"),
            InboundLine::Network(NetworkEntry {
                ssid: "TestSSID".into(),
                rssi: -60,
                channel: 6,
                bssid: "AA:BB:CC:DD:EE:FF".into(),
                security: "WPA2".into(),
            })
        );

        match parse("LIST:Lobby,-71,11") {
            InboundLine::Network(entry) => {
                assert_eq!(entry.bssid, "");
                assert_eq!(entry.security, "");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(InboundLine::parse("LIST:Lobby,-71").is_err());
        assert!(InboundLine::parse("LIST:Lobby,loud,11").is_err());
    }

    #[test]
    fn data_line_becomes_sample() {
        assert_eq!(
            parse("DATA:-50,1,XX:XX:XX:XX:XX:XX"),
            InboundLine::Sample(TrackSample {
                rssi: -50,
                channel: 1,
                bssid: "XX:XX:XX:XX:XX:XX".into(),
            })
        );

        match parse("DATA:-120,0,SCANNING...") {
            InboundLine::Sample(sample) => assert!(sample.is_lost()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_data_is_an_error_not_a_panic() {
        assert_eq!(
            InboundLine::parse("DATA:").unwrap_err(),
            ParseError::MissingRequiredField { field: "rssi" }
        );
        assert!(matches!(
            InboundLine::parse("DATA:garbage"),
            Err(ParseError::InvalidField { field: "rssi", .. })
        ));
    }

    #[test]
    fn log_lines_split_level_from_message() {
        assert_eq!(
            parse("LOG:INFO:System Booted. Radar Engine v10."),
            InboundLine::DeviceLog {
                level: "INFO".into(),
                message: "System Booted. Radar Engine v10.".into(),
            }
        );
        assert_eq!(
            parse("LOG:RAW:Reply from 8.8.8.8: time=23ms"),
            InboundLine::DeviceLog {
                level: "RAW".into(),
                message: "Reply from 8.8.8.8: time=23ms".into(),
            }
        );
        assert_eq!(
            parse("LOG:bare"),
            InboundLine::DeviceLog {
                level: String::new(),
                message: "bare".into(),
            }
        );
    }

    #[test]
    fn unknown_lines_are_kept_verbatim() {
        assert_eq!(
            parse("HELLO there"),
            InboundLine::Unrecognized("HELLO there".into())
        );
    }
}
