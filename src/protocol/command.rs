use crate::error::ValidationError;
use secrecy::{ExposeSecret, SecretString};

/// One outbound command, rendered to a single protocol line by [`Command::to_wire`]
#[derive(Debug)]
pub enum Command {
    SetSsid(String),
    SetPass(SecretString),
    DoConnect,
    Ping { target: String, count: u32 },
    Scan,
    GetStatus,
    Track { ssid: String, channel: u32 },
    Stop,
}

impl Command {
    /// Wire form without the line terminator. Exposes the password.
    pub fn to_wire(&self) -> String {
        match self {
            Command::SetSsid(ssid) => format!("SET_SSID:{ssid}"),
            Command::SetPass(password) => format!("SET_PASS:{}", password.expose_secret()),
            Command::DoConnect => "DO_CONNECT".to_string(),
            Command::Ping { target, count } => format!("PING:{target}:{count}"),
            Command::Scan => "SCAN".to_string(),
            Command::GetStatus => "GET_STATUS".to_string(),
            Command::Track { ssid, channel } => format!("TRACK:{ssid}:{channel}"),
            Command::Stop => "STOP".to_string(),
        }
    }

    /// Name of the command for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetSsid(_) => "SET_SSID",
            Command::SetPass(_) => "SET_PASS",
            Command::DoConnect => "DO_CONNECT",
            Command::Ping { .. } => "PING",
            Command::Scan => "SCAN",
            Command::GetStatus => "GET_STATUS",
            Command::Track { .. } => "TRACK",
            Command::Stop => "STOP",
        }
    }
}

/// Reject values that would split or corrupt a protocol line.
///
/// Line breaks and other control characters are never allowed; `extra` adds
/// field-specific delimiters.
pub fn ensure_line_safe(
    field: &'static str,
    value: &str,
    extra: &[char],
) -> Result<(), ValidationError> {
    match value
        .chars()
        .find(|ch| ch.is_control() || extra.contains(ch))
    {
        Some(ch) => Err(ValidationError::UnsafeValue { field, ch }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_forms() {
        assert_eq!(Command::SetSsid("TestNet".into()).to_wire(), "SET_SSID:TestNet");
        assert_eq!(
            Command::SetPass(SecretString::from("password123".to_string())).to_wire(),
            "SET_PASS:password123"
        );
        assert_eq!(Command::DoConnect.to_wire(), "DO_CONNECT");
        assert_eq!(
            Command::Ping {
                target: "8.8.8.8".into(),
                count: 3
            }
            .to_wire(),
            "PING:8.8.8.8:3"
        );
        assert_eq!(
            Command::Track {
                ssid: "Lab".into(),
                channel: 11
            }
            .to_wire(),
            "TRACK:Lab:11"
        );
        assert_eq!(Command::Scan.to_wire(), "SCAN");
        assert_eq!(Command::GetStatus.to_wire(), "GET_STATUS");
        assert_eq!(Command::Stop.to_wire(), "STOP");
    }

    #[test]
    fn debug_never_shows_password() {
        let cmd = Command::SetPass(SecretString::from("hunter2".to_string()));
        assert!(!format!("{cmd:?}").contains("hunter2"));
        assert_eq!(cmd.name(), "SET_PASS");
    }

    #[test]
    fn control_characters_are_unsafe() {
        assert_eq!(
            ensure_line_safe("password", "abc\ndef", &[]),
            Err(ValidationError::UnsafeValue {
                field: "password",
                ch: '\n'
            })
        );
        assert_eq!(
            ensure_line_safe("ssid", "Home,Guest", &[',']),
            Err(ValidationError::UnsafeValue {
                field: "ssid",
                ch: ','
            })
        );
        assert!(ensure_line_safe("ssid", "Café 5G: upstairs", &[',']).is_ok());
        assert!(ensure_line_safe("ssid", "", &[',']).is_ok());
    }
}
