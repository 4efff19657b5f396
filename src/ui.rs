use crate::measure::{Measurement, quality};
use crate::protocol::{DeviceStatus, NetworkEntry, TrackSample};

/// Signal quality on a 1..=4 scale
pub fn signal_bars(rssi: i32) -> u8 {
    match rssi {
        r if r > -50 => 4,
        r if r > -70 => 3,
        r if r > -85 => 2,
        _ => 1,
    }
}

pub fn render_status(status: &DeviceStatus) -> String {
    if !status.is_connected() {
        return "OFFLINE".to_string();
    }

    let mut parts = vec![
        "ONLINE".to_string(),
        format!("ssid={}", status.ssid.as_deref().unwrap_or("--")),
        format!("ip={}", status.ip_address.as_deref().unwrap_or("--")),
    ];
    if let Some(rssi) = status.rssi {
        parts.push(format!("rssi={rssi}dBm ({}/4)", signal_bars(rssi)));
    }
    if let Some(gateway) = &status.gateway {
        parts.push(format!("gw={gateway}"));
    }
    if let Some(mask) = &status.subnet_mask {
        parts.push(format!("mask={mask}"));
    }
    if let Some(mac) = &status.mac {
        parts.push(format!("mac={mac}"));
    }
    parts.join("  ")
}

pub fn render_network(entry: &NetworkEntry) -> String {
    let mut line = format!("{:<32} {:>4}dBm  CH:{:<3}", entry.ssid, entry.rssi, entry.channel);
    if !entry.security.is_empty() {
        line.push(' ');
        line.push_str(&entry.security);
    }
    if !entry.bssid.is_empty() {
        line.push_str(&format!("  {}", entry.bssid));
    }
    line
}

pub fn render_sample(sample: &TrackSample) -> String {
    if sample.is_lost() {
        return "target not visible".to_string();
    }
    format!(
        "{}dBm ({}/4)  CH:{}  {}",
        sample.rssi,
        signal_bars(sample.rssi),
        sample.channel,
        sample.bssid
    )
}

pub fn render_measurement(m: &Measurement) -> String {
    format!(
        "#{:<3} {:>5}°  {:>4}dBm  {:>3.0}%  ({} samples)",
        m.id,
        m.angle,
        m.rssi,
        quality(m.rssi),
        m.raw_samples.len()
    )
}

pub fn render_estimate(bearing: Option<u32>) -> String {
    match bearing {
        Some(deg) => format!("EST: {deg}°"),
        None => "NEED DATA".to_string(),
    }
}
