use crate::config::{self, source};
use crate::measure::{MeasurePlan, Sampler, Survey};
use crate::protocol::{DeviceStatus, InboundLine, NetworkEntry, StatusBoard, TrackSample};
use std::collections::VecDeque;
use std::fmt;

/// One line in the user-visible log surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub source: &'static str,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.source, self.message)
    }
}

/// Bounded log; the oldest entries fall off once it is full.
#[derive(Debug)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    unseen: usize,
}

impl LogBook {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            unseen: 0,
        }
    }

    pub fn push(&mut self, source: &'static str, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            source,
            message: message.into(),
        });
        self.unseen = (self.unseen + 1).min(self.entries.len());
    }

    /// Entries added since the previous call
    pub fn take_unseen(&mut self) -> Vec<LogEntry> {
        let start = self.entries.len() - self.unseen;
        self.unseen = 0;
        self.entries.iter().skip(start).cloned().collect()
    }

    #[cfg(test)]
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

/// What the front end renders from: device status, scan list, tracking,
/// the direction-finding sweep and logs
#[derive(Debug)]
pub struct Session {
    pub board: StatusBoard,
    pub networks: Vec<NetworkEntry>,
    pub last_sample: Option<TrackSample>,
    pub survey: Survey,
    sampler: Option<Sampler>,
    pub logs: LogBook,
    pub show_raw: bool,
}

impl Session {
    pub fn new(show_raw: bool) -> Session {
        Session {
            board: StatusBoard::new(),
            networks: Vec::new(),
            last_sample: None,
            survey: Survey::default(),
            sampler: None,
            logs: LogBook::with_capacity(config::MAX_LOG_ENTRIES),
            show_raw,
        }
    }

    pub fn status(&self) -> DeviceStatus {
        self.board.current()
    }

    /// Apply one inbound line. Rejected lines leave state as it was and
    /// show up as an `[ERR]` entry.
    pub fn handle_line(&mut self, line: &str) -> Option<InboundLine> {
        if self.show_raw && !line.trim().is_empty() {
            self.logs.push(source::RAW, line.trim());
        }

        let parsed = match InboundLine::parse(line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, line, "rejected inbound line");
                self.logs.push(source::ERR, e.to_string());
                return None;
            }
        };

        match &parsed {
            InboundLine::Status(status) => self.board.publish(status.clone()),
            InboundLine::ScanStarted => {
                self.networks.clear();
                self.logs.push(source::SYS, "SCANNING...");
            }
            InboundLine::ScanFinished => {
                tracing::info!(networks = self.networks.len(), "scan finished");
            }
            InboundLine::Network(entry) => self.networks.push(entry.clone()),
            InboundLine::Sample(sample) => {
                self.last_sample = Some(sample.clone());
                self.feed_sampler(sample.rssi);
            }
            InboundLine::DeviceLog { level, message } => {
                let text = if level.is_empty() {
                    message.clone()
                } else {
                    format!("{level}:{message}")
                };
                self.logs.push(source::DEV, text);
            }
            InboundLine::Unrecognized(raw) => {
                tracing::debug!(line = %raw, "ignoring unrecognized line");
            }
        }
        Some(parsed)
    }

    /// Start averaging tracking samples for one dial angle
    pub fn start_measurement(&mut self, plan: MeasurePlan) {
        tracing::info!(angle = plan.angle, samples = plan.samples, "sampling");
        self.sampler = Some(Sampler::new(plan));
    }

    pub fn is_measuring(&self) -> bool {
        self.sampler.is_some()
    }

    /// `(taken, required)` while a measurement is running
    pub fn measure_progress(&self) -> Option<(usize, usize)> {
        self.sampler.as_ref().map(Sampler::progress)
    }

    fn feed_sampler(&mut self, rssi: i32) {
        let Some(sampler) = self.sampler.as_mut() else {
            return;
        };
        if !sampler.push(rssi) {
            return;
        }
        let saved = self
            .sampler
            .take()
            .and_then(|sampler| self.survey.record(sampler))
            .map(|m| format!("Saved: {}dBm @ {}°", m.rssi, m.angle));
        if let Some(message) = saved {
            self.logs.push(source::MAP, message);
        }
    }

    /// Transport went away: the device can no longer be trusted to be online
    pub fn link_lost(&mut self, reason: Option<&str>) {
        if let Some(reason) = reason {
            self.logs.push(source::ERR, reason);
        }
        self.logs.push(source::ERR, "DISCONNECTED");
        self.board.publish(DeviceStatus::disconnected());
    }
}
