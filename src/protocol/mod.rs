//! Device protocol for radarlink
//!
//! This module parses the line-oriented reports of the radar peripheral and
//! turns user intents into ordered command sequences for it.

mod command;
mod inbound;
mod sequencer;
mod status;
mod types;

// Re-export public API
pub use inbound::InboundLine;
pub use sequencer::{CommandSink, ConnectionGate, Sequencer};
pub use status::StatusBoard;
pub use types::{ConnectIntent, DeviceStatus, Intent, NetworkEntry, PingIntent, TrackSample};
