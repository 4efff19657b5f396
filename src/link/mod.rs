//! Serial link for radarlink
//!
//! Owns the connection gate and the byte stream to the device: a writer task
//! drains queued commands, a reader task turns inbound bytes into lines.

mod gate;
mod transport;

// Re-export public API
pub use transport::{Endpoint, Link, LinkEvent, open};

#[cfg(test)]
pub use transport::attach;
