use crate::protocol::ConnectionGate;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared up/down flag for the serial link.
///
/// Clones observe the same flag. Only the transport tasks flip it; the
/// sequencer reads it through [`ConnectionGate`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionLink {
    connected: Arc<AtomicBool>,
}

impl ConnectionLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl ConnectionGate for ConnectionLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
