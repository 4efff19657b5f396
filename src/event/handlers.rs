use crate::{
    app::Session,
    config::source,
    error::{ConnectionError, ProtocolError},
    protocol::{CommandSink, ConnectionGate, Intent, Sequencer},
};

/// Submit one intent and report the outcome in the log surface.
///
/// Returns whether the commands were handed to the link.
pub fn handle_intent<G, S>(session: &mut Session, sequencer: &mut Sequencer<G, S>, intent: &Intent) -> bool
where
    G: ConnectionGate,
    S: CommandSink,
{
    match sequencer.submit(intent) {
        Ok(dispatched) => {
            if let Some(message) = dispatched.log {
                session.logs.push(source::SYS, message);
            }
            tracing::debug!(sent = dispatched.sent, "sequence dispatched");
            true
        }
        Err(ProtocolError::Connection(ConnectionError::NotConnected)) => {
            session.logs.push(source::SYS, "Please connect serial first.");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "intent rejected");
            session.logs.push(source::ERR, e.to_string());
            false
        }
    }
}
