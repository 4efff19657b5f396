use crate::error::{ConnectionError, ProtocolResult, ValidationError};
use crate::protocol::command::{Command, ensure_line_safe};
use crate::protocol::types::{ConnectIntent, Intent, PingIntent};
use secrecy::{ExposeSecret, SecretString};

/// Read-only view of whether the transport link is up
pub trait ConnectionGate {
    fn is_connected(&self) -> bool;
}

/// Accepts one command line at a time and hands it to the transport
pub trait CommandSink {
    fn send(&mut self, command: &str) -> Result<(), ConnectionError>;
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send(&mut self, command: &str) -> Result<(), ConnectionError> {
        (**self).send(command)
    }
}

/// Ordered commands for one intent, plus the log line announcing it
#[derive(Debug)]
pub struct CommandSequence {
    pub log: Option<String>,
    pub commands: Vec<Command>,
}

impl CommandSequence {
    fn single(command: Command) -> Self {
        Self {
            log: None,
            commands: vec![command],
        }
    }
}

/// `SET_SSID`, `SET_PASS`, `DO_CONNECT`, in that order.
///
/// The password line is sent even when empty so the device drops any
/// credential from a previous attempt.
pub fn build_connect_sequence(intent: &ConnectIntent) -> Result<CommandSequence, ValidationError> {
    ensure_line_safe("ssid", &intent.ssid, &[','])?;
    ensure_line_safe("password", intent.password.expose_secret(), &[])?;

    Ok(CommandSequence {
        log: None,
        commands: vec![
            Command::SetSsid(intent.ssid.clone()),
            Command::SetPass(SecretString::from(
                intent.password.expose_secret().to_string(),
            )),
            Command::DoConnect,
        ],
    })
}

pub fn build_ping_sequence(intent: &PingIntent) -> Result<CommandSequence, ValidationError> {
    if intent.count == 0 {
        return Err(ValidationError::InvalidCount {
            count: intent.count,
        });
    }
    ensure_line_safe("target", &intent.target, &[])?;

    Ok(CommandSequence {
        log: Some(format!(
            "Initiating Ping: {} ({}x)...",
            intent.target, intent.count
        )),
        commands: vec![Command::Ping {
            target: intent.target.clone(),
            count: intent.count,
        }],
    })
}

impl Intent {
    pub fn build(&self) -> Result<CommandSequence, ValidationError> {
        match self {
            Intent::Connect(intent) => build_connect_sequence(intent),
            Intent::Ping(intent) => build_ping_sequence(intent),
            Intent::Scan => Ok(CommandSequence::single(Command::Scan)),
            Intent::RequestStatus => Ok(CommandSequence::single(Command::GetStatus)),
            Intent::Track { ssid, channel } => {
                ensure_line_safe("ssid", ssid, &[])?;
                Ok(CommandSequence::single(Command::Track {
                    ssid: ssid.clone(),
                    channel: *channel,
                }))
            }
            Intent::Stop => Ok(CommandSequence::single(Command::Stop)),
        }
    }
}

/// Outcome of a dispatched sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub log: Option<String>,
    pub sent: usize,
}

/// Turns intents into commands and pushes them, in order, through a sink.
///
/// The sequencer never waits for the device to answer; it only guarantees
/// that command N+1 is handed over after command N.
#[derive(Debug)]
pub struct Sequencer<G, S> {
    gate: G,
    sink: S,
}

impl<G: ConnectionGate, S: CommandSink> Sequencer<G, S> {
    pub fn new(gate: G, sink: S) -> Self {
        Self { gate, sink }
    }

    pub fn submit(&mut self, intent: &Intent) -> ProtocolResult<Dispatched> {
        let sequence = intent.build()?;
        Ok(self.dispatch(sequence)?)
    }

    pub fn dispatch(&mut self, sequence: CommandSequence) -> Result<Dispatched, ConnectionError> {
        if !self.gate.is_connected() {
            tracing::warn!(
                commands = sequence.commands.len(),
                "link down, dropping command sequence"
            );
            return Err(ConnectionError::NotConnected);
        }

        let mut sent = 0;
        for command in &sequence.commands {
            tracing::debug!(command = command.name(), "sending");
            self.sink.send(&command.to_wire())?;
            sent += 1;
        }

        Ok(Dispatched {
            log: sequence.log,
            sent,
        })
    }
}
