use crate::config;
use crate::error::{ConnectionError, LinkError};
use crate::link::gate::ConnectionLink;
use crate::protocol::CommandSink;
use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

/// Where the device's serial stream is reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Serial-over-TCP bridge, `host:port`
    Tcp(String),
    /// Character device that is already configured (baud rate etc.)
    Device(PathBuf),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
            Endpoint::Device(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Events coming up from the transport tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Line(String),
    Closed { reason: Option<String> },
}

/// Queues commands for the writer task; never blocks.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<String>,
}

impl CommandSink for ChannelSink {
    fn send(&mut self, command: &str) -> Result<(), ConnectionError> {
        self.tx
            .send(command.to_string())
            .map_err(|_| ConnectionError::SendFailed {
                // Only the verb: the payload may be a password
                command: command.split(':').next().unwrap_or_default().to_string(),
                reason: "writer task stopped".to_string(),
            })
    }
}

/// An open link: the gate, the command sink and the inbound event stream
#[derive(Debug)]
pub struct Link {
    pub gate: ConnectionLink,
    pub sink: ChannelSink,
    pub events: UnboundedReceiver<LinkEvent>,
}

/// Open the endpoint and start the reader and writer tasks
pub async fn open(endpoint: &Endpoint) -> Result<Link, LinkError> {
    let open_failed = |source: std::io::Error| LinkError::Open {
        endpoint: endpoint.to_string(),
        source,
    };

    match endpoint {
        Endpoint::Tcp(addr) => {
            let stream = tokio::time::timeout(
                Duration::from_secs(config::CONNECT_TIMEOUT_SECS),
                TcpStream::connect(addr.as_str()),
            )
            .await
            .map_err(|_| LinkError::Timeout {
                endpoint: endpoint.to_string(),
            })?
            .map_err(open_failed)?;
            let (reader, writer) = stream.into_split();
            Ok(attach(reader, writer))
        }
        Endpoint::Device(path) => open_device(path).map_err(open_failed),
    }
}

/// Open a tty (or FIFO) as two non-blocking ends polled by the reactor, so a
/// quiet device never pins a blocking-pool thread past shutdown.
#[cfg(unix)]
fn open_device(path: &Path) -> std::io::Result<Link> {
    use tokio::net::unix::pipe;

    let mut options = pipe::OpenOptions::new();
    options.unchecked(true);
    // Reader first: a FIFO refuses a non-blocking writer until it has a reader
    let reader = options.open_receiver(path)?;
    let writer = options.open_sender(path)?;
    Ok(attach(reader, writer))
}

#[cfg(not(unix))]
fn open_device(path: &Path) -> std::io::Result<Link> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("{} is not reachable: character devices need a unix host", path.display()),
    ))
}

/// Wire an already-open byte stream into a [`Link`]. The gate starts up.
pub fn attach<R, W>(reader: R, writer: W) -> Link
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let gate = ConnectionLink::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    gate.set_connected(true);
    tokio::spawn(write_commands(
        writer,
        command_rx,
        gate.clone(),
        event_tx.clone(),
    ));
    tokio::spawn(read_lines(reader, event_tx, gate.clone()));
    tracing::info!("serial link up");

    Link {
        gate,
        sink: ChannelSink { tx: command_tx },
        events: event_rx,
    }
}

async fn read_lines<R: AsyncRead + Unpin>(
    reader: R,
    events: UnboundedSender<LinkEvent>,
    gate: ConnectionLink,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let reason = loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break None,
            Ok(_) => {
                // Boot noise is not valid UTF-8; replace it rather than drop the link
                let line = String::from_utf8_lossy(&buf);
                if events.send(LinkEvent::Line(line.trim().to_string())).is_err() {
                    return;
                }
            }
            Err(e) => break Some(e.to_string()),
        }
    };

    gate.set_connected(false);
    tracing::warn!(
        reason = reason.as_deref().unwrap_or("end of stream"),
        "serial link closed"
    );
    let _ = events.send(LinkEvent::Closed { reason });
}

async fn write_commands<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut commands: UnboundedReceiver<String>,
    gate: ConnectionLink,
    events: UnboundedSender<LinkEvent>,
) {
    while let Some(mut line) = commands.recv().await {
        line.push('\n');
        let written = match writer.write_all(line.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            gate.set_connected(false);
            tracing::error!(error = %e, "failed to write command");
            let _ = events.send(LinkEvent::Closed {
                reason: Some(format!("Send Failed: {e}")),
            });
            return;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ConnectionGate;
    use tokio::io::{duplex, split};

    #[tokio::test]
    async fn commands_reach_the_device_in_order() {
        let (ours, device) = duplex(1024);
        let (reader, writer) = split(ours);
        let mut link = attach(reader, writer);

        for command in ["SET_SSID:TestNet", "SET_PASS:password123", "DO_CONNECT"] {
            link.sink.send(command).unwrap();
        }

        let mut lines = BufReader::new(device).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "SET_SSID:TestNet");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "SET_PASS:password123");
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "DO_CONNECT");
    }

    #[tokio::test]
    async fn inbound_lines_are_split_and_trimmed() {
        let (ours, mut device) = duplex(1024);
        let (reader, writer) = split(ours);
        let mut link = attach(reader, writer);

        device
            .write_all(b"STATUS:DEVICE:DISCONNECTED\r\nLOG:INFO:ready  \n")
            .await
            .unwrap();

        assert_eq!(
            link.events.recv().await,
            Some(LinkEvent::Line("STATUS:DEVICE:DISCONNECTED".into()))
        );
        assert_eq!(
            link.events.recv().await,
            Some(LinkEvent::Line("LOG:INFO:ready".into()))
        );
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_close_the_link() {
        let (ours, mut device) = duplex(1024);
        let (reader, writer) = split(ours);
        let mut link = attach(reader, writer);

        device
            .write_all(b"\xff\xfe boot noise\nSTATUS:DEVICE:DISCONNECTED\n")
            .await
            .unwrap();

        match link.events.recv().await {
            Some(LinkEvent::Line(line)) => assert!(line.ends_with("boot noise")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            link.events.recv().await,
            Some(LinkEvent::Line("STATUS:DEVICE:DISCONNECTED".into()))
        );
        assert!(link.gate.is_connected());
    }

    #[cfg(unix)]
    #[test]
    fn silent_device_does_not_hold_up_shutdown() {
        let fifo = std::env::temp_dir().join(format!("radarlink-quiet-{}", std::process::id()));
        let _ = std::fs::remove_file(&fifo);
        let made = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(made.success());

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let endpoint = Endpoint::Device(fifo.clone());
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let quiet = runtime.block_on(async {
                let mut link = open(&endpoint).await.unwrap();
                tokio::time::timeout(Duration::from_millis(100), link.events.recv())
                    .await
                    .is_err()
            });
            drop(runtime);
            let _ = done_tx.send(quiet);
        });

        let quiet = done_rx.recv_timeout(Duration::from_secs(5));
        let _ = std::fs::remove_file(&fifo);
        assert_eq!(quiet, Ok(true));
    }

    #[tokio::test]
    async fn device_hangup_closes_the_gate() {
        let (ours, device) = duplex(64);
        let (reader, writer) = split(ours);
        let mut link = attach(reader, writer);
        assert!(link.gate.is_connected());

        drop(device);

        assert_eq!(
            link.events.recv().await,
            Some(LinkEvent::Closed { reason: None })
        );
        assert!(!link.gate.is_connected());
    }

    #[test]
    fn endpoints_display_for_logs() {
        assert_eq!(
            Endpoint::Tcp("192.168.4.1:2000".into()).to_string(),
            "tcp://192.168.4.1:2000"
        );
        assert_eq!(
            Endpoint::Device(PathBuf::from("/dev/ttyACM0")).to_string(),
            "/dev/ttyACM0"
        );
    }
}
