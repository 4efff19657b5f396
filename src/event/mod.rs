//! Event handling module for radarlink
//!
//! This module runs the single event loop that reacts to inbound device lines
//! and submits the user's intent once the link has settled.

mod handlers;

use crate::{
    app::Session,
    config::source,
    link::{Link, LinkEvent},
    measure::MeasurePlan,
    protocol::{InboundLine, Intent, Sequencer},
    ui::{render_estimate, render_measurement, render_network, render_sample, render_status},
};
use color_eyre::eyre::Result;
use handlers::handle_intent;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// How long to stay on the link, counted from start
    pub listen: Duration,
    /// Pause before the first commands so the device can finish booting its UART
    pub init_delay: Duration,
    /// Average tracking samples into one measurement, then stop listening
    pub measure: Option<MeasurePlan>,
}

pub async fn run(
    session: &mut Session,
    link: Link,
    mut intent: Option<Intent>,
    options: RunOptions,
) -> Result<()> {
    let Link {
        gate,
        sink,
        mut events,
    } = link;
    let mut sequencer = Sequencer::new(gate, sink);
    let mut status_rx = session.board.subscribe();

    let init = tokio::time::sleep(options.init_delay);
    let deadline = tokio::time::sleep(options.listen);
    tokio::pin!(init, deadline);
    let mut initialized = false;
    let mut measuring = false;

    session.logs.push(source::SYS, "CONNECTED");

    loop {
        tokio::select! {
            _ = &mut init, if !initialized => {
                initialized = true;
                handle_intent(session, &mut sequencer, &Intent::RequestStatus);
                if let Some(intent) = intent.take() {
                    let sent = handle_intent(session, &mut sequencer, &intent);
                    if let (true, Some(plan)) = (sent, options.measure) {
                        session.start_measurement(plan);
                        measuring = true;
                    }
                }
            }
            event = events.recv() => match event {
                Some(LinkEvent::Line(line)) => match session.handle_line(&line) {
                    Some(InboundLine::Network(entry)) => println!("  {}", render_network(&entry)),
                    Some(InboundLine::Sample(sample)) => {
                        println!("track: {}", render_sample(&sample));
                        if let Some((taken, required)) = session.measure_progress() {
                            println!("sampling: {taken}/{required}");
                        } else if measuring {
                            break;
                        }
                    }
                    _ => {}
                },
                Some(LinkEvent::Closed { reason }) => {
                    session.link_lost(reason.as_deref());
                    break;
                }
                None => {
                    session.link_lost(None);
                    break;
                }
            },
            Ok(()) = status_rx.changed() => {
                println!("status: {}", render_status(&status_rx.borrow_and_update()));
            }
            _ = &mut deadline => break,
        }

        for entry in session.logs.take_unseen() {
            println!("{entry}");
        }
    }

    for entry in session.logs.take_unseen() {
        println!("{entry}");
    }
    if !session.networks.is_empty() {
        println!("networks found: {}", session.networks.len());
    }
    if let Some(sample) = &session.last_sample {
        println!("last track: {}", render_sample(sample));
    }
    if !session.survey.is_empty() {
        println!("sweep:");
        for m in session.survey.measurements() {
            println!("  {}", render_measurement(m));
        }
        println!("source: {}", render_estimate(session.survey.estimate_source()));
    }
    println!("status: {}", render_status(&session.status()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::attach;
    use crate::protocol::PingIntent;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex, split};

    fn options(listen_ms: u64) -> RunOptions {
        RunOptions {
            listen: Duration::from_millis(listen_ms),
            init_delay: Duration::from_millis(10),
            measure: None,
        }
    }

    #[tokio::test]
    async fn ping_flow_over_an_in_memory_link() {
        let (ours, device) = duplex(4096);
        let (reader, writer) = split(ours);
        let link = attach(reader, writer);
        let (device_rx, mut device_tx) = split(device);

        device_tx
            .write_all(b"STATUS:DEVICE:CONNECTED,MyWiFi,192.168.1.100,-50\r\n")
            .await
            .unwrap();

        let mut session = Session::new(false);
        let intent = Intent::Ping(PingIntent {
            target: "8.8.8.8".into(),
            count: 3,
        });
        run(&mut session, link, Some(intent), options(200))
            .await
            .unwrap();

        let mut lines = BufReader::new(device_rx).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("GET_STATUS"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("PING:8.8.8.8:3"));

        assert_eq!(session.status().ssid.as_deref(), Some("MyWiFi"));
        assert!(
            session
                .logs
                .entries()
                .any(|e| e.to_string() == "[SYS] Initiating Ping: 8.8.8.8 (3x)...")
        );
    }

    #[tokio::test]
    async fn measurement_ends_the_session_once_sampled() {
        let (ours, device) = duplex(4096);
        let (reader, writer) = split(ours);
        let link = attach(reader, writer);
        let (device_rx, mut device_tx) = split(device);

        let device_side = tokio::spawn(async move {
            let mut lines = BufReader::new(device_rx).lines();
            while let Some(line) = lines.next_line().await.unwrap() {
                if line == "TRACK:Lab:6" {
                    device_tx
                        .write_all(b"DATA:-120,0,SCANNING...\nDATA:-60,6,AA\nDATA:-62,6,AA\n")
                        .await
                        .unwrap();
                    return line;
                }
            }
            String::new()
        });

        let mut session = Session::new(false);
        let intent = Intent::Track {
            ssid: "Lab".into(),
            channel: 6,
        };
        let options = RunOptions {
            measure: Some(MeasurePlan::new(90.0, 2)),
            ..options(5_000)
        };
        tokio::time::timeout(Duration::from_secs(2), run(&mut session, link, Some(intent), options))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(device_side.await.unwrap(), "TRACK:Lab:6");
        assert!(!session.is_measuring());
        let sweep = session.survey.measurements();
        assert_eq!(sweep.len(), 1);
        assert_eq!((sweep[0].angle, sweep[0].rssi), (90.0, -61));
    }

    #[tokio::test]
    async fn device_hangup_ends_the_session_offline() {
        let (ours, mut device) = duplex(4096);
        let (reader, writer) = split(ours);
        let link = attach(reader, writer);

        device
            .write_all(b"STATUS:DEVICE:CONNECTED,MyWiFi,192.168.1.100,-50\n")
            .await
            .unwrap();
        drop(device);

        let mut session = Session::new(false);
        run(&mut session, link, None, options(5_000)).await.unwrap();

        assert!(!session.status().is_connected());
        assert_eq!(
            session.logs.entries().last().map(ToString::to_string).as_deref(),
            Some("[ERR] DISCONNECTED")
        );
    }
}
