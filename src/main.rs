mod app;
mod config;
mod error;
mod event;
mod link;
mod measure;
mod protocol;
mod ui;

use clap::{ArgGroup, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use std::{path::PathBuf, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::{
    app::Session,
    event::{RunOptions, run},
    link::Endpoint,
    measure::{MeasurePlan, Survey},
    protocol::{ConnectIntent, Intent, PingIntent},
};

/// Talk to a Wi-Fi radar peripheral over its serial line protocol
#[derive(Parser, Debug)]
#[command(
    name = "radarlink",
    about = "Talk to a Wi-Fi radar peripheral over its serial line protocol.",
    long_about = None,
    version = env!("CARGO_PKG_VERSION"),
    disable_version_flag = true
)]
#[command(group(ArgGroup::new("endpoint").required(true).args(["address", "device"])))]
struct Args {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Serial-over-TCP bridge to connect to (host:port)
    #[arg(short, long)]
    address: Option<String>,

    /// Serial character device, already configured for 115200 baud
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Seconds to stay on the link before exiting
    #[arg(long = "listen-secs", default_value_t = config::DEFAULT_LISTEN_SECS)]
    listen_secs: u64,

    /// Echo every inbound line into the log
    #[arg(long)]
    raw: bool,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Only watch status and log lines
    Monitor,
    /// Join the device to a network
    Connect {
        #[arg(long)]
        ssid: String,
        /// Network password; empty for open networks
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Ping a host from the device
    Ping {
        #[arg(long, default_value = config::DEFAULT_PING_TARGET)]
        target: String,
        #[arg(long, default_value_t = config::DEFAULT_PING_COUNT)]
        count: u32,
    },
    /// Scan for access points
    Scan,
    /// Stream signal readings for one network
    Track {
        #[arg(long)]
        ssid: String,
        #[arg(long)]
        channel: u32,
    },
    /// Stop scanning or tracking
    Stop,
    /// Average tracking readings at one antenna angle for direction finding
    Measure {
        #[arg(long)]
        ssid: String,
        #[arg(long)]
        channel: u32,
        /// Dial angle in degrees, clockwise from north
        #[arg(long, allow_negative_numbers = true)]
        angle: f64,
        /// Usable readings to average
        #[arg(long, default_value_t = config::DEFAULT_MEASURE_SAMPLES,
              value_parser = clap::value_parser!(u32).range(1..))]
        samples: u32,
        /// Survey CSV to extend; the source estimate covers every row in it
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

impl Action {
    fn into_intent(self) -> Option<Intent> {
        match self {
            Action::Monitor => None,
            Action::Connect { ssid, password } => {
                Some(Intent::Connect(ConnectIntent::new(ssid, password)))
            }
            Action::Ping { target, count } => Some(Intent::Ping(PingIntent { target, count })),
            Action::Scan => Some(Intent::Scan),
            Action::Track { ssid, channel } => Some(Intent::Track { ssid, channel }),
            Action::Stop => Some(Intent::Stop),
            Action::Measure { ssid, channel, .. } => Some(Intent::Track { ssid, channel }),
        }
    }

    fn measure_plan(&self) -> Option<(MeasurePlan, Option<PathBuf>)> {
        match self {
            Action::Measure {
                angle, samples, csv, ..
            } => Some((MeasurePlan::new(*angle, *samples as usize), csv.clone())),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (measure, survey_file) = match args.command.as_ref().and_then(Action::measure_plan) {
        Some((plan, file)) => (Some(plan), file),
        None => (None, None),
    };
    let intent = args.command.and_then(Action::into_intent);
    if let Some(intent) = &intent {
        // Fail before touching the device
        intent.build()?;
    }

    let endpoint = match (args.address, args.device) {
        (Some(address), _) => Endpoint::Tcp(address),
        (None, Some(device)) => Endpoint::Device(device),
        (None, None) => return Err(eyre!("either --address or --device is required")),
    };

    let link = link::open(&endpoint)
        .await
        .wrap_err_with(|| format!("could not reach the device at {endpoint}"))?;
    tracing::info!(%endpoint, "connected");

    let mut session = Session::new(args.raw);
    if let Some(path) = &survey_file {
        session.survey = Survey::load(path)
            .await
            .wrap_err_with(|| format!("could not read survey {}", path.display()))?;
    }

    let options = RunOptions {
        listen: Duration::from_secs(args.listen_secs),
        init_delay: Duration::from_millis(config::INIT_COMMAND_DELAY_MS),
        measure,
    };
    run(&mut session, link, intent, options).await?;

    if let Some(path) = &survey_file {
        session
            .survey
            .save(path)
            .await
            .wrap_err_with(|| format!("could not write survey {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = session.survey.measurements().len(), "survey saved");
    }
    Ok(())
}
