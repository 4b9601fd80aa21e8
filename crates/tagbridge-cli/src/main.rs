//! `tagbridge` entrypoint.
//!
//! - `tagbridge decode <HEX>` - Decode an NDEF message and print a report
//! - `tagbridge simulate [HEX]` - Present a mock Type 2 tag and publish its state
//! - `tagbridge watch` - Watch a PC/SC reader (feature `pcsc`)
//!
//! Tag state goes to the MQTT broker given by `--mqtt-broker` / `MQTT_BROKER`,
//! or to stdout when none is configured. Logs go to stderr.

#![forbid(unsafe_code)]

mod config;
mod identify;
mod logging;
mod monitor;
mod mqtt;
mod publish;
mod report;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::{ServiceArgs, ServiceConfig};
use monitor::{Monitor, forward_events};
use mqtt::MqttConnection;
use publish::{StdoutPublisher, TagPublisher, Transport};
use report::TagReport;
use std::time::Duration;
use tagbridge_core::parse_hex;
use tagbridge_hardware::HardwareError;
use tagbridge_hardware::mock::MockT2Tag;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Suffix of the URI record on a simulated tag when none is given.
const SIMULATED_TAG_URI: &str = "home-assistant.io/tag/test123";

/// `https://` abbreviation code.
const HTTPS_PREFIX_CODE: u8 = 0x04;

/// NFC tag reader bridging Type 2 tags to Home Assistant.
#[derive(Parser)]
#[command(name = "tagbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level filter, overridden by RUST_LOG
    #[arg(long, global = true, env = "TAGBRIDGE_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an NDEF message.
    ///
    /// Prints a JSON report with one summary per record and the identifier
    /// the message stands for.
    ///
    /// Example: tagbridge decode D1010C5504...
    Decode(DecodeArgs),

    /// Present a simulated Type 2 tag.
    ///
    /// Builds a mock tag holding the given NDEF message (by default a Home
    /// Assistant tag URL), runs it through the presence monitor and publishes
    /// the arrival and removal.
    Simulate(SimulateArgs),

    /// Watch a PC/SC reader and publish tag state until interrupted.
    #[cfg(feature = "pcsc")]
    Watch(ServiceArgs),
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// NDEF message as hex; whitespace and colons are ignored
    hex: String,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// NDEF message as hex
    hex: Option<String>,

    /// How long the tag stays in the field, in milliseconds
    #[arg(long, default_value_t = 1000)]
    hold_ms: u64,

    #[command(flatten)]
    service: ServiceArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.json_logs)?;
    debug!(version = tagbridge_core::VERSION, "Starting tagbridge");

    match cli.command {
        Commands::Decode(args) => decode(args),
        Commands::Simulate(args) => simulate(args).await,
        #[cfg(feature = "pcsc")]
        Commands::Watch(args) => watch(args).await,
    }
}

fn decode(args: DecodeArgs) -> anyhow::Result<()> {
    let ndef = parse_hex(&args.hex).context("invalid NDEF hex")?;
    let report = TagReport::from_ndef(None, &ndef);
    report.log();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let ndef = match &args.hex {
        Some(hex) => parse_hex(hex).context("invalid NDEF hex")?,
        None => default_ndef(),
    };
    let config = ServiceConfig::try_from(args.service).context("invalid configuration")?;
    if let Some(reader) = &config.reader {
        warn!(reader = %reader, "Reader filter ignored by simulate");
    }
    let tag = MockT2Tag::new(&ndef).context("failed to build mock tag")?;
    info!(
        ndef_length = ndef.len(),
        pages = tag.page_count(),
        "Simulated tag ready"
    );

    let (mut publisher, mut connection) = open_publisher(&config).await?;

    // The connector hands the tag out once; asking again means it has left.
    let presence = tag.presence();
    let (done_tx, done_rx) = oneshot::channel();
    let mut tag = Some(tag);
    let mut done_tx = Some(done_tx);
    let connect = move || match tag.take() {
        Some(tag) => Ok(tag),
        None => {
            if let Some(tx) = done_tx.take() {
                let _ = tx.send(());
            }
            Err(HardwareError::NoCard)
        }
    };

    let (monitor, mut events) = Monitor::spawn(connect, config.monitor);

    let hold = Duration::from_millis(args.hold_ms);
    tokio::spawn(async move {
        tokio::time::sleep(hold).await;
        debug!("Removing simulated tag");
        presence.remove();
    });

    let finished = async {
        tokio::select! {
            _ = done_rx => {}
            _ = shutdown_signal() => {}
        }
    };
    let connections = connection.as_mut().map(MqttConnection::connected);
    forward_events(&mut events, &mut publisher, connections, finished).await;
    debug!(current = ?publisher.current(), "Simulation finished");

    monitor.shutdown().await?;
    close_publisher(publisher, connection).await;
    Ok(())
}

/// Single URI record pointing at a Home Assistant tag URL.
fn default_ndef() -> Vec<u8> {
    let payload_length = SIMULATED_TAG_URI.len() + 1;
    let mut ndef = vec![0xD1, 0x01, payload_length as u8, b'U', HTTPS_PREFIX_CODE];
    ndef.extend_from_slice(SIMULATED_TAG_URI.as_bytes());
    ndef
}

#[cfg(feature = "pcsc")]
async fn watch(args: ServiceArgs) -> anyhow::Result<()> {
    let config = ServiceConfig::try_from(args).context("invalid configuration")?;

    let (mut publisher, mut connection) = open_publisher(&config).await?;

    let connector = monitor::pcsc_connector(config.reader.clone());
    let (monitor, mut events) = Monitor::spawn(connector, config.monitor);
    info!("Waiting for NFC tags");

    let connections = connection.as_mut().map(MqttConnection::connected);
    forward_events(&mut events, &mut publisher, connections, shutdown_signal()).await;
    monitor.shutdown().await?;

    if publisher.current().is_some()
        && let Err(e) = publisher.publish_state(None).await
    {
        warn!(error = %e, "Failed to publish final absent state");
    }
    close_publisher(publisher, connection).await;
    info!("Stopped");
    Ok(())
}

/// Publisher for the configured transport.
///
/// With a broker, discovery and state are published each time the session
/// connects. Without one, messages go to stdout and are announced at once.
async fn open_publisher(
    config: &ServiceConfig,
) -> anyhow::Result<(TagPublisher<Transport>, Option<MqttConnection>)> {
    match &config.broker {
        Some(broker) => {
            let (publisher, connection) =
                mqtt::connect(broker, &config.client_id, config.monitor.reconnect_delay);
            let publisher = TagPublisher::new(Transport::Mqtt(publisher), config);
            Ok((publisher, Some(connection)))
        }
        None => {
            warn!("MQTT broker not configured, publishing to stdout");
            let mut publisher =
                TagPublisher::new(Transport::Stdout(StdoutPublisher::new()), config);
            publisher.announce().await?;
            Ok((publisher, None))
        }
    }
}

/// Disconnect from the broker, if any, once queued messages are out.
async fn close_publisher(
    mut publisher: TagPublisher<Transport>,
    connection: Option<MqttConnection>,
) {
    if let Err(e) = publisher.close().await {
        warn!(error = %e, "Failed to close publisher");
    }
    if let Some(connection) = connection {
        connection.finish().await;
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
