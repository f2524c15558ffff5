//! WICED HCI host tool
//!
//! Drives a Bluetooth controller whose UART is exposed over TCP by a serial
//! bridge or by the simulator's per-node UART ports.
//!
//! # Usage
//!
//! ```bash
//! # Download firmware, then print every DEVICE and MESH event
//! wiced-hci --connect 127.0.0.1:4000 --firmware mesh_app.hcd monitor --groups device,mesh
//!
//! # Controller already running: send a raw command and watch for replies
//! wiced-hci --connect 127.0.0.1:4000 --skip-download send 0x16EF 00 --wait-ms 500
//!
//! # Walk a firmware image offline
//! wiced-hci inspect mesh_app.hcd
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiced_hci::{
    CommandStatus, FirmwareImage, Group, HciConfig, TcpTransport, WicedHci, EVT_COMMAND_STATUS,
    OPCODE_LAUNCH_RAM, OPCODE_WRITE_RAM,
};

#[derive(Parser, Debug)]
#[command(name = "wiced-hci")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bring up and talk to a WICED HCI controller over a TCP-bridged UART")]
struct Cli {
    /// Address of the UART bridge
    #[arg(short, long)]
    connect: Option<SocketAddr>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Firmware image (.hcd) to download at bring-up
    #[arg(short, long, conflicts_with = "skip_download")]
    firmware: Option<PathBuf>,

    /// Version string of the firmware image, for the logs
    #[arg(long, requires = "firmware")]
    firmware_version: Option<String>,

    /// Skip the firmware download (controller already runs its application)
    #[arg(long)]
    skip_download: bool,

    /// Delay between firmware launch and the first read, overrides the config file
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print inbound events until Ctrl+C
    Monitor {
        /// Groups to subscribe to (device, le, gatt, mesh)
        #[arg(short, long, value_delimiter = ',', default_value = "device,le,gatt,mesh")]
        groups: Vec<String>,

        /// Stop after this many events (0 = unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u64,
    },

    /// Send one raw WICED command
    Send {
        /// Command code, e.g. 0x16EF
        command: String,

        /// Payload as hex
        #[arg(default_value = "")]
        payload: String,

        /// Print events received for this long after sending
        #[arg(long, default_value = "0")]
        wait_ms: u64,
    },

    /// List the chunks of a firmware image without connecting
    Inspect {
        /// Firmware image (.hcd)
        path: PathBuf,
    },
}

/// One inbound event forwarded from the reader thread.
struct Event {
    group: Group,
    command: u16,
    payload: Vec<u8>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Inspect { path } => cmd_inspect(path),
        Commands::Monitor { groups, count } => {
            let groups = parse_groups(groups)?;
            let hci = bring_up(&cli)?;
            let result = cmd_monitor(&hci, &groups, *count);
            hci.down().context("Failed to take the link down")?;
            result
        }
        Commands::Send {
            command,
            payload,
            wait_ms,
        } => {
            let command = parse_command(command)?;
            let payload = hex::decode(payload.replace([' ', ':'], ""))
                .context("Payload is not valid hex")?;
            let hci = bring_up(&cli)?;
            let result = cmd_send(&hci, command, &payload, Duration::from_millis(*wait_ms));
            hci.down().context("Failed to take the link down")?;
            result
        }
    }
}

fn build_config(cli: &Cli) -> Result<HciConfig> {
    let mut config = match &cli.config {
        Some(path) => HciConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HciConfig::default(),
    };
    if let Some(settle_ms) = cli.settle_ms {
        config.settle_delay_ms = settle_ms;
    }
    Ok(config)
}

fn bring_up(cli: &Cli) -> Result<WicedHci<TcpTransport>> {
    let addr = cli
        .connect
        .context("--connect <ADDR> is required for this command")?;
    let config = build_config(cli)?;

    let image = match (&cli.firmware, cli.skip_download) {
        (Some(path), _) => {
            let image = FirmwareImage::from_file(path)
                .with_context(|| format!("Failed to read firmware {}", path.display()))?;
            Some(match &cli.firmware_version {
                Some(version) => image.with_version(version.clone()),
                None => image,
            })
        }
        (None, true) => None,
        (None, false) => bail!("Pass --firmware <PATH> or --skip-download"),
    };

    let hci = WicedHci::with_config(TcpTransport::new(addr), config)?;
    tracing::info!(%addr, "Bringing up controller");
    if let Some(report) = hci
        .up(image.as_ref())
        .with_context(|| format!("Bring-up over {} failed", addr))?
    {
        tracing::info!(
            chunks = report.chunks_written,
            bytes = report.bytes_written,
            hardware_error = report.hardware_error_seen,
            "Firmware downloaded"
        );
    }
    Ok(hci)
}

fn cmd_monitor(hci: &WicedHci<TcpTransport>, groups: &[Group], count: u64) -> Result<()> {
    let events = subscribe(hci, groups)?;
    let stop = stop_signal()?;

    println!("Monitoring {} group(s). Press Ctrl+C to stop...", groups.len());
    let mut received = 0u64;
    loop {
        select! {
            recv(events) -> event => match event {
                Ok(event) => {
                    received += 1;
                    print_event(&event);
                    if count > 0 && received >= count {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(stop) -> _ => break,
        }
    }

    let stats = hci.stats();
    tracing::info!(
        delivered = stats.delivered,
        unhandled = stats.unhandled,
        dropped = stats.dropped,
        "Monitor stopped"
    );
    Ok(())
}

fn cmd_send(
    hci: &WicedHci<TcpTransport>,
    command: u16,
    payload: &[u8],
    wait: Duration,
) -> Result<()> {
    let events = if wait.is_zero() {
        None
    } else {
        Some(subscribe(hci, &Group::DISPATCHABLE)?)
    };

    hci.send(command, payload)
        .with_context(|| format!("Failed to send command 0x{:04X}", command))?;
    println!("Sent 0x{:04X} ({} bytes)", command, payload.len());

    if let Some(events) = events {
        let deadline = crossbeam_channel::after(wait);
        loop {
            select! {
                recv(events) -> event => match event {
                    Ok(event) => print_event(&event),
                    Err(_) => break,
                },
                recv(deadline) -> _ => break,
            }
        }
    }
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let image = FirmwareImage::from_file(path)
        .with_context(|| format!("Failed to read firmware {}", path.display()))?;

    let mut writes = 0usize;
    for chunk in image.chunks() {
        let chunk = chunk.context("Malformed firmware image")?;
        match chunk.opcode {
            OPCODE_WRITE_RAM => writes += 1,
            OPCODE_LAUNCH_RAM => {
                println!(
                    "{}: {} write chunk(s), launch at offset {}",
                    path.display(),
                    writes,
                    chunk.offset
                );
                return Ok(());
            }
            other => bail!(
                "Unknown chunk opcode 0x{:04X} at offset {}",
                other,
                chunk.offset
            ),
        }
    }
    bail!("{}: no launch chunk after {} write chunk(s)", path.display(), writes)
}

fn subscribe(hci: &WicedHci<TcpTransport>, groups: &[Group]) -> Result<Receiver<Event>> {
    let (tx, rx) = unbounded();
    for &group in groups {
        let tx: Sender<Event> = tx.clone();
        hci.set_event_callback(group.code(), move |command, payload| {
            let _ = tx.send(Event {
                group,
                command,
                payload: payload.to_vec(),
            });
        })?;
    }
    Ok(rx)
}

fn stop_signal() -> Result<Receiver<()>> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, shutting down...");
        let _ = tx.try_send(());
    })
    .context("Failed to install Ctrl+C handler")?;
    Ok(rx)
}

fn print_event(event: &Event) {
    let status = match event.command {
        EVT_COMMAND_STATUS => CommandStatus::from_payload(&event.payload)
            .map(|status| format!(" status={}", status))
            .unwrap_or_default(),
        _ => String::new(),
    };
    println!(
        "[{:>6}] 0x{:04X} len={:<4} {}{}",
        event.group.to_string(),
        event.command,
        event.payload.len(),
        hex::encode(&event.payload),
        status
    );
}

fn parse_groups(names: &[String]) -> Result<Vec<Group>> {
    names
        .iter()
        .map(|name| match name.trim().to_lowercase().as_str() {
            "device" | "dev" => Ok(Group::Device),
            "le" | "ble" => Ok(Group::Le),
            "gatt" => Ok(Group::Gatt),
            "mesh" => Ok(Group::Mesh),
            other => bail!("Unknown group: {}", other),
        })
        .collect()
}

fn parse_command(s: &str) -> Result<u16> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.with_context(|| format!("Invalid command code: {}", s))
}
