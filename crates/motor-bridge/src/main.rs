//! Motor bridge — entry point.
//!
//! This binary serves a small HTTP API and a static control page, and relays
//! API calls as line-delimited ASCII commands to a motor-driving
//! microcontroller on a serial port.
//!
//! # Usage
//!
//! ```text
//! motor-bridge [OPTIONS] --serial-port <PATH>
//!
//! Options:
//!   --serial-port <PATH>  Serial device (e.g. /dev/serial/by-id/usb-Arduino...)
//!   --baud <RATE>         Baud rate [default: 115200]
//!   --port <PORT>         HTTP listener port [default: 5173]
//!   --bind <ADDR>         HTTP bind address [default: 0.0.0.0]
//!   --static-dir <DIR>    Static asset root [default: ./public]
//! ```
//!
//! # Environment variable overrides
//!
//! The CLI defaults can also be supplied with environment variables.  CLI
//! args take precedence when both are present.
//!
//! | Variable      | Default    | Description              |
//! |---------------|------------|--------------------------|
//! | `SERIAL_PORT` | (required) | Serial device path       |
//! | `BAUD`        | `115200`   | Baud rate                |
//! | `PORT`        | `5173`     | HTTP listener port       |
//! | `BIND`        | `0.0.0.0`  | HTTP bind address        |
//! | `STATIC_DIR`  | `./public` | Static asset root        |
//!
//! # Startup order
//!
//! The serial channel opens *before* the listener binds: a bridge that
//! cannot reach its device has nothing to serve, and the failure should be
//! reported once, at startup, instead of per request.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use motor_bridge::application::CommandPort;
use motor_bridge::domain::{BridgeConfig, ChannelTuning};
use motor_bridge::infrastructure::run_server;
use motor_bridge::infrastructure::serial::SerialChannel;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// HTTP bridge to a serial motor controller.
#[derive(Debug, Parser)]
#[command(
    name = "motor-bridge",
    about = "HTTP-to-serial bridge for a motor-driving microcontroller",
    version
)]
struct Cli {
    /// Serial device path.
    ///
    /// Prefer the stable `/dev/serial/by-id/...` symlink over `/dev/ttyACM0`,
    /// which renumbers when the board resets.
    #[arg(long, env = "SERIAL_PORT")]
    serial_port: String,

    /// Serial baud rate (8N1 framing is fixed).
    #[arg(long, default_value_t = 115200, env = "BAUD")]
    baud: u32,

    /// TCP port for the HTTP listener.
    #[arg(long, default_value_t = 5173, env = "PORT")]
    port: u16,

    /// IP address to bind the HTTP listener to.
    ///
    /// Use `0.0.0.0` to accept connections from the LAN, or `127.0.0.1`
    /// for local-only control.
    #[arg(long, default_value = "0.0.0.0", env = "BIND")]
    bind: String,

    /// Root directory for the static control page.
    #[arg(long, default_value = "./public", env = "STATIC_DIR")]
    static_dir: PathBuf,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let http_bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        Ok(BridgeConfig {
            http_bind_addr,
            static_root: self.static_dir,
            serial_path: self.serial_port,
            baud_rate: self.baud,
            tuning: ChannelTuning::default(),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from RUST_LOG; default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_bridge_config()?;

    info!(
        "motor bridge starting — http={}, serial={} @{}",
        config.http_bind_addr, config.serial_path, config.baud_rate
    );

    // Fatal startup error #1: the device. Open, configure, drain greeting.
    let channel = SerialChannel::open(&config.serial_path, config.baud_rate, config.tuning)
        .await
        .with_context(|| format!("failed to open serial device '{}'", config.serial_path))?;
    let port: Arc<dyn CommandPort> = Arc::new(channel);

    // Graceful shutdown: Ctrl+C clears the flag; the accept loop polls it.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // Fatal startup error #2 lives inside: the listener bind.
    run_server(config, port, running).await?;

    info!("motor bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
