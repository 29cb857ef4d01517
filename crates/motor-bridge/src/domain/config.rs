//! Bridge configuration types.
//!
//! These are pure data — construction and defaults only.  Parsing from the
//! command line / environment lives in `main.rs`; nothing here performs I/O.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Timing knobs for the serial command channel.
///
/// The defaults encode hard-won device behavior and should not be lowered in
/// production: USB-CDC microcontrollers (ATmega32U4-class boards) reset when
/// the port is opened and can sit silent for most of a second afterwards.
/// Tests shrink these to keep the suite fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTuning {
    /// Lower bound applied to every acknowledgement wait, whatever the
    /// caller asked for.  The effective wait is `max(requested, floor)`.
    pub ack_wait_floor: Duration,
    /// How long to wait for an unsolicited boot banner (e.g. `READY`) right
    /// after open.  Seeing nothing is not an error.
    pub greeting_wait: Duration,
}

impl Default for ChannelTuning {
    fn default() -> Self {
        Self {
            // The device may be mid-reset or busy with a prior command.
            ack_wait_floor: Duration::from_millis(800),
            greeting_wait: Duration::from_secs(3),
        }
    }
}

/// Complete runtime configuration for the bridge process.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address the HTTP listener binds to.
    pub http_bind_addr: SocketAddr,
    /// Root directory for static assets (`/` serves `<root>/index.html`).
    pub static_root: PathBuf,
    /// Serial device path, e.g. `/dev/serial/by-id/usb-Arduino...`.
    pub serial_path: String,
    /// Serial baud rate.  The wire format is 8N1 at this rate.
    pub baud_rate: u32,
    /// Channel timing knobs.
    pub tuning: ChannelTuning,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
