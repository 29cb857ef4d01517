//! The serial command channel: one device handle, one transaction at a time.
//!
//! This module is responsible for:
//!
//! 1. Opening the character device and configuring the line for raw byte
//!    transport: fixed baud, 8 data bits, no parity, one stop bit, no
//!    hardware flow control.
//! 2. Asserting DTR and RTS after open.  USB-serial microcontroller bridges
//!    (ATmega32U4-class CDC devices) treat these as "terminal open" and may
//!    reset or refuse to transmit until they are raised.
//! 3. Draining one unsolicited greeting line (a boot banner such as `READY`)
//!    within a bounded wait.  Silence is fine.
//! 4. Running every command/reply exchange as a single indivisible
//!    transaction under one async mutex.
//!
//! # The chief invariant
//!
//! At most one command is in flight against the device at any instant.  The
//! mutex guard is held across the *whole* write-then-read sequence — not per
//! syscall — because two interleaved half-transactions would let one
//! caller's command consume another caller's reply.
//!
//! # Waits are time-bounded, not byte-bounded
//!
//! Reply reads accumulate bytes until a `\n` (a `\r` immediately before it
//! is stripped).  No line-length limit is enforced; a device that never
//! sends a terminator exhausts the wait budget, not memory.  Bytes received
//! past a terminator are kept for the next transaction.
//!
//! # Closing
//!
//! Dropping the channel releases the device handle.  A transaction already
//! holding the guard completes or times out on its own schedule; drop does
//! not interrupt an in-progress wait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, info, warn};

use crate::application::port::{ChannelError, CommandOutcome, CommandPort};
use crate::domain::ChannelTuning;

/// Read-chunk size for reply accumulation.  Replies are one short line; this
/// only bounds a single syscall, not the line length.
const READ_CHUNK: usize = 256;

/// The serial command channel.
///
/// Generic over the byte stream so tests can drive it with
/// `tokio::io::duplex` instead of a device; production uses
/// [`SerialStream`] via [`SerialChannel::open`].
pub struct SerialChannel<T> {
    // The mutex scope IS the transaction scope. Everything the device shares
    // with callers lives behind it.
    link: Mutex<Link<T>>,
    tuning: ChannelTuning,
}

/// The exclusively-held device state: the stream plus bytes read past the
/// last line terminator.
struct Link<T> {
    io: T,
    pending: Vec<u8>,
}

impl SerialChannel<SerialStream> {
    /// Opens and configures the serial device, then drains the greeting.
    ///
    /// This is the `Closed → Opening → Ready` path.  Failure anywhere in it
    /// is fatal to startup: a bridge without its device has nothing to serve.
    ///
    /// # Errors
    ///
    /// Returns the underlying serial error if the device cannot be opened or
    /// the control lines cannot be asserted.
    pub async fn open(
        path: &str,
        baud_rate: u32,
        tuning: ChannelTuning,
    ) -> Result<Self, tokio_serial::Error> {
        let mut stream = tokio_serial::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()?;

        // "Terminal open" for USB CDC bridges; without these some boards
        // never start transmitting.
        stream.write_data_terminal_ready(true)?;
        stream.write_request_to_send(true)?;

        info!("serial open at {path} @{baud_rate}");

        let channel = Self::from_stream(stream, tuning);
        channel.drain_greeting().await;
        Ok(channel)
    }
}

impl<T> SerialChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an already-configured byte stream.  Used directly by tests and
    /// by [`SerialChannel::open`].
    pub fn from_stream(io: T, tuning: ChannelTuning) -> Self {
        Self {
            link: Mutex::new(Link {
                io,
                pending: Vec::new(),
            }),
            tuning,
        }
    }

    /// Waits up to the configured greeting window for an unsolicited boot
    /// banner and logs it.  Absence is expected for boards that are already
    /// running.
    pub async fn drain_greeting(&self) {
        let mut link = self.link.lock().await;
        match link.read_line(self.tuning.greeting_wait).await {
            Some(banner) => info!("serial ← {banner} (greeting)"),
            None => debug!(
                "no greeting within {:?}; continuing",
                self.tuning.greeting_wait
            ),
        }
    }

    /// One full command/reply transaction.  See the module docs for the
    /// atomicity contract.
    async fn transact(
        &self,
        line: &str,
        min_ack_wait: Duration,
    ) -> Result<CommandOutcome, ChannelError> {
        // Held until return: write and read are one unit.
        let mut link = self.link.lock().await;

        link.write_line(line).await?;
        debug!("serial → {line}");

        let wait = min_ack_wait.max(self.tuning.ack_wait_floor);
        match link.read_line(wait).await {
            Some(reply) => {
                debug!("serial ← {reply}");
                Ok(CommandOutcome::Acknowledged(reply))
            }
            None => {
                debug!("serial ← (no reply within {wait:?})");
                Ok(CommandOutcome::NoReply)
            }
        }
    }
}

#[async_trait]
impl<T> CommandPort for SerialChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_command(
        &self,
        line: &str,
        min_ack_wait: Duration,
    ) -> Result<CommandOutcome, ChannelError> {
        self.transact(line, min_ack_wait).await
    }
}

impl<T> Link<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Writes `line` plus the `\n` terminator in a single write call.
    ///
    /// A short write is the one condition surfaced to callers as a hard
    /// error: the device did not get the whole command.
    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        let mut out = Vec::with_capacity(line.len() + 1);
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');

        let written = self.io.write(&out).await?;
        if written != out.len() {
            return Err(ChannelError::WriteFailed {
                expected: out.len(),
                written,
            });
        }
        self.io.flush().await?;
        Ok(())
    }

    /// Reads one `\n`-terminated line within `wait`, stripping a trailing
    /// `\r`.  Returns `None` when the deadline passes (or the stream ends)
    /// without a complete line; partial bytes stay buffered for later.
    async fn read_line(&mut self, wait: Duration) -> Option<String> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
                line.pop(); // the '\n'
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Some(String::from_utf8_lossy(&line).into_owned());
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            let mut buf = [0u8; READ_CHUNK];
            match timeout(remaining, self.io.read(&mut buf)).await {
                Ok(Ok(0)) => return None, // stream ended mid-wait
                Ok(Ok(n)) => self.pending.extend_from_slice(&buf[..n]),
                Ok(Err(e)) => {
                    warn!("serial read error: {e}");
                    return None;
                }
                Err(_) => return None, // deadline
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
//
// Behavioral tests for the channel (atomicity, floor waits, greeting) live in
// tests/channel_integration.rs; these cover the line codec edge cases.
