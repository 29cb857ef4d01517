//! The `CommandPort` seam between request dispatch and the serial hardware.
//!
//! Dispatch never touches a device handle.  It sees exactly one operation —
//! send a command line, get back what happened — and the three outcomes that
//! operation can have.  The real implementation is
//! `infrastructure::serial::SerialChannel`; tests use
//! `infrastructure::serial::MockCommandPort`.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// What came back from one command/reply transaction.
///
/// Note the asymmetry with [`ChannelError`]: *both* variants here are
/// successful exchanges at the channel layer.  A reply that arrived is
/// `Acknowledged` whatever its text says; whether the text is a firmware ack
/// token is a separate, semantic question (`motor_core::is_ack`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A terminated reply line arrived within the deadline.  Carries the raw
    /// line with the terminator (and any trailing `\r`) stripped.
    Acknowledged(String),
    /// The deadline elapsed without a terminated line.  Explicitly not a
    /// failure: firmware may process a command silently.  A caller that
    /// needs certainty polls `STATUS` instead of trusting per-command acks.
    NoReply,
}

/// The one hard failure a command transaction can produce.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Fewer bytes went out than the command line contains.  The command did
    /// not reach the device; the caller must be told.
    #[error("short serial write: wrote {written} of {expected} bytes")]
    WriteFailed { expected: usize, written: usize },

    /// The write itself errored (device unplugged, handle closed).
    #[error("serial write error: {0}")]
    Io(#[from] io::Error),
}

/// Sole path by which the rest of the system talks to the device.
///
/// Implementations must make each call atomic with respect to other callers:
/// the write of the command line and the bounded wait for its reply execute
/// as one unit, with no other caller's write in between.  The effective wait
/// is `max(min_ack_wait, floor)` where the floor belongs to the
/// implementation (see `ChannelTuning`).
#[async_trait]
pub trait CommandPort: Send + Sync {
    /// Writes `line` (terminator appended by the implementation) and waits
    /// up to the effective deadline for one reply line.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] only when the command did not go out in
    /// full.  A missing reply is the `Ok(NoReply)` outcome, not an error.
    async fn send_command(
        &self,
        line: &str,
        min_ack_wait: Duration,
    ) -> Result<CommandOutcome, ChannelError>;
}
