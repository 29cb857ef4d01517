//! # motor-core
//!
//! Shared library for the motor bridge containing the serial wire protocol:
//! motor addressing types, command-line encoding, and acknowledgement
//! interpretation.
//!
//! This crate is used by the bridge service and by its test harnesses.
//! It has zero dependencies on OS APIs, async runtimes, or sockets.
//!
//! # Architecture overview
//!
//! The motor bridge is a small HTTP service that drives motors attached to a
//! microcontroller over a serial link.  HTTP requests are translated into
//! one-line ASCII commands such as `M3:START:80:CW`, written to the device,
//! and answered with one-line replies such as `OK`.
//!
//! This crate (`motor-core`) is the pure foundation.  It defines:
//!
//! - **`protocol::command`** – How a logical motor operation becomes bytes on
//!   the wire.  [`MotorCommand`] renders the exact line the firmware parses,
//!   with validated motor ids and clamped speed percentages.
//!
//! - **`protocol::reply`** – How a raw reply line is interpreted.  The
//!   firmware acknowledges with literal `OK` or `STATUS OK`; anything else is
//!   application-specific status text.
//!
//! The serial channel, the HTTP listener, and all I/O live in the
//! `motor-bridge` crate.  Keeping the protocol here means it can be tested
//! exhaustively without a device on the other end.

pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `motor_core::MotorCommand` instead of `motor_core::protocol::command::MotorCommand`.
pub use protocol::command::{
    CommandError, Direction, MotorCommand, MotorId, SpeedPercent, MOTOR_ACK_WAIT, STATUS_ACK_WAIT,
};
pub use protocol::reply::is_ack;
