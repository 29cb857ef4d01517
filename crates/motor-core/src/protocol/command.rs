//! Outbound command construction: typed motor operations and their wire form.
//!
//! Validation happens here, before any serial I/O.  A bad motor id is a
//! [`CommandError`] the caller surfaces as a 4xx; it must never reach the
//! device.  Speeds, by contrast, are clamped rather than rejected — the
//! firmware has no use for an error when "a bit too fast" is unambiguous.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Minimum acknowledgement wait for motor commands (START/STOP/SET).
///
/// The serial channel applies its own generous floor on top of this; see the
/// channel documentation in `motor-bridge`.
pub const MOTOR_ACK_WAIT: Duration = Duration::from_millis(100);

/// Minimum acknowledgement wait for a STATUS query, which asks the firmware
/// to compose a report and therefore gets longer than a bare command ack.
pub const STATUS_ACK_WAIT: Duration = Duration::from_millis(500);

/// Error type for command construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The motor id is outside the addressable range [1, 9].
    #[error("invalid motor id {0}; expected 1..9")]
    InvalidMotorId(u32),
}

/// A validated motor address.  The firmware addresses motors `M1` through
/// `M9`; one decimal digit, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotorId(u8);

impl MotorId {
    /// Creates a motor id, rejecting values outside [1, 9].
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::InvalidMotorId`] for 0 or anything above 9.
    pub fn new(id: u32) -> Result<Self, CommandError> {
        if (1..=9).contains(&id) {
            Ok(Self(id as u8))
        } else {
            Err(CommandError::InvalidMotorId(id))
        }
    }

    /// Returns the numeric id.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A speed expressed as a percentage of full power, always within [0, 100].
///
/// Construction clamps instead of failing: `150` becomes `100`, `-5` becomes
/// `0`.  Callers that parse untrusted input can hand the raw integer straight
/// in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPercent(u8);

impl SpeedPercent {
    /// Clamps any requested value into [0, 100].
    pub fn clamped(requested: i64) -> Self {
        Self(requested.clamp(0, 100) as u8)
    }

    /// Returns the clamped percentage.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for SpeedPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rotation direction.  Wire form is the literal token `CW` or `CCW`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Clockwise — the default when a request does not say otherwise.
    #[default]
    Cw,
    /// Counter-clockwise.
    Ccw,
}

impl Direction {
    /// Lenient parse for query-string values.
    ///
    /// Surrounding whitespace and letter case are ignored (`"ccw"`, `"CCW "`
    /// both parse as counter-clockwise).  Absent or unrecognized values
    /// default to clockwise — the endpoint contract treats direction as a
    /// hint, not a validated field.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("ccw") => Self::Ccw,
            _ => Self::Cw,
        }
    }

    /// Returns the wire token.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Cw => "CW",
            Self::Ccw => "CCW",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// One logical motor operation, ready to be rendered as a wire line.
///
/// Values are ephemeral: constructed per request, encoded, and dropped.  The
/// enum carries already-validated fields, so `wire_line` cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotorCommand {
    /// Start a motor at a given speed and direction.
    Start {
        id: MotorId,
        speed: SpeedPercent,
        dir: Direction,
    },
    /// Stop a motor.  Idempotent on the firmware side.
    Stop { id: MotorId },
    /// Adjust the speed/direction of a running motor.
    Set {
        id: MotorId,
        speed: SpeedPercent,
        dir: Direction,
    },
    /// Request a one-line status report.
    Status,
}

impl MotorCommand {
    /// Renders the command as the exact line the firmware parses, without the
    /// trailing line terminator (the channel appends `\n` when writing).
    pub fn wire_line(&self) -> String {
        match self {
            Self::Start { id, speed, dir } => format!("M{id}:START:{speed}:{dir}"),
            Self::Stop { id } => format!("M{id}:STOP"),
            Self::Set { id, speed, dir } => format!("M{id}:SET:{speed}:{dir}"),
            Self::Status => "STATUS".to_string(),
        }
    }

    /// Returns the minimum acknowledgement wait appropriate for this command.
    pub fn min_ack_wait(&self) -> Duration {
        match self {
            Self::Status => STATUS_ACK_WAIT,
            _ => MOTOR_ACK_WAIT,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_id_accepts_full_valid_range() {
        for id in 1..=9 {
            assert!(MotorId::new(id).is_ok(), "id {id} must be valid");
        }
    }

    #[test]
    fn test_motor_id_rejects_zero() {
        assert_eq!(MotorId::new(0), Err(CommandError::InvalidMotorId(0)));
    }

    #[test]
    fn test_motor_id_rejects_ten_and_above() {
        assert_eq!(MotorId::new(10), Err(CommandError::InvalidMotorId(10)));
        assert_eq!(MotorId::new(250), Err(CommandError::InvalidMotorId(250)));
    }

    #[test]
    fn test_speed_clamps_above_hundred() {
        // Property from the endpoint contract: speed=150 → sent as 100.
        assert_eq!(SpeedPercent::clamped(150).get(), 100);
    }

    #[test]
    fn test_speed_clamps_below_zero() {
        // speed=-5 → sent as 0.
        assert_eq!(SpeedPercent::clamped(-5).get(), 0);
    }

    #[test]
    fn test_speed_passes_in_range_values_through() {
        assert_eq!(SpeedPercent::clamped(0).get(), 0);
        assert_eq!(SpeedPercent::clamped(42).get(), 42);
        assert_eq!(SpeedPercent::clamped(100).get(), 100);
    }

    #[test]
    fn test_direction_defaults_to_cw_when_absent() {
        assert_eq!(Direction::from_query(None), Direction::Cw);
    }

    #[test]
    fn test_direction_parses_ccw_case_insensitively() {
        assert_eq!(Direction::from_query(Some("ccw")), Direction::Ccw);
        assert_eq!(Direction::from_query(Some("CcW")), Direction::Ccw);
    }

    #[test]
    fn test_direction_trims_surrounding_whitespace() {
        assert_eq!(Direction::from_query(Some("CCW ")), Direction::Ccw);
        assert_eq!(Direction::from_query(Some(" cw")), Direction::Cw);
    }

    #[test]
    fn test_direction_unrecognized_defaults_to_cw() {
        assert_eq!(Direction::from_query(Some("widdershins")), Direction::Cw);
        assert_eq!(Direction::from_query(Some("")), Direction::Cw);
    }

    #[test]
    fn test_start_command_wire_form() {
        // Arrange
        let cmd = MotorCommand::Start {
            id: MotorId::new(3).unwrap(),
            speed: SpeedPercent::clamped(80),
            dir: Direction::Cw,
        };

        // Act / Assert
        assert_eq!(cmd.wire_line(), "M3:START:80:CW");
    }

    #[test]
    fn test_stop_command_wire_form() {
        let cmd = MotorCommand::Stop {
            id: MotorId::new(9).unwrap(),
        };
        assert_eq!(cmd.wire_line(), "M9:STOP");
    }

    #[test]
    fn test_set_command_wire_form_ccw() {
        let cmd = MotorCommand::Set {
            id: MotorId::new(1).unwrap(),
            speed: SpeedPercent::clamped(55),
            dir: Direction::Ccw,
        };
        assert_eq!(cmd.wire_line(), "M1:SET:55:CCW");
    }

    #[test]
    fn test_status_command_wire_form() {
        assert_eq!(MotorCommand::Status.wire_line(), "STATUS");
    }

    #[test]
    fn test_wire_line_has_no_terminator() {
        // The channel owns line termination; the encoder must not add one.
        let cmd = MotorCommand::Status;
        assert!(!cmd.wire_line().ends_with('\n'));
        assert!(!cmd.wire_line().ends_with('\r'));
    }

    #[test]
    fn test_status_gets_the_longer_ack_wait() {
        assert_eq!(MotorCommand::Status.min_ack_wait(), STATUS_ACK_WAIT);
        let stop = MotorCommand::Stop {
            id: MotorId::new(2).unwrap(),
        };
        assert_eq!(stop.min_ack_wait(), MOTOR_ACK_WAIT);
    }

    #[test]
    fn test_clamped_speed_appears_clamped_on_the_wire() {
        let cmd = MotorCommand::Start {
            id: MotorId::new(5).unwrap(),
            speed: SpeedPercent::clamped(999),
            dir: Direction::Ccw,
        };
        assert_eq!(cmd.wire_line(), "M5:START:100:CCW");
    }
}
