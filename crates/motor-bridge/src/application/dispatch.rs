//! API request dispatch: routes, validation, and JSON response bodies.
//!
//! The HTTP listener hands every `/api` request here as
//! `(method, decoded path, query string, body)` and gets back a complete
//! `(status, content type, body)` triple.  This layer owns:
//!
//! - Route matching (`/api/status`, `/api/motor/{id}/{action}`).
//! - Validation: a motor id outside [1, 9] is a 400 and **never** reaches
//!   the serial channel.  Speed is clamped, not rejected; direction is a
//!   lenient hint (see `motor_core`).
//! - The soft-acknowledgement policy: only a failed *write* is a failure.
//!   `NoReply` is optimistic success, and so is any reply at all — even one
//!   that is not a firmware ack token.
//!
//! # Known risk, preserved deliberately
//!
//! Because any reply counts as success, a device-reported error string (say
//! `ERR:STALL`) is silently reported as `ok:true`.  The original controller
//! traded reliability signaling for availability here, and clients depend on
//! the behavior; tightening it to check `motor_core::is_ack` would change
//! the observable API.  Non-ack replies are logged at warn level so the
//! trade-off at least leaves a trace.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use motor_core::{is_ack, Direction, MotorCommand, MotorId, SpeedPercent};

use crate::application::port::{CommandOutcome, CommandPort};

/// A complete API response, ready for the listener to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header value.
    pub content_type: &'static str,
    /// Response body bytes (always well-formed JSON from this layer).
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: json_body(value),
        }
    }
}

// ── JSON body types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OkBody {
    ok: bool,
}

#[derive(Serialize)]
struct StatusBody {
    status: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Serializes a response body, falling back to `{}` if serde ever fails on
/// one of our own plain structs (it cannot, but the listener must always get
/// well-formed JSON).
fn json_body<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error!("response serialization failed: {e}");
        "{}".to_string()
    })
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Routes decoded API requests to the command port.
///
/// Cheap to clone; all clones share the same port, and the port itself is
/// what serializes hardware access.
#[derive(Clone)]
pub struct Dispatcher {
    port: Arc<dyn CommandPort>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given command port.
    pub fn new(port: Arc<dyn CommandPort>) -> Self {
        Self { port }
    }

    /// Handles one `/api` request.
    ///
    /// `path` is the percent-decoded request path without the query string;
    /// `query` is the raw query string (decoded per-pair in here).  The body
    /// is accepted for interface completeness; no current endpoint reads it.
    pub async fn dispatch(&self, method: &str, path: &str, query: &str, _body: &[u8]) -> ApiResponse {
        debug!("api dispatch: {method} {path}");

        if method == "GET" && path == "/api/status" {
            return self.status_query().await;
        }

        // /api/motor/{id}/{start|stop|set}
        if let Some(rest) = path.strip_prefix("/api/motor/") {
            if matches!(method, "GET" | "POST") {
                if let Some((id_part, action)) = rest.split_once('/') {
                    return self.motor_command(id_part, action, query).await;
                }
            }
        }

        ApiResponse::json(404, &ErrorBody { error: "not found" })
    }

    /// `/api/status` — write `STATUS`, relay the raw reply (or `NO-REPLY`).
    async fn status_query(&self) -> ApiResponse {
        let cmd = MotorCommand::Status;
        match self.port.send_command(&cmd.wire_line(), cmd.min_ack_wait()).await {
            Ok(CommandOutcome::Acknowledged(line)) => ApiResponse::json(200, &StatusBody { status: line }),
            Ok(CommandOutcome::NoReply) => ApiResponse::json(
                200,
                &StatusBody {
                    status: "NO-REPLY".to_string(),
                },
            ),
            Err(e) => {
                warn!("status query write failed: {e}");
                ApiResponse::json(500, &ErrorBody { error: "serial write failed" })
            }
        }
    }

    /// `/api/motor/{id}/{action}` — validate, encode, send, map the outcome.
    async fn motor_command(&self, id_part: &str, action: &str, query: &str) -> ApiResponse {
        // A non-numeric id segment is an unmatched route, like the original's
        // digit-only pattern; a numeric id out of range is a validation error.
        let Ok(raw_id) = id_part.parse::<u32>() else {
            return ApiResponse::json(404, &ErrorBody { error: "not found" });
        };
        let id = match MotorId::new(raw_id) {
            Ok(id) => id,
            Err(_) => {
                return ApiResponse::json(
                    400,
                    &ErrorBody {
                        error: "invalid id; expected 1..9",
                    },
                )
            }
        };

        let (speed, dir) = parse_motor_query(query);
        let cmd = match action {
            "start" => MotorCommand::Start { id, speed, dir },
            "stop" => MotorCommand::Stop { id },
            "set" => MotorCommand::Set { id, speed, dir },
            _ => return ApiResponse::json(404, &ErrorBody { error: "not found" }),
        };

        match self.port.send_command(&cmd.wire_line(), cmd.min_ack_wait()).await {
            Ok(outcome) => {
                if let CommandOutcome::Acknowledged(line) = &outcome {
                    if !is_ack(line) {
                        // Soft-acknowledgement policy: still ok:true, but leave
                        // a trace for whoever is debugging the firmware.
                        warn!("non-ack reply to {}: {line:?}", cmd.wire_line());
                    }
                }
                ApiResponse::json(200, &OkBody { ok: true })
            }
            Err(e) => {
                warn!("command write failed: {e}");
                ApiResponse::json(500, &OkBody { ok: false })
            }
        }
    }
}

/// Pulls `speed` and `dir` out of a raw query string.
///
/// `form_urlencoded` handles percent sequences and `+` for us.  An
/// unparsable or absent speed is 0 (the original used `atoi` semantics);
/// direction parsing is delegated to [`Direction::from_query`].
fn parse_motor_query(query: &str) -> (SpeedPercent, Direction) {
    let mut speed = SpeedPercent::clamped(0);
    let mut dir = Direction::default();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "speed" => speed = SpeedPercent::clamped(value.trim().parse::<i64>().unwrap_or(0)),
            "dir" => dir = Direction::from_query(Some(value.as_ref())),
            _ => {}
        }
    }
    (speed, dir)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
