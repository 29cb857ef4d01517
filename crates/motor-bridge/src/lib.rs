//! motor-bridge library crate.
//!
//! This crate provides a small HTTP service that drives motors attached to a
//! microcontroller over a serial link.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! HTTP client (JSON over plain sockets, one request per connection)
//!         ↕
//! [motor-bridge]
//!   ├── domain/           Pure types: BridgeConfig, ChannelTuning
//!   ├── application/      Dispatch: routes, validation, JSON bodies,
//!   │                     the CommandPort seam
//!   └── infrastructure/
//!         ├── http/          Accept loop + minimal HTTP parser
//!         ├── static_files/  Static asset resolver (index, content types)
//!         └── serial/        Exclusive serial command channel + mock
//!         ↕
//! Microcontroller (line-delimited ASCII over /dev/tty*, e.g. "M3:START:80:CW")
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `motor-core` only; its view of the
//!   hardware is the [`application::CommandPort`] trait.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tokio-serial`.
//!
//! # The two correctness hazards
//!
//! Everything else in this crate is thin glue; two places carry real
//! invariants:
//!
//! 1. **One command/reply transaction at a time.**  Any number of HTTP
//!    connections may race, but the serial channel holds a single async mutex
//!    across the *entire* write-then-read exchange, so one caller's command
//!    can never consume another caller's reply.  See
//!    [`infrastructure::serial`].
//!
//! 2. **No reply is not a failure.**  The firmware may process a command
//!    silently, so a bounded wait that elapses without a reply is reported as
//!    optimistic success.  See [`application::dispatch`].

/// Domain layer: pure configuration types (no I/O).
pub mod domain;

/// Application layer: request dispatch and the hardware port seam.
pub mod application;

/// Infrastructure layer: HTTP listener, static files, serial channel.
pub mod infrastructure;
