//! Serial command channel: exclusive owner of the device handle.
//!
//! `channel` holds the real implementation; `mock` holds a scriptable
//! [`crate::application::CommandPort`] for tests that never touch hardware.

pub mod channel;
pub mod mock;

pub use channel::SerialChannel;
pub use mock::MockCommandPort;
