//! Application layer: request dispatch and the hardware port seam.

pub mod dispatch;
pub mod port;

pub use dispatch::{ApiResponse, Dispatcher};
pub use port::{ChannelError, CommandOutcome, CommandPort};
