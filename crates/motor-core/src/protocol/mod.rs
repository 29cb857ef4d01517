//! Serial wire protocol: command encoding and reply interpretation.
//!
//! The protocol is line-delimited ASCII.  Exactly one command or one reply
//! per line, terminated by `\n` (a trailing `\r` on replies is tolerated and
//! stripped by the channel before this crate ever sees the line).
//!
//! Commands:
//!
//! ```text
//! M<id>:START:<speed>:<dir>     start motor <id> at <speed>% in <dir>
//! M<id>:STOP                    stop motor <id>
//! M<id>:SET:<speed>:<dir>       adjust a running motor
//! STATUS                        request a one-line status report
//! ```
//!
//! Expected acknowledgement tokens: `OK`, `STATUS OK`, or an
//! application-specific status line.

pub mod command;
pub mod reply;
