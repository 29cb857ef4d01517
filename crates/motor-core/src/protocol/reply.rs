//! Inbound reply interpretation.
//!
//! Two independent layers look at a reply, and they must not be conflated:
//!
//! 1. The **channel** layer (in `motor-bridge`) only cares that *some*
//!    terminated line arrived before the deadline.  Any non-empty reply is a
//!    successful exchange at that layer, whatever the text says.
//!
//! 2. The **semantic** layer — this module — decides whether the text is one
//!    of the firmware's acknowledgement tokens.
//!
//! Current policy quirk, preserved deliberately: the bridge treats every
//! outcome except a failed write as success, so a reply that fails [`is_ack`]
//! still produces `ok:true` upstream.  See the dispatch module in
//! `motor-bridge` for the full soft-acknowledgement discussion.

/// Exact acknowledgement tokens the firmware emits.
const ACK_TOKENS: [&str; 2] = ["OK", "STATUS OK"];

/// Returns `true` if `line` is one of the firmware's literal acknowledgement
/// tokens (`OK` or `STATUS OK`).
///
/// Matching is exact — no trimming, no case folding.  The channel strips the
/// line terminator (and a trailing `\r`) before the line gets here; anything
/// else in the line is significant.
pub fn is_ack(line: &str) -> bool {
    ACK_TOKENS.contains(&line)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
