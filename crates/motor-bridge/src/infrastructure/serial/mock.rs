//! Mock command port for unit and integration tests.
//!
//! Allows tests to script channel outcomes and inspect the exact lines the
//! dispatch layer sent, without a serial device or any timing dependence.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::port::{ChannelError, CommandOutcome, CommandPort};

/// What the mock should do for one `send_command` call.
#[derive(Debug, Clone)]
enum Scripted {
    Ack(String),
    NoReply,
    WriteFailure,
}

/// A scriptable [`CommandPort`] that records every line sent through it.
///
/// Outcomes are consumed in FIFO order; when the script is empty the mock
/// acknowledges with `OK`, so happy-path tests need no setup.
pub struct MockCommandPort {
    sent: Mutex<Vec<String>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl MockCommandPort {
    /// Creates a mock with an empty script (every command acks `OK`).
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Queues an acknowledged reply carrying `line`.
    pub fn script_ack(&self, line: &str) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(Scripted::Ack(line.to_string()));
    }

    /// Queues a deadline-elapsed outcome (device stays silent).
    pub fn script_no_reply(&self) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(Scripted::NoReply);
    }

    /// Queues a hard write failure (short write).
    pub fn script_write_failure(&self) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(Scripted::WriteFailure);
    }

    /// Returns every line sent so far, in order.
    pub fn sent_lines(&self) -> Vec<String> {
        self.sent.lock().expect("lock poisoned").clone()
    }
}

impl Default for MockCommandPort {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandPort for MockCommandPort {
    async fn send_command(
        &self,
        line: &str,
        _min_ack_wait: Duration,
    ) -> Result<CommandOutcome, ChannelError> {
        let next = self
            .script
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Scripted::Ack("OK".to_string()));

        // A failed write never reaches the device; everything else does.
        if !matches!(next, Scripted::WriteFailure) {
            self.sent
                .lock()
                .expect("lock poisoned")
                .push(line.to_string());
        }

        match next {
            Scripted::Ack(reply) => Ok(CommandOutcome::Acknowledged(reply)),
            Scripted::NoReply => Ok(CommandOutcome::NoReply),
            Scripted::WriteFailure => Err(ChannelError::WriteFailed {
                expected: line.len() + 1,
                written: 0,
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_defaults_to_ok_ack() {
        // Arrange
        let mock = MockCommandPort::new();

        // Act
        let outcome = mock
            .send_command("M1:STOP", Duration::from_millis(1))
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome, CommandOutcome::Acknowledged("OK".to_string()));
        assert_eq!(mock.sent_lines(), vec!["M1:STOP".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_consumes_script_in_order() {
        let mock = MockCommandPort::new();
        mock.script_no_reply();
        mock.script_ack("STATUS OK");

        let first = mock.send_command("A", Duration::ZERO).await.unwrap();
        let second = mock.send_command("B", Duration::ZERO).await.unwrap();

        assert_eq!(first, CommandOutcome::NoReply);
        assert_eq!(second, CommandOutcome::Acknowledged("STATUS OK".to_string()));
    }

    #[tokio::test]
    async fn test_mock_write_failure_records_no_line() {
        let mock = MockCommandPort::new();
        mock.script_write_failure();

        let result = mock.send_command("M1:STOP", Duration::ZERO).await;

        assert!(result.is_err());
        assert!(mock.sent_lines().is_empty());
    }
}
