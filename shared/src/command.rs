//! Command grammar
//!
//! The single place where a [`CommandPath`] is validated. Anything that does
//! not match exactly is rejected with `None` so callers can ignore it.

use crate::topic::CommandPath;
use std::fmt;

/// A validated remote command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the process if it is stopped
    Start,
    /// Stop the process if it is running
    Stop,
    /// Start if stopped and keep it running for at least this many ticks
    Pulse(u32),
    /// Report the current process state right away
    Status,
}

impl Command {
    /// Validate a command path. Unknown verbs, wrong arity and malformed
    /// pulse arguments all yield `None`.
    pub fn from_path(path: &CommandPath) -> Option<Self> {
        match (path.verb(), path.args()) {
            ("start", []) => Some(Command::Start),
            ("stop", []) => Some(Command::Stop),
            ("status", []) => Some(Command::Status),
            ("pulse", [ticks]) => parse_ticks(ticks).map(Command::Pulse),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Pulse(ticks) => write!(f, "pulse/{}", ticks),
            Command::Status => write!(f, "status"),
        }
    }
}

/// Non-negative decimal literal; signs and whitespace are rejected and values
/// beyond `u32::MAX` saturate
fn parse_ticks(literal: &str) -> Option<u32> {
    if literal.is_empty() || !literal.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // All digits, so the only possible failure is overflow
    Some(literal.parse().unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::{parse_topic, TopicMatch};

    fn command(topic: &str) -> Option<Command> {
        Command::from_path(&parse_topic("svc", topic, TopicMatch::Prefix))
    }

    #[test]
    fn test_recognized_verbs() {
        assert_eq!(command("svc/start"), Some(Command::Start));
        assert_eq!(command("svc/stop"), Some(Command::Stop));
        assert_eq!(command("svc/status"), Some(Command::Status));
        assert_eq!(command("svc/pulse/30"), Some(Command::Pulse(30)));
        assert_eq!(command("svc/pulse/0"), Some(Command::Pulse(0)));
    }

    #[test]
    fn test_wrong_arity_is_ignored() {
        assert_eq!(command("svc/start/now"), None);
        assert_eq!(command("svc/stop/1"), None);
        assert_eq!(command("svc/pulse"), None);
        assert_eq!(command("svc/pulse/1/2"), None);
    }

    #[test]
    fn test_malformed_pulse_argument_is_ignored() {
        assert_eq!(command("svc/pulse/abc"), None);
        assert_eq!(command("svc/pulse/-5"), None);
        assert_eq!(command("svc/pulse/+5"), None);
        assert_eq!(command("svc/pulse/"), None);
        assert_eq!(command("svc/pulse/ 5"), None);
    }

    #[test]
    fn test_oversized_pulse_saturates() {
        assert_eq!(command("svc/pulse/5000000000"), Some(Command::Pulse(u32::MAX)));
        assert_eq!(command("svc/pulse/4294967295"), Some(Command::Pulse(u32::MAX)));
        assert_eq!(command("svc/pulse/007"), Some(Command::Pulse(7)));
    }

    #[test]
    fn test_unknown_and_empty_verbs_are_ignored() {
        assert_eq!(command(""), None);
        assert_eq!(command("svc/"), None);
        assert_eq!(command("svc/restart"), None);
        assert_eq!(command("svc/START"), None);
    }
}
