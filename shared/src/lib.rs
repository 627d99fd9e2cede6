//! Edge Bridge Shared Types
//!
//! This crate provides the types shared between the bridge service and the
//! event listener: the command topic grammar, the normalized process state
//! and the shadow update document.

pub mod command;
pub mod shadow;
pub mod topic;

use bytes::Bytes;
use std::fmt;

pub use command::Command;
pub use shadow::{ReportKind, ShadowDocument};
pub use topic::{CommandPath, TopicMatch};

/// Default timing parameters for the bridge
pub mod defaults {
    /// Poll tick period in milliseconds
    pub const TICK_PERIOD_MS: u64 = 1000;

    /// Number of ticks between two status samples
    pub const SAMPLE_EVERY_TICKS: u32 = 20;

    /// Pulse deadline value at which the poll loop issues the stop
    pub const STOP_THRESHOLD: u32 = 1;

    /// Upper bound for a single supervisor or publish call
    pub const CALL_TIMEOUT_MS: u64 = 800;

    /// Broker keep-alive interval
    pub const KEEPALIVE_INTERVAL_MS: u64 = 10_000;

    /// Supervisord XML-RPC endpoint
    pub const SUPERVISOR_URL: &str = "http://localhost:9001/RPC2";
}

/// State of the supervised process, normalized from the supervisor's state name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Stopped,
    Running,
    /// Supervisor unreachable or process not known to it
    Unknown,
    /// Any other supervisor state (STARTING, BACKOFF, EXITED, FATAL, ...)
    Other(String),
}

impl ProcessState {
    /// Normalize a supervisord `statename` value
    pub fn from_supervisor(statename: &str) -> Self {
        match statename.trim() {
            "STOPPED" => ProcessState::Stopped,
            "RUNNING" => ProcessState::Running,
            "UNKNOWN" | "" => ProcessState::Unknown,
            other => ProcessState::Other(other.to_string()),
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ProcessState::Stopped)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ProcessState::Running)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Stopped => write!(f, "Stopped"),
            ProcessState::Running => write!(f, "Running"),
            ProcessState::Unknown => write!(f, "Unknown"),
            ProcessState::Other(name) => write!(f, "{}", name),
        }
    }
}

/// MQTT-style delivery guarantee requested for a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Qos {
    #[default]
    AtMostOnce,
    AtLeastOnce,
}

impl Qos {
    pub fn level(self) -> u32 {
        match self {
            Qos::AtMostOnce => 0,
            Qos::AtLeastOnce => 1,
        }
    }
}

/// A message delivered to the bridge by its subscription
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}
