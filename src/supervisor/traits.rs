//! Supervisor capability abstraction

use async_trait::async_trait;
use bridge_shared::ProcessState;
use std::time::Duration;
use thiserror::Error;

/// Failures of a single supervisor call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupervisorError {
    #[error("supervisor unreachable: {0}")]
    Unreachable(String),

    #[error("process {0} is not known to the supervisor")]
    UnknownProcess(String),

    #[error("supervisor call timed out after {0:?}")]
    Timeout(Duration),

    #[error("supervisor fault {code}: {message}")]
    Fault { code: i32, message: String },

    #[error("malformed supervisor response: {0}")]
    Malformed(String),
}

/// Query and control one named process
#[async_trait]
pub trait SupervisorClient: Send + Sync {
    /// Current state of the process
    async fn status(&self) -> Result<ProcessState, SupervisorError>;

    /// Request a start; starting a running process is not an error
    async fn start(&self) -> Result<(), SupervisorError>;

    /// Request a stop; stopping a stopped process is not an error
    async fn stop(&self) -> Result<(), SupervisorError>;
}
