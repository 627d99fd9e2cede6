//! Bridge configuration

use bridge_shared::{defaults, TopicMatch};
use std::time::Duration;
use thiserror::Error;

/// Which halves of the bridge are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BridgeMode {
    /// Handle commands and publish state
    #[default]
    Both,
    /// Publish state only; inbound commands are not subscribed
    Publish,
    /// Handle commands only; state changes are not published
    Subscribe,
}

impl BridgeMode {
    pub fn handles_commands(self) -> bool {
        matches!(self, BridgeMode::Both | BridgeMode::Subscribe)
    }

    pub fn publishes_state(self) -> bool {
        matches!(self, BridgeMode::Both | BridgeMode::Publish)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("tick period must be greater than zero")]
    ZeroTickPeriod,

    #[error("sample period must be at least one tick")]
    ZeroSamplePeriod,

    #[error("stop threshold must be at least one tick")]
    ZeroStopThreshold,

    #[error("process name must not be empty")]
    EmptyProcessName,
}

/// Immutable configuration of a bridge, fixed at startup
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Supervised process; also the shadow key its state is reported under
    pub process_name: String,
    /// Topic prefix that inbound commands are published under
    pub topic_prefix: String,
    /// How the prefix is removed from inbound topics
    pub topic_match: TopicMatch,
    /// Poll loop period
    pub tick_period: Duration,
    /// Ticks between status samples
    pub sample_every: u32,
    /// Pulse deadline value that triggers the automatic stop
    pub stop_threshold: u32,
    /// Upper bound for each supervisor or publish call
    pub call_timeout: Duration,
    pub mode: BridgeMode,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            process_name: "vstream".into(),
            topic_prefix: "sdk/test/Python".into(),
            topic_match: TopicMatch::Prefix,
            tick_period: Duration::from_millis(defaults::TICK_PERIOD_MS),
            sample_every: defaults::SAMPLE_EVERY_TICKS,
            stop_threshold: defaults::STOP_THRESHOLD,
            call_timeout: Duration::from_millis(defaults::CALL_TIMEOUT_MS),
            mode: BridgeMode::Both,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.process_name.is_empty() {
            return Err(ConfigError::EmptyProcessName);
        }
        if self.tick_period.is_zero() {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.sample_every == 0 {
            return Err(ConfigError::ZeroSamplePeriod);
        }
        if self.stop_threshold == 0 {
            return Err(ConfigError::ZeroStopThreshold);
        }
        Ok(())
    }
}
