//! Poll Loop
//!
//! The single fixed-cadence driver. Each tick advances the pulse countdown
//! (stopping the process when a pulse expires, and starting it again when a
//! command asked for it during that stop); every `sample_every` ticks it
//! samples the process state and reports it when it changed.

use super::pulse::PulseTick;
use super::service::Bridge;
use bridge_shared::ProcessState;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, Instrument};

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub pulse: PulseTick,
    /// Started again after an expiry stop
    pub restarted: bool,
    /// State read at a sampling tick
    pub sampled: Option<ProcessState>,
    /// Whether a changed state was published
    pub published: bool,
}

pub struct PollLoop {
    bridge: Arc<Bridge>,
    /// Last state seen by this loop; never read by the command path
    last_observed: ProcessState,
    ticks_since_sample: u32,
}

impl PollLoop {
    pub(crate) fn new(bridge: Arc<Bridge>, initial: ProcessState) -> Self {
        Self {
            bridge,
            last_observed: initial,
            ticks_since_sample: 0,
        }
    }

    pub fn last_observed(&self) -> &ProcessState {
        &self.last_observed
    }

    /// Run one tick
    pub async fn tick(&mut self) -> TickReport {
        let config = self.bridge.config();

        let pulse = self.bridge.pulse().tick(config.stop_threshold).await;
        let mut restarted = false;
        match pulse {
            PulseTick::Expired => {
                info!("[POLL] Pulse expired, stopping {}", config.process_name);
                self.bridge.stop_process().await;
                if self.bridge.pulse().finish_stop().await {
                    info!("[POLL] Start requested during stop, starting {}", config.process_name);
                    restarted = self.bridge.start_process().await;
                }
            }
            PulseTick::Counting { remaining } => {
                debug!("[POLL] Pulse: {} ticks remaining", remaining);
            }
            PulseTick::Idle => {}
        }

        let mut report = TickReport {
            pulse,
            restarted,
            sampled: None,
            published: false,
        };

        self.ticks_since_sample += 1;
        if self.ticks_since_sample < config.sample_every {
            return report;
        }
        self.ticks_since_sample = 0;

        let state = self.bridge.observe_status().await;
        if state != self.last_observed {
            info!("[POLL] {} -> {}", self.last_observed, state);
            self.last_observed = state.clone();
            if config.mode.publishes_state() {
                report.published = self.bridge.report(&state).await;
            }
        }
        report.sampled = Some(state);

        report
    }

    /// Tick forever at the configured period
    pub async fn run(mut self) {
        let span = self.bridge.span().clone();

        async move {
            let mut ticker = interval(self.bridge.config().tick_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick completes immediately; tick 1 is one period out
            ticker.tick().await;
            info!("[POLL] Started, period {:?}", self.bridge.config().tick_period);

            loop {
                ticker.tick().await;
                self.tick().await;
            }
        }
        .instrument(span)
        .await
    }
}
