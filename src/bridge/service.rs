//! Bridge wiring
//!
//! Owns the pulse countdown and the capability handles. The inbound path runs
//! topic parsing, grammar validation and interpretation for each message; the
//! outbound path is the [`PollLoop`]. Every supervisor and publish call is
//! bounded by `call_timeout` and its failure is logged, never propagated.

use super::interpreter::{interpret, Action};
use super::poll::PollLoop;
use super::pulse::PulseTimer;
use crate::config::BridgeConfig;
use crate::shadow::{PublishError, ShadowPublisher, Subscriber};
use crate::supervisor::{SupervisorClient, SupervisorError};
use bridge_shared::{topic, Command, CommandPath, InboundMessage, ProcessState, Qos, ReportKind};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

/// What the bridge did with one inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Not a recognized command
    Ignored(CommandPath),
    Handled { command: Command, action: Action },
}

pub struct Bridge {
    config: BridgeConfig,
    supervisor: Arc<dyn SupervisorClient>,
    publisher: Arc<dyn ShadowPublisher>,
    pulse: PulseTimer,
    /// Log context for both execution contexts
    span: Span,
}

impl Bridge {
    pub fn new(
        config: BridgeConfig,
        supervisor: Arc<dyn SupervisorClient>,
        publisher: Arc<dyn ShadowPublisher>,
    ) -> Self {
        let span = info_span!("bridge", process = %config.process_name);
        Self {
            config,
            supervisor,
            publisher,
            pulse: PulseTimer::new(),
            span,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn pulse(&self) -> &PulseTimer {
        &self.pulse
    }

    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    /// Subscription callback: interpret one inbound message
    pub async fn handle_message(&self, message: &InboundMessage) -> Dispatch {
        self.dispatch(message).instrument(self.span.clone()).await
    }

    async fn dispatch(&self, message: &InboundMessage) -> Dispatch {
        debug!("[CMD] {} ({} bytes)", message.topic, message.payload.len());

        let path = topic::parse_topic(
            &self.config.topic_prefix,
            &message.topic,
            self.config.topic_match,
        );
        let Some(command) = Command::from_path(&path) else {
            debug!("[CMD] Ignoring unrecognized command '{}'", path);
            return Dispatch::Ignored(path);
        };

        let seen = self.pulse.expiries().await;
        let status = self.observe_status().await;

        // Read and write the pulse state in one critical section so a
        // concurrent poll tick cannot be lost; the side effect runs after the
        // lock is gone
        let (action, effective) = self
            .pulse
            .update_state(|pulse| {
                let effective = if pulse.stopping {
                    // An expiry stop is in flight; a start waits for it
                    if matches!(command, Command::Start | Command::Pulse(_)) {
                        pulse.restart_requested = true;
                    }
                    ProcessState::Other("STOPPING".into())
                } else if pulse.expiries != seen {
                    // An expiry stop finished after `status` was read
                    ProcessState::Stopped
                } else {
                    status.clone()
                };
                let result = interpret(command, pulse.deadline, &effective);
                pulse.deadline = result.deadline;
                (result.action, effective)
            })
            .await;

        info!("[CMD] {} while {} -> {:?}", command, effective, action);

        match action {
            Action::Start => {
                self.start_process().await;
            }
            Action::Stop => {
                self.stop_process().await;
            }
            Action::Report => {
                self.report(&status).await;
            }
            Action::Nothing => {}
        }

        Dispatch::Handled { command, action }
    }

    /// Build the poll loop, seeding its last observed state from a live query
    pub async fn poll_loop(self: &Arc<Self>) -> PollLoop {
        let initial = self.observe_status().instrument(self.span.clone()).await;
        info!(parent: &self.span, "[POLL] Initial state: {}", initial);
        PollLoop::new(self.clone(), initial)
    }

    /// Run both contexts until the process exits
    pub async fn run<S: Subscriber>(self: Arc<Self>, mut subscriber: S) {
        let poll = self.poll_loop().await;
        let poll_task = tokio::spawn(poll.run());

        if self.config.mode.handles_commands() {
            while let Some(message) = subscriber.next_message().await {
                self.handle_message(&message).await;
            }
            warn!(parent: &self.span, "[BRIDGE] Subscription closed, no further commands");
        }

        if let Err(e) = poll_task.await {
            error!(parent: &self.span, "[BRIDGE] Poll loop ended: {}", e);
        }
    }

    /// Current process state; any failure reads as `Unknown`
    pub(crate) async fn observe_status(&self) -> ProcessState {
        self.supervised("status", self.supervisor.status())
            .await
            .unwrap_or(ProcessState::Unknown)
    }

    pub(crate) async fn start_process(&self) -> bool {
        self.supervised("start", self.supervisor.start()).await.is_some()
    }

    pub(crate) async fn stop_process(&self) -> bool {
        self.supervised("stop", self.supervisor.stop()).await.is_some()
    }

    /// Publish `{process_name: state}` as a reported update
    pub(crate) async fn report(&self, state: &ProcessState) -> bool {
        let publish = self.publisher.publish(
            &self.config.process_name,
            Value::String(state.to_string()),
            ReportKind::Reported,
            Qos::AtLeastOnce,
        );

        let result = match timeout(self.config.call_timeout, publish).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout),
        };

        match result {
            Ok(()) => {
                info!("[SHADOW] Reported {} = {}", self.config.process_name, state);
                true
            }
            Err(e) => {
                warn!("[SHADOW] Failed to report {}: {}", state, e);
                false
            }
        }
    }

    async fn supervised<T>(
        &self,
        call: &str,
        request: impl Future<Output = Result<T, SupervisorError>>,
    ) -> Option<T> {
        let result = match timeout(self.config.call_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(SupervisorError::Timeout(self.config.call_timeout)),
        };

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!("[SUPERVISOR] {} failed: {}", call, e);
                None
            }
        }
    }
}
