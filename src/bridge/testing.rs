//! In-memory capability fakes for bridge tests

use crate::shadow::{PublishError, ShadowPublisher};
use crate::supervisor::{SupervisorClient, SupervisorError};
use async_trait::async_trait;
use bridge_shared::{ProcessState, Qos, ReportKind};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Parks one supervisor call until released
#[derive(Debug, Clone, Default)]
pub struct Hold {
    /// Notified once the held call is in progress
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Hold {
    async fn park(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug, Default)]
struct SupervisorState {
    state: Option<ProcessState>,
    unreachable: bool,
    hang: bool,
    starts: u32,
    stops: u32,
    status_calls: u32,
    status_hold: Option<Hold>,
    stop_hold: Option<Hold>,
}

/// Supervisor that flips its state on start/stop and counts calls
#[derive(Debug, Default)]
pub struct FakeSupervisor {
    inner: Mutex<SupervisorState>,
}

impl FakeSupervisor {
    pub fn with_state(state: ProcessState) -> Self {
        let fake = Self::default();
        fake.set_state(state);
        fake
    }

    pub fn set_state(&self, state: ProcessState) {
        self.inner.lock().unwrap().state = Some(state);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unwrap().unreachable = unreachable;
    }

    /// Make every call block forever
    pub fn set_hang(&self, hang: bool) {
        self.inner.lock().unwrap().hang = hang;
    }

    pub fn state(&self) -> ProcessState {
        self.inner
            .lock()
            .unwrap()
            .state
            .clone()
            .unwrap_or(ProcessState::Unknown)
    }

    /// Park the next status call; it answers with the state seen on entry
    pub fn hold_next_status(&self) -> Hold {
        let hold = Hold::default();
        self.inner.lock().unwrap().status_hold = Some(hold.clone());
        hold
    }

    /// Park the next stop call before it changes the state
    pub fn hold_next_stop(&self) -> Hold {
        let hold = Hold::default();
        self.inner.lock().unwrap().stop_hold = Some(hold.clone());
        hold
    }

    pub fn starts(&self) -> u32 {
        self.inner.lock().unwrap().starts
    }

    pub fn stops(&self) -> u32 {
        self.inner.lock().unwrap().stops
    }

    pub fn status_calls(&self) -> u32 {
        self.inner.lock().unwrap().status_calls
    }

    async fn gate(&self) -> Result<(), SupervisorError> {
        let (hang, unreachable) = {
            let inner = self.inner.lock().unwrap();
            (inner.hang, inner.unreachable)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        if unreachable {
            return Err(SupervisorError::Unreachable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SupervisorClient for FakeSupervisor {
    async fn status(&self) -> Result<ProcessState, SupervisorError> {
        let hold = {
            let mut inner = self.inner.lock().unwrap();
            inner.status_calls += 1;
            inner.status_hold.take()
        };
        self.gate().await?;
        let state = self.state();
        if let Some(hold) = hold {
            hold.park().await;
        }
        Ok(state)
    }

    async fn start(&self) -> Result<(), SupervisorError> {
        self.gate().await?;
        let mut inner = self.inner.lock().unwrap();
        inner.starts += 1;
        inner.state = Some(ProcessState::Running);
        Ok(())
    }

    async fn stop(&self) -> Result<(), SupervisorError> {
        self.gate().await?;
        let hold = self.inner.lock().unwrap().stop_hold.take();
        if let Some(hold) = hold {
            hold.park().await;
        }
        let mut inner = self.inner.lock().unwrap();
        inner.stops += 1;
        inner.state = Some(ProcessState::Stopped);
        Ok(())
    }
}

/// A publish seen by [`RecordingPublisher`]
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub key: String,
    pub value: Value,
    pub kind: ReportKind,
    pub qos: Qos,
}

/// Publisher that records every update
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<Published>>,
    failing: Mutex<bool>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl ShadowPublisher for RecordingPublisher {
    async fn publish(
        &self,
        key: &str,
        value: Value,
        kind: ReportKind,
        qos: Qos,
    ) -> Result<(), PublishError> {
        if *self.failing.lock().unwrap() {
            return Err(PublishError::Mqtt("not connected".into()));
        }
        self.published.lock().unwrap().push(Published {
            key: key.to_string(),
            value,
            kind,
            qos,
        });
        Ok(())
    }
}
