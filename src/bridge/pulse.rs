//! Pulse countdown
//!
//! The deadline is the only value written by both the command path and the
//! poll loop. Every change is a read-modify-write under one mutex, and the lock
//! is never held across a supervisor or publish call.
//!
//! An expiry is split in two: [`PulseTimer::tick`] marks the stop as in flight
//! and [`PulseTimer::finish_stop`] closes it, reporting whether a command asked
//! for the process back while the stop was running.

use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of one poll tick on the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseTick {
    /// No pulse pending
    Idle,
    /// Pulse still running with this many ticks left
    Counting { remaining: u32 },
    /// Pulse consumed; the process must be stopped
    Expired,
}

/// Everything guarded by the pulse lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseState {
    /// Ticks remaining; 0 means no pulse
    pub deadline: u32,
    /// Number of expiries so far
    pub expiries: u64,
    /// An expiry stop is in flight
    pub stopping: bool,
    /// A start arrived while `stopping`
    pub restart_requested: bool,
}

/// Shared "ticks remaining" counter
#[derive(Debug, Clone, Default)]
pub struct PulseTimer {
    state: Arc<Mutex<PulseState>>,
}

impl PulseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn remaining(&self) -> u32 {
        self.state.lock().await.deadline
    }

    pub async fn expiries(&self) -> u64 {
        self.state.lock().await.expiries
    }

    /// Run `f` on the whole state in one critical section
    pub async fn update_state<R>(&self, f: impl FnOnce(&mut PulseState) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state)
    }

    /// Atomically replace the deadline with the second value returned by `f`
    pub async fn update<R>(&self, f: impl FnOnce(u32) -> (R, u32)) -> R {
        self.update_state(|state| {
            let (result, next) = f(state.deadline);
            state.deadline = next;
            result
        })
        .await
    }

    /// Advance the countdown by one tick
    pub async fn tick(&self, stop_threshold: u32) -> PulseTick {
        self.update_state(|state| {
            let (tick, next) = advance(state.deadline, stop_threshold);
            state.deadline = next;
            if tick == PulseTick::Expired {
                state.expiries += 1;
                state.stopping = true;
                state.restart_requested = false;
            }
            tick
        })
        .await
    }

    /// Close the stop opened by an expiry; true when the process must be
    /// started again
    pub async fn finish_stop(&self) -> bool {
        self.update_state(|state| {
            state.stopping = false;
            let restart = state.deadline > 0 || state.restart_requested;
            state.restart_requested = false;
            restart
        })
        .await
    }
}

/// One tick of the countdown state machine
pub fn advance(deadline: u32, stop_threshold: u32) -> (PulseTick, u32) {
    match deadline {
        0 => (PulseTick::Idle, 0),
        d if d <= stop_threshold => (PulseTick::Expired, 0),
        d => (PulseTick::Counting { remaining: d - 1 }, d - 1),
    }
}
