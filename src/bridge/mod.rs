//! Command/state bridge
//!
//! This module handles:
//! - Parsing and validating inbound command topics
//! - Driving the supervisor with start/stop/pulse semantics
//! - The pulse countdown shared by the command path and the poll loop
//! - Sampling process state and reporting it to the shadow on change

mod interpreter;
mod poll;
mod pulse;
mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use service::Bridge;
