//! Broker connection management
//!
//! This module handles:
//! - The MQTT session with automatic reconnection and backoff
//! - Forwarding command publishes into the bridge's subscriber channel
//! - Logging connection events

mod manager;

pub use manager::{ConnectionManager, MqttConfig};
