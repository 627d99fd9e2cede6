//! Shadow publishing and command subscription
//!
//! The bridge reports state through [`ShadowPublisher`] and receives commands
//! through [`Subscriber`]. [`MqttPublisher`] publishes on the broker session;
//! commands arrive on the channel filled by the connection manager.

mod publisher;

pub use publisher::{MqttPublisher, PublishError, ShadowPublisher, Subscriber};
