//! Shadow publisher and subscriber capabilities

use async_trait::async_trait;
use bridge_shared::{shadow, InboundMessage, Qos, ReportKind, ShadowDocument};
use mqtt5::MqttClient;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failures of a single publish
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("mqtt publish failed: {0}")]
    Mqtt(String),

    #[error("publish timed out")]
    Timeout,

    #[error("failed to encode shadow document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Publishes partial updates to the remote shadow
#[async_trait]
pub trait ShadowPublisher: Send + Sync {
    async fn publish(
        &self,
        key: &str,
        value: Value,
        kind: ReportKind,
        qos: Qos,
    ) -> Result<(), PublishError>;
}

/// Source of inbound command messages
#[async_trait]
pub trait Subscriber: Send {
    /// Next message, or `None` once the subscription is gone
    async fn next_message(&mut self) -> Option<InboundMessage>;
}

#[async_trait]
impl Subscriber for mpsc::Receiver<InboundMessage> {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.recv().await
    }
}

/// Topic and payload of a single-key shadow update for `thing`
pub fn shadow_update(
    thing: &str,
    key: &str,
    value: Value,
    kind: ReportKind,
) -> Result<(String, Vec<u8>), PublishError> {
    let payload = ShadowDocument::single(kind, key, value).to_bytes()?;
    Ok((shadow::update_topic(thing), payload))
}

/// Publishes shadow updates for one thing through the broker session
pub struct MqttPublisher {
    thing: String,
    client: Arc<MqttClient>,
}

impl MqttPublisher {
    pub fn new(thing: impl Into<String>, client: Arc<MqttClient>) -> Self {
        Self {
            thing: thing.into(),
            client,
        }
    }
}

#[async_trait]
impl ShadowPublisher for MqttPublisher {
    async fn publish(
        &self,
        key: &str,
        value: Value,
        kind: ReportKind,
        qos: Qos,
    ) -> Result<(), PublishError> {
        let (topic, payload) = shadow_update(&self.thing, key, value, kind)?;

        let result = match qos {
            Qos::AtMostOnce => self.client.publish_qos0(&topic, payload.as_slice()).await,
            Qos::AtLeastOnce => self.client.publish_qos1(&topic, payload.as_slice()).await,
        };
        result
            .map(|_| ())
            .map_err(|e| PublishError::Mqtt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shadow_update_topic_and_document() {
        let (topic, payload) =
            shadow_update("pi-01", "vstream", json!("Running"), ReportKind::Reported)
                .expect("update");

        assert_eq!(topic, "$aws/things/pi-01/shadow/update");
        let doc = ShadowDocument::from_slice(&payload).expect("document");
        assert_eq!(doc.state.reported.expect("reported")["vstream"], json!("Running"));
        assert!(doc.state.desired.is_none());
    }

    #[test]
    fn test_desired_update() {
        let (_, payload) =
            shadow_update("pi-01", "vstream", json!("Stopped"), ReportKind::Desired)
                .expect("update");

        let doc = ShadowDocument::from_slice(&payload).expect("document");
        assert_eq!(doc.state.desired.expect("desired")["vstream"], json!("Stopped"));
    }

    #[tokio::test]
    async fn test_channel_subscriber() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(InboundMessage::new("svc/start", "")).await.expect("send");
        drop(tx);

        let msg = rx.next_message().await.expect("message");
        assert_eq!(msg.topic, "svc/start");
        assert!(rx.next_message().await.is_none());
    }
}
