//! Connection manager over an `mqtt5` client

use anyhow::{anyhow, Result};
use bridge_shared::{defaults, topic, InboundMessage};
use mqtt5::{ConnectOptions, ConnectionEvent, MqttClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Configuration for the broker session
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Client id presented to the broker; also keys the persistent session
    pub client_id: String,
    /// `mqtt://host:port` or `mqtts://host:port`
    pub broker_url: String,
    pub keep_alive: Duration,
    /// Reconnection delay (initial)
    pub reconnect_delay: Duration,
    /// Maximum reconnection delay
    pub max_reconnect_delay: Duration,
    /// Commands buffered between the client and the bridge
    pub command_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            client_id: "edge-bridge".into(),
            broker_url: "mqtt://127.0.0.1:1883".into(),
            keep_alive: Duration::from_millis(defaults::KEEPALIVE_INTERVAL_MS),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(32),
            command_capacity: 64,
        }
    }
}

/// Owns the broker session shared by the publisher and the subscription
pub struct ConnectionManager {
    client: Arc<MqttClient>,
    command_capacity: usize,
}

impl ConnectionManager {
    /// Open a persistent session; reconnection is left to the client
    pub async fn connect(config: &MqttConfig) -> Result<Self> {
        let options = ConnectOptions::new(&config.client_id)
            .with_clean_start(false)
            .with_keep_alive(config.keep_alive)
            .with_automatic_reconnect(true)
            .with_reconnect_delay(config.reconnect_delay, config.max_reconnect_delay);

        let client = Arc::new(MqttClient::with_options(options));

        client
            .on_connection_event(move |event| match event {
                ConnectionEvent::Connected { session_present } => {
                    info!("[MQTT] Connected (session present: {})", session_present);
                }
                ConnectionEvent::Disconnected { reason } => {
                    warn!("[MQTT] Disconnected: {:?}", reason);
                }
                ConnectionEvent::Reconnecting { attempt } => {
                    info!("[MQTT] Reconnecting, attempt {}", attempt);
                }
                ConnectionEvent::ReconnectFailed { error } => {
                    error!("[MQTT] Reconnect failed: {}", error);
                }
            })
            .await
            .map_err(|e| anyhow!("Failed to register connection events: {}", e))?;

        client
            .connect(&config.broker_url)
            .await
            .map_err(|e| anyhow!("Failed to connect to {}: {}", config.broker_url, e))?;

        Ok(Self {
            client,
            command_capacity: config.command_capacity,
        })
    }

    /// Client handle for publishing
    pub fn client(&self) -> Arc<MqttClient> {
        self.client.clone()
    }

    /// Subscribe to `filter` and deliver matching publishes on the returned
    /// channel
    pub async fn subscribe_commands(&self, filter: &str) -> Result<mpsc::Receiver<InboundMessage>> {
        let (tx, rx) = mpsc::channel(self.command_capacity);
        let owned = filter.to_string();

        debug!("[MQTT] Subscribing to {}", filter);
        self.client
            .subscribe(filter, move |msg| {
                forward_command(&owned, &tx, &msg.topic, &msg.payload);
            })
            .await
            .map_err(|e| anyhow!("Failed to subscribe to {}: {}", filter, e))?;

        Ok(rx)
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| anyhow!("Failed to disconnect: {}", e))
    }
}

/// Hand one publish to the bridge without blocking the client's callback
///
/// Returns whether the message was queued. A full channel drops the message.
fn forward_command(
    filter: &str,
    tx: &mpsc::Sender<InboundMessage>,
    topic: &str,
    payload: &[u8],
) -> bool {
    if !topic::matches_filter(filter, topic) {
        debug!("[MQTT] Publish on {} outside {}", topic, filter);
        return false;
    }

    match tx.try_send(InboundMessage::new(topic.to_string(), payload.to_vec())) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(message)) => {
            warn!("[MQTT] Command queue full, dropping {}", message.topic);
            false
        }
        Err(mpsc::error::TrySendError::Closed(message)) => {
            debug!("[MQTT] Bridge gone, dropping {}", message.topic);
            false
        }
    }
}
