use crate::config::{BridgeConfig, BridgeMode};
use crate::connection::MqttConfig;
use crate::supervisor::SupervisorConfig;
use bridge_shared::{defaults, topic, TopicMatch};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "edge-bridge")]
#[command(about = "Bridges remote shadow commands to a supervisord-managed process")]
pub struct Args {
    /// Supervised program name (also the shadow key for its state)
    #[arg(long, short = 'P', default_value = "vstream")]
    pub process: String,

    /// Topic prefix that commands are published under
    #[arg(long, short = 't', default_value = "sdk/test/Python")]
    pub topic: String,

    /// Thing name of this device's shadow (defaults to the short hostname)
    #[arg(long, short = 'n')]
    pub thing_name: Option<String>,

    /// MQTT broker URL (`mqtts://` for TLS)
    #[arg(long, short = 'b', default_value = "mqtt://127.0.0.1:1883")]
    pub broker: String,

    /// Client id presented to the broker
    #[arg(long = "client-id", default_value = "edge-bridge")]
    pub client_id: String,

    /// Supervisord XML-RPC endpoint
    #[arg(long, default_value = defaults::SUPERVISOR_URL)]
    pub supervisor_url: String,

    /// Poll tick period in milliseconds
    #[arg(long, default_value_t = defaults::TICK_PERIOD_MS)]
    pub tick_ms: u64,

    /// Ticks between status samples
    #[arg(long, default_value_t = defaults::SAMPLE_EVERY_TICKS)]
    pub sample_ticks: u32,

    /// Pulse deadline value at which the process is stopped
    #[arg(long, default_value_t = defaults::STOP_THRESHOLD)]
    pub stop_threshold: u32,

    /// Timeout for each supervisor or publish call in milliseconds
    #[arg(long, default_value_t = defaults::CALL_TIMEOUT_MS)]
    pub call_timeout_ms: u64,

    /// Strip the topic prefix wherever it first occurs, not only at the start
    #[arg(long)]
    pub legacy_topic_match: bool,

    /// Operation mode
    #[arg(long, short = 'm', value_enum, default_value = "both")]
    pub mode: BridgeMode,
}

impl Args {
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            process_name: self.process.clone(),
            topic_prefix: self.topic.clone(),
            topic_match: if self.legacy_topic_match {
                TopicMatch::Substring
            } else {
                TopicMatch::Prefix
            },
            tick_period: Duration::from_millis(self.tick_ms),
            sample_every: self.sample_ticks,
            stop_threshold: self.stop_threshold,
            call_timeout: Duration::from_millis(self.call_timeout_ms),
            mode: self.mode,
        }
    }

    pub fn mqtt_config(&self) -> MqttConfig {
        MqttConfig {
            client_id: self.client_id.clone(),
            broker_url: self.broker.clone(),
            ..Default::default()
        }
    }

    /// Command filter to subscribe to; `None` when the mode handles no commands
    pub fn command_filter(&self) -> Option<String> {
        self.mode
            .handles_commands()
            .then(|| topic::command_filter(&self.topic))
    }

    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            url: self.supervisor_url.clone(),
            process: self.process.clone(),
            request_timeout: Duration::from_millis(self.call_timeout_ms),
        }
    }

    pub fn thing_name(&self) -> String {
        self.thing_name.clone().unwrap_or_else(short_hostname)
    }
}

/// First label of the host name, as the shadow thing name
fn short_hostname() -> String {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .and_then(|name| name.trim().split('.').next().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "edge".to_string())
}
