mod bridge;
mod cli;
mod config;
mod connection;
mod shadow;
mod supervisor;

use anyhow::Context;
use bridge::Bridge;
use bridge_shared::InboundMessage;
use clap::Parser;
use cli::Args;
use connection::ConnectionManager;
use shadow::MqttPublisher;
use std::sync::Arc;
use supervisor::SupervisordClient;
use tokio::sync::mpsc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let bridge_config = args.bridge_config();
    bridge_config.validate().context("invalid bridge configuration")?;

    let mqtt_config = args.mqtt_config();
    let thing = args.thing_name();

    info!("Edge bridge starting: {}", mqtt_config.client_id);
    info!("  Process: {}", bridge_config.process_name);
    info!("  Command prefix: {}", bridge_config.topic_prefix);
    info!("  Shadow thing: {}", thing);
    info!("  Mode: {:?}", bridge_config.mode);
    info!("  Broker: {}", mqtt_config.broker_url);

    let conn = ConnectionManager::connect(&mqtt_config).await?;

    // Publish mode never subscribes; its subscriber is a channel that is
    // already closed
    let commands = match args.command_filter() {
        Some(filter) => conn.subscribe_commands(&filter).await?,
        None => {
            let (_, rx) = mpsc::channel::<InboundMessage>(1);
            rx
        }
    };

    let supervisor = Arc::new(
        SupervisordClient::new(args.supervisor_config()).context("building supervisor client")?,
    );
    let publisher = Arc::new(MqttPublisher::new(thing, conn.client()));
    let bridge = Arc::new(Bridge::new(bridge_config, supervisor, publisher));

    let mut bridge_handle = tokio::spawn(bridge.run(commands));

    tokio::select! {
        result = &mut bridge_handle => {
            if let Err(e) = result {
                error!("Bridge task ended: {}", e);
            }
        }
        result = tokio::signal::ctrl_c() => {
            result.context("waiting for ctrl-c")?;
            info!("Shutting down");
            bridge_handle.abort();
        }
    }

    if let Err(e) = conn.disconnect().await {
        warn!("{}", e);
    }
    Ok(())
}
