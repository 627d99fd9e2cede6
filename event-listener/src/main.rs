//! Supervisord event listener
//!
//! stdout carries the listener protocol, so all logging goes to stderr.

mod protocol;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let handled = protocol::serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    info!("stdin closed after {} event(s)", handled);
    Ok(())
}
