//! Tracing initialization for the `botapi` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the application.
//! Verbosity is controlled with `RUST_LOG` (default `info`), e.g. `RUST_LOG=botapi=trace`.

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a fmt subscriber filtered by `RUST_LOG`.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
