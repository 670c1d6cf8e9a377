//! edge-provisioner CLI entry point.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = edge_provisioner::cli::parse_cli();

    // RUST_LOG takes precedence over --log-level
    let fallback = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&fallback)))
        .init();

    edge_provisioner::cli::run_with_cli(cli).await
}
