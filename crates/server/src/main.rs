// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use tracing::error;

use pankha_server::config::ServerConfig;

#[derive(Parser)]
#[command(name = "pankhad", about = "Central server for the Pankha cooling control plane")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = pankha_server::run(cli.config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
