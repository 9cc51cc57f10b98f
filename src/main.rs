//! Downtime classifier - Main Entry Point
//!
//! Starts the HTTP server by default; `train` and `info` work on local CSV files.

use clap::Parser;
use downtime_classifier::cli::{cmd_info, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "downtime_classifier=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Train { data, features, target }) => {
            cmd_train(&data, &features, &target)?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(&data)?;
        }
        Some(Commands::Serve { port, host }) => {
            cmd_serve(host, port).await?;
        }
        None => {
            cmd_serve(None, None).await?;
        }
    }

    Ok(())
}
