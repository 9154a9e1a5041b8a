//! dream-broker - reference service broker
//!
//! Subcommands:
//! - `dream-broker serve` - Run the broker HTTP API
//! - `dream-broker config` - Print the effective configuration

use anyhow::{Context, Result};
use brokerconf::BrokerConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dream_broker::{serve, telemetry};

#[derive(Parser)]
#[command(name = "dream-broker")]
#[command(about = "Reference service broker for marketplace provisioning")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./dream-broker.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the broker HTTP server
    Serve {
        /// HTTP port to bind
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// OTLP gRPC endpoint for OpenTelemetry (e.g., "localhost:4317")
        #[arg(long)]
        otlp_endpoint: Option<String>,
    },

    /// Print the effective configuration and where it came from
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = BrokerConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            otlp_endpoint,
        } => {
            if let Some(port) = port {
                config.infra.bind.http_port = port;
            }
            if let Some(host) = host {
                config.infra.bind.host = host;
            }
            if let Some(endpoint) = otlp_endpoint {
                config.infra.telemetry.otlp_endpoint = endpoint;
            }

            telemetry::init(&config.infra.telemetry)?;
            for file in &sources.files {
                tracing::info!("Loaded config from {}", file.display());
            }

            serve::run(config).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml());
            println!();
            for file in &sources.files {
                println!("# loaded: {}", file.display());
            }
            for var in &sources.env_overrides {
                println!("# env override: {}", var);
            }
        }
    }

    Ok(())
}
