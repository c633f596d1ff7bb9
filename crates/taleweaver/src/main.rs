//! Taleweaver CLI binary.
//!
//! - Serve the story flows over HTTP
//! - List registered flows
//! - Run a single flow from the command line

use clap::Parser;
use taleweaver::{ObservabilityConfig, TaleweaverConfig, build_registry, init_observability_with_config};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, list_flows, run_flow, serve};

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = TaleweaverConfig::load(cli.config.as_deref())?;

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging().level().clone()
    };
    init_observability_with_config(
        ObservabilityConfig::new("taleweaver")
            .with_log_level(log_level)
            .with_json_logs(cli.json_logs || *config.logging().json()),
    )?;

    let registry = build_registry(&config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server().host().clone());
            let port = port.unwrap_or(*config.server().port());
            serve(registry, &host, port).await?;
        }

        Commands::Flows => {
            list_flows(&registry);
        }

        Commands::Run {
            flow,
            input,
            session,
        } => {
            run_flow(&registry, &flow, &input, session.as_deref()).await?;
        }
    }

    Ok(())
}
