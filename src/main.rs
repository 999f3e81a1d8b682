//! OIDC test client - minimal OpenID Connect relying party
//!
#![doc = "Main entry point for the OIDC test client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oidc_test_client::cli::{Cli, Commands};
use oidc_test_client::commands;
use oidc_test_client::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config = Config::load(cli.config.as_deref(), &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        None | Some(Commands::Serve { .. }) => {
            tracing::info!("Starting relying party server");
            commands::serve::run_serve(config).await
        }
        Some(Commands::Discover) => {
            tracing::debug!("Fetching provider metadata");
            commands::discover::run_discover(config).await
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "oidc_test_client=debug"
    } else {
        "oidc_test_client=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so `discover` output stays machine-readable
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
