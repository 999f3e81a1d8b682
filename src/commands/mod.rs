/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `serve`    - Discover the provider and run the relying party web server
- `discover` - Print the provider metadata document and exit

Both start with the same discovery step; a provider that cannot be
discovered is a fatal startup error.
*/

use crate::config::Config;
use crate::error::Result;
use crate::oidc::discovery::{discover, ProviderMetadata};
use crate::server::AppState;

async fn discover_provider(config: &Config, http: &reqwest::Client) -> Result<ProviderMetadata> {
    tracing::info!("Discovering provider at {}", config.issuer);
    discover(http, &config.issuer).await.map_err(|e| {
        tracing::error!("Provider discovery failed: {:#}", e);
        e
    })
}

// Serve command handler
pub mod serve {
    //! Relying party web server.
    //!
    //! Discovers the provider, assembles the shared state and serves the
    //! flow endpoints until a shutdown signal arrives.

    use super::*;
    use crate::server;

    /// Run the relying party
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration (consumed)
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails or the listener cannot be bound.
    pub async fn run_serve(config: Config) -> Result<()> {
        let addr = config.socket_addr()?;
        let http = AppState::http_client(&config)?;
        let provider = discover_provider(&config, &http).await?;

        tracing::info!(
            client_id = %config.client_id,
            redirect_uri = %config.redirect_uri,
            scopes = %config.scope_param(),
            "Starting relying party"
        );

        let state = AppState::new(config, provider, http)?;
        server::serve(state, addr).await
    }
}

// Discover command handler
pub mod discover {
    use super::*;

    /// Fetch the provider metadata and print it as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails.
    pub async fn run_discover(config: Config) -> Result<()> {
        let http = AppState::http_client(&config)?;
        let provider = discover_provider(&config, &http).await?;

        println!("{}", serde_json::to_string_pretty(&provider)?);
        Ok(())
    }
}
