//! Command-line interface definition for the OIDC test client
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the relying party and probing discovery.

use clap::{Parser, Subcommand};

/// OIDC test client - minimal OpenID Connect relying party
///
/// Runs the Authorization Code flow against an external identity provider
/// and displays the tokens and profile it receives.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "oidc-test-client")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Provider issuer URL (overrides config and OIDC_ISSUER)
    #[arg(long, global = true)]
    pub issuer: Option<String>,

    /// Command to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the relying party web server
    Serve {
        /// OAuth client identifier
        #[arg(long)]
        client_id: Option<String>,

        /// Redirect URI registered with the provider
        #[arg(long)]
        redirect_uri: Option<String>,

        /// Address to listen on (e.g. `:4000` or `127.0.0.1:4000`)
        #[arg(short, long)]
        listen: Option<String>,

        /// Whitespace-separated scopes to request
        #[arg(long)]
        scopes: Option<String>,
    },

    /// Fetch and print the provider metadata document
    Discover,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
