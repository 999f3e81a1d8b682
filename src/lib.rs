//! OIDC test client - minimal OpenID Connect relying party library
//!
//! This library drives the OAuth 2.0 Authorization Code flow against an
//! external identity provider, keeps short-lived per-browser sessions in
//! memory, and renders the received tokens and profile claims for
//! inspection.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `oidc`: Provider discovery, random tokens, code exchange and userinfo
//! - `session`: Session store and pending-authorization registry
//! - `server`: Axum router, flow handlers, cookies and page rendering
//! - `commands`: `serve` and `discover` command handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use oidc_test_client::cli::Cli;
//! use oidc_test_client::oidc::discover;
//! use oidc_test_client::server::{self, AppState};
//! use oidc_test_client::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None, &Cli::default())?;
//!     config.validate()?;
//!
//!     let http = AppState::http_client(&config)?;
//!     let provider = discover(&http, &config.issuer).await?;
//!     let addr = config.socket_addr()?;
//!
//!     server::serve(AppState::new(config, provider, http)?, addr).await
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod oidc;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{FlowResult, OidcError, Result};
pub use oidc::{ProviderClient, ProviderMetadata};
pub use server::{router, AppState};
pub use session::{PendingAuthorizations, Session, SessionStore};
