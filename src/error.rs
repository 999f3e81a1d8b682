//! Error types for the OIDC test client
//!
//! This module defines all error types used throughout the relying party,
//! using `thiserror` for ergonomic error handling.
//!
//! Startup paths (configuration, discovery, binding the listener) use the
//! [`Result`] alias backed by `anyhow`.  The per-request authorization flow
//! uses [`FlowResult`] so that each failure keeps its variant and can be
//! mapped onto an HTTP status by the server layer.

use thiserror::Error;

/// Main error type for relying party operations
///
/// The first group of variants is the flow taxonomy surfaced to browsers
/// (or logged, for [`OidcError::ProfileFetch`]); the remaining variants wrap
/// library errors raised while loading configuration or talking to the
/// provider.
#[derive(Error, Debug)]
pub enum OidcError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider metadata could not be fetched or parsed (startup only)
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Missing or invalid `state` / `code`, or an unknown state value
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Token endpoint returned a non-200 status or an undecodable body
    #[error("Token exchange failed: {0}")]
    UpstreamExchange(String),

    /// Userinfo endpoint call failed; never fatal to a login
    #[error("Profile fetch failed: {0}")]
    ProfileFetch(String),

    /// Template registration or rendering errors
    #[error("Render error: {0}")]
    Render(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for startup operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Result type alias for per-request flow operations
pub type FlowResult<T> = std::result::Result<T, OidcError>;
