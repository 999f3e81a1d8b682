//! OpenID Connect Discovery for the relying party
//!
//! The provider metadata document is fetched once at startup from
//! `{issuer}/.well-known/openid-configuration`.  A failure here is fatal:
//! without endpoint URLs the relying party cannot drive any login.
//!
//! # References
//!
//! - OpenID Connect Discovery 1.0 <https://openid.net/specs/openid-connect-discovery-1_0.html>

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{OidcError, Result};

/// Well-known path appended to the issuer URL.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

// ---------------------------------------------------------------------------
// Provider Metadata
// ---------------------------------------------------------------------------

/// Immutable snapshot of the provider's endpoints.
///
/// Endpoint URLs are kept as the exact strings the provider published and
/// are used verbatim by the token and profile calls.
///
/// # Examples
///
/// ```
/// use oidc_test_client::oidc::discovery::ProviderMetadata;
///
/// let json = r#"{
///     "issuer": "https://idp.example.com",
///     "authorization_endpoint": "https://idp.example.com/authorize",
///     "token_endpoint": "https://idp.example.com/token",
///     "userinfo_endpoint": "https://idp.example.com/userinfo"
/// }"#;
///
/// let meta: ProviderMetadata = serde_json::from_str(json).unwrap();
/// assert_eq!(meta.token_endpoint, "https://idp.example.com/token");
/// assert!(meta.has_userinfo_endpoint());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// The issuer identifier published by the provider.
    pub issuer: String,

    /// URL the browser is redirected to when a login starts.
    pub authorization_endpoint: String,

    /// URL the relying party POSTs the authorization code to.
    pub token_endpoint: String,

    /// Profile endpoint; empty when the provider does not advertise one.
    #[serde(default)]
    pub userinfo_endpoint: String,

    /// Additional metadata fields, kept for display.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProviderMetadata {
    /// Returns `true` when a profile endpoint was advertised.
    pub fn has_userinfo_endpoint(&self) -> bool {
        !self.userinfo_endpoint.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Builds the discovery URL for an issuer, trimming one trailing slash.
pub fn discovery_url(issuer: &str) -> String {
    format!("{}{}", issuer.strip_suffix('/').unwrap_or(issuer), WELL_KNOWN_PATH)
}

/// Fetches the provider metadata document for `issuer`.
///
/// # Arguments
///
/// * `http` - Shared [`reqwest::Client`]; its timeout bounds the request.
/// * `issuer` - Issuer URL, with or without a trailing slash.
///
/// # Errors
///
/// Returns [`OidcError::Discovery`] on transport failure, on any status
/// other than `200 OK`, or when the body is not a valid metadata document.
///
/// # Examples
///
/// ```no_run
/// use oidc_test_client::oidc::discovery::discover;
///
/// # async fn example() -> oidc_test_client::error::Result<()> {
/// let http = reqwest::Client::new();
/// let meta = discover(&http, "https://idp.example.com/").await?;
/// println!("token endpoint: {}", meta.token_endpoint);
/// # Ok(())
/// # }
/// ```
pub async fn discover(http: &reqwest::Client, issuer: &str) -> Result<ProviderMetadata> {
    let url = discovery_url(issuer);
    tracing::debug!(url = %url, "Fetching provider metadata");

    let resp = http
        .get(&url)
        .send()
        .await
        .map_err(|e| OidcError::Discovery(format!("request to {url} failed: {e}")))?;

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        return Err(OidcError::Discovery(format!("{url} returned {status}")).into());
    }

    let metadata: ProviderMetadata = resp
        .json()
        .await
        .map_err(|e| OidcError::Discovery(format!("malformed metadata from {url}: {e}")))?;

    tracing::info!(
        issuer = %metadata.issuer,
        authorization_endpoint = %metadata.authorization_endpoint,
        token_endpoint = %metadata.token_endpoint,
        userinfo_endpoint = %metadata.userinfo_endpoint,
        "Discovered provider"
    );

    Ok(metadata)
}
