//! Server-to-server calls against the provider
//!
//! [`ProviderClient`] performs the two outbound calls of the callback step:
//! the authorization code exchange at the token endpoint and the optional
//! bearer-authenticated profile fetch at the userinfo endpoint.  Both share a
//! single [`reqwest::Client`] whose timeout bounds how long a slow provider
//! can hold a request.
//!
//! # References
//!
//! - RFC 6749 section 4.1.3 <https://www.rfc-editor.org/rfc/rfc6749#section-4.1.3>
//! - OpenID Connect Core 1.0 section 5.3 (UserInfo)

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FlowResult, OidcError, Result};
use crate::oidc::discovery::ProviderMetadata;

// ---------------------------------------------------------------------------
// Token endpoint response
// ---------------------------------------------------------------------------

/// JSON response from the token endpoint.
///
/// Every field is optional on the wire; missing strings decode as empty,
/// matching what the session page displays.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Declared lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: String,
}

impl TokenResponse {
    /// Absolute expiry derived from `issued_at` and `expires_in`.
    ///
    /// Returns `None` when the provider omitted the lifetime, declared a
    /// non-positive one, or declared one past the representable date range;
    /// `None` means "unknown", never "already expired".
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = self.expires_in.filter(|secs| *secs > 0)?;
        let expires_at = chrono::Duration::try_seconds(secs)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime));
        if expires_at.is_none() {
            tracing::warn!(expires_in = secs, "Ignoring out-of-range token lifetime");
        }
        expires_at
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Profile claims returned by the userinfo endpoint.
///
/// The well-known claims are lifted into fields; `raw` keeps the complete
/// claim map, including claims this client knows nothing about.
///
/// # Examples
///
/// ```
/// use oidc_test_client::oidc::client::UserProfile;
///
/// let claims = serde_json::json!({
///     "sub": "user-1",
///     "email": "alice@example.com",
///     "groups": ["admins"]
/// });
///
/// let profile = UserProfile::from_claims(claims.as_object().unwrap().clone());
/// assert_eq!(profile.subject, "user-1");
/// assert!(profile.name.is_empty());
/// assert!(profile.raw.contains_key("groups"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserProfile {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub locale: String,
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Builds a profile from a decoded claim map.
    ///
    /// Well-known claims that are absent or not strings are left empty.
    pub fn from_claims(raw: serde_json::Map<String, serde_json::Value>) -> Self {
        let claim = |key: &str| {
            raw.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        Self {
            subject: claim("sub"),
            email: claim("email"),
            name: claim("name"),
            locale: claim("locale"),
            raw,
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderClient
// ---------------------------------------------------------------------------

/// Builds the shared outbound HTTP client.
///
/// # Errors
///
/// Returns [`OidcError::Http`] if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(OidcError::Http)?;
    Ok(client)
}

/// Client credentials and endpoints used for the back-channel calls.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    provider: Arc<ProviderMetadata>,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("token_endpoint", &self.provider.token_endpoint)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

impl ProviderClient {
    /// Creates a client for the discovered provider.
    pub fn new(
        http: reqwest::Client,
        provider: Arc<ProviderMetadata>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            http,
            provider,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Provider metadata this client talks to.
    pub fn provider(&self) -> &ProviderMetadata {
        &self.provider
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// POSTs a form-encoded `authorization_code` grant carrying the client
    /// identifier and secret in the body.  No retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::UpstreamExchange`] on transport failure, on any
    /// status other than `200 OK` (the message carries the upstream status
    /// and body), or when the body is not a token response.
    pub async fn exchange_code(&self, code: &str) -> FlowResult<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let resp = self
            .http
            .post(&self.provider.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| OidcError::UpstreamExchange(format!("token request failed: {e}")))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(OidcError::UpstreamExchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        resp.json::<TokenResponse>().await.map_err(|e| {
            OidcError::UpstreamExchange(format!("failed to parse token response: {e}"))
        })
    }

    /// Fetches the profile claims for `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::ProfileFetch`] when no userinfo endpoint is
    /// advertised, on transport failure, on a non-200 status, or when the
    /// body is not a JSON object.
    pub async fn fetch_profile(&self, access_token: &str) -> FlowResult<UserProfile> {
        if !self.provider.has_userinfo_endpoint() {
            return Err(OidcError::ProfileFetch(
                "provider does not advertise a userinfo endpoint".to_string(),
            ));
        }

        let resp = self
            .http
            .get(&self.provider.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OidcError::ProfileFetch(format!("userinfo request failed: {e}")))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(OidcError::ProfileFetch(format!(
                "userinfo endpoint returned {status}"
            )));
        }

        let claims: serde_json::Map<String, serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| OidcError::ProfileFetch(format!("failed to parse userinfo: {e}")))?;

        Ok(UserProfile::from_claims(claims))
    }
}
