//! Per-browser session records
//!
//! A [`Session`] is the relying party's own record of one browser's login
//! outcome.  The [`SessionStore`] owns every record; callers never hold a
//! reference across requests and always look a session up by identifier.
//!
//! The backing map is guarded by a single [`RwLock`].  Guards are released
//! before any `.await`, so the token and profile calls never run while the
//! lock is held.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::oidc::client::{TokenResponse, UserProfile};
use crate::oidc::random::{is_url_safe, random_opaque_token, SESSION_ID_LENGTH};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Credentials received for one browser session.
///
/// A session only ever exists after a successful code exchange.  It is
/// written once, as a complete replacement, and is never partially updated.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use oidc_test_client::oidc::client::TokenResponse;
/// use oidc_test_client::session::Session;
///
/// let now = Utc::now();
/// let token = TokenResponse {
///     access_token: "tok1".to_string(),
///     expires_in: Some(3600),
///     ..TokenResponse::default()
/// };
///
/// let session = Session::from_token_response(token, now);
/// assert_eq!(session.access_token, "tok1");
/// assert_eq!(session.expires_at, Some(now + Duration::seconds(3600)));
/// assert!(!session.is_expired(now));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
    pub token_type: String,

    /// Space-delimited scope granted by the provider.
    pub scope: String,

    /// Absolute expiry of the access token.
    ///
    /// `None` means the provider declared no lifetime; such a session never
    /// reports itself as expired.
    pub expires_at: Option<DateTime<Utc>>,

    /// Claims from the userinfo endpoint, when the fetch succeeded.
    pub profile: Option<UserProfile>,
}

impl Session {
    /// Builds a session from a token response received at `issued_at`.
    pub fn from_token_response(token: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        let expires_at = token.expires_at(issued_at);
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            id_token: token.id_token,
            token_type: token.token_type,
            scope: token.scope,
            expires_at,
            profile: None,
        }
    }

    /// Returns `true` once `now` has reached a known expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Resolved session identifier for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: String,

    /// `true` when the identifier was just minted and a cookie must be set.
    pub minted: bool,
}

/// Thread-safe in-memory map from session identifier to [`Session`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the identifier carried by the request cookie, or mints one.
    ///
    /// A cookie value is reused when it is non-empty and uses the opaque
    /// token alphabet, whether or not a record exists for it yet.  Anything
    /// else is replaced by a fresh identifier and `minted` is set so the
    /// caller issues a new cookie.  No record is inserted here.
    pub fn get_or_create(&self, cookie: Option<&str>) -> SessionHandle {
        match cookie {
            Some(value) if !value.is_empty() && is_url_safe(value) => SessionHandle {
                id: value.to_string(),
                minted: false,
            },
            _ => {
                let id = random_opaque_token(SESSION_ID_LENGTH);
                tracing::debug!(session_id = %id, "Minted session identifier");
                SessionHandle { id, minted: true }
            }
        }
    }

    /// Returns a copy of the session stored under `id`, if any.
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Stores `session` under `id`, replacing any previous record.
    pub fn put(&self, id: &str, session: Session) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), session);
    }

    /// Removes the session stored under `id`.
    ///
    /// Returns `true` if a record was present.
    pub fn delete(&self, id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
