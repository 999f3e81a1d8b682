//! Flow controller endpoints
//!
//! A browser moves through three implicit states: anonymous, pending (a
//! `state` value is registered for its session) and authenticated (a
//! [`Session`] is stored).  `/login` moves it to pending, `/auth/callback`
//! to authenticated, and `/logout` back to anonymous.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use super::{cookies, found, AppState};
use crate::error::{FlowResult, OidcError};
use crate::oidc::random::{random_opaque_token, NONCE_LENGTH, STATE_LENGTH};
use crate::session::Session;

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

pub(super) async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> FlowResult<Html<String>> {
    let session = current_session(&state, &jar);
    let html = state.renderer.render_index(
        &state.config,
        state.provider(),
        session.as_ref(),
        Utc::now(),
    )?;
    Ok(Html(html))
}

pub(super) async fn session_json(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Json<serde_json::Value> {
    let session = current_session(&state, &jar);
    let expired = session.as_ref().is_some_and(|s| s.is_expired(Utc::now()));

    Json(json!({
        "authenticated": session.is_some(),
        "expired": expired,
        "session": session,
    }))
}

pub(super) async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    cookies::session_id(jar, &state.config.session).and_then(|id| state.sessions.get(id))
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

pub(super) async fn login(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Response) {
    let settings = &state.config.session;
    let handle = state
        .sessions
        .get_or_create(cookies::session_id(&jar, settings));

    let jar = if handle.minted {
        jar.add(cookies::session_cookie(
            settings,
            &handle.id,
            OffsetDateTime::now_utc(),
        ))
    } else {
        jar
    };

    let csrf_state = random_opaque_token(STATE_LENGTH);
    let nonce = random_opaque_token(NONCE_LENGTH);
    state.pending.register(&csrf_state, &handle.id, &nonce);

    let location = authorization_url(&state, &csrf_state, &nonce);

    tracing::info!(new_session = handle.minted, "Login initiated");
    tracing::debug!(session_id = %handle.id, state = %csrf_state, "Registered pending authorization");

    (jar, found(&location))
}

fn authorization_url(state: &AppState, csrf_state: &str, nonce: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("response_type", "code")
        .append_pair("client_id", &state.config.client_id)
        .append_pair("redirect_uri", &state.config.redirect_uri)
        .append_pair("scope", &state.config.scope_param())
        .append_pair("state", csrf_state)
        .append_pair("nonce", nonce)
        .finish();

    let endpoint = &state.provider().authorization_endpoint;
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query}")
}

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

/// Parameters the provider appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    /// Fills fields missing from `self` with values from `fallback`.
    fn or(self, fallback: CallbackParams) -> Self {
        Self {
            code: self.code.or(fallback.code),
            state: self.state.or(fallback.state),
            error: self.error.or(fallback.error),
            error_description: self.error_description.or(fallback.error_description),
        }
    }
}

pub(super) async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> FlowResult<Response> {
    complete_login(&state, params).await
}

/// `response_mode=form_post` delivery; form fields win over the query.
pub(super) async fn callback_form(
    State(state): State<AppState>,
    Query(query): Query<CallbackParams>,
    Form(form): Form<CallbackParams>,
) -> FlowResult<Response> {
    complete_login(&state, form.or(query)).await
}

async fn complete_login(state: &AppState, params: CallbackParams) -> FlowResult<Response> {
    let csrf_state = non_empty(params.state);

    if let Some(error) = non_empty(params.error) {
        if let Some(csrf_state) = &csrf_state {
            state.pending.consume(csrf_state);
        }
        let description = params.error_description.unwrap_or_default();
        tracing::warn!(error = %error, description = %description, "Provider returned an error");

        let message = if description.is_empty() {
            format!("provider returned error: {error}")
        } else {
            format!("provider returned error: {error}: {description}")
        };
        return Err(OidcError::BadRequest(message));
    }

    let (Some(csrf_state), Some(code)) = (csrf_state, non_empty(params.code)) else {
        tracing::warn!("Callback rejected: missing state or code");
        return Err(OidcError::BadRequest("missing state or code".to_string()));
    };

    let Some(pending) = state.pending.consume(&csrf_state) else {
        tracing::warn!("Callback rejected: unknown state");
        return Err(OidcError::BadRequest("unknown state".to_string()));
    };

    let token = state.client.exchange_code(&code).await.map_err(|e| {
        tracing::error!(error = %e, "Token exchange failed");
        e
    })?;

    let mut session = Session::from_token_response(token, Utc::now());

    if state.provider().has_userinfo_endpoint() && !session.access_token.is_empty() {
        match state.client.fetch_profile(&session.access_token).await {
            Ok(profile) => session.profile = Some(profile),
            Err(e) => tracing::warn!(error = %e, "Continuing login without profile"),
        }
    }

    tracing::info!(
        has_profile = session.profile.is_some(),
        has_refresh_token = !session.refresh_token.is_empty(),
        "Login completed"
    );
    state.sessions.put(&pending.session_id, session);

    Ok(found("/"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

pub(super) async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let settings = &state.config.session;

    let session_id = cookies::session_id(&jar, settings).map(str::to_string);

    let jar = match session_id {
        Some(id) => {
            let existed = state.sessions.delete(&id);
            tracing::info!(existed, "Logged out");
            jar.add(cookies::clear_session_cookie(settings))
        }
        None => jar,
    };

    (jar, found("/"))
}
