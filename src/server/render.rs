//! HTML presentation of configuration, provider metadata and session
//!
//! The page is a debugging surface: tokens and raw claims are shown
//! verbatim.  Handlebars escapes every interpolated value.

use chrono::{DateTime, SecondsFormat, Utc};
use handlebars::Handlebars;
use serde_json::json;

use crate::config::Config;
use crate::error::{FlowResult, OidcError, Result};
use crate::oidc::discovery::ProviderMetadata;
use crate::session::Session;

const INDEX_TEMPLATE: &str = "index";

/// Compiled page templates.
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer").finish_non_exhaustive()
    }
}

impl PageRenderer {
    /// Compiles the embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Render`] if a template does not parse.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars
            .register_template_string(INDEX_TEMPLATE, include_str!("../../templates/index.hbs"))
            .map_err(|e| OidcError::Render(format!("Failed to register index template: {e}")))?;

        Ok(Self { handlebars })
    }

    /// Renders the index page for an optional session.
    ///
    /// The client secret is never part of the page data.
    pub fn render_index(
        &self,
        config: &Config,
        provider: &ProviderMetadata,
        session: Option<&Session>,
        now: DateTime<Utc>,
    ) -> FlowResult<String> {
        let user_info = session
            .and_then(|s| s.profile.as_ref())
            .map(|profile| serde_json::to_string_pretty(&profile.raw))
            .transpose()?;

        let data = json!({
            "config": {
                "issuer": config.issuer,
                "client_id": config.client_id,
                "redirect_uri": config.redirect_uri,
                "scopes": config.scopes,
            },
            "provider": provider,
            "session": session,
            "expires_at": session
                .and_then(|s| s.expires_at)
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            "expired": session.is_some_and(|s| s.is_expired(now)),
            "user_info": user_info,
        });

        self.handlebars
            .render(INDEX_TEMPLATE, &data)
            .map_err(|e| OidcError::Render(e.to_string()))
    }
}
