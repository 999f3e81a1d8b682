//! Session cookie helpers

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use crate::config::SessionConfig;

/// Builds the session cookie with a fixed absolute expiry from `now`.
///
/// The expiry is set once when the identifier is minted and is never
/// renewed on later requests. A lifetime past the representable date range
/// yields a browser-session cookie with no `Expires`.
pub(super) fn session_cookie(
    settings: &SessionConfig,
    session_id: &str,
    now: OffsetDateTime,
) -> Cookie<'static> {
    let mut builder = Cookie::build((settings.cookie_name.clone(), session_id.to_string()))
        .http_only(true)
        .secure(settings.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/");

    match session_expiry(now, settings.lifetime_hours) {
        Some(expires) => builder = builder.expires(expires),
        None => tracing::warn!(
            lifetime_hours = settings.lifetime_hours,
            "Session lifetime out of range; issuing cookie without expiry"
        ),
    }

    builder.build()
}

fn session_expiry(now: OffsetDateTime, lifetime_hours: i64) -> Option<OffsetDateTime> {
    lifetime_hours
        .checked_mul(3600)
        .and_then(|secs| now.checked_add(Duration::seconds(secs)))
}

/// Builds a removal cookie: empty value, expiry in the past.
pub(super) fn clear_session_cookie(settings: &SessionConfig) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), ""))
        .http_only(true)
        .secure(settings.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .build()
}

/// Reads the session identifier carried by the request, if any.
pub(super) fn session_id<'a>(jar: &'a CookieJar, settings: &SessionConfig) -> Option<&'a str> {
    jar.get(&settings.cookie_name).map(|c| c.value())
}
