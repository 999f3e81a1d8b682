//! Opaque random tokens for session identifiers, CSRF state and nonces
//!
//! Tokens are drawn from the thread-local CSPRNG (seeded from the operating
//! system) and encoded with the base64url alphabet without padding, so they
//! can be placed in query strings and cookie values without escaping.
//!
//! The generator panics if the operating system entropy source fails.  That
//! is an unrecoverable environment failure, not a per-request error.

use base64::Engine as _;
use rand::RngCore as _;

/// Length of session identifiers (192 bits of entropy).
pub const SESSION_ID_LENGTH: usize = 32;

/// Length of CSRF `state` values (144 bits of entropy).
pub const STATE_LENGTH: usize = 24;

/// Length of `nonce` values (144 bits of entropy).
pub const NONCE_LENGTH: usize = 24;

/// Generates a URL-safe opaque token of exactly `length` characters.
///
/// `length` random bytes are base64url-encoded and the encoding is cut back
/// to `length` characters, so each character carries six bits of entropy.
///
/// # Examples
///
/// ```
/// use oidc_test_client::oidc::random::random_opaque_token;
///
/// let token = random_opaque_token(24);
/// assert_eq!(token.len(), 24);
/// assert!(token
///     .chars()
///     .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
/// ```
pub fn random_opaque_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::rng().fill_bytes(&mut bytes);

    let mut encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&bytes);
    encoded.truncate(length);
    encoded
}

/// Returns `true` when `value` only uses the alphabet produced by
/// [`random_opaque_token`].
pub fn is_url_safe(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
