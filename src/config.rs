//! Configuration management for the OIDC test client
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{OidcError, Result};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use url::Url;

/// Main configuration structure for the relying party
///
/// Every field has a default so that the client can run against a local
/// provider with no configuration at all; `validate` rejects values the
/// flow cannot work with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Issuer URL of the external provider
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// OAuth client identifier registered with the provider
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// OAuth client secret, sent in the token request body
    #[serde(default = "default_client_secret")]
    pub client_secret: String,

    /// Redirect URI the provider sends the browser back to
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Listen address; a bare `:port` binds all interfaces
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Scopes requested in the authorization request
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Timeout applied to every outbound provider call
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,

    /// Session cookie settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Session cookie and pending-authorization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the HTTP-only session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Whether the cookie carries the `Secure` attribute
    #[serde(default)]
    pub cookie_secure: bool,

    /// Absolute cookie lifetime from issuance, never renewed
    #[serde(default = "default_lifetime_hours")]
    pub lifetime_hours: i64,

    /// Age after which an unfinished login attempt is discarded (0 = never)
    #[serde(default = "default_pending_ttl_seconds")]
    pub pending_ttl_seconds: u64,
}

/// Upper bound on `session.lifetime_hours` (one year).
pub const MAX_SESSION_LIFETIME_HOURS: i64 = 8760;

fn default_issuer() -> String {
    "http://localhost:8080".to_string()
}

fn default_client_id() -> String {
    "third-web-app".to_string()
}

fn default_client_secret() -> String {
    "third-secret".to_string()
}

fn default_redirect_uri() -> String {
    "http://localhost:4000/auth/callback".to_string()
}

fn default_listen_addr() -> String {
    ":4000".to_string()
}

fn default_scopes() -> Vec<String> {
    parse_scopes("openid profile email offline_access")
}

fn default_http_timeout_seconds() -> u64 {
    10
}

fn default_cookie_name() -> String {
    "oidc_client_session".to_string()
}

fn default_lifetime_hours() -> i64 {
    12
}

fn default_pending_ttl_seconds() -> u64 {
    600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            lifetime_hours: default_lifetime_hours(),
            pending_ttl_seconds: default_pending_ttl_seconds(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            client_id: default_client_id(),
            client_secret: default_client_secret(),
            redirect_uri: default_redirect_uri(),
            listen_addr: default_listen_addr(),
            scopes: default_scopes(),
            http_timeout_seconds: default_http_timeout_seconds(),
            session: SessionConfig::default(),
        }
    }
}

/// Splits a whitespace-separated scope list, dropping empty entries.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to a YAML configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly named file cannot be read or parsed
    pub fn load(path: Option<&str>, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = match path {
            Some(p) if Path::new(p).exists() => Self::from_file(p)?,
            Some(p) => {
                return Err(OidcError::Config(format!("Config file not found: {}", p)).into());
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| OidcError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| OidcError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Some(issuer) = non_empty_env("OIDC_ISSUER") {
            self.issuer = issuer;
        }

        if let Some(client_id) = non_empty_env("OIDC_CLIENT_ID") {
            self.client_id = client_id;
        }

        if let Some(client_secret) = non_empty_env("OIDC_CLIENT_SECRET") {
            self.client_secret = client_secret;
        }

        if let Some(redirect_uri) = non_empty_env("OIDC_REDIRECT_URI") {
            self.redirect_uri = redirect_uri;
        }

        if let Some(listen_addr) = non_empty_env("OIDC_LISTEN_ADDR") {
            self.listen_addr = listen_addr;
        }

        if let Some(scopes) = non_empty_env("OIDC_SCOPES") {
            self.scopes = parse_scopes(&scopes);
        }

        if let Some(timeout) = non_empty_env("OIDC_HTTP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid OIDC_HTTP_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Some(name) = non_empty_env("OIDC_SESSION_COOKIE_NAME") {
            self.session.cookie_name = name;
        }

        if let Some(secure) = non_empty_env("OIDC_SESSION_COOKIE_SECURE") {
            match secure.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.session.cookie_secure = true,
                "0" | "false" | "no" => self.session.cookie_secure = false,
                _ => tracing::warn!("Invalid OIDC_SESSION_COOKIE_SECURE: {}", secure),
            }
        }

        if let Some(hours) = non_empty_env("OIDC_SESSION_LIFETIME_HOURS") {
            if let Ok(value) = hours.parse() {
                self.session.lifetime_hours = value;
            } else {
                tracing::warn!("Invalid OIDC_SESSION_LIFETIME_HOURS: {}", hours);
            }
        }

        if let Some(ttl) = non_empty_env("OIDC_PENDING_TTL_SECONDS") {
            if let Ok(value) = ttl.parse() {
                self.session.pending_ttl_seconds = value;
            } else {
                tracing::warn!("Invalid OIDC_PENDING_TTL_SECONDS: {}", ttl);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(issuer) = &cli.issuer {
            self.issuer = issuer.clone();
        }

        if let Some(crate::cli::Commands::Serve {
            client_id,
            redirect_uri,
            listen,
            scopes,
        }) = &cli.command
        {
            if let Some(client_id) = client_id {
                self.client_id = client_id.clone();
            }
            if let Some(redirect_uri) = redirect_uri {
                self.redirect_uri = redirect_uri.clone();
            }
            if let Some(listen) = listen {
                self.listen_addr = listen.clone();
            }
            if let Some(scopes) = scopes {
                self.scopes = parse_scopes(scopes);
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Config`] naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.issuer)
            .map_err(|e| OidcError::Config(format!("Invalid issuer URL '{}': {}", self.issuer, e)))?;

        Url::parse(&self.redirect_uri).map_err(|e| {
            OidcError::Config(format!(
                "Invalid redirect URI '{}': {}",
                self.redirect_uri, e
            ))
        })?;

        if self.client_id.trim().is_empty() {
            return Err(OidcError::Config("client_id cannot be empty".to_string()).into());
        }

        if self.client_secret.is_empty() {
            return Err(OidcError::Config("client_secret cannot be empty".to_string()).into());
        }

        if self.scopes.is_empty() {
            return Err(
                OidcError::Config("at least one scope must be requested".to_string()).into(),
            );
        }

        if self.http_timeout_seconds == 0 || self.http_timeout_seconds > 60 {
            return Err(OidcError::Config(
                "http_timeout_seconds must be between 1 and 60".to_string(),
            )
            .into());
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(
                OidcError::Config("session.cookie_name cannot be empty".to_string()).into(),
            );
        }

        if !(1..=MAX_SESSION_LIFETIME_HOURS).contains(&self.session.lifetime_hours) {
            return Err(OidcError::Config(format!(
                "session.lifetime_hours must be between 1 and {}",
                MAX_SESSION_LIFETIME_HOURS
            ))
            .into());
        }

        self.socket_addr()?;

        Ok(())
    }

    /// Resolves `listen_addr` into a bindable socket address.
    ///
    /// A bare `:port` form binds every IPv4 interface. Host names such as
    /// `localhost:4000` are resolved and the first address is used.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::Config`] when the address has no port or the
    /// host does not resolve
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = self.listen_addr.trim();
        let normalized = if addr.starts_with(':') {
            format!("0.0.0.0{}", addr)
        } else {
            addr.to_string()
        };

        let mut resolved = normalized.to_socket_addrs().map_err(|e| {
            OidcError::Config(format!("Invalid listen address '{}': {}", self.listen_addr, e))
        })?;

        resolved.next().ok_or_else(|| {
            OidcError::Config(format!(
                "Listen address '{}' resolved to no addresses",
                self.listen_addr
            ))
            .into()
        })
    }

    /// Space-joined scope string sent to the authorization endpoint.
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use serial_test::serial;
    use std::io::Write;

    const ENV_KEYS: &[&str] = &[
        "OIDC_ISSUER",
        "OIDC_CLIENT_ID",
        "OIDC_CLIENT_SECRET",
        "OIDC_REDIRECT_URI",
        "OIDC_LISTEN_ADDR",
        "OIDC_SCOPES",
        "OIDC_HTTP_TIMEOUT_SECONDS",
        "OIDC_SESSION_COOKIE_NAME",
        "OIDC_SESSION_COOKIE_SECURE",
        "OIDC_SESSION_LIFETIME_HOURS",
        "OIDC_PENDING_TTL_SECONDS",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client_id, "third-web-app");
        assert_eq!(
            config.scopes,
            vec!["openid", "profile", "email", "offline_access"]
        );
        assert_eq!(config.session.cookie_name, "oidc_client_session");
        assert_eq!(config.session.lifetime_hours, 12);
    }

    #[test]
    fn test_parse_scopes_collapses_whitespace() {
        assert_eq!(
            parse_scopes("  openid \t profile\nemail "),
            vec!["openid", "profile", "email"]
        );
        assert!(parse_scopes("   ").is_empty());
    }

    #[test]
    fn test_scope_param_is_space_joined() {
        let config = Config {
            scopes: vec!["openid".to_string(), "profile".to_string()],
            ..Config::default()
        };
        assert_eq!(config.scope_param(), "openid profile");
    }

    #[test]
    fn test_socket_addr_bare_port_binds_all_interfaces() {
        let config = Config::default();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:4000");
    }

    #[test]
    fn test_socket_addr_explicit_host() {
        let config = Config {
            listen_addr: "127.0.0.1:8123".to_string(),
            ..Config::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 8123);
    }

    #[test]
    fn test_socket_addr_resolves_host_name() {
        let config = Config {
            listen_addr: "localhost:4000".to_string(),
            ..Config::default()
        };
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.port(), 4000);
        assert!(addr.ip().is_loopback());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_issuer() {
        let config = Config {
            issuer: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_scopes() {
        let config = Config {
            scopes: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            http_timeout_seconds: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_lifetime() {
        for hours in [0, -1, MAX_SESSION_LIFETIME_HOURS + 1, 1_000_000_000_000] {
            let config = Config {
                session: SessionConfig {
                    lifetime_hours: hours,
                    ..SessionConfig::default()
                },
                ..Config::default()
            };
            let err = config.validate().expect_err("lifetime must be rejected");
            assert!(
                err.to_string().contains("session.lifetime_hours"),
                "lifetime_hours={hours}: {err}"
            );
        }
    }

    #[test]
    fn test_validate_accepts_lifetime_at_upper_bound() {
        let config = Config {
            session: SessionConfig {
                lifetime_hours: MAX_SESSION_LIFETIME_HOURS,
                ..SessionConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_listen_addr() {
        let config = Config {
            listen_addr: "localhost".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_yaml_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "issuer: https://idp.example.com\nclient_id: acme\nscopes: [openid, profile]\nsession:\n  cookie_secure: true"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = Config::load(Some(&path), &Cli::default()).unwrap();

        assert_eq!(config.issuer, "https://idp.example.com");
        assert_eq!(config.client_id, "acme");
        assert_eq!(config.scopes, vec!["openid", "profile"]);
        assert!(config.session.cookie_secure);
        assert_eq!(config.client_secret, "third-secret");
    }

    #[test]
    #[serial]
    fn test_load_missing_file_is_an_error() {
        clear_env();
        let result = Config::load(Some("/nonexistent/oidc-client.yaml"), &Cli::default());
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides_defaults() {
        clear_env();
        std::env::set_var("OIDC_CLIENT_ID", "env-client");
        std::env::set_var("OIDC_SCOPES", "openid email");
        std::env::set_var("OIDC_PENDING_TTL_SECONDS", "0");

        let config = Config::load(None, &Cli::default()).unwrap();
        clear_env();

        assert_eq!(config.client_id, "env-client");
        assert_eq!(config.scopes, vec!["openid", "email"]);
        assert_eq!(config.session.pending_ttl_seconds, 0);
    }

    #[test]
    #[serial]
    fn test_invalid_numeric_env_is_ignored() {
        clear_env();
        std::env::set_var("OIDC_HTTP_TIMEOUT_SECONDS", "soon");

        let config = Config::load(None, &Cli::default()).unwrap();
        clear_env();

        assert_eq!(config.http_timeout_seconds, 10);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_env() {
        clear_env();
        std::env::set_var("OIDC_CLIENT_ID", "env-client");

        let cli = Cli {
            issuer: Some("https://cli.example.com".to_string()),
            command: Some(Commands::Serve {
                client_id: Some("cli-client".to_string()),
                redirect_uri: None,
                listen: Some("127.0.0.1:9999".to_string()),
                scopes: None,
            }),
            ..Cli::default()
        };

        let config = Config::load(None, &cli).unwrap();
        clear_env();

        assert_eq!(config.issuer, "https://cli.example.com");
        assert_eq!(config.client_id, "cli-client");
        assert_eq!(config.listen_addr, "127.0.0.1:9999");
    }
}
