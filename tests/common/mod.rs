use std::fs;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oidc_test_client::config::Config;
use oidc_test_client::oidc::discover;
use oidc_test_client::server::{router, AppState};

pub const CLIENT_ID: &str = "acme";
pub const CLIENT_SECRET: &str = "acme-secret";
pub const REDIRECT_URI: &str = "http://localhost:4000/auth/callback";
pub const COOKIE_NAME: &str = "oidc_client_session";

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Discovery document whose endpoints live on `base_url`.
#[allow(dead_code)]
pub fn provider_metadata_body(base_url: &str, with_userinfo: bool) -> serde_json::Value {
    let mut body = serde_json::json!({
        "issuer": base_url,
        "authorization_endpoint": format!("{}/authorize", base_url),
        "token_endpoint": format!("{}/token", base_url),
        "response_types_supported": ["code"]
    });
    if with_userinfo {
        body["userinfo_endpoint"] = serde_json::json!(format!("{}/userinfo", base_url));
    }
    body
}

/// Mounts the well-known discovery document on `server`.
#[allow(dead_code)]
pub async fn mount_discovery(server: &MockServer, with_userinfo: bool) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(provider_metadata_body(&server.uri(), with_userinfo)),
        )
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn test_config(issuer: &str) -> Config {
    Config {
        issuer: issuer.to_string(),
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        redirect_uri: REDIRECT_URI.to_string(),
        scopes: vec!["openid".to_string(), "profile".to_string()],
        ..Config::default()
    }
}

/// Starts a mock provider and an application discovered against it.
#[allow(dead_code)]
pub async fn start_app(with_userinfo: bool) -> (MockServer, AppState, Router) {
    start_app_with(with_userinfo, |_| {}).await
}

/// Like [`start_app`], with `configure` applied to the config before the
/// application is built.
#[allow(dead_code)]
pub async fn start_app_with(
    with_userinfo: bool,
    configure: impl FnOnce(&mut Config),
) -> (MockServer, AppState, Router) {
    let server = MockServer::start().await;
    mount_discovery(&server, with_userinfo).await;

    let mut config = test_config(&server.uri());
    configure(&mut config);
    let http = AppState::http_client(&config).expect("http client");
    let provider = discover(&http, &config.issuer)
        .await
        .expect("discovery against mock provider");

    let state = AppState::new(config, provider, http).expect("app state");
    let app = router(state.clone());
    (server, state, app)
}

#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router is infallible")
}

#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = cookie {
        builder = builder.header(header::COOKIE, format!("{}={}", COOKIE_NAME, value));
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[allow(dead_code)]
pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// Value of the session cookie set by `response`, if any.
#[allow(dead_code)]
pub fn session_cookie_value(response: &Response<Body>) -> Option<String> {
    set_cookie_header(response).map(|raw| {
        raw.split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, value)| value.to_string())
            .unwrap_or_default()
    })
}

#[allow(dead_code)]
pub fn set_cookie_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{}=", COOKIE_NAME)))
        .map(str::to_string)
}

/// Query parameter `key` of an absolute URL.
#[allow(dead_code)]
pub fn query_param(url: &str, key: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
