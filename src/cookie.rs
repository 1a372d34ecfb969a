//! Session cookie reading and writing.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::{config::AppConfig, error::ApiError, session::SessionToken};

/// session_token
///
/// Finds the named cookie across every `Cookie` header and parses its value as a
/// session token. Absent, empty or malformed values yield `None`.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| SessionToken::parse(value.trim()))
}

/// Builds the `Set-Cookie` value that installs `token`.
pub fn issue(config: &AppConfig, token: &SessionToken) -> Result<HeaderValue, ApiError> {
    let max_age = config.session_lifetime.num_seconds();
    render(config, token.as_str(), max_age)
}

/// Builds the `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear(config: &AppConfig) -> Result<HeaderValue, ApiError> {
    render(config, "", 0)
}

fn render(config: &AppConfig, value: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.session_cookie_name, value, max_age
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("invalid session cookie: {}", e)))
}
