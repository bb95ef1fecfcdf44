//! Session credentials and request header derivation.

use std::fmt;
use std::path::Path;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Public bearer token shipped with the X web client.
///
/// It identifies the web application, not the user; the session is carried
/// by the cookies and the CSRF header.
pub const WEB_BEARER_TOKEN: &str = "Bearer AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

/// Cookie holding the CSRF token echoed in `x-csrf-token`.
pub const CSRF_COOKIE: &str = "ct0";

/// Cookie holding the session token.
pub const AUTH_COOKIE: &str = "auth_token";

/// One cookie as exported by browser cookie extensions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    #[serde(default)]
    pub domain: String,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

/// Read a cookie export (JSON array of cookie objects).
pub fn load_cookies(path: &Path) -> Result<Vec<Cookie>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::AuthConfig(format!("Cookies file not found: {}", path.display()))
        } else {
            Error::Io(e)
        }
    })?;

    parse_cookies(&content)
}

/// Parse a cookie export from its JSON text.
pub fn parse_cookies(content: &str) -> Result<Vec<Cookie>> {
    serde_json::from_str(content)
        .map_err(|e| Error::AuthConfig(format!("Cookies file is not a cookie array: {}", e)))
}

/// Immutable credentials for one export run.
#[derive(Clone)]
pub struct CredentialContext {
    csrf_token: String,
    auth_token: String,
    bearer_token: String,
    cookie_header: String,
}

impl CredentialContext {
    /// Build the context from parsed cookies using the public web bearer token.
    pub fn from_cookies(cookies: &[Cookie]) -> Result<Self> {
        Self::with_bearer(cookies, WEB_BEARER_TOKEN)
    }

    /// Build the context with an explicit bearer token.
    pub fn with_bearer(cookies: &[Cookie], bearer_token: &str) -> Result<Self> {
        // Later entries win, but the header keeps first-seen order.
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            match pairs.iter_mut().find(|(name, _)| *name == cookie.name) {
                Some(pair) => pair.1 = cookie.value.as_str(),
                None => pairs.push((cookie.name.as_str(), cookie.value.as_str())),
            }
        }

        let lookup = |name: &str| {
            pairs
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.to_string())
                .unwrap_or_default()
        };

        let csrf_token = lookup(CSRF_COOKIE);
        let auth_token = lookup(AUTH_COOKIE);

        validate_token(CSRF_COOKIE, &csrf_token)?;
        validate_token(AUTH_COOKIE, &auth_token)?;

        if !bearer_token.starts_with("Bearer ") || bearer_token.len() <= "Bearer ".len() {
            return Err(Error::AuthConfig(
                "bearer token must have the form 'Bearer <token>'".to_string(),
            ));
        }

        let cookie_header = pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");

        Ok(Self {
            csrf_token,
            auth_token,
            bearer_token: bearer_token.to_string(),
            cookie_header,
        })
    }

    /// CSRF token (`ct0`).
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// Session token (`auth_token`).
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Raw `Cookie` header value.
    pub fn cookie_header(&self) -> &str {
        &self.cookie_header
    }

    /// Headers attached to every authenticated API request.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(header::AUTHORIZATION, header_value(&self.bearer_token)?);
        headers.insert(
            HeaderName::from_static("x-csrf-token"),
            header_value(&self.csrf_token)?,
        );
        headers.insert(header::COOKIE, header_value(&self.cookie_header)?);
        headers.insert(
            HeaderName::from_static("x-twitter-active-user"),
            HeaderValue::from_static("yes"),
        );
        headers.insert(
            HeaderName::from_static("x-twitter-auth-type"),
            HeaderValue::from_static("OAuth2Session"),
        );
        headers.insert(
            HeaderName::from_static("x-twitter-client-language"),
            HeaderValue::from_static("en"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::REFERER, HeaderValue::from_static("https://x.com/"));
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://x.com"));

        Ok(headers)
    }
}

impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("csrf_token", &"<redacted>")
            .field("auth_token", &"<redacted>")
            .field("cookie_count", &self.cookie_header.split("; ").count())
            .finish()
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::AuthConfig(format!("Credential is not a valid header value: {}", e)))
}

/// Validate a required session token.
pub fn validate_token(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::AuthConfig(format!(
            "required cookie '{}' is missing or empty",
            name
        )));
    }

    let malformed = value
        .chars()
        .any(|c| !c.is_ascii_graphic() || c == ';' || c == '=' || c == ',');
    if malformed {
        return Err(Error::AuthConfig(format!(
            "cookie '{}' contains characters not allowed in a token",
            name
        )));
    }

    Ok(())
}
