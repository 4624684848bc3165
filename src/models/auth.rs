//! Auth request/response DTOs and the refresh-token cookie descriptor

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Name of the cookie carrying the refresh token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email, length(max = 64))]
    pub email: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self { status: status.to_string() }
    }
}

/// Everything needed to set (or clear) the session cookie.
#[derive(Debug, Clone)]
pub struct CookieDescriptor {
    pub name: String,
    pub value: String,
    pub max_age_secs: u64,
    pub path: String,
    pub domain: String,
    pub http_only: bool,
}

impl CookieDescriptor {
    /// A cookie carrying a freshly minted refresh token.
    pub fn session(token: &str, max_age_secs: u64, domain: &str) -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            value: token.to_string(),
            max_age_secs,
            path: "/".to_string(),
            domain: domain.to_string(),
            http_only: true,
        }
    }

    /// A cookie that immediately expires the client's session cookie.
    pub fn expired(domain: &str) -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            value: String::new(),
            max_age_secs: 1,
            path: "/".to_string(),
            domain: domain.to_string(),
            http_only: true,
        }
    }

    /// Render as a Set-Cookie header value.
    pub fn to_set_cookie(&self) -> String {
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path={}",
            self.name, self.value, self.max_age_secs, self.path
        );
        if !self.domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.domain));
        }
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie
    }
}

/// Find a cookie value in a Cookie header.
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_header() {
        let cookie = CookieDescriptor::session("abc123", 2592000, "example.com");
        let header = cookie.to_set_cookie();

        assert_eq!(
            header,
            "session=abc123; Max-Age=2592000; Path=/; Domain=example.com; HttpOnly"
        );
    }

    #[test]
    fn test_expired_cookie_header() {
        let cookie = CookieDescriptor::expired("example.com");
        let header = cookie.to_set_cookie();

        assert!(header.starts_with("session=;"));
        assert!(header.contains("Max-Age=1"));
        assert!(header.contains("HttpOnly"));
    }

    #[test]
    fn test_cookie_value_lookup() {
        let header = "theme=dark; session=deadbeef; lang=en";
        assert_eq!(cookie_value(header, "session"), Some("deadbeef"));
        assert_eq!(cookie_value(header, "theme"), Some("dark"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn test_token_response_json_name() {
        let json = serde_json::to_value(TokenResponse { access_token: "t".to_string() }).unwrap();
        assert!(json.get("accessToken").is_some());
    }
}
