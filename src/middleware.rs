//! HTTP middleware and shared application state

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::{PasswordHasher, TokenService},
    config::AppConfig,
    error::AppError,
    services::{AuthService, ProjectService, StorageService, UserService},
};

/// Application state: configuration plus the service bundle, composed
/// once at startup and shared via Arc.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: sqlx::PgPool,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub project_service: Arc<ProjectService>,
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// Wire up the service bundle. Misconfiguration (short JWT secret,
    /// hash cost out of bounds, broken storage credentials) fails here,
    /// before the server binds.
    pub fn new(config: AppConfig, db: sqlx::PgPool) -> Result<Self, AppError> {
        let token_service = Arc::new(TokenService::from_config(&config)?);
        let hasher = Arc::new(PasswordHasher::from_config(&config)?);
        let storage_service = Arc::new(StorageService::from_config(&config.storage)?);

        let auth_service = Arc::new(AuthService::new(
            db.clone(),
            token_service.clone(),
            hasher.clone(),
            &config,
        ));
        let user_service = Arc::new(UserService::new(
            db.clone(),
            token_service.clone(),
            hasher,
            storage_service.clone(),
            &config,
        ));
        let project_service = Arc::new(ProjectService::new(db.clone(), storage_service));

        Ok(Self {
            config,
            db,
            auth_service,
            user_service,
            project_service,
            rate_limiter: Arc::new(IpRateLimiter::new(RateLimitConfig::default())),
        })
    }
}

/// Request tracking: a span with trace/request ids, latency metrics, and
/// the ids echoed back in response headers.
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::counter!("http_requests_total", "status" => status.to_string()).increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Sign-in rate limit, keyed by client IP.
pub async fn sign_in_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = client_ip(req.headers(), state.config.security.trust_proxy)
        .unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.check(&client_ip) {
        tracing::warn!(%client_ip, "Sign-in rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(req).await)
}

/// Client IP from proxy headers (when trusted). Falls back to None so
/// callers can decide on a placeholder.
pub fn client_ip(headers: &HeaderMap, trust_proxy: bool) -> Option<String> {
    if !trust_proxy {
        return None;
    }

    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// The user-agent string a session is bound to: client hints plus the
/// classic header, concatenated.
pub fn compose_user_agent(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };

    format!(
        "{} {} {}",
        header("sec-ch-ua"),
        header("sec-ch-ua-platform"),
        header("user-agent")
    )
}

// ==================== Sign-in rate limiter ====================

/// Sliding-window counter per client IP.
pub struct IpRateLimiter {
    windows: DashMap<String, VecDeque<Instant>>,
    config: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(300),
        }
    }
}

impl IpRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Record a request and report whether it is allowed.
    pub fn check(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut window = self.windows.entry(ip.to_string()).or_default();

        while let Some(&front) = window.front() {
            if now.duration_since(front) < self.config.window {
                break;
            }
            window.pop_front();
        }

        if window.len() < self.config.max_requests {
            window.push_back(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        assert_eq!(extract_or_generate_trace_id(&headers), "test-trace-123");

        let headers = HeaderMap::new();
        let trace_id = extract_or_generate_trace_id(&headers);
        assert!(!trace_id.is_empty());
    }

    #[test]
    fn test_client_ip_from_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "192.168.1.1, 10.0.0.1".parse().unwrap());

        assert_eq!(client_ip(&headers, true), Some("192.168.1.1".to_string()));
        assert_eq!(client_ip(&headers, false), None);
    }

    #[test]
    fn test_client_ip_from_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "192.168.1.2".parse().unwrap());

        assert_eq!(client_ip(&headers, true), Some("192.168.1.2".to_string()));
    }

    #[test]
    fn test_compose_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert("sec-ch-ua", "\"Chromium\";v=\"130\"".parse().unwrap());
        headers.insert("sec-ch-ua-platform", "\"Linux\"".parse().unwrap());
        headers.insert("user-agent", "Mozilla/5.0".parse().unwrap());

        assert_eq!(
            compose_user_agent(&headers),
            "\"Chromium\";v=\"130\" \"Linux\" Mozilla/5.0"
        );

        // Missing headers still produce a stable shape
        let headers = HeaderMap::new();
        assert_eq!(compose_user_agent(&headers), "  ");
    }

    #[test]
    fn test_rate_limiter_sliding_window() {
        let limiter = IpRateLimiter::new(RateLimitConfig {
            max_requests: 3,
            window: Duration::from_secs(60),
        });

        for _ in 0..3 {
            assert!(limiter.check("192.168.1.1"));
        }
        assert!(!limiter.check("192.168.1.1"));

        // Other IPs are unaffected
        assert!(limiter.check("192.168.1.2"));
    }
}
