use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use saddlery_core::AppConfig;
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// What a recognised bearer token may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Staff,
}

type TokenDigest = [u8; 32];

/// Bearer-token auth settings used by middleware.
///
/// Tokens are held only as salted SHA-256 digests.
#[derive(Clone)]
pub struct AuthState {
    keys: Arc<Vec<(TokenDigest, Role)>>,
    salt: Arc<str>,
    pub enabled: bool,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("keys", &self.keys.len())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl AuthState {
    #[must_use]
    pub fn new(admin_keys: &[String], staff_keys: &[String], salt: Option<&str>) -> Self {
        let salt: Arc<str> = Arc::from(salt.unwrap_or_default());
        let keys = admin_keys
            .iter()
            .map(|k| (digest(&salt, k), Role::Admin))
            .chain(staff_keys.iter().map(|k| (digest(&salt, k), Role::Staff)))
            .collect();

        Self {
            keys: Arc::new(keys),
            salt,
            enabled: true,
        }
    }

    /// Builds auth from the configured admin and staff keys.
    ///
    /// In development, missing admin keys disable auth for local iteration.
    /// In non-development envs, missing admin keys fail startup.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if config.admin_keys.is_empty() {
            if config.is_development() {
                tracing::warn!(
                    "SADDLERY_ADMIN_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    keys: Arc::new(Vec::new()),
                    salt: Arc::from(""),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "SADDLERY_ADMIN_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self::new(
            &config.admin_keys,
            &config.staff_keys,
            config.api_key_hash_salt.as_deref(),
        ))
    }

    /// Role for `token`, comparing against every stored digest in constant time.
    fn role_for(&self, token: &str) -> Option<Role> {
        let candidate = digest(&self.salt, token);
        let mut found = None;
        for (key, role) in self.keys.iter() {
            if bool::from(candidate[..].ct_eq(&key[..])) {
                found = Some(*role);
            }
        }
        found
    }
}

fn digest(salt: &str, token: &str) -> TokenDigest {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(token.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    error: &'static str,
    code: &'static str,
}

fn reject(status: StatusCode, error: &'static str, code: &'static str) -> Response {
    (status, Json(MiddlewareError { error, code })).into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware admitting only admin bearer tokens when auth is enabled.
///
/// Missing or unknown tokens get 401; recognised non-admin tokens get 403.
pub async fn require_admin(State(auth): State<AuthState>, req: Request, next: Next) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let role = extract_bearer_token(req.headers().get(AUTHORIZATION)).and_then(|t| auth.role_for(t));

    match role {
        Some(Role::Admin) => next.run(req).await,
        Some(Role::Staff) => reject(StatusCode::FORBIDDEN, "Forbidden", "forbidden"),
        None => reject(StatusCode::UNAUTHORIZED, "Unauthorized", "unauthorized"),
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests",
            "rate_limited",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        let blank = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&blank)), None);
    }

    #[test]
    fn role_for_distinguishes_admin_staff_and_unknown() {
        let auth = AuthState::new(&keys(&["root-key"]), &keys(&["desk-key"]), Some("pepper"));
        assert_eq!(auth.role_for("root-key"), Some(Role::Admin));
        assert_eq!(auth.role_for("desk-key"), Some(Role::Staff));
        assert_eq!(auth.role_for("nope"), None);
        assert_eq!(auth.role_for(""), None);
    }

    #[test]
    fn digest_depends_on_salt() {
        assert_ne!(digest("a", "token"), digest("b", "token"));
        assert_eq!(digest("a", "token"), digest("a", "token"));
    }

    #[test]
    fn debug_does_not_print_digests() {
        let auth = AuthState::new(&keys(&["root-key"]), &[], None);
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("root-key"));
        assert!(rendered.contains("enabled: true"));
    }
}
