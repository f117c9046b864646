//! Rate limiting
//!
//! Fixed window per client key (first `X-Forwarded-For` hop, else the peer
//! address when known).

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::{config::EnvironmentConfig, state::AppState, utils::errors::AppError};

#[derive(Debug, Clone)]
struct Window {
    requests: u32,
    started: Instant,
}

#[derive(Clone)]
pub struct RateLimitState {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self::new(config.rate_limit_requests, Duration::from_secs(config.rate_limit_window))
    }

    /// Count one request for `client`; false once the window is exhausted
    pub async fn check(&self, client: &str) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        let window = windows.entry(client.to_string()).or_insert(Window {
            requests: 0,
            started: now,
        });
        if window.requests >= self.max_requests {
            return false;
        }
        window.requests += 1;
        true
    }
}

fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|h| !h.is_empty())
    {
        return forwarded.to_string();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request);
    if !state.rate_limit.check(&client).await {
        return Err(AppError::RateLimitExceeded);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_window_blocks_after_limit() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        assert!(limiter.check("a").await);
        assert!(limiter.check("a").await);
        assert!(!limiter.check("a").await);
        assert!(limiter.check("b").await);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimitState::new(1, Duration::from_millis(20));
        assert!(limiter.check("a").await);
        assert!(!limiter.check("a").await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check("a").await);
    }
}
