// ABOUTME: OAuth endpoint rate limiting with per-IP windowed counters
// ABOUTME: Sharded DashMap state with lazy cleanup; the protocol core has no awareness of it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use crate::config::environment::RateLimitConfig;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entries older than this are dropped during cleanup
const STALE_ENTRY_TIMEOUT: Duration = Duration::from_secs(600);

/// Cleanup runs once the map grows past this many tracked IPs
const CLEANUP_THRESHOLD: usize = 10_000;

/// Per-endpoint request limits within one window
#[derive(Debug, Clone)]
pub struct EndpointLimits {
    /// Limit for GET /oauth/authorize
    pub authorize: u32,
    /// Limit for POST /oauth/token
    pub token: u32,
    /// Limit for POST /oauth/register
    pub register: u32,
    /// Limit for everything else under the gate
    pub default: u32,
}

impl EndpointLimits {
    /// Derive endpoint limits from the shared rate limit configuration.
    /// Registration is the abuse magnet, so it gets a fraction of the base.
    #[must_use]
    pub fn from_rate_limit_config(config: &RateLimitConfig) -> Self {
        let base = config.requests_per_window;
        Self {
            authorize: base,
            token: base,
            register: (base / 6).max(5),
            default: base,
        }
    }

    fn get_limit(&self, endpoint: &str) -> u32 {
        match endpoint {
            "authorize" => self.authorize,
            "token" => self.token,
            "register" => self.register,
            _ => self.default,
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Whether the request must be rejected
    pub is_limited: bool,
    /// The limit applied to this endpoint
    pub limit: u32,
    /// Requests remaining in the current window
    pub remaining: u32,
    /// Seconds until the window resets, set when limited
    pub retry_after_seconds: Option<u64>,
}

/// OAuth rate limiter with per-IP tracking using a sharded concurrent map
///
/// `DashMap` provides lock-free reads and sharded writes instead of one
/// global mutex on the hot path.
#[derive(Clone)]
pub struct OAuth2RateLimiter {
    /// Per-IP request tracking: IP -> (request count, window start)
    state: Arc<DashMap<IpAddr, (u32, Instant)>>,
    limits: EndpointLimits,
    window: Duration,
    enabled: bool,
}

impl OAuth2RateLimiter {
    /// Create a rate limiter from the shared configuration
    #[must_use]
    pub fn from_rate_limit_config(config: &RateLimitConfig) -> Self {
        Self {
            state: Arc::new(DashMap::new()),
            limits: EndpointLimits::from_rate_limit_config(config),
            window: Duration::from_secs(config.window_seconds),
            enabled: config.enabled,
        }
    }

    /// Check the rate limit for an endpoint and IP, incrementing the counter
    /// when the request is admitted
    #[must_use]
    pub fn check_rate_limit(&self, endpoint: &str, client_ip: IpAddr) -> RateLimitStatus {
        let limit = self.limits.get_limit(endpoint);
        let now = Instant::now();

        let mut entry = self.state.entry(client_ip).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) >= self.window {
            *count = 0;
            *window_start = now;
        }

        let is_limited = *count >= limit;
        if !is_limited {
            *count += 1;
        }
        let remaining = limit.saturating_sub(*count);

        let retry_after_seconds = is_limited.then(|| {
            self.window
                .saturating_sub(now.duration_since(*window_start))
                .as_secs()
                .max(1)
        });

        drop(entry);

        // Lazy cleanup off the critical path: only when the map has grown
        if self.state.len() > CLEANUP_THRESHOLD {
            self.cleanup_old_entries(now);
        }

        RateLimitStatus {
            is_limited,
            limit,
            remaining,
            retry_after_seconds,
        }
    }

    /// Remove stale per-IP entries
    fn cleanup_old_entries(&self, now: Instant) {
        self.state
            .retain(|_ip, (_count, start)| now.duration_since(*start) < STALE_ENTRY_TIMEOUT);
    }
}

/// Map a request path to the endpoint name used for limit selection
fn endpoint_name(path: &str) -> &'static str {
    match path {
        "/oauth/authorize" => "authorize",
        "/oauth/token" => "token",
        "/oauth/register" => "register",
        _ => "default",
    }
}

/// Axum middleware applying the rate limiter in front of the OAuth routes
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<OAuth2RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.enabled {
        return next.run(request).await;
    }

    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |info| info.0.ip());

    let endpoint = endpoint_name(request.uri().path());
    let status = limiter.check_rate_limit(endpoint, client_ip);

    if status.is_limited {
        let retry_after = status.retry_after_seconds.unwrap_or(1);
        tracing::warn!(%client_ip, endpoint, "Rate limit exceeded");

        let body = Json(serde_json::json!({
            "error": "rate_limit_exceeded",
            "error_description": format!("Rate limit of {} requests exceeded", status.limit),
        }));
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", retry_after.to_string())],
            body,
        )
            .into_response();
    }

    next.run(request).await
}
