//! Rate limiting middleware.
//!
//! Fixed-window counting per client key. The counter table is the one piece
//! of shared mutable state in the core: each read-modify-write happens under
//! the owning map shard's entry lock, so concurrent requests for the same key
//! are serialized while requests for different keys proceed in parallel.
//!
//! A background sweep purges entries older than twice the window so an
//! unbounded population of distinct clients cannot grow the table forever.
//! The sweep may race a request and reset a live counter to zero; that only
//! ever admits extra requests, never rejects valid ones, and is accepted.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header::HeaderValue,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;

/// Authenticated API-key identity, inserted by the auth layer upstream.
/// Takes precedence over any IP-derived key.
#[derive(Debug, Clone)]
pub struct ApiKeyId(pub String);

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window (0 when rejected).
    pub remaining: u32,
    /// Epoch second at which the current window ends, rounded up.
    pub reset_epoch_seconds: i64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    window_start_ms: i64,
}

/// Fixed-window rate limiter over a sharded counter table.
///
/// Construct one per policy and inject it where needed; there is no global
/// instance. Call `spawn_sweep` once after construction and `close` on
/// shutdown to stop the sweep task.
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, Entry>,
    max_requests: u32,
    window_ms: i64,
    sweep: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified limits.
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window_ms: window_ms as i64,
            sweep: std::sync::Mutex::new(None),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count one request against `key` and decide whether to admit it.
    ///
    /// The whole expiry-check-plus-increment runs under the entry lock of
    /// the key's shard, so two requests at the limit boundary can never both
    /// observe `count < limit`.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now_ms = Utc::now().timestamp_millis();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(Entry { count: 0, window_start_ms: now_ms });

        if now_ms - entry.window_start_ms >= self.window_ms {
            entry.count = 1;
            entry.window_start_ms = now_ms;
        } else if entry.count >= self.max_requests {
            let reset = reset_epoch_seconds(entry.window_start_ms, self.window_ms);
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_epoch_seconds: reset,
            };
        } else {
            entry.count += 1;
        }

        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_epoch_seconds: reset_epoch_seconds(entry.window_start_ms, self.window_ms),
        }
    }

    /// Drop entries whose window expired more than one full window ago.
    /// Holds each shard lock only for its scan-and-delete pass.
    pub fn purge_expired(&self) {
        let now_ms = Utc::now().timestamp_millis();
        let stale_after = self.window_ms * 2;
        self.entries
            .retain(|_, entry| now_ms - entry.window_start_ms < stale_after);
    }

    /// Start the periodic purge sweep. Idempotent per limiter: a second call
    /// replaces the previous task.
    pub fn spawn_sweep(self: &Arc<Self>, interval: Duration) {
        let limiter = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match limiter.upgrade() {
                    Some(limiter) => limiter.purge_expired(),
                    None => break,
                }
            }
        });
        if let Some(previous) = self.sweep.lock().expect("sweep lock poisoned").replace(handle) {
            previous.abort();
        }
    }

    /// Stop the background sweep. Entries already in the table are left to
    /// expire naturally.
    pub fn close(&self) {
        if let Some(handle) = self.sweep.lock().expect("sweep lock poisoned").take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Epoch second at which a window ends, rounded up.
fn reset_epoch_seconds(window_start_ms: i64, window_ms: i64) -> i64 {
    let end_ms = window_start_ms + window_ms;
    (end_ms + 999) / 1000
}

/// Rate limiting middleware.
///
/// Returns 429 Too Many Requests when the limit is exceeded, with a
/// Retry-After header indicating when to retry. Admitted responses carry
/// X-RateLimit-Limit / -Remaining / -Reset headers.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = limiter.check(&key);

    if decision.allowed {
        let mut response = next.run(request).await;
        apply_headers(response.headers_mut(), &limiter, &decision);
        response
    } else {
        tracing::debug!(key = %key, "Rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
        )
            .into_response();

        let retry_after = (decision.reset_epoch_seconds - Utc::now().timestamp()).max(1);
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            headers.insert("Retry-After", value);
        }
        apply_headers(headers, &limiter, &decision);
        response
    }
}

fn apply_headers(
    headers: &mut axum::http::HeaderMap,
    limiter: &RateLimiter,
    decision: &RateLimitDecision,
) {
    if let Ok(value) = HeaderValue::from_str(&limiter.max_requests().to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_epoch_seconds.to_string()) {
        headers.insert("X-RateLimit-Reset", value);
    }
}

/// Derive the rate-limit key for a request.
///
/// Precedence: authenticated API-key id, then the first hop of an
/// X-Forwarded-For chain, then the edge-provided client IP header, then a
/// shared "unknown" sentinel. Missing headers never fail the request.
fn client_key(request: &Request) -> String {
    if let Some(api_key) = request.extensions().get::<ApiKeyId>() {
        return format!("key:{}", api_key.0);
    }

    if let Some(forwarded) = header_str(request, "x-forwarded-for") {
        if let Some(first_hop) = forwarded.split(',').next().map(str::trim) {
            if !first_hop.is_empty() {
                return format!("ip:{first_hop}");
            }
        }
    }

    if let Some(client_ip) = header_str(request, "cf-connecting-ip") {
        let client_ip = client_ip.trim();
        if !client_ip.is_empty() {
            return format!("ip:{client_ip}");
        }
    }

    "ip:unknown".to_string()
}

fn header_str<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}
