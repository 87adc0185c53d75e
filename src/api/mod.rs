//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::services::analytics_service::AnalyticsService;
use crate::store::{Clock, EventSink, ReleaseStore};

use middleware::rate_limit::RateLimiter;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ReleaseStore>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
    pub analytics: Arc<AnalyticsService>,
    /// Update-check routes (60 req/min by default).
    pub public_limiter: Arc<RateLimiter>,
    /// Admin API routes (100 req/min by default).
    pub admin_limiter: Arc<RateLimiter>,
    /// CI artifact-attach routes (30 req/min by default).
    pub ci_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn ReleaseStore>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let analytics = Arc::new(AnalyticsService::new(events.clone(), clock.clone()));
        let public_limiter = Arc::new(RateLimiter::new(
            config.public_rate_limit,
            config.public_rate_window_ms,
        ));
        let admin_limiter = Arc::new(RateLimiter::new(
            config.admin_rate_limit,
            config.admin_rate_window_ms,
        ));
        let ci_limiter = Arc::new(RateLimiter::new(
            config.ci_rate_limit,
            config.ci_rate_window_ms,
        ));
        Self {
            config,
            store,
            events,
            clock,
            analytics,
            public_limiter,
            admin_limiter,
            ci_limiter,
        }
    }

    /// Start the limiter purge sweeps. Call once after construction.
    pub fn spawn_background(&self) {
        let interval = Duration::from_millis(self.config.rate_sweep_interval_ms);
        self.public_limiter.spawn_sweep(interval);
        self.admin_limiter.spawn_sweep(interval);
        self.ci_limiter.spawn_sweep(interval);
    }

    /// Stop background tasks. Safe to call more than once.
    pub fn shutdown(&self) {
        self.public_limiter.close();
        self.admin_limiter.close();
        self.ci_limiter.close();
    }
}

pub type SharedState = Arc<AppState>;
