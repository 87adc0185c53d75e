//! Route definitions for the API.

use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};

use super::handlers;
use super::middleware::rate_limit::rate_limit_middleware;
use super::SharedState;

/// Create the main API router.
///
/// Three rate-limit policies apply to three route groups, each keyed and
/// windowed independently: the public policy guards the update-check routes,
/// the CI policy guards artifact attachment, and the admin policy guards the
/// rest of the management API.
pub fn create_router(state: SharedState) -> Router {
    // Build the OpenAPI spec once at startup.
    let openapi = Arc::new(super::openapi::build_openapi());

    let update_routes = handlers::update::router().layer(middleware::from_fn_with_state(
        state.public_limiter.clone(),
        rate_limit_middleware,
    ));

    let artifact_routes = handlers::releases::artifact_upload_router().layer(
        middleware::from_fn_with_state(state.ci_limiter.clone(), rate_limit_middleware),
    );

    let admin_routes = Router::new()
        .merge(handlers::apps::router())
        .merge(handlers::releases::router())
        .merge(handlers::analytics::router())
        .layer(middleware::from_fn_with_state(
            state.admin_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health endpoints (no rate limiting)
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/livez", get(handlers::health::liveness_check))
        // OpenAPI spec
        .route(
            "/api/v1/openapi.json",
            get(move || {
                let spec = openapi.clone();
                async move { Json((*spec).clone()) }
            }),
        )
        // Admin + CI API
        .nest("/api/v1", admin_routes.merge(artifact_routes))
        // Public update-check routes; wildcard-ish, so merged last
        .merge(update_routes)
        .with_state(state)
}
