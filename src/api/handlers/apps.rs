//! App management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::api::dto::CreateAppRequest;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::App;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/apps", post(create_app).get(list_apps))
        .route("/apps/:app_id", get(get_app))
}

/// POST /api/v1/apps
#[utoipa::path(
    post,
    path = "/apps",
    context_path = "/api/v1",
    tag = "apps",
    request_body = CreateAppRequest,
    responses(
        (status = 201, description = "App created", body = App),
        (status = 400, description = "Invalid slug or name"),
        (status = 409, description = "Slug already in use"),
    )
)]
pub async fn create_app(
    State(state): State<SharedState>,
    Json(req): Json<CreateAppRequest>,
) -> Result<(StatusCode, Json<App>)> {
    validate_slug(&req.slug)?;
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }

    let app = state
        .store
        .insert_app(App {
            id: Uuid::new_v4(),
            slug: req.slug,
            name: req.name,
            created_at: state.clock.now(),
        })
        .await?;
    tracing::info!(app_id = %app.id, slug = %app.slug, "App created");
    Ok((StatusCode::CREATED, Json(app)))
}

/// GET /api/v1/apps
#[utoipa::path(
    get,
    path = "/apps",
    context_path = "/api/v1",
    tag = "apps",
    responses(
        (status = 200, description = "All registered apps", body = Vec<App>),
    )
)]
pub async fn list_apps(State(state): State<SharedState>) -> Result<Json<Vec<App>>> {
    Ok(Json(state.store.list_apps().await?))
}

/// GET /api/v1/apps/{app_id}
#[utoipa::path(
    get,
    path = "/apps/{app_id}",
    context_path = "/api/v1",
    tag = "apps",
    params(("app_id" = Uuid, Path, description = "App ID")),
    responses(
        (status = 200, description = "App details", body = App),
        (status = 404, description = "Unknown app"),
    )
)]
pub async fn get_app(
    State(state): State<SharedState>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<App>> {
    state
        .store
        .app_by_id(app_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("app {app_id}")))
}

/// Slugs appear verbatim in the public update-check route, so they share its
/// constraints.
fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 {
        return Err(AppError::Validation(
            "slug must be between 1 and 64 characters".into(),
        ));
    }
    if !slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_') {
        return Err(AppError::Validation(
            "slug may only contain lowercase alphanumerics, '-' and '_'".into(),
        ));
    }
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(create_app, list_apps, get_app),
    components(schemas(CreateAppRequest, App))
)]
pub struct AppsApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("acme").is_ok());
        assert!(validate_slug("my-app_2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Has Space").is_err());
        assert!(validate_slug("UPPER").is_err());
        assert!(validate_slug(&"a".repeat(65)).is_err());
    }
}
