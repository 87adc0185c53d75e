//! Release lifecycle and artifact handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::api::dto::{CreateArtifactRequest, CreateReleaseRequest};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::{Artifact, Release};
use crate::services::release_service::{NewArtifact, NewRelease, ReleaseService};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/apps/:app_id/releases",
            post(create_release).get(list_releases),
        )
        .route("/releases/:release_id", delete(delete_release))
        .route("/releases/:release_id/publish", post(publish_release))
        .route("/releases/:release_id/archive", post(archive_release))
        .route("/releases/:release_id/artifacts", get(list_artifacts))
}

/// Artifact-attach routes, split out so the CI rate-limit policy can be
/// applied to them independently of the rest of the admin API.
pub fn artifact_upload_router() -> Router<SharedState> {
    Router::new().route("/releases/:release_id/artifacts", post(create_artifact))
}

fn service(state: &SharedState) -> ReleaseService {
    ReleaseService::new(state.store.clone(), state.clock.clone())
}

/// POST /api/v1/apps/{app_id}/releases
#[utoipa::path(
    post,
    path = "/apps/{app_id}/releases",
    context_path = "/api/v1",
    tag = "releases",
    params(("app_id" = Uuid, Path, description = "App ID")),
    request_body = CreateReleaseRequest,
    responses(
        (status = 201, description = "Draft release created", body = Release),
        (status = 400, description = "Version is not valid semver"),
        (status = 404, description = "Unknown app"),
        (status = 409, description = "Version already exists for this app"),
    )
)]
pub async fn create_release(
    State(state): State<SharedState>,
    Path(app_id): Path<Uuid>,
    Json(req): Json<CreateReleaseRequest>,
) -> Result<(StatusCode, Json<Release>)> {
    let release = service(&state)
        .create_release(NewRelease {
            app_id,
            version: req.version,
            notes: req.notes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(release)))
}

/// GET /api/v1/apps/{app_id}/releases
#[utoipa::path(
    get,
    path = "/apps/{app_id}/releases",
    context_path = "/api/v1",
    tag = "releases",
    params(("app_id" = Uuid, Path, description = "App ID")),
    responses(
        (status = 200, description = "Releases for the app, newest first", body = Vec<Release>),
        (status = 404, description = "Unknown app"),
    )
)]
pub async fn list_releases(
    State(state): State<SharedState>,
    Path(app_id): Path<Uuid>,
) -> Result<Json<Vec<Release>>> {
    if state.store.app_by_id(app_id).await?.is_none() {
        return Err(AppError::NotFound(format!("app {app_id}")));
    }
    Ok(Json(state.store.releases_for_app(app_id).await?))
}

/// POST /api/v1/releases/{release_id}/publish
#[utoipa::path(
    post,
    path = "/releases/{release_id}/publish",
    context_path = "/api/v1",
    tag = "releases",
    params(("release_id" = Uuid, Path, description = "Release ID")),
    responses(
        (status = 200, description = "Release published", body = Release),
        (status = 404, description = "Unknown release"),
        (status = 409, description = "Release is not a draft"),
    )
)]
pub async fn publish_release(
    State(state): State<SharedState>,
    Path(release_id): Path<Uuid>,
) -> Result<Json<Release>> {
    Ok(Json(service(&state).publish(release_id).await?))
}

/// POST /api/v1/releases/{release_id}/archive
#[utoipa::path(
    post,
    path = "/releases/{release_id}/archive",
    context_path = "/api/v1",
    tag = "releases",
    params(("release_id" = Uuid, Path, description = "Release ID")),
    responses(
        (status = 200, description = "Release archived", body = Release),
        (status = 404, description = "Unknown release"),
        (status = 409, description = "Release is already archived"),
    )
)]
pub async fn archive_release(
    State(state): State<SharedState>,
    Path(release_id): Path<Uuid>,
) -> Result<Json<Release>> {
    Ok(Json(service(&state).archive(release_id).await?))
}

/// DELETE /api/v1/releases/{release_id}
#[utoipa::path(
    delete,
    path = "/releases/{release_id}",
    context_path = "/api/v1",
    tag = "releases",
    params(("release_id" = Uuid, Path, description = "Release ID")),
    responses(
        (status = 204, description = "Draft release deleted"),
        (status = 404, description = "Unknown release"),
        (status = 409, description = "Only drafts may be deleted"),
    )
)]
pub async fn delete_release(
    State(state): State<SharedState>,
    Path(release_id): Path<Uuid>,
) -> Result<StatusCode> {
    service(&state).delete(release_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/releases/{release_id}/artifacts
#[utoipa::path(
    post,
    path = "/releases/{release_id}/artifacts",
    context_path = "/api/v1",
    tag = "releases",
    params(("release_id" = Uuid, Path, description = "Release ID")),
    request_body = CreateArtifactRequest,
    responses(
        (status = 201, description = "Artifact attached", body = Artifact),
        (status = 404, description = "Unknown release"),
        (status = 409, description = "Release archived or platform already present"),
    )
)]
pub async fn create_artifact(
    State(state): State<SharedState>,
    Path(release_id): Path<Uuid>,
    Json(req): Json<CreateArtifactRequest>,
) -> Result<(StatusCode, Json<Artifact>)> {
    let artifact = service(&state)
        .add_artifact(
            release_id,
            NewArtifact {
                platform: req.platform,
                signature: req.signature,
                download_url: req.url,
                file_size: req.file_size,
                checksum: req.checksum,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(artifact)))
}

/// GET /api/v1/releases/{release_id}/artifacts
#[utoipa::path(
    get,
    path = "/releases/{release_id}/artifacts",
    context_path = "/api/v1",
    tag = "releases",
    params(("release_id" = Uuid, Path, description = "Release ID")),
    responses(
        (status = 200, description = "Artifacts attached to the release", body = Vec<Artifact>),
        (status = 404, description = "Unknown release"),
    )
)]
pub async fn list_artifacts(
    State(state): State<SharedState>,
    Path(release_id): Path<Uuid>,
) -> Result<Json<Vec<Artifact>>> {
    Ok(Json(service(&state).artifacts(release_id).await?))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_release,
        list_releases,
        publish_release,
        archive_release,
        delete_release,
        create_artifact,
        list_artifacts,
    ),
    components(schemas(
        CreateReleaseRequest,
        CreateArtifactRequest,
        Release,
        Artifact,
        crate::models::ReleaseStatus,
    ))
)]
pub struct ReleasesApiDoc;
