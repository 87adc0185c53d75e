//! Public update-check endpoints consumed by shipped desktop clients.
//!
//! The response contract is frozen: 200 + JSON when an update exists, 204
//! when the client is current or no artifact matches its platform, 404 for
//! an unknown app slug, 400 for malformed route segments. Served updates
//! are recorded as download events on a detached task after the response
//! is built.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::SecondsFormat;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::api::dto::UpdateResponse;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::{DownloadEvent, DownloadType};
use crate::services::resolver_service::{Decision, NoUpdateReason, ResolverService};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/:app_slug/update/:target/:current_version", get(check_update))
        .route(
            "/:app_slug/update/:target/:arch/:current_version",
            get(check_update_with_arch),
        )
}

/// GET /{app_slug}/update/{target}/{current_version}
#[utoipa::path(
    get,
    path = "/{app_slug}/update/{target}/{current_version}",
    tag = "update",
    params(
        ("app_slug" = String, Path, description = "App slug"),
        ("target" = String, Path, description = "Client platform, e.g. darwin-aarch64"),
        ("current_version" = String, Path, description = "Version the client is running"),
    ),
    responses(
        (status = 200, description = "Update available", body = UpdateResponse),
        (status = 204, description = "No update available or no artifact for platform"),
        (status = 400, description = "Malformed route parameters"),
        (status = 404, description = "Unknown app slug"),
        (status = 429, description = "Rate limit exceeded"),
    )
)]
pub async fn check_update(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((app_slug, target, current_version)): Path<(String, String, String)>,
) -> Result<Response> {
    respond(&state, &headers, &app_slug, &target, &current_version).await
}

/// GET /{app_slug}/update/{target}/{arch}/{current_version}
///
/// Legacy route shape: older clients report architecture as its own path
/// segment. Both shapes funnel into the same resolution after joining
/// `target-arch`.
#[utoipa::path(
    get,
    path = "/{app_slug}/update/{target}/{arch}/{current_version}",
    tag = "update",
    params(
        ("app_slug" = String, Path, description = "App slug"),
        ("target" = String, Path, description = "Client OS, e.g. darwin"),
        ("arch" = String, Path, description = "Client architecture, e.g. aarch64"),
        ("current_version" = String, Path, description = "Version the client is running"),
    ),
    responses(
        (status = 200, description = "Update available", body = UpdateResponse),
        (status = 204, description = "No update available or no artifact for platform"),
        (status = 400, description = "Malformed route parameters"),
        (status = 404, description = "Unknown app slug"),
        (status = 429, description = "Rate limit exceeded"),
    )
)]
pub async fn check_update_with_arch(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((app_slug, target, arch, current_version)): Path<(String, String, String, String)>,
) -> Result<Response> {
    let joined = format!("{target}-{arch}");
    respond(&state, &headers, &app_slug, &joined, &current_version).await
}

async fn respond(
    state: &SharedState,
    headers: &HeaderMap,
    app_slug: &str,
    target: &str,
    current_version: &str,
) -> Result<Response> {
    validate_route_params(app_slug, target, current_version)?;

    let resolver = ResolverService::new(state.store.clone());
    let decision = resolver.resolve(app_slug, target, current_version).await?;

    match decision {
        Decision::NoUpdate(NoUpdateReason::AppNotFound) => {
            Err(AppError::NotFound(format!("app '{app_slug}'")))
        }
        Decision::NoUpdate(_) => Ok(StatusCode::NO_CONTENT.into_response()),
        Decision::Update { release, artifact } => {
            let body = UpdateResponse {
                version: release.version.clone(),
                notes: release.notes.clone().unwrap_or_default(),
                pub_date: release
                    .pub_date
                    .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
                url: artifact.download_url.clone(),
                signature: artifact.signature.clone(),
            };

            // The response is already decided; the analytics write happens
            // on its own task with its own error handling.
            state.analytics.record_detached(DownloadEvent {
                id: Uuid::new_v4(),
                artifact_id: artifact.id,
                app_id: release.app_id,
                platform: artifact.platform.clone(),
                version: release.version.clone(),
                ip_country: country_of(headers),
                download_type: DownloadType::Update,
                downloaded_at: state.clock.now(),
            });

            Ok((StatusCode::OK, Json(body)).into_response())
        }
    }
}

/// Route-level validation, applied before the resolver runs. This is about
/// structurally broken requests (oversized or empty segments, junk bytes in
/// the version); a well-formed but unparseable current_version is instead
/// handled inside resolution as "no update".
fn validate_route_params(app_slug: &str, target: &str, current_version: &str) -> Result<()> {
    if app_slug.is_empty() || app_slug.len() > 64 {
        return Err(AppError::Validation(
            "app slug must be between 1 and 64 characters".into(),
        ));
    }
    if !app_slug.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
        return Err(AppError::Validation(
            "app slug may only contain alphanumerics, '-' and '_'".into(),
        ));
    }
    if target.is_empty() || target.len() > 64 {
        return Err(AppError::Validation(
            "target must be between 1 and 64 characters".into(),
        ));
    }
    if current_version.is_empty() || current_version.len() > 100 {
        return Err(AppError::Validation(
            "current_version must be between 1 and 100 characters".into(),
        ));
    }
    if !current_version
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'+'))
    {
        return Err(AppError::Validation(
            "current_version contains invalid characters".into(),
        ));
    }
    Ok(())
}

/// Country attribution from the edge, when present.
fn country_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("cf-ipcountry")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_uppercase())
        .filter(|v| !v.is_empty() && v != "XX")
}

#[derive(OpenApi)]
#[openapi(
    paths(check_update, check_update_with_arch),
    components(schemas(UpdateResponse))
)]
pub struct UpdateApiDoc;
