//! OpenAPI specification generated from handler annotations via utoipa.

use utoipa::OpenApi;

/// Top-level OpenAPI document.
///
/// Each handler module contributes its own paths and schemas via per-module
/// `#[derive(OpenApi)]` structs that are merged into this root document at
/// startup.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Liftgate API",
        description = "Update server for desktop applications: versioned releases, per-platform artifacts, and an update-resolution API.",
        version = "0.3.1",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "update", description = "Public update-check endpoints"),
        (name = "apps", description = "App management"),
        (name = "releases", description = "Release lifecycle and artifacts"),
        (name = "analytics", description = "Download analytics"),
        (name = "health", description = "Health and readiness checks"),
    )
)]
pub struct ApiDoc;

/// Build the merged OpenAPI document from all handler modules.
pub fn build_openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.merge(super::handlers::update::UpdateApiDoc::openapi());
    doc.merge(super::handlers::apps::AppsApiDoc::openapi());
    doc.merge(super::handlers::releases::ReleasesApiDoc::openapi());
    doc.merge(super::handlers::analytics::AnalyticsApiDoc::openapi());
    doc.merge(super::handlers::health::HealthApiDoc::openapi());
    doc
}
