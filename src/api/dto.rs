//! Request and response DTOs for the admin and public APIs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Update-check response body. Field names and shape are consumed verbatim
/// by shipped desktop clients; do not rename.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateResponse {
    pub version: String,
    pub notes: String,
    /// RFC 3339 publication timestamp.
    pub pub_date: Option<String>,
    pub url: String,
    pub signature: String,
}

/// Request body for creating an app.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppRequest {
    pub slug: String,
    pub name: String,
}

/// Request body for creating a draft release.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReleaseRequest {
    pub version: String,
    pub notes: Option<String>,
}

/// Request body for attaching an artifact to a release.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateArtifactRequest {
    pub platform: String,
    pub signature: String,
    pub url: String,
    pub file_size: i64,
    pub checksum: Option<String>,
}
