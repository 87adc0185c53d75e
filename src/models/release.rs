//! Release and artifact models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a release.
///
/// Transitions are `draft -> published -> archived` plus the direct
/// `draft -> archived` shortcut. `archived` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Draft,
    Published,
    Archived,
}

/// A versioned release of an application. Unique per (app_id, version).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Release {
    pub id: Uuid,
    pub app_id: Uuid,
    /// Raw semver-valid version string as submitted at creation.
    pub version: String,
    pub notes: Option<String>,
    /// Set exactly once, at the draft -> published transition.
    pub pub_date: Option<DateTime<Utc>>,
    pub status: ReleaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Release {
    /// Whether new artifacts may still be attached to this release.
    pub fn accepts_artifacts(&self) -> bool {
        self.status != ReleaseStatus::Archived
    }
}

/// A per-platform binary belonging to a release. Unique per
/// (release_id, platform); deleted with its owning release.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Artifact {
    pub id: Uuid,
    pub release_id: Uuid,
    /// Canonical platform id (see `crate::platform`).
    pub platform: String,
    /// Updater signature as produced by the build pipeline. Stored, not
    /// verified.
    pub signature: String,
    pub download_url: String,
    pub file_size: i64,
    pub checksum: Option<String>,
    pub created_at: DateTime<Utc>,
}
