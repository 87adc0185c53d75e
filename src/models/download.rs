//! Download event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// What kind of download an event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DownloadType {
    /// An update served through the update-check endpoint.
    Update,
    /// A fresh installer download.
    Installer,
}

/// Append-only record of a single download. Never mutated after the fact;
/// retention is owned by the backing store.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DownloadEvent {
    pub id: Uuid,
    pub artifact_id: Uuid,
    pub app_id: Uuid,
    pub platform: String,
    pub version: String,
    /// Two-letter country code from the edge, when available.
    pub ip_country: Option<String>,
    pub download_type: DownloadType,
    pub downloaded_at: DateTime<Utc>,
}
