//! Application model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A published desktop application whose releases this server distributes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct App {
    pub id: Uuid,
    /// URL-safe identifier used in the public update-check route.
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
