//! Storage seam.
//!
//! The core never talks to a database directly. It consumes two narrow
//! async traits: `ReleaseStore` for apps, releases and artifacts, and
//! `EventSink` for download events. A store implementation may be slow or
//! fail independently; failures surface as `AppError::Store`, never as
//! "not found". The in-memory implementation in `memory` backs the default
//! binary and the test suite.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{App, Artifact, DownloadEvent, Release};

pub use memory::MemoryStore;

/// Repository for apps, releases and their artifacts.
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Look up an app by its public slug.
    async fn app_by_slug(&self, slug: &str) -> Result<Option<App>>;

    /// Look up an app by id.
    async fn app_by_id(&self, id: Uuid) -> Result<Option<App>>;

    /// Insert a new app. Fails with a conflict when the slug is taken.
    async fn insert_app(&self, app: App) -> Result<App>;

    /// List all apps, newest first.
    async fn list_apps(&self) -> Result<Vec<App>>;

    /// Insert a new release. Fails with a conflict when (app_id, version)
    /// already exists.
    async fn insert_release(&self, release: Release) -> Result<Release>;

    /// Look up a release by id.
    async fn release_by_id(&self, id: Uuid) -> Result<Option<Release>>;

    /// Persist updated release fields (status, pub_date, updated_at).
    async fn update_release(&self, release: &Release) -> Result<()>;

    /// Delete a release and, by cascade, its artifacts.
    async fn delete_release(&self, id: Uuid) -> Result<()>;

    /// List all releases for an app, newest created first.
    async fn releases_for_app(&self, app_id: Uuid) -> Result<Vec<Release>>;

    /// List published releases for an app, most recently published first.
    async fn published_releases(&self, app_id: Uuid) -> Result<Vec<Release>>;

    /// Insert a new artifact. Fails with a conflict when
    /// (release_id, platform) already exists.
    async fn insert_artifact(&self, artifact: Artifact) -> Result<Artifact>;

    /// List artifacts belonging to a release.
    async fn artifacts_for_release(&self, release_id: Uuid) -> Result<Vec<Artifact>>;
}

/// Append-only sink and range reader for download events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append one download event.
    async fn record(&self, event: DownloadEvent) -> Result<()>;

    /// Events for an app within an optional closed time range.
    async fn events_for_app(
        &self,
        app_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<DownloadEvent>>;
}

/// Injectable time source so lifecycle timestamps and analytics bucketing
/// are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
