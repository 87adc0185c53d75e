//! In-memory store implementation.
//!
//! Backs the default binary and the test suite. All collections live behind
//! a single `tokio::sync::RwLock`; throughput is not a concern here since a
//! production deployment swaps in a SQL-backed implementation of the same
//! traits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{App, Artifact, DownloadEvent, Release, ReleaseStatus};

use super::{EventSink, ReleaseStore};

#[derive(Default)]
struct Tables {
    apps: HashMap<Uuid, App>,
    releases: HashMap<Uuid, Release>,
    artifacts: HashMap<Uuid, Artifact>,
    events: Vec<DownloadEvent>,
}

/// In-memory `ReleaseStore` + `EventSink`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReleaseStore for MemoryStore {
    async fn app_by_slug(&self, slug: &str) -> Result<Option<App>> {
        let tables = self.tables.read().await;
        Ok(tables.apps.values().find(|a| a.slug == slug).cloned())
    }

    async fn app_by_id(&self, id: Uuid) -> Result<Option<App>> {
        let tables = self.tables.read().await;
        Ok(tables.apps.get(&id).cloned())
    }

    async fn insert_app(&self, app: App) -> Result<App> {
        let mut tables = self.tables.write().await;
        if tables.apps.values().any(|a| a.slug == app.slug) {
            return Err(AppError::Conflict(format!(
                "app slug '{}' already exists",
                app.slug
            )));
        }
        tables.apps.insert(app.id, app.clone());
        Ok(app)
    }

    async fn list_apps(&self) -> Result<Vec<App>> {
        let tables = self.tables.read().await;
        let mut apps: Vec<App> = tables.apps.values().cloned().collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn insert_release(&self, release: Release) -> Result<Release> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .releases
            .values()
            .any(|r| r.app_id == release.app_id && r.version == release.version);
        if duplicate {
            return Err(AppError::Conflict(format!(
                "release {} already exists for this app",
                release.version
            )));
        }
        tables.releases.insert(release.id, release.clone());
        Ok(release)
    }

    async fn release_by_id(&self, id: Uuid) -> Result<Option<Release>> {
        let tables = self.tables.read().await;
        Ok(tables.releases.get(&id).cloned())
    }

    async fn update_release(&self, release: &Release) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.releases.get_mut(&release.id) {
            Some(stored) => {
                *stored = release.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("release {}", release.id))),
        }
    }

    async fn delete_release(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.releases.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("release {id}")));
        }
        // Cascade: artifacts are owned by exactly one release.
        tables.artifacts.retain(|_, a| a.release_id != id);
        Ok(())
    }

    async fn releases_for_app(&self, app_id: Uuid) -> Result<Vec<Release>> {
        let tables = self.tables.read().await;
        let mut releases: Vec<Release> = tables
            .releases
            .values()
            .filter(|r| r.app_id == app_id)
            .cloned()
            .collect();
        releases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(releases)
    }

    async fn published_releases(&self, app_id: Uuid) -> Result<Vec<Release>> {
        let tables = self.tables.read().await;
        let mut releases: Vec<Release> = tables
            .releases
            .values()
            .filter(|r| r.app_id == app_id && r.status == ReleaseStatus::Published)
            .cloned()
            .collect();
        releases.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        Ok(releases)
    }

    async fn insert_artifact(&self, artifact: Artifact) -> Result<Artifact> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .artifacts
            .values()
            .any(|a| a.release_id == artifact.release_id && a.platform == artifact.platform);
        if duplicate {
            return Err(AppError::Conflict(format!(
                "artifact for platform '{}' already exists on this release",
                artifact.platform
            )));
        }
        tables.artifacts.insert(artifact.id, artifact.clone());
        Ok(artifact)
    }

    async fn artifacts_for_release(&self, release_id: Uuid) -> Result<Vec<Artifact>> {
        let tables = self.tables.read().await;
        let mut artifacts: Vec<Artifact> = tables
            .artifacts
            .values()
            .filter(|a| a.release_id == release_id)
            .cloned()
            .collect();
        artifacts.sort_by(|a, b| a.platform.cmp(&b.platform));
        Ok(artifacts)
    }
}

#[async_trait]
impl EventSink for MemoryStore {
    async fn record(&self, event: DownloadEvent) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.events.push(event);
        Ok(())
    }

    async fn events_for_app(
        &self,
        app_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<DownloadEvent>> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|e| {
                e.app_id == app_id
                    && from.is_none_or(|f| e.downloaded_at >= f)
                    && to.is_none_or(|t| e.downloaded_at <= t)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(slug: &str) -> App {
        App {
            id: Uuid::new_v4(),
            slug: slug.into(),
            name: slug.into(),
            created_at: Utc::now(),
        }
    }

    fn release(app_id: Uuid, version: &str) -> Release {
        let now = Utc::now();
        Release {
            id: Uuid::new_v4(),
            app_id,
            version: version.into(),
            notes: None,
            pub_date: None,
            status: ReleaseStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = MemoryStore::new();
        store.insert_app(app("acme")).await.unwrap();
        let err = store.insert_app(app("acme")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_version_conflicts() {
        let store = MemoryStore::new();
        let owner = store.insert_app(app("acme")).await.unwrap();
        store.insert_release(release(owner.id, "1.0.0")).await.unwrap();
        let err = store
            .insert_release(release(owner.id, "1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_release_cascades_artifacts() {
        let store = MemoryStore::new();
        let owner = store.insert_app(app("acme")).await.unwrap();
        let rel = store.insert_release(release(owner.id, "1.0.0")).await.unwrap();
        store
            .insert_artifact(Artifact {
                id: Uuid::new_v4(),
                release_id: rel.id,
                platform: "linux-x86_64".into(),
                signature: "sig".into(),
                download_url: "https://example.com/a".into(),
                file_size: 1,
                checksum: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        store.delete_release(rel.id).await.unwrap();
        assert!(store.artifacts_for_release(rel.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_published_releases_ordered_by_pub_date() {
        let store = MemoryStore::new();
        let owner = store.insert_app(app("acme")).await.unwrap();

        let mut older = release(owner.id, "1.0.0");
        older.status = ReleaseStatus::Published;
        older.pub_date = Some(Utc::now() - chrono::Duration::days(2));
        let mut newer = release(owner.id, "1.1.0");
        newer.status = ReleaseStatus::Published;
        newer.pub_date = Some(Utc::now());
        store.insert_release(older).await.unwrap();
        store.insert_release(newer).await.unwrap();
        store.insert_release(release(owner.id, "2.0.0")).await.unwrap(); // draft

        let published = store.published_releases(owner.id).await.unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].version, "1.1.0");
        assert_eq!(published[1].version, "1.0.0");
    }
}
