//! Release lifecycle service.
//!
//! Owns the draft -> published -> archived state machine. Illegal transitions
//! are reported as conflicts rather than silently ignored so that caller bugs
//! (double publish, archive of archived) surface immediately.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Artifact, Release, ReleaseStatus};
use crate::platform;
use crate::semver::Version;
use crate::store::{Clock, ReleaseStore};

/// Fields accepted when creating a draft release.
#[derive(Debug)]
pub struct NewRelease {
    pub app_id: Uuid,
    pub version: String,
    pub notes: Option<String>,
}

/// Fields accepted when attaching an artifact to a release.
#[derive(Debug)]
pub struct NewArtifact {
    pub platform: String,
    pub signature: String,
    pub download_url: String,
    pub file_size: i64,
    pub checksum: Option<String>,
}

pub struct ReleaseService {
    store: Arc<dyn ReleaseStore>,
    clock: Arc<dyn Clock>,
}

impl ReleaseService {
    pub fn new(store: Arc<dyn ReleaseStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Create a release in `draft`. The version must be semver-valid; the
    /// raw string is stored as submitted.
    pub async fn create_release(&self, new: NewRelease) -> Result<Release> {
        if Version::parse(&new.version).is_none() {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid semantic version",
                new.version
            )));
        }
        if self.store.app_by_id(new.app_id).await?.is_none() {
            return Err(AppError::NotFound(format!("app {}", new.app_id)));
        }

        let now = self.clock.now();
        let release = Release {
            id: Uuid::new_v4(),
            app_id: new.app_id,
            version: new.version,
            notes: new.notes,
            pub_date: None,
            status: ReleaseStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_release(release).await
    }

    /// Publish a draft release, setting `pub_date` exactly once.
    pub async fn publish(&self, release_id: Uuid) -> Result<Release> {
        let mut release = self.require(release_id).await?;
        if release.status != ReleaseStatus::Draft {
            return Err(AppError::Conflict(format!(
                "release {} is {:?} and cannot be published",
                release_id, release.status
            )));
        }

        let now = self.clock.now();
        release.status = ReleaseStatus::Published;
        release.pub_date = Some(now);
        release.updated_at = now;
        self.store.update_release(&release).await?;
        tracing::info!(release_id = %release.id, version = %release.version, "Release published");
        Ok(release)
    }

    /// Archive a draft or published release. Archiving an archived release
    /// is a conflict, mirroring publish's strictness.
    pub async fn archive(&self, release_id: Uuid) -> Result<Release> {
        let mut release = self.require(release_id).await?;
        if release.status == ReleaseStatus::Archived {
            return Err(AppError::Conflict(format!(
                "release {release_id} is already archived"
            )));
        }

        release.status = ReleaseStatus::Archived;
        release.updated_at = self.clock.now();
        self.store.update_release(&release).await?;
        tracing::info!(release_id = %release.id, version = %release.version, "Release archived");
        Ok(release)
    }

    /// Delete a draft release and its artifacts. Published and archived
    /// releases are immutable history: archive them instead.
    pub async fn delete(&self, release_id: Uuid) -> Result<()> {
        let release = self.require(release_id).await?;
        if release.status != ReleaseStatus::Draft {
            return Err(AppError::Conflict(format!(
                "release {} is {:?}; only drafts may be deleted",
                release_id, release.status
            )));
        }
        self.store.delete_release(release_id).await
    }

    /// Attach an artifact to a draft or published release. The platform is
    /// normalized on write so lookups compare canonical ids.
    pub async fn add_artifact(&self, release_id: Uuid, new: NewArtifact) -> Result<Artifact> {
        let release = self.require(release_id).await?;
        if !release.accepts_artifacts() {
            return Err(AppError::Conflict(format!(
                "release {release_id} is archived; no new artifacts may be added"
            )));
        }
        if new.platform.trim().is_empty() {
            return Err(AppError::Validation("platform must not be empty".into()));
        }
        if new.download_url.trim().is_empty() {
            return Err(AppError::Validation("download_url must not be empty".into()));
        }
        if new.file_size < 0 {
            return Err(AppError::Validation("file_size must not be negative".into()));
        }

        let artifact = Artifact {
            id: Uuid::new_v4(),
            release_id,
            platform: platform::normalize(&new.platform),
            signature: new.signature,
            download_url: new.download_url,
            file_size: new.file_size,
            checksum: new.checksum,
            created_at: self.clock.now(),
        };
        self.store.insert_artifact(artifact).await
    }

    /// List artifacts attached to a release.
    pub async fn artifacts(&self, release_id: Uuid) -> Result<Vec<Artifact>> {
        self.require(release_id).await?;
        self.store.artifacts_for_release(release_id).await
    }

    async fn require(&self, release_id: Uuid) -> Result<Release> {
        self.store
            .release_by_id(release_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("release {release_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::App;
    use crate::store::{MemoryStore, SystemClock};
    use chrono::Utc;

    async fn service_with_app() -> (ReleaseService, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let app = store
            .insert_app(App {
                id: Uuid::new_v4(),
                slug: "acme".into(),
                name: "Acme".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let service = ReleaseService::new(store, Arc::new(SystemClock));
        (service, app.id)
    }

    fn artifact_req(platform: &str) -> NewArtifact {
        NewArtifact {
            platform: platform.into(),
            signature: "sig".into(),
            download_url: "https://cdn.example.com/acme.tar.gz".into(),
            file_size: 1024,
            checksum: None,
        }
    }

    #[tokio::test]
    async fn test_create_starts_as_draft() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: Some("first".into()),
            })
            .await
            .unwrap();
        assert_eq!(release.status, ReleaseStatus::Draft);
        assert!(release.pub_date.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_version() {
        let (service, app_id) = service_with_app().await;
        let err = service
            .create_release(NewRelease {
                app_id,
                version: "v1.0".into(),
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_publish_sets_pub_date_once() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();

        let published = service.publish(release.id).await.unwrap();
        assert_eq!(published.status, ReleaseStatus::Published);
        assert!(published.pub_date.is_some());
    }

    #[tokio::test]
    async fn test_double_publish_conflicts() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();
        service.publish(release.id).await.unwrap();
        let err = service.publish(release.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_archive_from_draft_and_published() {
        let (service, app_id) = service_with_app().await;
        for (version, publish_first) in [("1.0.0", false), ("1.1.0", true)] {
            let release = service
                .create_release(NewRelease {
                    app_id,
                    version: version.into(),
                    notes: None,
                })
                .await
                .unwrap();
            if publish_first {
                service.publish(release.id).await.unwrap();
            }
            let archived = service.archive(release.id).await.unwrap();
            assert_eq!(archived.status, ReleaseStatus::Archived);
        }
    }

    #[tokio::test]
    async fn test_archive_of_archived_conflicts() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();
        service.archive(release.id).await.unwrap();
        let err = service.archive(release.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_publish_after_archive_conflicts() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();
        service.archive(release.id).await.unwrap();
        let err = service.publish(release.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_only_from_draft() {
        let (service, app_id) = service_with_app().await;
        let draft = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();
        service.delete(draft.id).await.unwrap();

        let published = service
            .create_release(NewRelease {
                app_id,
                version: "1.1.0".into(),
                notes: None,
            })
            .await
            .unwrap();
        service.publish(published.id).await.unwrap();
        let err = service.delete(published.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_artifacts_attach_until_archived() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();

        // CI attaches to a still-draft release, then publishes.
        service
            .add_artifact(release.id, artifact_req("darwin-universal"))
            .await
            .unwrap();
        service.publish(release.id).await.unwrap();
        service
            .add_artifact(release.id, artifact_req("linux-x86_64"))
            .await
            .unwrap();

        service.archive(release.id).await.unwrap();
        let err = service
            .add_artifact(release.id, artifact_req("windows-x86_64"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_artifact_platform_is_normalized() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();
        let artifact = service
            .add_artifact(release.id, artifact_req("WIN64"))
            .await
            .unwrap();
        assert_eq!(artifact.platform, "windows-x86_64");
    }

    #[tokio::test]
    async fn test_duplicate_platform_conflicts() {
        let (service, app_id) = service_with_app().await;
        let release = service
            .create_release(NewRelease {
                app_id,
                version: "1.0.0".into(),
                notes: None,
            })
            .await
            .unwrap();
        service
            .add_artifact(release.id, artifact_req("win64"))
            .await
            .unwrap();
        let err = service
            .add_artifact(release.id, artifact_req("windows-x86_64"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
