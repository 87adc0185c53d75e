//! Update resolution.
//!
//! Combines the semver engine, the platform normalizer and the release store
//! to answer one question: does this client have an update waiting? The
//! answer is a pure `Decision` value; domain outcomes like "app not found"
//! are decisions, not errors. Only store failures propagate as errors.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Artifact, Release};
use crate::platform;
use crate::semver;
use crate::store::ReleaseStore;

/// Outcome of an update-check query.
#[derive(Debug)]
pub enum Decision {
    /// A newer release with a matching artifact exists.
    Update { release: Release, artifact: Artifact },
    /// No update to hand out, with the reason.
    NoUpdate(NoUpdateReason),
}

/// Why no update was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoUpdateReason {
    /// The app slug is unknown.
    AppNotFound,
    /// A matching artifact exists but the client is already current (or
    /// reported a version we could not parse).
    NoUpdateAvailable,
    /// No published release carries an artifact for this platform, even
    /// after fallbacks.
    NoArtifactForPlatform,
}

pub struct ResolverService {
    store: Arc<dyn ReleaseStore>,
}

impl ResolverService {
    pub fn new(store: Arc<dyn ReleaseStore>) -> Self {
        Self { store }
    }

    /// Resolve one update-check query.
    ///
    /// The candidate is the most recently published release whose artifact
    /// set matches the client platform, trying the exact canonical id first
    /// and then each fallback in chain order. The candidate is handed out
    /// only when its version is strictly newer than the reported one; an
    /// unparseable reported version never yields an update.
    pub async fn resolve(
        &self,
        app_slug: &str,
        raw_target: &str,
        raw_current_version: &str,
    ) -> Result<Decision> {
        let Some(app) = self.store.app_by_slug(app_slug).await? else {
            return Ok(Decision::NoUpdate(NoUpdateReason::AppNotFound));
        };

        let candidates = platform::candidates(raw_target);

        let mut matched: Option<(Release, Artifact)> = None;
        for release in self.store.published_releases(app.id).await? {
            let artifacts = self.store.artifacts_for_release(release.id).await?;
            let hit = candidates.iter().find_map(|platform| {
                artifacts.iter().find(|a| &a.platform == platform).cloned()
            });
            if let Some(artifact) = hit {
                matched = Some((release, artifact));
                break;
            }
        }

        let Some((release, artifact)) = matched else {
            return Ok(Decision::NoUpdate(NoUpdateReason::NoArtifactForPlatform));
        };

        if !semver::is_newer(raw_current_version, &release.version) {
            if semver::Version::parse(raw_current_version).is_none() {
                tracing::debug!(
                    app = app_slug,
                    current_version = raw_current_version,
                    "Client reported an unparseable version; returning no update"
                );
            }
            return Ok(Decision::NoUpdate(NoUpdateReason::NoUpdateAvailable));
        }

        Ok(Decision::Update { release, artifact })
    }
}
