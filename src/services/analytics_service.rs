//! Download analytics.
//!
//! Write path: append one `DownloadEvent` per served download, dispatched on
//! a detached task so a slow or failing sink never touches the update-check
//! response. Read path: grouped counts and gap-filled time series suitable
//! for charting without client-side interpolation.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::DownloadEvent;
use crate::store::{Clock, EventSink};

/// Time-series query period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Last24h,
    Last7d,
    Last30d,
    Last90d,
}

impl Period {
    /// Bucket width in seconds: hourly for 24h, daily otherwise.
    fn bucket_secs(self) -> i64 {
        match self {
            Period::Last24h => 3600,
            _ => 86_400,
        }
    }

    /// Number of buckets in the series. The last bucket is the truncated
    /// current hour/day, so a 24h series has exactly 24 points.
    fn bucket_count(self) -> i64 {
        match self {
            Period::Last24h => 24,
            Period::Last7d => 7,
            Period::Last30d => 30,
            Period::Last90d => 90,
        }
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "24h" => Ok(Period::Last24h),
            "7d" => Ok(Period::Last7d),
            "30d" => Ok(Period::Last30d),
            "90d" => Ok(Period::Last90d),
            other => Err(AppError::Validation(format!(
                "invalid period '{other}' (expected 24h, 7d, 30d or 90d)"
            ))),
        }
    }
}

/// Downloads for one version.
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionCount {
    pub version: String,
    pub count: u64,
}

/// Downloads for one platform.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlatformCount {
    pub platform: String,
    pub count: u64,
}

/// Downloads for one country.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

/// Grouped download counts for an app.
#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadStats {
    pub total_downloads: u64,
    pub by_version: Vec<VersionCount>,
    pub by_platform: Vec<PlatformCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_country: Option<Vec<CountryCount>>,
}

/// One bucket of a download time series. `timestamp` is the bucket start.
#[derive(Debug, Serialize, ToSchema)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
}

pub struct AnalyticsService {
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl AnalyticsService {
    pub fn new(events: Arc<dyn EventSink>, clock: Arc<dyn Clock>) -> Self {
        Self { events, clock }
    }

    /// Append one download event.
    pub async fn record(&self, event: DownloadEvent) -> Result<()> {
        self.events.record(event).await
    }

    /// Record a download on a detached task: best-effort, at-most-once.
    /// Failures are logged and discarded, never propagated or retried.
    pub fn record_detached(self: &Arc<Self>, event: DownloadEvent) {
        let service = self.clone();
        tokio::spawn(async move {
            let artifact_id = event.artifact_id;
            if let Err(error) = service.record(event).await {
                tracing::warn!(%artifact_id, %error, "Failed to record download event");
            }
        });
    }

    /// Grouped download counts over an optionally date-bounded event set.
    pub async fn stats(
        &self,
        app_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        include_countries: bool,
    ) -> Result<DownloadStats> {
        let events = self.events.events_for_app(app_id, from, to).await?;

        let mut by_version: HashMap<String, u64> = HashMap::new();
        let mut by_platform: HashMap<String, u64> = HashMap::new();
        let mut by_country: HashMap<String, u64> = HashMap::new();
        for event in &events {
            *by_version.entry(event.version.clone()).or_default() += 1;
            *by_platform.entry(event.platform.clone()).or_default() += 1;
            if let Some(country) = &event.ip_country {
                *by_country.entry(country.clone()).or_default() += 1;
            }
        }

        Ok(DownloadStats {
            total_downloads: events.len() as u64,
            by_version: sorted(by_version)
                .map(|(version, count)| VersionCount { version, count })
                .collect(),
            by_platform: sorted(by_platform)
                .map(|(platform, count)| PlatformCount { platform, count })
                .collect(),
            by_country: include_countries.then(|| {
                sorted(by_country)
                    .map(|(country, count)| CountryCount { country, count })
                    .collect()
            }),
        })
    }

    /// Gap-filled download time series for an app.
    ///
    /// The series is contiguous and evenly spaced: one point per bucket,
    /// keyed by bucket start, with empty buckets materialized at zero. The
    /// last bucket is the truncated current hour (24h) or day (7d/30d/90d).
    pub async fn time_series(&self, app_id: Uuid, period: Period) -> Result<Vec<TimeSeriesPoint>> {
        let bucket_secs = period.bucket_secs();
        let bucket_count = period.bucket_count();

        let now = self.clock.now();
        let last_bucket = truncate(now, bucket_secs);
        let first_bucket = last_bucket - Duration::seconds(bucket_secs * (bucket_count - 1));

        let events = self
            .events
            .events_for_app(app_id, Some(first_bucket), Some(now))
            .await?;

        let mut counts: HashMap<i64, u64> = HashMap::new();
        for event in &events {
            let bucket = truncate(event.downloaded_at, bucket_secs).timestamp();
            *counts.entry(bucket).or_default() += 1;
        }

        let mut series = Vec::with_capacity(bucket_count as usize);
        for i in 0..bucket_count {
            let bucket = first_bucket + Duration::seconds(bucket_secs * i);
            series.push(TimeSeriesPoint {
                timestamp: bucket,
                count: counts.get(&bucket.timestamp()).copied().unwrap_or(0),
            });
        }
        Ok(series)
    }
}

/// Truncate a timestamp down to a bucket boundary (UTC).
fn truncate(at: DateTime<Utc>, bucket_secs: i64) -> DateTime<Utc> {
    let secs = at.timestamp();
    let start = secs - secs.rem_euclid(bucket_secs);
    DateTime::from_timestamp(start, 0).unwrap_or(at)
}

/// Highest counts first, ties broken by key for deterministic output.
fn sorted(map: HashMap<String, u64>) -> impl Iterator<Item = (String, u64)> {
    let mut entries: Vec<(String, u64)> = map.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DownloadType;
    use crate::store::MemoryStore;

    /// Fixed clock so bucket boundaries are stable under test.
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn event(app_id: Uuid, version: &str, platform: &str, country: Option<&str>, at: DateTime<Utc>) -> DownloadEvent {
        DownloadEvent {
            id: Uuid::new_v4(),
            artifact_id: Uuid::new_v4(),
            app_id,
            platform: platform.into(),
            version: version.into(),
            ip_country: country.map(Into::into),
            download_type: DownloadType::Update,
            downloaded_at: at,
        }
    }

    fn service_at(now: DateTime<Utc>) -> (Arc<MemoryStore>, AnalyticsService) {
        let store = Arc::new(MemoryStore::new());
        let service = AnalyticsService::new(store.clone(), Arc::new(FixedClock(now)));
        (store, service)
    }

    fn t(text: &str) -> DateTime<Utc> {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn test_stats_groups_counts() {
        let now = t("2025-06-15T12:30:00Z");
        let (store, service) = service_at(now);
        let app_id = Uuid::new_v4();
        store.record(event(app_id, "1.0.0", "linux-x86_64", Some("DE"), now)).await.unwrap();
        store.record(event(app_id, "1.0.0", "darwin-universal", Some("DE"), now)).await.unwrap();
        store.record(event(app_id, "1.1.0", "linux-x86_64", None, now)).await.unwrap();

        let stats = service.stats(app_id, None, None, true).await.unwrap();
        assert_eq!(stats.total_downloads, 3);
        assert_eq!(stats.by_version[0].version, "1.0.0");
        assert_eq!(stats.by_version[0].count, 2);
        assert_eq!(stats.by_platform[0].platform, "linux-x86_64");
        assert_eq!(stats.by_platform[0].count, 2);
        let countries = stats.by_country.unwrap();
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].country, "DE");
        assert_eq!(countries[0].count, 2);
    }

    #[tokio::test]
    async fn test_stats_omits_countries_unless_requested() {
        let now = t("2025-06-15T12:30:00Z");
        let (store, service) = service_at(now);
        let app_id = Uuid::new_v4();
        store.record(event(app_id, "1.0.0", "linux-x86_64", Some("US"), now)).await.unwrap();

        let stats = service.stats(app_id, None, None, false).await.unwrap();
        assert!(stats.by_country.is_none());
    }

    #[tokio::test]
    async fn test_stats_respects_date_bounds() {
        let now = t("2025-06-15T12:00:00Z");
        let (store, service) = service_at(now);
        let app_id = Uuid::new_v4();
        store.record(event(app_id, "1.0.0", "linux-x86_64", None, t("2025-06-01T00:00:00Z"))).await.unwrap();
        store.record(event(app_id, "1.1.0", "linux-x86_64", None, t("2025-06-10T00:00:00Z"))).await.unwrap();

        let stats = service
            .stats(app_id, Some(t("2025-06-05T00:00:00Z")), None, false)
            .await
            .unwrap();
        assert_eq!(stats.total_downloads, 1);
        assert_eq!(stats.by_version[0].version, "1.1.0");
    }

    #[tokio::test]
    async fn test_time_series_24h_empty_is_24_zero_points() {
        let now = t("2025-06-15T12:30:00Z");
        let (_store, service) = service_at(now);

        let series = service
            .time_series(Uuid::new_v4(), Period::Last24h)
            .await
            .unwrap();
        assert_eq!(series.len(), 24);
        assert!(series.iter().all(|p| p.count == 0));
        // Evenly spaced one hour apart, ending at the truncated current hour.
        for pair in series.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(1));
        }
        assert_eq!(series[23].timestamp, t("2025-06-15T12:00:00Z"));
    }

    #[tokio::test]
    async fn test_time_series_buckets_events_by_hour() {
        let now = t("2025-06-15T12:30:00Z");
        let (store, service) = service_at(now);
        let app_id = Uuid::new_v4();
        store.record(event(app_id, "1.0.0", "linux-x86_64", None, t("2025-06-15T12:10:00Z"))).await.unwrap();
        store.record(event(app_id, "1.0.0", "linux-x86_64", None, t("2025-06-15T12:20:00Z"))).await.unwrap();
        store.record(event(app_id, "1.0.0", "linux-x86_64", None, t("2025-06-15T09:59:00Z"))).await.unwrap();

        let series = service.time_series(app_id, Period::Last24h).await.unwrap();
        let by_ts: HashMap<_, _> = series.iter().map(|p| (p.timestamp, p.count)).collect();
        assert_eq!(by_ts[&t("2025-06-15T12:00:00Z")], 2);
        assert_eq!(by_ts[&t("2025-06-15T09:00:00Z")], 1);
        assert_eq!(by_ts[&t("2025-06-15T11:00:00Z")], 0);
    }

    #[tokio::test]
    async fn test_time_series_7d_uses_daily_buckets() {
        let now = t("2025-06-15T12:30:00Z");
        let (store, service) = service_at(now);
        let app_id = Uuid::new_v4();
        store.record(event(app_id, "1.0.0", "linux-x86_64", None, t("2025-06-14T23:59:00Z"))).await.unwrap();
        store.record(event(app_id, "1.0.0", "linux-x86_64", None, t("2025-06-14T00:00:00Z"))).await.unwrap();

        let series = service.time_series(app_id, Period::Last7d).await.unwrap();
        assert_eq!(series.len(), 7);
        assert_eq!(series[6].timestamp, t("2025-06-15T00:00:00Z"));
        let by_ts: HashMap<_, _> = series.iter().map(|p| (p.timestamp, p.count)).collect();
        assert_eq!(by_ts[&t("2025-06-14T00:00:00Z")], 2);
    }

    #[tokio::test]
    async fn test_events_outside_period_excluded() {
        let now = t("2025-06-15T12:30:00Z");
        let (store, service) = service_at(now);
        let app_id = Uuid::new_v4();
        store.record(event(app_id, "1.0.0", "linux-x86_64", None, t("2025-06-13T12:00:00Z"))).await.unwrap();

        let series = service.time_series(app_id, Period::Last24h).await.unwrap();
        assert!(series.iter().all(|p| p.count == 0));
    }

    #[tokio::test]
    async fn test_record_detached_swallows_and_logs() {
        // A detached record against a working sink eventually lands.
        let now = t("2025-06-15T12:30:00Z");
        let (store, service) = service_at(now);
        let service = Arc::new(service);
        let app_id = Uuid::new_v4();
        service.record_detached(event(app_id, "1.0.0", "linux-x86_64", None, now));

        for _ in 0..50 {
            tokio::task::yield_now().await;
            if !store.events_for_app(app_id, None, None).await.unwrap().is_empty() {
                return;
            }
        }
        panic!("detached record never landed");
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("24h".parse::<Period>().unwrap(), Period::Last24h);
        assert_eq!("7d".parse::<Period>().unwrap(), Period::Last7d);
        assert_eq!("30d".parse::<Period>().unwrap(), Period::Last30d);
        assert_eq!("90d".parse::<Period>().unwrap(), Period::Last90d);
        assert!("1y".parse::<Period>().is_err());
    }
}
