//! Download analytics handlers.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::services::analytics_service::{DownloadStats, Period, TimeSeriesPoint};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/apps/:app_id/analytics/stats", get(get_stats))
        .route("/apps/:app_id/analytics/timeseries", get(get_time_series))
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct StatsQuery {
    /// RFC 3339 lower bound (inclusive).
    pub from: Option<String>,
    /// RFC 3339 upper bound (inclusive).
    pub to: Option<String>,
    /// Include the per-country breakdown.
    pub include_countries: Option<bool>,
}

impl StatsQuery {
    fn parse_bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let parse = |field: &Option<String>, name: &str| -> Result<Option<DateTime<Utc>>> {
            field
                .as_deref()
                .map(|s| {
                    s.parse::<DateTime<Utc>>().map_err(|_| {
                        AppError::Validation(format!("'{name}' is not an RFC 3339 timestamp"))
                    })
                })
                .transpose()
        };
        Ok((parse(&self.from, "from")?, parse(&self.to, "to")?))
    }
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct TimeSeriesQuery {
    /// One of 24h, 7d, 30d, 90d.
    pub period: Option<String>,
}

/// GET /api/v1/apps/{app_id}/analytics/stats
#[utoipa::path(
    get,
    path = "/apps/{app_id}/analytics/stats",
    context_path = "/api/v1",
    tag = "analytics",
    params(("app_id" = Uuid, Path, description = "App ID"), StatsQuery),
    responses(
        (status = 200, description = "Grouped download counts", body = DownloadStats),
        (status = 404, description = "Unknown app"),
    )
)]
pub async fn get_stats(
    State(state): State<SharedState>,
    Path(app_id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DownloadStats>> {
    require_app(&state, app_id).await?;
    let (from, to) = query.parse_bounds()?;
    let stats = state
        .analytics
        .stats(app_id, from, to, query.include_countries.unwrap_or(false))
        .await?;
    Ok(Json(stats))
}

/// GET /api/v1/apps/{app_id}/analytics/timeseries
#[utoipa::path(
    get,
    path = "/apps/{app_id}/analytics/timeseries",
    context_path = "/api/v1",
    tag = "analytics",
    params(("app_id" = Uuid, Path, description = "App ID"), TimeSeriesQuery),
    responses(
        (status = 200, description = "Gap-filled download time series", body = Vec<TimeSeriesPoint>),
        (status = 400, description = "Invalid period"),
        (status = 404, description = "Unknown app"),
    )
)]
pub async fn get_time_series(
    State(state): State<SharedState>,
    Path(app_id): Path<Uuid>,
    Query(query): Query<TimeSeriesQuery>,
) -> Result<Json<Vec<TimeSeriesPoint>>> {
    require_app(&state, app_id).await?;
    let period: Period = query.period.as_deref().unwrap_or("7d").parse()?;
    Ok(Json(state.analytics.time_series(app_id, period).await?))
}

async fn require_app(state: &SharedState, app_id: Uuid) -> Result<()> {
    if state.store.app_by_id(app_id).await?.is_none() {
        return Err(AppError::NotFound(format!("app {app_id}")));
    }
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(get_stats, get_time_series),
    components(schemas(
        StatsQuery,
        TimeSeriesQuery,
        DownloadStats,
        TimeSeriesPoint,
        crate::services::analytics_service::VersionCount,
        crate::services::analytics_service::PlatformCount,
        crate::services::analytics_service::CountryCount,
    ))
)]
pub struct AnalyticsApiDoc;
