use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use saddlery_analytics::{
    build_dashboard, build_export, export_filename, parse_period_days, render_export,
    AnalyticsResponse, ExportFormat,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_analytics_error, ApiError, AppState};

const FETCH_FAILED: &str = "Failed to fetch analytics data";
const EXPORT_FAILED: &str = "Failed to export analytics data";

/// `period` is kept as text so a malformed value falls back to the default
/// window instead of failing extraction.
#[derive(Debug, Deserialize)]
pub(super) struct AnalyticsQuery {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExportQuery {
    pub period: Option<String>,
    pub format: Option<String>,
}

pub(super) async fn get_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let period_days = parse_period_days(query.period.as_deref());

    let response = build_dashboard(&state.pool, period_days, Utc::now())
        .await
        .map_err(|e| map_analytics_error(req_id.0.clone(), &e, FETCH_FAILED))?;

    Ok(Json(response))
}

pub(super) async fn export_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let period_days = parse_period_days(query.period.as_deref());
    let format = ExportFormat::parse(query.format.as_deref());
    let now = Utc::now();

    let report = build_export(&state.pool, period_days, now)
        .await
        .map_err(|e| map_analytics_error(req_id.0.clone(), &e, EXPORT_FAILED))?;
    let body = render_export(&report, format)
        .map_err(|e| map_analytics_error(req_id.0.clone(), &e, EXPORT_FAILED))?;

    let disposition = format!("attachment; filename=\"{}\"", export_filename(format, now));

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
