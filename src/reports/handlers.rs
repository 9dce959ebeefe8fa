use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    dto::{ReportQuery, ReportResponse, VolumeResponse},
    services::{build_report, monthly_window, yearly_volume, yearly_window, TypeFilter, YearRange},
};
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/monthly", get(monthly_report))
        .route("/reports/yearly", get(yearly_report))
        .route("/fun-facts/yearly-volume", get(yearly_volume_fact))
}

#[instrument(skip(state))]
pub async fn monthly_report(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Query(q) = query?;
    let range = YearRange::current(&state.config.reports);
    let window = monthly_window(q.year.as_deref(), q.month.as_deref(), range)?;
    let filter = TypeFilter::parse(q.coffee_type.as_deref(), &state.catalog)?;

    let report = build_report(&state, auth.user_id, window, filter).await?;
    debug!(user_id = %auth.user_id, total = report.total_coffees, "monthly report built");
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn yearly_report(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Query(q) = query?;
    let range = YearRange::current(&state.config.reports);
    let window = yearly_window(q.year.as_deref(), range)?;
    let filter = TypeFilter::parse(q.coffee_type.as_deref(), &state.catalog)?;

    let report = build_report(&state, auth.user_id, window, filter).await?;
    debug!(user_id = %auth.user_id, total = report.total_coffees, "yearly report built");
    Ok(Json(report))
}

#[instrument(skip(state))]
pub async fn yearly_volume_fact(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<VolumeResponse>, ApiError> {
    let Query(q) = query?;
    let range = YearRange::current(&state.config.reports);
    let year = yearly_window(q.year.as_deref(), range)?.year();

    let total_volume_ml = yearly_volume(&state, auth.user_id, year).await?;
    Ok(Json(VolumeResponse {
        year,
        total_volume_ml,
    }))
}
