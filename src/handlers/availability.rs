use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::time::parse_date;
use crate::models::{AvailabilityResult, ResourceFreeIntervals};
use crate::services::scheduling::{
    check_availability, free_intervals_for_date, resolve_weekday_to_date, AvailabilityQuery,
};
use crate::state::AppState;

// POST /api/availability
pub async fn check(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(query): Json<AvailabilityQuery>,
) -> Result<Json<AvailabilityResult>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let result = check_availability(
        &state.repository,
        &state.scheduling,
        state.staff_picker.as_ref(),
        &query,
    )
    .await?;

    Ok(Json(result))
}

// GET /api/availability/free-intervals?date=
#[derive(Deserialize)]
pub struct DateQuery {
    date: String,
}

pub async fn free_intervals(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> Result<Json<ResourceFreeIntervals>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let date = parse_date(&query.date)?;
    let free = free_intervals_for_date(&state.repository, &state.scheduling, date).await?;
    Ok(Json(free))
}

// GET /api/weekday?weekday=&week_offset=
#[derive(Deserialize)]
pub struct WeekdayQuery {
    weekday: String,
    week_offset: Option<u32>,
}

pub async fn resolve_weekday(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<WeekdayQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let today = chrono::Local::now().date_naive();
    let date = resolve_weekday_to_date(&query.weekday, query.week_offset.unwrap_or(1), today)?;
    Ok(Json(serde_json::json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "weekday": date.format("%A").to_string(),
    })))
}
