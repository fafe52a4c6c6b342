use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::db::repository::SchedulingRepository;
use crate::errors::AppError;
use crate::handlers::check_auth;
use crate::models::{Room, SpaService, Staff, StaffId};
use crate::state::AppState;

// GET /api/rooms
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Room>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let rooms = state.repository.rooms().await?;
    Ok(Json(rooms.into_values().collect()))
}

// GET /api/staff
pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Staff>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let staff = state.repository.staff().await?;
    Ok(Json(staff.into_values().collect()))
}

// POST /api/staff/:id/active
#[derive(Deserialize)]
pub struct StaffActiveBody {
    active: bool,
}

pub async fn set_staff_active(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StaffActiveBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    if !state.repository.set_staff_active(StaffId(id), body.active)? {
        return Err(AppError::NotFound(format!("staff {id}")));
    }

    tracing::info!(staff_id = id, active = body.active, "staff availability changed");
    Ok(Json(serde_json::json!({ "id": id, "active": body.active })))
}

// GET /api/services?q=
#[derive(Deserialize)]
pub struct ServicesQuery {
    q: Option<String>,
}

pub async fn list_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ServicesQuery>,
) -> Result<Json<Vec<SpaService>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let services = state.repository.list_services(query.q.as_deref())?;
    Ok(Json(services))
}
