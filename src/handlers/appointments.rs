use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::{AppError, SchedulingError};
use crate::handlers::check_auth;
use crate::models::{Appointment, AppointmentStatus, TimeOfDay};
use crate::services::booking::{BookingOutcome, BookingRequest};
use crate::state::AppState;

fn outcome_status(outcome: &BookingOutcome) -> StatusCode {
    match outcome {
        BookingOutcome::Booked { .. } => StatusCode::CREATED,
        BookingOutcome::RoomWithoutStaff { .. } | BookingOutcome::Unavailable => {
            StatusCode::CONFLICT
        }
    }
}

// GET /api/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    status: Option<String>,
    customer_phone: Option<String>,
    limit: Option<i64>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(AppointmentStatus::parse(raw).ok_or_else(|| {
            SchedulingError::Format(format!("unknown appointment status: {raw:?}"))
        })?),
        None => None,
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    let appointments = state.repository.list_appointments(
        status,
        query.customer_phone.as_deref(),
        limit,
    )?;
    Ok(Json(appointments))
}

// GET /api/appointments/:id
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    state
        .repository
        .get_appointment(&id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))
}

// POST /api/appointments
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingOutcome>), AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let outcome = state.bookings().book(&request).await?;
    Ok((outcome_status(&outcome), Json(outcome)))
}

// POST /api/appointments/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let appointment = state.bookings().cancel(&id).await?;
    Ok(Json(appointment))
}

// POST /api/appointments/:id/reschedule
#[derive(Deserialize)]
pub struct RescheduleRequest {
    date: NaiveDate,
    start_time: TimeOfDay,
}

pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<(StatusCode, Json<BookingOutcome>), AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let outcome = state
        .bookings()
        .reschedule(&id, request.date, request.start_time)
        .await?;
    let status = match outcome {
        BookingOutcome::Booked { .. } => StatusCode::OK,
        _ => outcome_status(&outcome),
    };
    Ok((status, Json(outcome)))
}
