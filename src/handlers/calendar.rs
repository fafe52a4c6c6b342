use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::repository::SchedulingRepository;
use crate::errors::AppError;
use crate::services::calendar::{generate_ics, CalendarLabels};
use crate::state::AppState;

// GET /calendar/:id.ics
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let appointment_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let appointment = state
        .repository
        .get_appointment(appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    let (rooms, staff) = tokio::try_join!(state.repository.rooms(), state.repository.staff())?;
    let room_name = rooms
        .get(&appointment.room_id)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| format!("Room {}", appointment.room_id));
    // inactive staff drop out of the roster but keep their appointments
    let staff_name = staff
        .get(&appointment.staff_id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("Staff {}", appointment.staff_id));

    let ics = generate_ics(
        &appointment,
        &CalendarLabels {
            business_name: &state.config.business_name,
            room_name: &room_name,
            staff_name: &staff_name,
        },
    );
    let filename = format!("appointment-{appointment_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
