use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::repository::{SchedulingRepository, SlotTaken, SqliteRepository};
use crate::errors::SchedulingError;
use crate::models::service::total_duration;
use crate::models::{
    Appointment, AppointmentStatus, AvailabilityResult, Interval, NewAppointment, RoomId, StaffId,
    TimeOfDay,
};
use crate::services::scheduling::{
    check_availability, AvailabilityQuery, SchedulingSettings, StaffPicker,
};

/// Attempts per booking before a contended slot is reported as unavailable.
pub const MAX_BOOKING_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub customer_name: String,
    pub customer_phone: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub duration_minutes: Option<u32>,
    pub party_size: Option<u32>,
    #[serde(default)]
    pub service_ids: Vec<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookingOutcome {
    Booked { appointment: Appointment },
    /// A room fits the window but no staff member is free to work it.
    RoomWithoutStaff { room_id: RoomId, room_name: String },
    Unavailable,
}

/// What to do with a room and staff member the engine settled on.
enum Claim {
    Done(Appointment),
    Contended,
}

pub struct BookingService<'a> {
    repo: &'a SqliteRepository,
    settings: &'a SchedulingSettings,
    picker: &'a dyn StaffPicker,
}

impl<'a> BookingService<'a> {
    pub fn new(
        repo: &'a SqliteRepository,
        settings: &'a SchedulingSettings,
        picker: &'a dyn StaffPicker,
    ) -> Self {
        Self {
            repo,
            settings,
            picker,
        }
    }

    pub async fn book(&self, request: &BookingRequest) -> Result<BookingOutcome, SchedulingError> {
        if request.customer_name.trim().is_empty() || request.customer_phone.trim().is_empty() {
            return Err(SchedulingError::InvalidRequest(
                "customer name and phone are required".to_string(),
            ));
        }

        let duration = match request.duration_minutes.filter(|m| *m > 0) {
            Some(minutes) => Some(minutes),
            None => self.services_duration(&request.service_ids)?,
        };

        let query = AvailabilityQuery {
            start_time: Some(request.start_time),
            duration_minutes: duration,
            party_size: request.party_size,
            ..AvailabilityQuery::for_date(request.date)
        };

        self.claim_with_retries(&query, |room_id, staff_id, interval| {
            let new = NewAppointment {
                customer_name: request.customer_name.trim().to_string(),
                customer_phone: request.customer_phone.trim().to_string(),
                room_id,
                staff_id,
                booking_date: request.date,
                interval,
                party_size: query.party_size(),
                note: request.note.clone(),
                service_ids: request.service_ids.clone(),
            };
            async move {
                match self.repo.create_appointment(&new).await {
                    Ok(appointment) => {
                        tracing::info!(
                            appointment_id = %appointment.id,
                            room_id = %room_id,
                            staff_id = %staff_id,
                            date = %new.booking_date,
                            "appointment booked"
                        );
                        Ok(Claim::Done(appointment))
                    }
                    Err(e) if e.downcast_ref::<SlotTaken>().is_some() => Ok(Claim::Contended),
                    Err(e) => Err(SchedulingError::Repository(e)),
                }
            }
        })
        .await
    }

    pub async fn cancel(&self, id: &str) -> Result<Appointment, SchedulingError> {
        let cancelled = self
            .repo
            .set_status(id, AppointmentStatus::Cancelled)
            .map_err(SchedulingError::Repository)?;

        let appointment = self.load(id)?;
        if !cancelled {
            return Err(SchedulingError::InvalidRequest(format!(
                "appointment {id} is already {}",
                appointment.status.as_str()
            )));
        }

        tracing::info!(appointment_id = %id, "appointment cancelled");
        Ok(appointment)
    }

    /// Moves a booked appointment to a new date and start, keeping its length
    /// and party size. The appointment's current slot does not count against it.
    pub async fn reschedule(
        &self,
        id: &str,
        date: NaiveDate,
        start_time: TimeOfDay,
    ) -> Result<BookingOutcome, SchedulingError> {
        let current = self.load(id)?;
        if current.status != AppointmentStatus::Booked {
            return Err(SchedulingError::InvalidRequest(format!(
                "appointment {id} is {} and cannot be moved",
                current.status.as_str()
            )));
        }

        let minutes = u32::try_from(current.total_minutes())
            .map_err(|_| SchedulingError::Range(current.total_minutes()))?;
        let query = AvailabilityQuery {
            start_time: Some(start_time),
            duration_minutes: Some(minutes),
            party_size: Some(current.party_size),
            exclude_appointment: Some(id.to_string()),
            ..AvailabilityQuery::for_date(date)
        };

        self.claim_with_retries(&query, |room_id, staff_id, interval| {
            let party_size = current.party_size;
            async move {
                let moved = match self
                    .repo
                    .reschedule(id, room_id, staff_id, date, &interval, party_size)
                {
                    Ok(moved) => moved,
                    Err(e) if e.downcast_ref::<SlotTaken>().is_some() => {
                        return Ok(Claim::Contended)
                    }
                    Err(e) => return Err(SchedulingError::Repository(e)),
                };
                if !moved {
                    return Err(SchedulingError::NotFound(format!("booked appointment {id}")));
                }
                tracing::info!(
                    appointment_id = %id,
                    room_id = %room_id,
                    staff_id = %staff_id,
                    date = %date,
                    "appointment rescheduled"
                );
                Ok(Claim::Done(self.load(id)?))
            }
        })
        .await
    }

    /// Runs commit mode and hands the assignment to `claim`, re-querying when
    /// the slot was taken in between.
    async fn claim_with_retries<F, Fut>(
        &self,
        query: &AvailabilityQuery,
        mut claim: F,
    ) -> Result<BookingOutcome, SchedulingError>
    where
        F: FnMut(RoomId, StaffId, Interval) -> Fut,
        Fut: std::future::Future<Output = Result<Claim, SchedulingError>>,
    {
        for attempt in 1..=MAX_BOOKING_ATTEMPTS {
            let result = check_availability(self.repo, self.settings, self.picker, query).await?;
            match result {
                AvailabilityResult::Assignment {
                    room_id,
                    staff_id,
                    start,
                    end,
                    ..
                } => match claim(room_id, staff_id, Interval::new(start, end)?).await? {
                    Claim::Done(appointment) => return Ok(BookingOutcome::Booked { appointment }),
                    Claim::Contended => {
                        tracing::warn!(attempt, room_id = %room_id, staff_id = %staff_id, "slot taken, retrying");
                    }
                },
                AvailabilityResult::PartialAssignment { room_id, room_name } => {
                    return Ok(BookingOutcome::RoomWithoutStaff { room_id, room_name })
                }
                AvailabilityResult::NoAvailability | AvailabilityResult::Report { .. } => {
                    return Ok(BookingOutcome::Unavailable)
                }
            }
        }

        tracing::warn!(date = %query.date, "giving up on contended slot");
        Ok(BookingOutcome::Unavailable)
    }

    /// Combined length of the chosen treatments, `None` when none were chosen.
    fn services_duration(&self, ids: &[i64]) -> Result<Option<u32>, SchedulingError> {
        if ids.is_empty() {
            return Ok(None);
        }
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let services = self
            .repo
            .services_by_ids(&wanted.iter().copied().collect::<Vec<_>>())
            .map_err(SchedulingError::Repository)?;

        if services.len() != wanted.len() {
            let found: BTreeSet<i64> = services.iter().map(|s| s.id).collect();
            let missing: Vec<String> = wanted.difference(&found).map(|id| id.to_string()).collect();
            return Err(SchedulingError::NotFound(format!(
                "services {}",
                missing.join(", ")
            )));
        }

        Ok(Some(total_duration(&services)).filter(|m| *m > 0))
    }

    fn load(&self, id: &str) -> Result<Appointment, SchedulingError> {
        self.repo
            .get_appointment(id)
            .map_err(SchedulingError::Repository)?
            .ok_or_else(|| SchedulingError::NotFound(format!("appointment {id}")))
    }
}
