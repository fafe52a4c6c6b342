use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::repository::SchedulingRepository;
use crate::errors::SchedulingError;
use crate::models::{
    AvailabilityReport, AvailabilityResult, Booking, BusinessHours, FreeCapacitySlot, Interval,
    ResourceFreeIntervals, Room, RoomAvailability, RoomId, Staff, StaffId, TimeOfDay,
};
use crate::services::scheduling::free_intervals::free_intervals_all;
use crate::services::scheduling::selector::{choose_room_and_staff, Selection, StaffPicker};
use crate::services::scheduling::sweep::free_capacity_slots;
use crate::services::scheduling::SchedulingSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub start_time: Option<TimeOfDay>,
    pub duration_minutes: Option<u32>,
    /// Length of the treatment already agreed earlier in the conversation.
    pub prior_duration_minutes: Option<u32>,
    pub party_size: Option<u32>,
    /// Appointment left out of the snapshot, so a reschedule does not collide with itself.
    #[serde(default)]
    pub exclude_appointment: Option<String>,
}

impl AvailabilityQuery {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: None,
            duration_minutes: None,
            prior_duration_minutes: None,
            party_size: None,
            exclude_appointment: None,
        }
    }

    pub fn party_size(&self) -> u32 {
        self.party_size.filter(|k| *k > 0).unwrap_or(1)
    }

    pub fn duration(&self, default_minutes: u32) -> u32 {
        self.duration_minutes
            .filter(|m| *m > 0)
            .or(self.prior_duration_minutes.filter(|m| *m > 0))
            .unwrap_or(default_minutes)
    }

    /// The window asked for in commit mode, or `None` in report mode.
    pub fn requested_window(
        &self,
        default_minutes: u32,
    ) -> Result<Option<Interval>, SchedulingError> {
        let Some(start) = self.start_time else {
            return Ok(None);
        };
        let duration = self.duration(default_minutes);
        let end = start
            .checked_add_minutes(i64::from(duration))
            .map_err(|_| {
                SchedulingError::InvalidRequest(format!(
                    "a {duration} minute booking starting at {start} would run past midnight"
                ))
            })?;
        Interval::new(start, end).map(Some)
    }
}

/// Everything the engine reads for one date, fetched once per query.
#[derive(Debug, Clone, Default)]
pub struct DaySnapshot {
    pub rooms: BTreeMap<RoomId, Room>,
    pub staff: BTreeMap<StaffId, Staff>,
    pub bookings: Vec<Booking>,
}

impl DaySnapshot {
    pub async fn load(
        repo: &dyn SchedulingRepository,
        date: NaiveDate,
        exclude_appointment: Option<&str>,
    ) -> Result<Self, SchedulingError> {
        let (rooms, staff, mut bookings) =
            tokio::try_join!(repo.rooms(), repo.staff(), repo.bookings_for_date(date)).map_err(
                |e| {
                    tracing::error!(error = %e, date = %date, "failed to load scheduling snapshot");
                    SchedulingError::Repository(e)
                },
            )?;

        if let Some(excluded) = exclude_appointment {
            bookings.retain(|b| b.appointment_id != excluded);
        }

        Ok(Self {
            rooms,
            staff,
            bookings,
        })
    }

    /// Qualifying slots of every room, rooms in ascending id order.
    pub fn slots_by_room(
        &self,
        party_size: u32,
        hours: BusinessHours,
    ) -> Result<Vec<(&Room, Vec<FreeCapacitySlot>)>, SchedulingError> {
        self.rooms
            .values()
            .map(|room| {
                let slots =
                    free_capacity_slots(&self.bookings, room, &self.staff, party_size, hours)?;
                Ok((room, slots))
            })
            .collect()
    }

    pub fn report(
        &self,
        party_size: u32,
        hours: BusinessHours,
    ) -> Result<AvailabilityReport, SchedulingError> {
        Ok(AvailabilityReport {
            rooms: self
                .slots_by_room(party_size, hours)?
                .into_iter()
                .map(|(room, slots)| RoomAvailability {
                    room_id: room.id,
                    room_name: room.name.clone(),
                    capacity: room.capacity,
                    slots,
                })
                .collect(),
        })
    }

    pub fn assign(
        &self,
        request: &Interval,
        party_size: u32,
        hours: BusinessHours,
        picker: &dyn StaffPicker,
    ) -> Result<AvailabilityResult, SchedulingError> {
        let per_room = self.slots_by_room(party_size, hours)?;
        let selection = choose_room_and_staff(
            per_room
                .iter()
                .map(|(room, slots)| (room.id, slots.as_slice())),
            request,
            picker,
        );

        Ok(match selection {
            Selection::Assigned { room_id, staff_id } => AvailabilityResult::Assignment {
                room_id,
                room_name: self.room_name(room_id),
                staff_id,
                staff_name: self
                    .staff
                    .get(&staff_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                start: request.start,
                end: request.end,
            },
            Selection::RoomOnly { room_id } => AvailabilityResult::PartialAssignment {
                room_id,
                room_name: self.room_name(room_id),
            },
            Selection::Nothing => AvailabilityResult::NoAvailability,
        })
    }

    fn room_name(&self, id: RoomId) -> String {
        self.rooms
            .get(&id)
            .map(|r| r.name.clone())
            .unwrap_or_default()
    }
}

/// Report mode without a start time, commit mode with one.
pub async fn check_availability(
    repo: &dyn SchedulingRepository,
    settings: &SchedulingSettings,
    picker: &dyn StaffPicker,
    query: &AvailabilityQuery,
) -> Result<AvailabilityResult, SchedulingError> {
    let request = query.requested_window(settings.default_duration_minutes)?;
    let party_size = query.party_size();
    let snapshot =
        DaySnapshot::load(repo, query.date, query.exclude_appointment.as_deref()).await?;

    tracing::debug!(
        date = %query.date,
        rooms = snapshot.rooms.len(),
        staff = snapshot.staff.len(),
        bookings = snapshot.bookings.len(),
        party_size,
        "checking availability"
    );

    let result = match request {
        None => {
            let report = snapshot.report(party_size, settings.hours)?;
            AvailabilityResult::Report {
                text: report.to_human_readable(),
                rooms: report.rooms,
            }
        }
        Some(window) => snapshot.assign(&window, party_size, settings.hours, picker)?,
    };

    Ok(result)
}

/// Free windows of each room and staff member on `date`, capacity ignored.
pub async fn free_intervals_for_date(
    repo: &dyn SchedulingRepository,
    settings: &SchedulingSettings,
    date: NaiveDate,
) -> Result<ResourceFreeIntervals, SchedulingError> {
    let snapshot = DaySnapshot::load(repo, date, None).await?;
    Ok(free_intervals_all(
        &snapshot.bookings,
        &snapshot.rooms,
        &snapshot.staff,
        settings.hours,
    ))
}
