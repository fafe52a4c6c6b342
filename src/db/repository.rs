use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{
    Appointment, AppointmentStatus, Booking, BusinessHours, Interval, NewAppointment, Room, RoomId,
    SpaService, Staff, StaffId,
};
use crate::services::scheduling::sweep::occupancy_timeline;

/// Read access the availability engine needs, plus the one write it feeds.
#[async_trait]
pub trait SchedulingRepository: Send + Sync {
    /// Booked appointments on `date`.
    async fn bookings_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<Booking>>;
    async fn rooms(&self) -> anyhow::Result<BTreeMap<RoomId, Room>>;
    async fn staff(&self) -> anyhow::Result<BTreeMap<StaffId, Staff>>;
    /// Fails with [`SlotTaken`] when the room or the staff member was claimed
    /// since the availability check.
    async fn create_appointment(&self, new: &NewAppointment) -> anyhow::Result<Appointment>;
}

/// The requested room or staff member is no longer free for the interval.
#[derive(Debug, thiserror::Error)]
#[error("slot taken: {0}")]
pub struct SlotTaken(pub String);

#[derive(Clone)]
pub struct SqliteRepository {
    db: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database mutex poisoned"))
    }

    pub fn get_appointment(&self, id: &str) -> anyhow::Result<Option<Appointment>> {
        queries::get_appointment_by_id(&*self.conn()?, id)
    }

    pub fn list_appointments(
        &self,
        status: Option<AppointmentStatus>,
        customer_phone: Option<&str>,
        limit: i64,
    ) -> anyhow::Result<Vec<Appointment>> {
        queries::list_appointments(&*self.conn()?, status, customer_phone, limit)
    }

    pub fn set_status(&self, id: &str, status: AppointmentStatus) -> anyhow::Result<bool> {
        queries::update_appointment_status(&*self.conn()?, id, status)
    }

    /// Moves a booked appointment, re-checking the target slot inside the
    /// same transaction. Returns false when the appointment is not booked.
    pub fn reschedule(
        &self,
        id: &str,
        room_id: RoomId,
        staff_id: StaffId,
        date: NaiveDate,
        interval: &Interval,
        party_size: u32,
    ) -> anyhow::Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        ensure_slot_free(&tx, date, room_id, staff_id, interval, party_size, Some(id))?;
        let updated =
            queries::update_appointment_schedule(&tx, id, room_id, staff_id, date, interval)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Inactive staff leave the roster but keep their appointments.
    pub fn set_staff_active(&self, id: StaffId, active: bool) -> anyhow::Result<bool> {
        queries::set_staff_active(&*self.conn()?, id, active)
    }

    pub fn list_services(&self, search: Option<&str>) -> anyhow::Result<Vec<SpaService>> {
        queries::list_services(&*self.conn()?, search)
    }

    pub fn services_by_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<SpaService>> {
        queries::get_services_by_ids(&*self.conn()?, ids)
    }
}

#[async_trait]
impl SchedulingRepository for SqliteRepository {
    async fn bookings_for_date(&self, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
        queries::get_bookings_for_date(&*self.conn()?, date)
    }

    async fn rooms(&self) -> anyhow::Result<BTreeMap<RoomId, Room>> {
        let rooms = queries::list_rooms(&*self.conn()?)?;
        Ok(rooms.into_iter().map(|r| (r.id, r)).collect())
    }

    async fn staff(&self) -> anyhow::Result<BTreeMap<StaffId, Staff>> {
        let staff = queries::list_staff(&*self.conn()?)?;
        Ok(staff.into_iter().map(|s| (s.id, s)).collect())
    }

    async fn create_appointment(&self, new: &NewAppointment) -> anyhow::Result<Appointment> {
        let id = uuid::Uuid::new_v4().to_string();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        ensure_slot_free(
            &tx,
            new.booking_date,
            new.room_id,
            new.staff_id,
            &new.interval,
            new.party_size,
            None,
        )?;
        queries::insert_appointment(&tx, &id, new)?;
        let appointment = queries::get_appointment_by_id(&tx, &id)?
            .ok_or_else(|| anyhow::anyhow!("appointment {id} vanished after insert"))?;
        tx.commit()?;

        Ok(appointment)
    }
}

/// Rejects the write when the staff member already works an overlapping
/// appointment or the room lacks `party_size` free places at any point of
/// `interval`.
fn ensure_slot_free(
    conn: &Connection,
    date: NaiveDate,
    room_id: RoomId,
    staff_id: StaffId,
    interval: &Interval,
    party_size: u32,
    exclude: Option<&str>,
) -> anyhow::Result<()> {
    let mut bookings = queries::get_bookings_for_date(conn, date)?;
    if let Some(excluded) = exclude {
        bookings.retain(|b| b.appointment_id != excluded);
    }

    if bookings
        .iter()
        .any(|b| b.staff_id == staff_id && b.interval.overlaps(interval))
    {
        return Err(SlotTaken(format!("staff {staff_id} is busy during {interval}")).into());
    }

    let room = queries::list_rooms(conn)?
        .into_iter()
        .find(|r| r.id == room_id)
        .ok_or_else(|| anyhow::anyhow!("unknown room {room_id}"))?;

    // Each appointment takes one place, whatever its party size.
    let peak = occupancy_timeline(
        &bookings,
        &room,
        BusinessHours::new(interval.start, interval.end),
    )?
    .iter()
    .map(|segment| segment.active)
    .max()
    .unwrap_or(0);

    if room.capacity.saturating_sub(peak) < party_size.max(1) {
        return Err(SlotTaken(format!("room {room_id} is full during {interval}")).into());
    }

    Ok(())
}
