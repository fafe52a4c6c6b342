use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Appointment, AppointmentStatus, Booking, Interval, NewAppointment, Room, RoomId, SpaService,
    Staff, StaffId, TimeOfDay,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const APPOINTMENT_COLUMNS: &str = "id, customer_name, customer_phone, room_id, staff_id, booking_date, \
     start_time, end_time, party_size, status, note, created_at, updated_at";

fn now_timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

// ── Rooms & Staff ──

pub fn insert_room(conn: &Connection, name: &str, capacity: u32) -> anyhow::Result<RoomId> {
    conn.execute(
        "INSERT INTO rooms (name, capacity) VALUES (?1, ?2)",
        params![name, capacity],
    )?;
    Ok(RoomId(conn.last_insert_rowid()))
}

pub fn list_rooms(conn: &Connection) -> anyhow::Result<Vec<Room>> {
    let mut stmt = conn.prepare("SELECT id, name, capacity FROM rooms ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Room {
            id: RoomId(row.get(0)?),
            name: row.get(1)?,
            capacity: row.get(2)?,
        })
    })?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row?);
    }
    Ok(rooms)
}

pub fn insert_staff(conn: &Connection, name: &str) -> anyhow::Result<StaffId> {
    conn.execute("INSERT INTO staff (name) VALUES (?1)", params![name])?;
    Ok(StaffId(conn.last_insert_rowid()))
}

/// Active staff only; inactive members are never offered for new bookings.
pub fn list_staff(conn: &Connection) -> anyhow::Result<Vec<Staff>> {
    let mut stmt = conn.prepare("SELECT id, name FROM staff WHERE active = 1 ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Staff {
            id: StaffId(row.get(0)?),
            name: row.get(1)?,
        })
    })?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row?);
    }
    Ok(staff)
}

pub fn set_staff_active(conn: &Connection, id: StaffId, active: bool) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE staff SET active = ?1 WHERE id = ?2",
        params![active as i32, id.0],
    )?;
    Ok(count > 0)
}

// ── Services ──

pub fn insert_service(
    conn: &Connection,
    kind: &str,
    name: &str,
    description: Option<&str>,
    duration_minutes: u32,
    price: i64,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO services (type, name, description, duration_minutes, price)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![kind, name, description, duration_minutes, price],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Catalog listing, optionally narrowed by a case-insensitive match on name or type.
pub fn list_services(conn: &Connection, search: Option<&str>) -> anyhow::Result<Vec<SpaService>> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()));

    let mut stmt = conn.prepare(
        "SELECT id, type, name, description, duration_minutes, price FROM services
         WHERE ?1 IS NULL OR lower(name) LIKE ?1 OR lower(type) LIKE ?1
         ORDER BY type ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![pattern], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_services_by_ids(conn: &Connection, ids: &[i64]) -> anyhow::Result<Vec<SpaService>> {
    let mut stmt = conn.prepare(
        "SELECT id, type, name, description, duration_minutes, price FROM services WHERE id = ?1",
    )?;

    let mut services = vec![];
    for id in ids {
        if let Some(service) = stmt.query_row(params![id], parse_service_row).optional()? {
            services.push(service);
        }
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<SpaService> {
    Ok(SpaService {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        duration_minutes: row.get(4)?,
        price: row.get(5)?,
    })
}

// ── Appointments ──

/// Booked appointments of `date` as the engine sees them. Completed and
/// cancelled appointments no longer hold a room or a staff member.
pub fn get_bookings_for_date(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, room_id, staff_id, start_time, end_time FROM appointments
         WHERE booking_date = ?1 AND status = 'booked'
         ORDER BY start_time ASC",
    )?;
    let rows = stmt.query_map(params![date.format(DATE_FORMAT).to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut bookings = vec![];
    for row in rows {
        let (appointment_id, room_id, staff_id, start, end) = row?;
        bookings.push(Booking {
            appointment_id,
            room_id: RoomId(room_id),
            staff_id: StaffId(staff_id),
            interval: parse_interval(&start, &end)?,
        });
    }
    Ok(bookings)
}

pub fn insert_appointment(conn: &Connection, id: &str, new: &NewAppointment) -> anyhow::Result<()> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO appointments (id, customer_name, customer_phone, room_id, staff_id, booking_date,
                                   start_time, end_time, party_size, status, note, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'booked', ?10, ?11, ?11)",
        params![
            id,
            new.customer_name,
            new.customer_phone,
            new.room_id.0,
            new.staff_id.0,
            new.booking_date.format(DATE_FORMAT).to_string(),
            new.interval.start.to_string(),
            new.interval.end.to_string(),
            new.party_size,
            new.note,
            now,
        ],
    )?;

    for service_id in &new.service_ids {
        conn.execute(
            "INSERT OR IGNORE INTO appointment_services (appointment_id, service_id) VALUES (?1, ?2)",
            params![id, service_id],
        )?;
    }
    Ok(())
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let raw = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"),
            params![id],
            AppointmentRow::from_row,
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(raw.into_appointment(conn)?)),
        None => Ok(None),
    }
}

pub fn list_appointments(
    conn: &Connection,
    status: Option<AppointmentStatus>,
    customer_phone: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR customer_phone = ?2)
         ORDER BY booking_date ASC, start_time ASC
         LIMIT ?3"
    ))?;
    let rows = stmt.query_map(
        params![status.map(|s| s.as_str()), customer_phone, limit],
        AppointmentRow::from_row,
    )?;

    let mut raws = vec![];
    for row in rows {
        raws.push(row?);
    }

    raws.into_iter()
        .map(|raw| raw.into_appointment(conn))
        .collect()
}

/// Moves a booked appointment to `status`. Returns false when no booked
/// appointment with that id exists.
pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'booked'",
        params![status.as_str(), now_timestamp(), id],
    )?;
    Ok(count > 0)
}

pub fn update_appointment_schedule(
    conn: &Connection,
    id: &str,
    room_id: RoomId,
    staff_id: StaffId,
    booking_date: NaiveDate,
    interval: &Interval,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments
         SET room_id = ?1, staff_id = ?2, booking_date = ?3, start_time = ?4, end_time = ?5, updated_at = ?6
         WHERE id = ?7 AND status = 'booked'",
        params![
            room_id.0,
            staff_id.0,
            booking_date.format(DATE_FORMAT).to_string(),
            interval.start.to_string(),
            interval.end.to_string(),
            now_timestamp(),
            id,
        ],
    )?;
    Ok(count > 0)
}

fn service_ids_for(conn: &Connection, appointment_id: &str) -> anyhow::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT service_id FROM appointment_services WHERE appointment_id = ?1 ORDER BY service_id",
    )?;
    let rows = stmt.query_map(params![appointment_id], |row| row.get(0))?;

    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

fn parse_interval(start: &str, end: &str) -> anyhow::Result<Interval> {
    Ok(Interval::new(TimeOfDay::parse(start)?, TimeOfDay::parse(end)?)?)
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

/// Column values of one appointment row before they are checked.
struct AppointmentRow {
    id: String,
    customer_name: String,
    customer_phone: String,
    room_id: i64,
    staff_id: i64,
    booking_date: String,
    start_time: String,
    end_time: String,
    party_size: u32,
    status: String,
    note: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AppointmentRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            customer_phone: row.get(2)?,
            room_id: row.get(3)?,
            staff_id: row.get(4)?,
            booking_date: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            party_size: row.get(8)?,
            status: row.get(9)?,
            note: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_appointment(self, conn: &Connection) -> anyhow::Result<Appointment> {
        let booking_date = NaiveDate::parse_from_str(&self.booking_date, DATE_FORMAT)?;
        let status = AppointmentStatus::parse(&self.status)
            .ok_or_else(|| anyhow::anyhow!("unknown appointment status: {}", self.status))?;
        let service_ids = service_ids_for(conn, &self.id)?;

        Ok(Appointment {
            interval: parse_interval(&self.start_time, &self.end_time)?,
            id: self.id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            room_id: RoomId(self.room_id),
            staff_id: StaffId(self.staff_id),
            booking_date,
            party_size: self.party_size,
            status,
            note: self.note,
            service_ids,
            created_at: parse_timestamp(&self.created_at),
            updated_at: parse_timestamp(&self.updated_at),
        })
    }
}
