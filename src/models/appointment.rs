use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::resource::{RoomId, StaffId};
use crate::models::time::Interval;

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub room_id: RoomId,
    pub staff_id: StaffId,
    pub booking_date: NaiveDate,
    pub interval: Interval,
    pub party_size: u32,
    pub status: AppointmentStatus,
    pub note: Option<String>,
    pub service_ids: Vec<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn total_minutes(&self) -> i64 {
        self.interval.duration_minutes()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Booked,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(AppointmentStatus::Booked),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

/// The slice of an appointment the availability engine looks at: one room and
/// one staff member held for `interval`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub appointment_id: String,
    pub room_id: RoomId,
    pub staff_id: StaffId,
    pub interval: Interval,
}

/// Payload handed to the repository once a room and staff member are settled.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub customer_name: String,
    pub customer_phone: String,
    pub room_id: RoomId,
    pub staff_id: StaffId,
    pub booking_date: NaiveDate,
    pub interval: Interval,
    pub party_size: u32,
    pub note: Option<String>,
    pub service_ids: Vec<i64>,
}
