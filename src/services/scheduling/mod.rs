//! Availability engine: free intervals per resource, the capacity sweep,
//! room and staff selection, and the query facade tying them to a repository.

pub mod availability;
pub mod free_intervals;
pub mod selector;
pub mod sweep;
pub mod weekday;

pub use availability::{check_availability, free_intervals_for_date, AvailabilityQuery, DaySnapshot};
pub use free_intervals::{free_intervals, free_intervals_all, Resource};
pub use selector::{
    choose_room_and_staff, staff_picker_from_name, LowestIdStaffPicker, RandomStaffPicker,
    Selection, StaffPicker,
};
pub use sweep::{free_capacity_slots, occupancy_timeline, staff_free_in_interval};
pub use weekday::resolve_weekday_to_date;

use crate::models::BusinessHours;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingSettings {
    pub hours: BusinessHours,
    /// Used when neither the request nor the conversation gives a duration.
    pub default_duration_minutes: u32,
}
