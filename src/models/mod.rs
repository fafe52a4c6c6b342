pub mod appointment;
pub mod availability;
pub mod resource;
pub mod service;
pub mod time;

pub use appointment::{Appointment, AppointmentStatus, Booking, NewAppointment};
pub use availability::{
    AvailabilityReport, AvailabilityResult, FreeCapacitySlot, ResourceFreeIntervals,
    RoomAvailability,
};
pub use resource::{Room, RoomId, Staff, StaffId};
pub use service::SpaService;
pub use time::{BusinessHours, Interval, TimeOfDay};
