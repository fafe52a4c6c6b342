use std::collections::BTreeMap;

use crate::models::{
    Booking, BusinessHours, Interval, ResourceFreeIntervals, Room, RoomId, Staff, StaffId,
    TimeOfDay,
};

/// A single bookable resource, looked at without any notion of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Room(RoomId),
    Staff(StaffId),
}

impl Resource {
    fn holds(&self, booking: &Booking) -> bool {
        match self {
            Resource::Room(id) => booking.room_id == *id,
            Resource::Staff(id) => booking.staff_id == *id,
        }
    }
}

/// Gaps in one resource's day within business hours.
///
/// Bookings of the resource are sorted by start and walked with a cursor that
/// tracks the furthest end seen, so overlapping bookings collapse into one
/// busy stretch.
pub fn free_intervals(
    bookings: &[Booking],
    resource: Resource,
    hours: BusinessHours,
) -> Vec<Interval> {
    let Some(window) = hours.window() else {
        return Vec::new();
    };

    let mut busy: Vec<Interval> = bookings
        .iter()
        .filter(|b| resource.holds(b))
        .map(|b| b.interval)
        .collect();
    busy.sort_by_key(|i| (i.start, i.end));

    let mut free = Vec::new();
    let mut cursor: TimeOfDay = window.start;

    for interval in busy {
        if interval.start >= window.end {
            break;
        }
        if interval.start > cursor {
            free.push(Interval {
                start: cursor,
                end: interval.start,
            });
        }
        cursor = cursor.max(interval.end);
    }

    if cursor < window.end {
        free.push(Interval {
            start: cursor,
            end: window.end,
        });
    }

    free
}

/// [`free_intervals`] for every room and every staff member.
pub fn free_intervals_all(
    bookings: &[Booking],
    rooms: &BTreeMap<RoomId, Room>,
    staff: &BTreeMap<StaffId, Staff>,
    hours: BusinessHours,
) -> ResourceFreeIntervals {
    ResourceFreeIntervals {
        rooms: rooms
            .keys()
            .map(|id| (*id, free_intervals(bookings, Resource::Room(*id), hours)))
            .collect(),
        staff: staff
            .keys()
            .map(|id| (*id, free_intervals(bookings, Resource::Staff(*id), hours)))
            .collect(),
    }
}
