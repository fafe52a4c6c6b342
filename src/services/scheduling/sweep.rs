//! Capacity sweep over one room's day.
//!
//! Booking starts and ends become `+1`/`-1` events, bracketed by zero-delta
//! events at opening and closing time. Walking the events in `(time, delta)`
//! order yields the room's occupancy between every pair of consecutive event
//! times; the stretches with enough spare capacity become [`FreeCapacitySlot`]s
//! annotated with the staff who are idle throughout.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::SchedulingError;
use crate::models::{Booking, BusinessHours, FreeCapacitySlot, Interval, Room, Staff, StaffId};

/// Occupancy of a room over one stretch between consecutive events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupancySegment {
    pub interval: Interval,
    pub active: u32,
}

/// The room's occupancy timeline. Segments are chronological and tile the
/// business hours exactly.
pub fn occupancy_timeline(
    bookings: &[Booking],
    room: &Room,
    hours: BusinessHours,
) -> Result<Vec<OccupancySegment>, SchedulingError> {
    let Some(window) = hours.window() else {
        return Ok(Vec::new());
    };
    let (open, close) = (window.start.minutes(), window.end.minutes());

    let mut events: Vec<(i64, i32)> = vec![(open, 0), (close, 0)];
    for booking in bookings
        .iter()
        .filter(|b| b.room_id == room.id && b.interval.overlaps(&window))
    {
        events.push((booking.interval.start.minutes().max(open), 1));
        events.push((booking.interval.end.minutes().min(close), -1));
    }
    events.sort_unstable();

    let mut segments = Vec::new();
    let mut active: i32 = 0;
    let mut prev = open;

    for (time, delta) in events {
        if time > prev {
            let interval = Interval::from_minutes(prev, time).map_err(|e| {
                tracing::error!(error = %e, room_id = %room.id, "invalid occupancy segment");
                e
            })?;
            segments.push(OccupancySegment {
                interval,
                active: active.max(0) as u32,
            });
        }
        active += delta;
        prev = time;
    }

    Ok(segments)
}

/// Staff with no booking in any room overlapping `interval`.
pub fn staff_free_in_interval(
    bookings: &[Booking],
    interval: &Interval,
    staff: &BTreeMap<StaffId, Staff>,
) -> BTreeSet<StaffId> {
    staff
        .keys()
        .filter(|id| {
            !bookings
                .iter()
                .any(|b| b.staff_id == **id && b.interval.overlaps(interval))
        })
        .copied()
        .collect()
}

/// Stretches of the room's day with at least `party_size` free places.
///
/// `bookings` is the whole day's snapshot: room occupancy only counts this
/// room's bookings, while staff availability looks at every room.
pub fn free_capacity_slots(
    bookings: &[Booking],
    room: &Room,
    staff: &BTreeMap<StaffId, Staff>,
    party_size: u32,
    hours: BusinessHours,
) -> Result<Vec<FreeCapacitySlot>, SchedulingError> {
    let required = party_size.max(1);

    if bookings.is_empty() {
        return Ok(match hours.window() {
            Some(interval) if room.capacity >= required => vec![FreeCapacitySlot {
                interval,
                free_capacity: room.capacity,
                free_staff: staff.keys().copied().collect(),
            }],
            _ => Vec::new(),
        });
    }

    let slots = occupancy_timeline(bookings, room, hours)?
        .into_iter()
        .filter_map(|segment| {
            let free_capacity = room.capacity.saturating_sub(segment.active);
            (free_capacity >= required).then(|| FreeCapacitySlot {
                interval: segment.interval,
                free_capacity,
                free_staff: staff_free_in_interval(bookings, &segment.interval, staff),
            })
        })
        .collect();
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoomId, TimeOfDay};

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn hours() -> BusinessHours {
        BusinessHours::new(t("08:00"), t("21:00"))
    }

    fn room(id: i64, capacity: u32) -> Room {
        Room {
            id: RoomId(id),
            name: format!("Room {id}"),
            capacity,
        }
    }

    fn roster(ids: &[i64]) -> BTreeMap<StaffId, Staff> {
        ids.iter()
            .map(|id| {
                (
                    StaffId(*id),
                    Staff {
                        id: StaffId(*id),
                        name: format!("Staff {id}"),
                    },
                )
            })
            .collect()
    }

    fn booking(room: i64, staff: i64, start: &str, end: &str) -> Booking {
        Booking {
            appointment_id: format!("{room}-{staff}-{start}"),
            room_id: RoomId(room),
            staff_id: StaffId(staff),
            interval: Interval::new(t(start), t(end)).unwrap(),
        }
    }

    fn ids(set: &BTreeSet<StaffId>) -> Vec<i64> {
        set.iter().map(|s| s.0).collect()
    }

    #[test]
    fn test_empty_day_is_one_full_slot() {
        let slots = free_capacity_slots(&[], &room(1, 2), &roster(&[1, 2, 3]), 1, hours()).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].interval.to_string(), "08:00:00 - 21:00:00");
        assert_eq!(slots[0].free_capacity, 2);
        assert_eq!(ids(&slots[0].free_staff), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_day_party_larger_than_room() {
        let slots = free_capacity_slots(&[], &room(1, 2), &roster(&[1]), 3, hours()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_single_booking_splits_day() {
        let bookings = vec![booking(1, 1, "10:00", "11:00")];
        let slots =
            free_capacity_slots(&bookings, &room(1, 2), &roster(&[1, 2]), 1, hours()).unwrap();

        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].interval.to_string(), "08:00:00 - 10:00:00");
        assert_eq!(slots[0].free_capacity, 2);
        assert_eq!(ids(&slots[0].free_staff), vec![1, 2]);

        assert_eq!(slots[1].interval.to_string(), "10:00:00 - 11:00:00");
        assert_eq!(slots[1].free_capacity, 1);
        assert_eq!(ids(&slots[1].free_staff), vec![2]);

        assert_eq!(slots[2].interval.to_string(), "11:00:00 - 21:00:00");
        assert_eq!(slots[2].free_capacity, 2);
    }

    #[test]
    fn test_full_room_interval_is_dropped() {
        let bookings = vec![
            booking(1, 1, "10:00", "11:00"),
            booking(1, 2, "10:30", "12:00"),
        ];
        let slots =
            free_capacity_slots(&bookings, &room(1, 2), &roster(&[1, 2, 3]), 1, hours()).unwrap();
        let spans: Vec<String> = slots.iter().map(|s| s.interval.to_string()).collect();
        assert_eq!(
            spans,
            vec![
                "08:00:00 - 10:00:00",
                "10:00:00 - 10:30:00",
                "11:00:00 - 12:00:00",
                "12:00:00 - 21:00:00",
            ]
        );
    }

    #[test]
    fn test_party_size_filters_slots() {
        let bookings = vec![booking(1, 1, "10:00", "11:00")];
        let slots =
            free_capacity_slots(&bookings, &room(1, 2), &roster(&[1, 2]), 2, hours()).unwrap();
        assert!(slots.iter().all(|s| s.free_capacity >= 2));
        assert!(!slots
            .iter()
            .any(|s| s.interval.to_string() == "10:00:00 - 11:00:00"));
    }

    #[test]
    fn test_staff_busy_in_other_room_is_excluded() {
        let bookings = vec![
            booking(2, 7, "09:00", "10:00"),
            booking(1, 8, "15:00", "16:00"),
        ];
        let slots =
            free_capacity_slots(&bookings, &room(1, 1), &roster(&[7, 8, 9]), 1, hours()).unwrap();
        let first = &slots[0];
        assert_eq!(first.interval.to_string(), "08:00:00 - 15:00:00");
        // 7 is busy elsewhere at 09:00; 8 only starts when the slot ends
        assert_eq!(ids(&first.free_staff), vec![8, 9]);
        let last = slots.last().unwrap();
        assert_eq!(last.interval.to_string(), "16:00:00 - 21:00:00");
        assert_eq!(ids(&last.free_staff), vec![7, 8, 9]);
    }

    #[test]
    fn test_room_without_bookings_on_busy_day() {
        let bookings = vec![booking(2, 7, "09:00", "10:00")];
        let slots =
            free_capacity_slots(&bookings, &room(1, 3), &roster(&[7, 8]), 1, hours()).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].free_capacity, 3);
        assert_eq!(ids(&slots[0].free_staff), vec![8]);
    }

    #[test]
    fn test_back_to_back_bookings_keep_instant_free() {
        let bookings = vec![
            booking(1, 1, "10:00", "11:00"),
            booking(1, 2, "11:00", "12:00"),
        ];
        let timeline = occupancy_timeline(&bookings, &room(1, 1), hours()).unwrap();
        let busy: Vec<String> = timeline
            .iter()
            .filter(|s| s.active > 0)
            .map(|s| format!("{} x{}", s.interval, s.active))
            .collect();
        assert_eq!(
            busy,
            vec!["10:00:00 - 11:00:00 x1", "11:00:00 - 12:00:00 x1"]
        );
    }

    #[test]
    fn test_bookings_outside_hours_are_clipped() {
        let bookings = vec![
            booking(1, 1, "07:00", "09:00"),
            booking(1, 2, "20:30", "22:00"),
            booking(1, 3, "05:00", "06:00"),
        ];
        let timeline = occupancy_timeline(&bookings, &room(1, 1), hours()).unwrap();
        assert_eq!(timeline.first().unwrap().interval.start, t("08:00"));
        assert_eq!(timeline.last().unwrap().interval.end, t("21:00"));
        assert_eq!(timeline.first().unwrap().active, 1);
        assert_eq!(timeline.last().unwrap().active, 1);
    }

    #[test]
    fn test_timeline_tiles_business_hours() {
        let bookings = vec![
            booking(1, 1, "09:00", "10:00"),
            booking(1, 2, "09:30", "11:00"),
            booking(1, 3, "13:00", "14:00"),
        ];
        let timeline = occupancy_timeline(&bookings, &room(1, 2), hours()).unwrap();
        assert_eq!(timeline.first().unwrap().interval.start, t("08:00"));
        assert_eq!(timeline.last().unwrap().interval.end, t("21:00"));
        for pair in timeline.windows(2) {
            assert_eq!(pair[0].interval.end, pair[1].interval.start);
        }
    }

    #[test]
    fn test_overbooked_room_reports_no_capacity() {
        let bookings = vec![
            booking(1, 1, "10:00", "11:00"),
            booking(1, 2, "10:00", "11:00"),
        ];
        let slots =
            free_capacity_slots(&bookings, &room(1, 1), &roster(&[1, 2]), 1, hours()).unwrap();
        assert!(slots
            .iter()
            .all(|s| !s.interval.overlaps(&Interval::new(t("10:00"), t("11:00")).unwrap())));
    }

    #[test]
    fn test_closed_day_has_no_timeline() {
        let closed = BusinessHours::new(t("21:00"), t("08:00"));
        let bookings = vec![booking(1, 1, "10:00", "11:00")];
        assert!(occupancy_timeline(&bookings, &room(1, 1), closed)
            .unwrap()
            .is_empty());
        assert!(free_capacity_slots(&bookings, &room(1, 1), &roster(&[1]), 1, closed)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_idempotent() {
        let bookings = vec![
            booking(1, 1, "10:00", "11:00"),
            booking(1, 2, "10:30", "12:00"),
        ];
        let staff = roster(&[1, 2, 3]);
        let first = free_capacity_slots(&bookings, &room(1, 2), &staff, 1, hours()).unwrap();
        let second = free_capacity_slots(&bookings, &room(1, 2), &staff, 1, hours()).unwrap();
        assert_eq!(first, second);
    }
}
