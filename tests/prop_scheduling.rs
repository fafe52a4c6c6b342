//! Property-based tests for the availability engine.
//!
//! Bookings are generated at random across a few rooms and therapists; the
//! properties must hold for every day the strategies can produce.

use std::collections::BTreeMap;

use proptest::prelude::*;
use spabook::models::{
    AvailabilityResult, Booking, BusinessHours, Interval, Room, RoomId, Staff, StaffId, TimeOfDay,
};
use spabook::services::scheduling::{
    free_capacity_slots, free_intervals, occupancy_timeline, DaySnapshot, LowestIdStaffPicker,
    Resource,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const ROOMS: i64 = 3;
const STAFF: i64 = 4;

fn arb_interval() -> impl Strategy<Value = Interval> {
    (0i64..1400, 1i64..=180).prop_map(|(start, len)| {
        Interval::from_minutes(start, (start + len).min(1439)).unwrap()
    })
}

fn arb_booking() -> impl Strategy<Value = Booking> {
    (1i64..=ROOMS, 1i64..=STAFF, arb_interval(), any::<u32>()).prop_map(
        |(room, staff, interval, tag)| Booking {
            appointment_id: format!("appt-{tag}"),
            room_id: RoomId(room),
            staff_id: StaffId(staff),
            interval,
        },
    )
}

fn arb_bookings() -> impl Strategy<Value = Vec<Booking>> {
    prop::collection::vec(arb_booking(), 0..24)
}

fn arb_hours() -> impl Strategy<Value = BusinessHours> {
    (360i64..=600, 1080i64..=1320).prop_map(|(open, close)| {
        BusinessHours::new(
            TimeOfDay::from_minutes(open).unwrap(),
            TimeOfDay::from_minutes(close).unwrap(),
        )
    })
}

fn arb_capacities() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..=3, ROOMS as usize)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rooms(capacities: &[u32]) -> BTreeMap<RoomId, Room> {
    capacities
        .iter()
        .enumerate()
        .map(|(i, capacity)| {
            let id = RoomId(i as i64 + 1);
            (
                id,
                Room {
                    id,
                    name: format!("Room {}", id.0),
                    capacity: *capacity,
                },
            )
        })
        .collect()
}

fn roster() -> BTreeMap<StaffId, Staff> {
    (1..=STAFF)
        .map(|id| {
            (
                StaffId(id),
                Staff {
                    id: StaffId(id),
                    name: format!("Staff {id}"),
                },
            )
        })
        .collect()
}

fn room_load(bookings: &[Booking], room: RoomId, interval: &Interval) -> u32 {
    bookings
        .iter()
        .filter(|b| b.room_id == room && b.interval.overlaps(interval))
        .count() as u32
}

fn staff_busy(bookings: &[Booking], staff: StaffId, interval: &Interval) -> bool {
    bookings
        .iter()
        .any(|b| b.staff_id == staff && b.interval.overlaps(interval))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn timeline_tiles_business_hours(
        bookings in arb_bookings(),
        hours in arb_hours(),
        capacities in arb_capacities(),
    ) {
        for room in rooms(&capacities).values() {
            let timeline = occupancy_timeline(&bookings, room, hours).unwrap();
            prop_assert!(!timeline.is_empty());
            prop_assert_eq!(timeline.first().unwrap().interval.start, hours.open);
            prop_assert_eq!(timeline.last().unwrap().interval.end, hours.close);
            for pair in timeline.windows(2) {
                prop_assert_eq!(pair[0].interval.end, pair[1].interval.start);
            }
            for segment in &timeline {
                prop_assert_eq!(segment.active, room_load(&bookings, room.id, &segment.interval));
            }
        }
    }

    #[test]
    fn slots_respect_capacity_and_staff(
        bookings in arb_bookings(),
        hours in arb_hours(),
        capacities in arb_capacities(),
        party_size in 1u32..=3,
    ) {
        let staff = roster();
        let window = hours.window().unwrap();

        for room in rooms(&capacities).values() {
            let slots = free_capacity_slots(&bookings, room, &staff, party_size, hours).unwrap();

            for pair in slots.windows(2) {
                prop_assert!(pair[0].interval.end <= pair[1].interval.start);
            }

            for slot in &slots {
                prop_assert!(window.contains(&slot.interval));
                prop_assert!(slot.free_capacity >= party_size);
                prop_assert!(slot.free_capacity <= room.capacity);
                prop_assert_eq!(
                    slot.free_capacity,
                    room.capacity.saturating_sub(room_load(&bookings, room.id, &slot.interval))
                );
                for id in staff.keys() {
                    let listed = slot.free_staff.contains(id);
                    prop_assert_eq!(listed, !staff_busy(&bookings, *id, &slot.interval));
                }
            }
        }
    }

    #[test]
    fn free_intervals_avoid_bookings(
        bookings in arb_bookings(),
        hours in arb_hours(),
        staff_id in 1i64..=STAFF,
    ) {
        let window = hours.window().unwrap();
        let free = free_intervals(&bookings, Resource::Staff(StaffId(staff_id)), hours);

        for pair in free.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
        for interval in &free {
            prop_assert!(window.contains(interval));
            prop_assert!(!staff_busy(&bookings, StaffId(staff_id), interval));
        }

        // every minute of the window is either free or booked
        for minute in window.start.minutes()..window.end.minutes() {
            let one_minute = Interval::from_minutes(minute, minute + 1).unwrap();
            let is_free = free.iter().any(|i| i.contains(&one_minute));
            prop_assert_eq!(is_free, !staff_busy(&bookings, StaffId(staff_id), &one_minute));
        }
    }

    #[test]
    fn assignments_never_overbook(
        bookings in arb_bookings(),
        hours in arb_hours(),
        capacities in arb_capacities(),
        request in arb_interval(),
        party_size in 1u32..=3,
    ) {
        let snapshot = DaySnapshot {
            rooms: rooms(&capacities),
            staff: roster(),
            bookings: bookings.clone(),
        };

        match snapshot.assign(&request, party_size, hours, &LowestIdStaffPicker).unwrap() {
            AvailabilityResult::Assignment { room_id, staff_id, start, end, .. } => {
                prop_assert_eq!((start, end), (request.start, request.end));
                prop_assert!(hours.window().unwrap().contains(&request));
                prop_assert!(!staff_busy(&bookings, staff_id, &request));
                let capacity = snapshot.rooms[&room_id].capacity;
                prop_assert!(room_load(&bookings, room_id, &request) + party_size <= capacity);
            }
            AvailabilityResult::PartialAssignment { room_id, .. } => {
                let capacity = snapshot.rooms[&room_id].capacity;
                prop_assert!(room_load(&bookings, room_id, &request) + party_size <= capacity);
            }
            AvailabilityResult::NoAvailability => {}
            AvailabilityResult::Report { .. } => prop_assert!(false, "commit mode returned a report"),
        }
    }
}
