use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use serde::Serialize;

use crate::models::resource::{RoomId, StaffId};
use crate::models::time::{Interval, TimeOfDay};

/// A span of a room's day with enough spare capacity for the requested party,
/// together with the staff who have nothing booked anywhere during it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreeCapacitySlot {
    pub interval: Interval,
    pub free_capacity: u32,
    pub free_staff: BTreeSet<StaffId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomAvailability {
    pub room_id: RoomId,
    pub room_name: String,
    pub capacity: u32,
    pub slots: Vec<FreeCapacitySlot>,
}

/// Every qualifying slot of every room for one date, rooms in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub rooms: Vec<RoomAvailability>,
}

impl AvailabilityReport {
    pub fn to_human_readable(&self) -> String {
        let mut out = String::new();
        for room in &self.rooms {
            let _ = writeln!(out, "Room: {} (capacity={}):", room.room_name, room.capacity);
            if room.slots.is_empty() {
                let _ = writeln!(out, "- no free slots");
            }
            for slot in &room.slots {
                let _ = writeln!(
                    out,
                    "- {} - {}, free_capacity={}",
                    slot.interval.start, slot.interval.end, slot.free_capacity
                );
            }
        }
        out
    }
}

/// Outcome of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AvailabilityResult {
    Report {
        text: String,
        rooms: Vec<RoomAvailability>,
    },
    Assignment {
        room_id: RoomId,
        room_name: String,
        staff_id: StaffId,
        staff_name: String,
        start: TimeOfDay,
        end: TimeOfDay,
    },
    /// A room has capacity for the window but every staff member is busy.
    PartialAssignment { room_id: RoomId, room_name: String },
    NoAvailability,
}

/// Free windows of every room and staff member, ignoring room capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceFreeIntervals {
    pub rooms: BTreeMap<RoomId, Vec<Interval>>,
    pub staff: BTreeMap<StaffId, Vec<Interval>>,
}
