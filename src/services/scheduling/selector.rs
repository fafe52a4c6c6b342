use std::collections::BTreeSet;

use rand::seq::IteratorRandom;

use crate::models::{FreeCapacitySlot, Interval, RoomId, StaffId};

/// Policy for choosing one staff member out of a slot's free set.
pub trait StaffPicker: Send + Sync {
    fn pick(&self, candidates: &BTreeSet<StaffId>) -> Option<StaffId>;
}

/// Uniform random choice; staff are interchangeable for generic treatments.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomStaffPicker;

impl StaffPicker for RandomStaffPicker {
    fn pick(&self, candidates: &BTreeSet<StaffId>) -> Option<StaffId> {
        candidates.iter().copied().choose(&mut rand::thread_rng())
    }
}

/// Always the lowest staff id, for reproducible assignments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LowestIdStaffPicker;

impl StaffPicker for LowestIdStaffPicker {
    fn pick(&self, candidates: &BTreeSet<StaffId>) -> Option<StaffId> {
        candidates.first().copied()
    }
}

/// Builds the picker named by the `STAFF_SELECTION` setting.
pub fn staff_picker_from_name(name: &str) -> Option<Box<dyn StaffPicker>> {
    match name.trim().to_lowercase().as_str() {
        "random" => Some(Box::new(RandomStaffPicker)),
        "lowest_id" => Some(Box::new(LowestIdStaffPicker)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Assigned { room_id: RoomId, staff_id: StaffId },
    /// The room has capacity for the whole request but nobody is free to work it.
    RoomOnly { room_id: RoomId },
    Nothing,
}

/// First room, in the order given, with a single slot containing `request`.
///
/// Containment is per slot: a request spanning two adjacent slots does not
/// match, since slot boundaries mark changes in occupancy.
pub fn choose_room_and_staff<'a, I>(
    rooms: I,
    request: &Interval,
    picker: &dyn StaffPicker,
) -> Selection
where
    I: IntoIterator<Item = (RoomId, &'a [FreeCapacitySlot])>,
{
    for (room_id, slots) in rooms {
        let Some(slot) = slots.iter().find(|s| s.interval.contains(request)) else {
            continue;
        };
        return match picker.pick(&slot.free_staff) {
            Some(staff_id) => Selection::Assigned { room_id, staff_id },
            None => Selection::RoomOnly { room_id },
        };
    }
    Selection::Nothing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeOfDay;

    fn interval(start: &str, end: &str) -> Interval {
        Interval::new(TimeOfDay::parse(start).unwrap(), TimeOfDay::parse(end).unwrap()).unwrap()
    }

    fn slot(start: &str, end: &str, staff: &[i64]) -> FreeCapacitySlot {
        FreeCapacitySlot {
            interval: interval(start, end),
            free_capacity: 1,
            free_staff: staff.iter().map(|id| StaffId(*id)).collect(),
        }
    }

    #[test]
    fn test_first_containing_room_wins() {
        let room1 = vec![slot("08:00", "10:00", &[1])];
        let room2 = vec![slot("08:00", "12:00", &[2, 3])];
        let room3 = vec![slot("08:00", "21:00", &[4])];

        let selection = choose_room_and_staff(
            [
                (RoomId(1), room1.as_slice()),
                (RoomId(2), room2.as_slice()),
                (RoomId(3), room3.as_slice()),
            ],
            &interval("10:30", "11:30"),
            &LowestIdStaffPicker,
        );

        assert_eq!(
            selection,
            Selection::Assigned {
                room_id: RoomId(2),
                staff_id: StaffId(2)
            }
        );
    }

    #[test]
    fn test_request_spanning_two_slots_does_not_match() {
        let slots = vec![
            slot("08:00", "10:00", &[1]),
            slot("10:00", "11:00", &[1]),
        ];
        let selection = choose_room_and_staff(
            [(RoomId(1), slots.as_slice())],
            &interval("09:00", "10:30"),
            &LowestIdStaffPicker,
        );
        assert_eq!(selection, Selection::Nothing);
    }

    #[test]
    fn test_exact_fit_matches() {
        let slots = vec![slot("10:00", "11:00", &[5])];
        let selection = choose_room_and_staff(
            [(RoomId(4), slots.as_slice())],
            &interval("10:00", "11:00"),
            &LowestIdStaffPicker,
        );
        assert_eq!(
            selection,
            Selection::Assigned {
                room_id: RoomId(4),
                staff_id: StaffId(5)
            }
        );
    }

    #[test]
    fn test_room_without_free_staff() {
        let room1 = vec![slot("08:00", "21:00", &[])];
        let room2 = vec![slot("08:00", "21:00", &[9])];
        let selection = choose_room_and_staff(
            [(RoomId(1), room1.as_slice()), (RoomId(2), room2.as_slice())],
            &interval("10:00", "11:00"),
            &LowestIdStaffPicker,
        );
        assert_eq!(selection, Selection::RoomOnly { room_id: RoomId(1) });
    }

    #[test]
    fn test_no_rooms() {
        let selection = choose_room_and_staff(
            std::iter::empty::<(RoomId, &[FreeCapacitySlot])>(),
            &interval("10:00", "11:00"),
            &RandomStaffPicker,
        );
        assert_eq!(selection, Selection::Nothing);
    }

    #[test]
    fn test_random_picker_stays_within_candidates() {
        let candidates: BTreeSet<StaffId> = [StaffId(3), StaffId(5), StaffId(8)].into();
        for _ in 0..50 {
            let picked = RandomStaffPicker.pick(&candidates).unwrap();
            assert!(candidates.contains(&picked));
        }
        assert_eq!(RandomStaffPicker.pick(&BTreeSet::new()), None);
    }

    #[test]
    fn test_picker_from_name() {
        assert!(staff_picker_from_name("random").is_some());
        assert!(staff_picker_from_name(" Lowest_ID ").is_some());
        assert!(staff_picker_from_name("round_robin").is_none());
    }
}
