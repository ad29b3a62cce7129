//! The fixed daily slot schedule and the availability resolver.
//!
//! Bookings do not use free-form time ranges: every room is bookable in the same five two-hour
//! slots per day, defined by [slot_catalog]. A booking submission must match one catalog slot
//! exactly, and the availability of a (room, date) pair is always resolved against the full
//! catalog, so clients get one classified entry per slot.

use chrono::NaiveTime;
use roombook_api_types::{BusySlotEntry, BusyStatus, ClassifiedSlot, SlotStatus};

/// One bookable slot of the daily schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: &'static str,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub label: &'static str,
}

fn clock(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).expect("Slot catalog hours should be valid clock times")
}

/// The fixed catalog of daily booking slots, in chronological order.
///
/// There is no slot over the midday break (11:00 to 13:00).
pub fn slot_catalog() -> [TimeSlot; 5] {
    [
        TimeSlot {
            id: "07:00-09:00",
            start: clock(7),
            end: clock(9),
            label: "07:00 - 09:00",
        },
        TimeSlot {
            id: "09:00-11:00",
            start: clock(9),
            end: clock(11),
            label: "09:00 - 11:00",
        },
        TimeSlot {
            id: "13:00-15:00",
            start: clock(13),
            end: clock(15),
            label: "13:00 - 15:00",
        },
        TimeSlot {
            id: "15:00-17:00",
            start: clock(15),
            end: clock(17),
            label: "15:00 - 17:00",
        },
        TimeSlot {
            id: "17:00-19:00",
            start: clock(17),
            end: clock(19),
            label: "17:00 - 19:00",
        },
    ]
}

/// Find the catalog slot with exactly the given bounds.
///
/// Both bounds must match: a range that merely lies within a slot (or straddles two slots) is not
/// a valid booking slot.
pub fn find_slot(start: NaiveTime, end: NaiveTime) -> Option<TimeSlot> {
    slot_catalog()
        .into_iter()
        .find(|slot| slot.start == start && slot.end == end)
}

/// Classify every catalog slot against the busy-slot set of one (room, date) pair.
///
/// A busy entry is matched to its catalog slot by start time. Busy entries that do not match any
/// catalog slot start are ignored. The result always contains all catalog slots, in catalog
/// order.
pub fn resolve_availability(busy_slots: &[BusySlotEntry]) -> Vec<ClassifiedSlot> {
    slot_catalog()
        .into_iter()
        .map(|slot| {
            let status = busy_slots
                .iter()
                .find(|entry| entry.slot_start == slot.start)
                .map(|entry| match entry.status {
                    BusyStatus::Pending => SlotStatus::Pending,
                    BusyStatus::Approved => SlotStatus::Approved,
                })
                .unwrap_or(SlotStatus::Available);
            ClassifiedSlot {
                id: slot.id.to_owned(),
                slot_start: slot.start,
                slot_end: slot.end,
                label: slot.label.to_owned(),
                status,
            }
        })
        .collect()
}
