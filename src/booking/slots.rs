//! Candidate start times for a service on a given day.
//!
//! Candidates are laid on a fixed 30 minute grid from opening time, whatever
//! the service length. A candidate survives if the service ends by closing
//! time and its `[start, start + duration)` interval doesn't overlap any
//! appointment that still holds its slot.

use chrono::{Duration, NaiveTime};

use crate::models::{BookedSlot, DayHours};

pub const SLOT_STEP_MINUTES: i64 = 30;

/// Minutes since midnight. Working in plain minutes keeps the end of a late
/// service from wrapping past midnight the way `NaiveTime` arithmetic does.
fn minutes(time: NaiveTime) -> i64 {
    (time - NaiveTime::MIN).num_minutes()
}

fn overlaps(start: i64, end: i64, other_start: i64, other_end: i64) -> bool {
    start < other_end && end > other_start
}

pub fn available_slots(
    hours: &DayHours,
    duration_minutes: i32,
    existing: &[BookedSlot],
) -> Vec<NaiveTime> {
    if hours.closed || duration_minutes <= 0 {
        return Vec::new();
    }

    let duration = i64::from(duration_minutes);
    let open = minutes(hours.open);
    let close = minutes(hours.close);

    let busy: Vec<(i64, i64)> = existing
        .iter()
        .filter(|b| b.status.blocks_slot())
        .map(|b| {
            let start = minutes(b.start_time);
            (start, start + i64::from(b.duration.max(0)))
        })
        .collect();

    let mut slots = Vec::new();
    let mut start = open;
    while start + duration <= close {
        let end = start + duration;
        if !busy.iter().any(|&(s, e)| overlaps(start, end, s, e)) {
            slots.push(hours.open + Duration::minutes(start - open));
        }
        start += SLOT_STEP_MINUTES;
    }
    slots
}

pub fn is_slot_available(
    hours: &DayHours,
    duration_minutes: i32,
    existing: &[BookedSlot],
    start_time: NaiveTime,
) -> bool {
    available_slots(hours, duration_minutes, existing).contains(&start_time)
}

/// Appointments that still hold their slot and overlap
/// `[start_time, start_time + duration)`.
pub fn overlapping<'a>(
    existing: &'a [BookedSlot],
    start_time: NaiveTime,
    duration_minutes: i32,
) -> Vec<&'a BookedSlot> {
    let start = minutes(start_time);
    let end = start + i64::from(duration_minutes.max(0));
    existing
        .iter()
        .filter(|b| b.status.blocks_slot())
        .filter(|b| {
            let other = minutes(b.start_time);
            overlaps(start, end, other, other + i64::from(b.duration.max(0)))
        })
        .collect()
}
