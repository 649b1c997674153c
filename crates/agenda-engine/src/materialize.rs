//! Day slot materialization: one day's time slots, each tagged with its state.
//!
//! The materializer renders at a fixed granularity for display and
//! management, independent of the business's turn spacing. Every call is a
//! fresh read: slots carry no state between calls and `now` is always an
//! explicit argument.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::bookings::NormalizedBooking;
use crate::schedule::{resolve_effective_window, UnifiedSchedule};
use crate::time::{combine_date_and_minutes, intervals_overlap, minutes_to_time};

/// Default display step of a materialized day.
pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 30;

/// Display state of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    Free,
    Booked,
    Blocked,
    Past,
    ClosedByBusiness,
    ClosedByStaffRest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub date: NaiveDate,
    /// `"HH:MM"` start of the slot.
    pub time: String,
    pub start: NaiveDateTime,
    /// `start` plus the granularity.
    pub end: NaiveDateTime,
    pub state: SlotState,
    /// First booking overlapping the slot, if any.
    pub covering_booking: Option<NormalizedBooking>,
}

/// Slot starts from `start` while the slot still ends within `end`.
fn walk(start: u32, end: u32, step: u32) -> Vec<u32> {
    if step == 0 {
        return Vec::new();
    }
    let mut starts = Vec::new();
    let mut t = start;
    while let Some(next) = t.checked_add(step).filter(|n| *n <= end) {
        starts.push(t);
        t = next;
    }
    starts
}

/// Minute range actually rendered for `date`: the half-day window when it
/// holds at least one slot, else the full working window.
fn effective_range(schedule: &UnifiedSchedule, date: NaiveDate, granularity: u32) -> (u32, u32) {
    let window = resolve_effective_window(schedule, date);
    if window.is_narrowed() && walk(window.start, window.end, granularity).is_empty() {
        tracing::debug!(%date, "half-day window too short for granularity, using full window");
        return (window.full_start, window.full_end);
    }
    (window.start, window.end)
}

fn bookings_on(bookings: &[NormalizedBooking], date: NaiveDate) -> Vec<&NormalizedBooking> {
    bookings.iter().filter(|b| b.start.date() == date).collect()
}

fn covering<'a>(
    bookings: &[&'a NormalizedBooking],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Option<&'a NormalizedBooking> {
    bookings
        .iter()
        .copied()
        .find(|b| intervals_overlap(start, end, b.start, b.end))
}

/// Past wins over every other open-day state.
fn classify(
    booking: Option<&NormalizedBooking>,
    start: NaiveDateTime,
    now: NaiveDateTime,
) -> SlotState {
    if start < now {
        return SlotState::Past;
    }
    match booking {
        Some(b) if b.is_blocked => SlotState::Blocked,
        Some(_) => SlotState::Booked,
        None => SlotState::Free,
    }
}

fn make_slot(
    date: NaiveDate,
    minutes: u32,
    granularity: u32,
    state: SlotState,
    booking: Option<&NormalizedBooking>,
) -> TimeSlot {
    let start = combine_date_and_minutes(date, minutes);
    TimeSlot {
        date,
        time: minutes_to_time(minutes),
        start,
        end: start + Duration::minutes(i64::from(granularity)),
        state,
        covering_booking: booking.cloned(),
    }
}

/// Materialize the slots of `date` for one staff member.
///
/// Closed days (business or staff) produce no slots; the day range is where
/// closure is reported. Open days are walked in `granularity` steps over the
/// effective window, and each slot is classified against the bookings that
/// start on `date` and against `now`.
pub fn materialize_day_slots(
    schedule: &UnifiedSchedule,
    date: NaiveDate,
    bookings: &[NormalizedBooking],
    now: NaiveDateTime,
    granularity: u32,
) -> Vec<TimeSlot> {
    if schedule.is_closed_by_business(date) || schedule.is_closed_by_staff(date) {
        return Vec::new();
    }

    let (start, end) = effective_range(schedule, date, granularity);
    let day_bookings = bookings_on(bookings, date);

    walk(start, end, granularity)
        .into_iter()
        .map(|minutes| {
            let slot_start = combine_date_and_minutes(date, minutes);
            let slot_end = slot_start + Duration::minutes(i64::from(granularity));
            let booking = covering(&day_bookings, slot_start, slot_end);
            let state = classify(booking, slot_start, now);
            make_slot(date, minutes, granularity, state, booking)
        })
        .collect()
}

/// Owner calendar view of `date`.
///
/// Walks the full working window and, unlike [`materialize_day_slots`],
/// keeps closed time visible: every slot of a business closed day is
/// `ClosedByBusiness`; every slot of a staff closed day, and every slot
/// outside a half-rest day's window, is `ClosedByStaffRest`.
pub fn owner_day_view(
    schedule: &UnifiedSchedule,
    date: NaiveDate,
    bookings: &[NormalizedBooking],
    now: NaiveDateTime,
    granularity: u32,
) -> Vec<TimeSlot> {
    let closed_state = if schedule.is_closed_by_business(date) {
        Some(SlotState::ClosedByBusiness)
    } else if schedule.is_closed_by_staff(date) {
        Some(SlotState::ClosedByStaffRest)
    } else {
        None
    };

    let (open_start, open_end) = effective_range(schedule, date, granularity);
    let day_bookings = bookings_on(bookings, date);

    walk(schedule.start, schedule.end, granularity)
        .into_iter()
        .map(|minutes| {
            let slot_start = combine_date_and_minutes(date, minutes);
            let slot_end = slot_start + Duration::minutes(i64::from(granularity));
            let booking = covering(&day_bookings, slot_start, slot_end);
            let inside_window = minutes >= open_start && minutes + granularity <= open_end;
            let state = match closed_state {
                Some(state) => state,
                None if !inside_window => SlotState::ClosedByStaffRest,
                None => classify(booking, slot_start, now),
            };
            make_slot(date, minutes, granularity, state, booking)
        })
        .collect()
}

/// Counts of slot states for one materialized day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub free: usize,
    pub booked: usize,
    pub blocked: usize,
    pub past: usize,
    pub closed: usize,
    /// Slots exist but none is free. A fully booked day is shown, not hidden.
    pub fully_booked: bool,
}

pub fn summarize_day(slots: &[TimeSlot]) -> DaySummary {
    let mut summary = DaySummary::default();
    for slot in slots {
        match slot.state {
            SlotState::Free => summary.free += 1,
            SlotState::Booked => summary.booked += 1,
            SlotState::Blocked => summary.blocked += 1,
            SlotState::Past => summary.past += 1,
            SlotState::ClosedByBusiness | SlotState::ClosedByStaffRest => summary.closed += 1,
        }
    }
    summary.fully_booked = !slots.is_empty() && summary.free == 0;
    summary
}
