//! Client-facing availability: which template starts can still be booked.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::bookings::NormalizedBooking;
use crate::days::CalendarDay;
use crate::schedule::UnifiedSchedule;
use crate::slots::day_template;
use crate::time::{combine_date_and_minutes, intervals_overlap, minutes_to_time};

/// Bookable starts of one day in a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub day: CalendarDay,
    /// `"HH:MM"` starts a client can still book.
    pub starts: Vec<String>,
}

/// Template starts of `date` a client can book for a service of
/// `duration_minutes`.
///
/// A start qualifies when it is not before `now`, the service ends within
/// the day's window, and `[start, start + duration)` overlaps no booking or
/// block. Closed days yield nothing.
pub fn bookable_starts(
    schedule: &UnifiedSchedule,
    date: NaiveDate,
    bookings: &[NormalizedBooking],
    now: NaiveDateTime,
    duration_minutes: u32,
) -> Vec<String> {
    if schedule.is_closed(date) {
        return Vec::new();
    }
    let duration = duration_minutes.max(1);
    let template = day_template(schedule, date);
    let day_end = combine_date_and_minutes(date, template.end);

    template
        .starts
        .into_iter()
        .filter(|minutes| {
            let start = combine_date_and_minutes(date, *minutes);
            let end = start + Duration::minutes(i64::from(duration));
            start >= now
                && end <= day_end
                && !bookings
                    .iter()
                    .any(|b| intervals_overlap(start, end, b.start, b.end))
        })
        .map(minutes_to_time)
        .collect()
}

/// [`bookable_starts`] for every day of a generated range.
pub fn availability_for_range(
    schedule: &UnifiedSchedule,
    days: &[CalendarDay],
    bookings: &[NormalizedBooking],
    now: NaiveDateTime,
    duration_minutes: u32,
) -> Vec<DayAvailability> {
    days.iter()
        .map(|day| DayAvailability {
            starts: if day.is_closed {
                Vec::new()
            } else {
                bookable_starts(schedule, day.date, bookings, now, duration_minutes)
            },
            day: day.clone(),
        })
        .collect()
}
