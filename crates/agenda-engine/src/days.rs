//! Enumerate the calendar days offered for booking.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schedule::UnifiedSchedule;
use crate::weekday::weekday_name_of;

/// Default number of days in a booking range.
pub const DEFAULT_DAYS_AHEAD: u32 = 14;

/// One day in a booking range, with closure attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Canonical weekday name.
    pub weekday: String,
    /// Closed by the business or the staff member.
    pub is_closed: bool,
    /// The weekday is one of the business's closed days.
    pub closed_by_business: bool,
    /// The weekday is one of the staff member's days off.
    pub closed_by_staff: bool,
}

/// Produce exactly `days_ahead` consecutive days starting at `from`.
///
/// Days are flagged closed, never filtered out; past-ness is a per-slot
/// concern handled by the materializer.
pub fn generate_day_range(
    schedule: &UnifiedSchedule,
    days_ahead: u32,
    from: NaiveDate,
) -> Vec<CalendarDay> {
    let days: Vec<CalendarDay> = (0..u64::from(days_ahead))
        .filter_map(|offset| from.checked_add_days(Days::new(offset)))
        .map(|date| {
            let closed_by_business = schedule.is_closed_by_business(date);
            let closed_by_staff = schedule.is_closed_by_staff(date);
            CalendarDay {
                date,
                weekday: weekday_name_of(date).to_string(),
                is_closed: closed_by_business || closed_by_staff,
                closed_by_business,
                closed_by_staff,
            }
        })
        .collect();

    debug!(
        from = %from,
        days = days.len(),
        closed = days.iter().filter(|d| d.is_closed).count(),
        "generated day range"
    );
    days
}
