//! Base time-slot templates: the bookable start times of a working day
//! before any booking is taken into account.

use chrono::NaiveDate;

use crate::schedule::{resolve_effective_window, restrict_or_keep_all, Turn, UnifiedSchedule};
use crate::time::minutes_to_time;

/// Start times of the day template, in minutes since midnight.
///
/// - `FixedCount { n }`: `n` starts spaced `floor(total / n)` apart.
/// - `FillWorkday { gap }`: a start every `gap` minutes while `t + gap <= end`.
///
/// A zero-length or inverted day and a zero count yield an empty template.
/// So does a count larger than the day's minutes: the step would round down
/// to zero and every start would be the same minute.
pub fn base_slot_minutes(schedule: &UnifiedSchedule) -> Vec<u32> {
    let total = schedule.total_minutes();
    if total <= 0 {
        return Vec::new();
    }

    match schedule.turn {
        Turn::FixedCount { customers_per_day } => {
            if customers_per_day == 0 {
                return Vec::new();
            }
            let step = total / i64::from(customers_per_day);
            if step == 0 {
                return Vec::new();
            }
            (0..i64::from(customers_per_day))
                .filter_map(|i| u32::try_from(i64::from(schedule.start) + i * step).ok())
                .collect()
        }
        Turn::FillWorkday { gap_minutes } => {
            if gap_minutes == 0 {
                return Vec::new();
            }
            let mut slots = Vec::new();
            let mut t = schedule.start;
            while let Some(next) = t.checked_add(gap_minutes).filter(|n| *n <= schedule.end) {
                slots.push(t);
                t = next;
            }
            slots
        }
    }
}

/// Base slot template as `"HH:MM"` strings.
///
/// Without `selected_date` the unfiltered template is returned. With a date,
/// a half-day rest rule for that weekday restricts the template to the
/// narrowed window; if nothing would survive, the full template is kept.
pub fn generate_base_slots(
    schedule: &UnifiedSchedule,
    selected_date: Option<NaiveDate>,
) -> Vec<String> {
    let minutes = match selected_date {
        Some(date) => day_template(schedule, date).starts,
        None => base_slot_minutes(schedule),
    };
    minutes.into_iter().map(minutes_to_time).collect()
}

/// Base template of one specific date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTemplate {
    /// Slot starts, in minutes since midnight.
    pub starts: Vec<u32>,
    /// Latest minute a booking starting from the template may run to.
    pub end: u32,
}

/// Template of `date` after half-day rest narrowing, with the graceful
/// fallback to the full template when narrowing would leave nothing.
pub fn day_template(schedule: &UnifiedSchedule, date: NaiveDate) -> DayTemplate {
    let minutes = base_slot_minutes(schedule);
    let window = resolve_effective_window(schedule, date);
    if !window.is_narrowed() {
        return DayTemplate {
            starts: minutes,
            end: schedule.end,
        };
    }
    let narrowed = minutes.iter().any(|m| window.contains_start(*m));
    DayTemplate {
        starts: restrict_or_keep_all(minutes, |m| window.contains_start(*m)),
        end: if narrowed { window.end } else { schedule.end },
    }
}

/// Does this schedule produce any slot template at all?
///
/// `false` means "no availability configured" for the staff member.
pub fn has_slot_template(schedule: &UnifiedSchedule) -> bool {
    !base_slot_minutes(schedule).is_empty()
}
