//! Business and staff schedule configuration, and their merge into a
//! [`UnifiedSchedule`].
//!
//! Stored configuration is loosely shaped: hours are `"HH:MM"` strings,
//! closed days are free-form weekday names, and turn-mode parameters are
//! optional fields whose meaning depends on the mode. The merge resolves all
//! of that once, so downstream code works on a fully-typed value.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::time::{minutes_to_time, parse_time};
use crate::weekday::{normalize_weekday_name, parse_weekday, weekday_name_of};

/// Slot-template policy as stored on the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnMode {
    /// N evenly spaced appointments per day.
    #[serde(alias = "custom", alias = "personalizado", alias = "fixedCount")]
    FixedCount,
    /// Fixed-length slots tiling the whole working window.
    #[default]
    #[serde(alias = "workday", alias = "jornada", alias = "fillWorkday")]
    FillWorkday,
}

/// Which half of the day stays bookable on the half-rest day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestSession {
    /// Keep the first half-day of the window.
    #[serde(alias = "manana", alias = "mañana")]
    Morning,
    /// Keep the last half-day of the window.
    #[serde(alias = "tarde")]
    Afternoon,
}

/// Weekly half-day rest pattern.
///
/// The narrowing applies on `half_rest_day`, or on `full_rest_day` when no
/// half-rest day is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HalfDayRest {
    /// Weekday name of the staff member's weekly rest day.
    #[serde(default)]
    pub full_rest_day: Option<String>,
    /// Weekday name of the day only half is worked.
    #[serde(default)]
    pub half_rest_day: Option<String>,
    /// Half of the window that stays bookable on the narrowed day.
    pub rest_session: RestSession,
}

impl HalfDayRest {
    /// Canonical name of the day the narrowing applies to.
    pub fn narrowed_day(&self) -> Option<String> {
        self.half_rest_day
            .as_deref()
            .or(self.full_rest_day.as_deref())
            .filter(|d| !d.trim().is_empty())
            .map(normalize_weekday_name)
    }
}

/// Business-level schedule configuration, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessScheduleConfig {
    /// Weekday names or `0..=6` indexes the business never opens.
    #[serde(default)]
    pub closed_days: Vec<String>,
    /// How the day template is laid out.
    #[serde(default)]
    pub turn_mode: TurnMode,
    /// Appointments per day, read in `FixedCount` mode only.
    #[serde(default)]
    pub customers_per_day: Option<u32>,
    /// Minutes between starts, read in `FillWorkday` mode only.
    #[serde(default)]
    pub slot_gap_minutes: Option<u32>,
    /// Opening time (`"HH:MM"`).
    pub day_start: String,
    /// Closing time (`"HH:MM"`).
    pub day_end: String,
    /// Business-wide half-day rest, used when the staff sets none.
    #[serde(default)]
    pub half_day_rest: Option<HalfDayRest>,
}

/// Per-staff overrides. Every field falls back to the business config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffScheduleOverride {
    /// Staff start time (`"HH:MM"`). Only used together with `end`.
    #[serde(default)]
    pub start: Option<String>,
    /// Staff end time (`"HH:MM"`). Only used together with `start`.
    #[serde(default)]
    pub end: Option<String>,
    /// Staff days off, added to the business's closed days.
    #[serde(default)]
    pub closed_days: Vec<String>,
    /// Staff half-day rest pattern; replaces the business's.
    #[serde(default)]
    pub half_day_rest: Option<HalfDayRest>,
}

/// Resolved slot-template policy. Mode parameters only exist on the mode
/// that uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Turn {
    /// A count of 0 means the business never configured one.
    #[serde(rename_all = "camelCase")]
    FixedCount { customers_per_day: u32 },
    #[serde(rename_all = "camelCase")]
    FillWorkday { gap_minutes: u32 },
}

/// Fully resolved schedule for one (business, staff) pair.
///
/// Derived on every query and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedSchedule {
    /// Minutes since midnight.
    pub start: u32,
    /// Minutes since midnight.
    pub end: u32,
    /// Resolved slot-template policy.
    pub turn: Turn,
    /// Canonical weekday names the business is closed.
    pub closed_days_business: BTreeSet<String>,
    /// Canonical weekday names the staff member is off.
    pub closed_days_staff: BTreeSet<String>,
    /// Union of the two sets above.
    pub closed_days_combined: BTreeSet<String>,
    /// Half-day rest in force, staff first, then business.
    pub half_day_rest: Option<HalfDayRest>,
    /// Length of the window kept on a half-rest day.
    pub half_day_minutes: u32,
}

impl UnifiedSchedule {
    /// Length of the working window; zero or negative for a malformed day.
    pub fn total_minutes(&self) -> i64 {
        i64::from(self.end) - i64::from(self.start)
    }

    pub fn start_time(&self) -> String {
        minutes_to_time(self.start)
    }

    pub fn end_time(&self) -> String {
        minutes_to_time(self.end)
    }

    pub fn customers_per_day(&self) -> Option<u32> {
        match self.turn {
            Turn::FixedCount { customers_per_day } => Some(customers_per_day),
            Turn::FillWorkday { .. } => None,
        }
    }

    pub fn slot_gap_minutes(&self) -> Option<u32> {
        match self.turn {
            Turn::FillWorkday { gap_minutes } => Some(gap_minutes),
            Turn::FixedCount { .. } => None,
        }
    }

    pub fn is_closed_by_business(&self, date: NaiveDate) -> bool {
        self.closed_days_business.contains(weekday_name_of(date))
    }

    pub fn is_closed_by_staff(&self, date: NaiveDate) -> bool {
        self.closed_days_staff.contains(weekday_name_of(date))
    }

    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.closed_days_combined.contains(weekday_name_of(date))
    }

    /// Rest session in force on `date`, if the half-day rule applies.
    ///
    /// The rule is ignored for days no longer than one half-day.
    pub fn rest_session_on(&self, date: NaiveDate) -> Option<RestSession> {
        let rest = self.half_day_rest.as_ref()?;
        if self.total_minutes() <= i64::from(self.half_day_minutes) {
            return None;
        }
        let day = rest.narrowed_day()?;
        (day == weekday_name_of(date)).then_some(rest.rest_session)
    }
}

/// Bookable minute window of one specific day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: u32,
    pub end: u32,
    /// Full working window before any half-day narrowing.
    pub full_start: u32,
    pub full_end: u32,
    /// Set when the window was narrowed for a half-rest day.
    pub rest: Option<RestSession>,
}

impl DayWindow {
    pub fn is_narrowed(&self) -> bool {
        self.rest.is_some()
    }

    /// Does a slot starting at `minutes` fall inside the (possibly narrowed) window?
    pub fn contains_start(&self, minutes: u32) -> bool {
        minutes >= self.start && minutes < self.end
    }
}

/// Resolve the bookable window of `date`, applying half-day rest narrowing.
///
/// This is the single place both the base-slot generator and the day
/// materializer take their window from.
pub fn resolve_effective_window(schedule: &UnifiedSchedule, date: NaiveDate) -> DayWindow {
    let (full_start, full_end) = (schedule.start, schedule.end);
    let (start, end, rest) = match schedule.rest_session_on(date) {
        Some(RestSession::Morning) => (
            full_start,
            full_start + schedule.half_day_minutes,
            Some(RestSession::Morning),
        ),
        Some(RestSession::Afternoon) => (
            full_end.saturating_sub(schedule.half_day_minutes),
            full_end,
            Some(RestSession::Afternoon),
        ),
        None => (full_start, full_end, None),
    };
    DayWindow {
        start,
        end,
        full_start,
        full_end,
        rest,
    }
}

/// Keep the items `keep` accepts; if that would drop everything, keep all.
///
/// Availability narrowed by a rest rule degrades to the full day rather
/// than vanishing.
pub(crate) fn restrict_or_keep_all<T>(items: Vec<T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    if !items.iter().any(&keep) {
        if !items.is_empty() {
            debug!("half-day narrowing left no slots, falling back to the full window");
        }
        return items;
    }
    items.into_iter().filter(|item| keep(item)).collect()
}

fn normalize_days(raw: &[String], owner: &str) -> BTreeSet<String> {
    raw.iter()
        .filter(|d| !d.trim().is_empty())
        .map(|d| {
            if parse_weekday(d).is_none() {
                warn!(day = %d, owner, "unrecognized weekday name in closed days");
            }
            normalize_weekday_name(d)
        })
        .collect()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Merge business configuration with an optional staff override, using the
/// default [`EngineConfig`].
pub fn merge_schedule(
    business: &BusinessScheduleConfig,
    staff: Option<&StaffScheduleOverride>,
) -> UnifiedSchedule {
    merge_schedule_with(business, staff, &EngineConfig::default())
}

/// Merge business configuration with an optional staff override.
///
/// - Hours: the staff window wins only when it sets **both** start and end;
///   otherwise both come from the business.
/// - Closed days: normalized independently, then unioned.
/// - Turn: `FixedCount` takes `customers_per_day` (missing → 0),
///   `FillWorkday` takes `slot_gap_minutes` (missing → `config.default_gap_minutes`).
/// - Half-day rest: staff, else business, else none.
pub fn merge_schedule_with(
    business: &BusinessScheduleConfig,
    staff: Option<&StaffScheduleOverride>,
    config: &EngineConfig,
) -> UnifiedSchedule {
    let staff_window = staff.and_then(|s| Some((present(&s.start)?, present(&s.end)?)));
    let (start_raw, end_raw) =
        staff_window.unwrap_or((business.day_start.as_str(), business.day_end.as_str()));

    let start = parse_time(start_raw);
    let end = parse_time(end_raw);
    if !start.valid || !end.valid {
        warn!(start = start_raw, end = end_raw, "malformed working hours, defaulted leniently");
    }

    let closed_days_business = normalize_days(&business.closed_days, "business");
    let closed_days_staff = staff
        .map(|s| normalize_days(&s.closed_days, "staff"))
        .unwrap_or_default();
    let closed_days_combined = closed_days_business
        .union(&closed_days_staff)
        .cloned()
        .collect();

    let turn = match business.turn_mode {
        TurnMode::FixedCount => Turn::FixedCount {
            customers_per_day: business.customers_per_day.unwrap_or(0),
        },
        TurnMode::FillWorkday => Turn::FillWorkday {
            gap_minutes: business
                .slot_gap_minutes
                .filter(|g| *g > 0)
                .unwrap_or(config.default_gap_minutes),
        },
    };

    let half_day_rest = staff
        .and_then(|s| s.half_day_rest.clone())
        .or_else(|| business.half_day_rest.clone());

    let schedule = UnifiedSchedule {
        start: start.minutes,
        end: end.minutes,
        turn,
        closed_days_business,
        closed_days_staff,
        closed_days_combined,
        half_day_rest,
        half_day_minutes: config.half_day_minutes,
    };
    debug!(
        start = %schedule.start_time(),
        end = %schedule.end_time(),
        turn = ?schedule.turn,
        staff_hours = staff_window.is_some(),
        "merged schedule"
    );
    schedule
}
