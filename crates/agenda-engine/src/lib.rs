//! # agenda-engine
//!
//! Deterministic availability and time-slot computation for a multi-tenant
//! appointment-booking agenda.
//!
//! Businesses configure working hours, closed days and a turn mode; staff
//! members may override hours, closed days and a half-day rest pattern. The
//! engine merges both into a [`UnifiedSchedule`], enumerates bookable days,
//! builds each day's slot template and classifies slots against existing
//! bookings. The computations are pure and synchronous: no ambient clock, no shared
//! state. `now` is always passed in.
//!
//! ## Modules
//!
//! - [`time`]: `"HH:MM"` parsing, date/time combination, date coercion, interval overlap
//! - [`weekday`]: Accent/case-insensitive weekday normalization
//! - [`schedule`]: Business/staff config and the merge into a unified schedule
//! - [`days`]: Day range generation with closure attribution
//! - [`slots`]: Base slot templates (fixed count / fill workday)
//! - [`bookings`]: Normalization of heterogeneous stored booking records
//! - [`materialize`]: Per-day slot materialization and owner view
//! - [`availability`]: Client-facing bookable starts
//! - [`store`]: Booking store port with conditional writes
//! - [`config`]: Engine defaults (TOML)
//! - [`error`]: Error types

pub mod availability;
pub mod bookings;
pub mod config;
pub mod days;
pub mod error;
pub mod materialize;
pub mod schedule;
pub mod slots;
pub mod store;
pub mod time;
pub mod weekday;

pub use availability::{availability_for_range, bookable_starts, DayAvailability};
pub use bookings::{normalize_bookings, NormalizedBooking, RawBookingRecord};
pub use config::EngineConfig;
pub use days::{generate_day_range, CalendarDay};
pub use error::EngineError;
pub use materialize::{materialize_day_slots, owner_day_view, summarize_day, SlotState, TimeSlot};
pub use schedule::{
    merge_schedule, resolve_effective_window, BusinessScheduleConfig, StaffScheduleOverride,
    UnifiedSchedule,
};
pub use slots::{generate_base_slots, has_slot_template};
pub use store::{BookingStore, MemoryBookingStore};
