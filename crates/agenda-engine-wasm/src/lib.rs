//! WASM bindings for agenda-engine.
//!
//! Exposes schedule merging, day ranges, base slots, booking normalization
//! and slot materialization to the browser via `wasm-bindgen`. All complex
//! types cross the boundary as JSON strings; dates are `"YYYY-MM-DD"` and
//! instants are wall-clock ISO strings (`"2025-03-10T14:00:00"`).
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p agenda-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/agenda-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/agenda_engine_wasm.wasm
//! ```

use agenda_engine::bookings::{normalize_bookings_with, NormalizedBooking, RawBookingRecord};
use agenda_engine::materialize::DEFAULT_SLOT_GRANULARITY_MINUTES;
use agenda_engine::schedule::{BusinessScheduleConfig, StaffScheduleOverride, UnifiedSchedule};
use agenda_engine::time::coerce_to_date;
use agenda_engine::EngineConfig;
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Helpers: JSON and date parsing at the boundary
// ---------------------------------------------------------------------------

fn from_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn parse_date(s: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", s, e)))
}

/// Parse an instant the same way stored booking dates are coerced.
fn parse_instant(s: &str) -> Result<NaiveDateTime, JsValue> {
    coerce_to_date(&serde_json::Value::String(s.to_string()))
        .ok_or_else(|| JsValue::from_str(&format!("Invalid datetime '{}'", s)))
}

fn parse_bookings(json: &str) -> Result<Vec<NormalizedBooking>, JsValue> {
    from_json("bookings", json)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Merge a business config with an optional staff override.
///
/// Returns the unified schedule as JSON; pass it back to the other exports.
#[wasm_bindgen(js_name = "mergeSchedule")]
pub fn merge_schedule(business_json: &str, staff_json: Option<String>) -> Result<String, JsValue> {
    let business: BusinessScheduleConfig = from_json("business", business_json)?;
    let staff: Option<StaffScheduleOverride> = staff_json
        .as_deref()
        .map(|json| from_json("staff", json))
        .transpose()?;
    to_json(&agenda_engine::merge_schedule(&business, staff.as_ref()))
}

/// Enumerate `days_ahead` days from `from` (defaults to 14 days).
#[wasm_bindgen(js_name = "generateDayRange")]
pub fn generate_day_range(
    schedule_json: &str,
    from: &str,
    days_ahead: Option<u32>,
) -> Result<String, JsValue> {
    let schedule: UnifiedSchedule = from_json("schedule", schedule_json)?;
    let days_ahead = days_ahead.unwrap_or(EngineConfig::default().days_ahead);
    to_json(&agenda_engine::generate_day_range(&schedule, days_ahead, parse_date(from)?))
}

/// Base slot template, optionally for a specific date (applies half-day rest).
#[wasm_bindgen(js_name = "generateBaseSlots")]
pub fn generate_base_slots(
    schedule_json: &str,
    selected_date: Option<String>,
) -> Result<String, JsValue> {
    let schedule: UnifiedSchedule = from_json("schedule", schedule_json)?;
    let date = selected_date.as_deref().map(parse_date).transpose()?;
    to_json(&agenda_engine::generate_base_slots(&schedule, date))
}

/// Normalize raw stored booking records. Unresolvable records are dropped.
#[wasm_bindgen(js_name = "normalizeBookings")]
pub fn normalize_bookings(records_json: &str) -> Result<String, JsValue> {
    let records: Vec<RawBookingRecord> = from_json("booking records", records_json)?;
    let default_minutes = EngineConfig::default().default_booking_minutes;
    to_json(&normalize_bookings_with(&records, default_minutes))
}

/// Materialize one day's slots against normalized bookings.
#[wasm_bindgen(js_name = "materializeDaySlots")]
pub fn materialize_day_slots(
    schedule_json: &str,
    date: &str,
    bookings_json: &str,
    now: &str,
    granularity: Option<u32>,
) -> Result<String, JsValue> {
    let schedule: UnifiedSchedule = from_json("schedule", schedule_json)?;
    let slots = agenda_engine::materialize_day_slots(
        &schedule,
        parse_date(date)?,
        &parse_bookings(bookings_json)?,
        parse_instant(now)?,
        granularity.unwrap_or(DEFAULT_SLOT_GRANULARITY_MINUTES),
    );
    to_json(&slots)
}

/// Owner calendar view of one day, closed time included.
#[wasm_bindgen(js_name = "ownerDayView")]
pub fn owner_day_view(
    schedule_json: &str,
    date: &str,
    bookings_json: &str,
    now: &str,
    granularity: Option<u32>,
) -> Result<String, JsValue> {
    let schedule: UnifiedSchedule = from_json("schedule", schedule_json)?;
    let slots = agenda_engine::owner_day_view(
        &schedule,
        parse_date(date)?,
        &parse_bookings(bookings_json)?,
        parse_instant(now)?,
        granularity.unwrap_or(DEFAULT_SLOT_GRANULARITY_MINUTES),
    );
    to_json(&serde_json::json!({
        "summary": agenda_engine::summarize_day(&slots),
        "slots": slots,
    }))
}

/// Starts a client can book for a service of `duration_minutes`.
#[wasm_bindgen(js_name = "bookableStarts")]
pub fn bookable_starts(
    schedule_json: &str,
    date: &str,
    bookings_json: &str,
    now: &str,
    duration_minutes: u32,
) -> Result<String, JsValue> {
    let schedule: UnifiedSchedule = from_json("schedule", schedule_json)?;
    to_json(&agenda_engine::bookable_starts(
        &schedule,
        parse_date(date)?,
        &parse_bookings(bookings_json)?,
        parse_instant(now)?,
        duration_minutes,
    ))
}

/// Blocked raw records covering every free slot of `date`, to be written as
/// one batch. Slots taken by `bookings_json` are left alone.
#[wasm_bindgen(js_name = "blockDayRecords")]
pub fn block_day_records(
    schedule_json: &str,
    date: &str,
    bookings_json: &str,
    granularity: Option<u32>,
) -> Result<String, JsValue> {
    let schedule: UnifiedSchedule = from_json("schedule", schedule_json)?;
    to_json(&agenda_engine::store::block_day_records(
        &schedule,
        parse_date(date)?,
        &parse_bookings(bookings_json)?,
        granularity.unwrap_or(DEFAULT_SLOT_GRANULARITY_MINUTES),
    ))
}
