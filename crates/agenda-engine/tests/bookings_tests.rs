//! Tests for normalizing heterogeneous stored booking records.

use agenda_engine::bookings::{
    normalize_booking, normalize_bookings, normalize_bookings_with, ClientRef, RawBookingRecord,
};
use agenda_engine::materialize::{materialize_day_slots, SlotState};
use agenda_engine::schedule::{merge_schedule, BusinessScheduleConfig, TurnMode};
use agenda_engine::EngineError;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn record(value: serde_json::Value) -> RawBookingRecord {
    serde_json::from_value(value).unwrap()
}

#[test]
fn hh_mm_duration_is_a_duration_not_a_decimal() {
    let raw = record(json!({"fecha": "2025-03-10", "hora": "14:00", "duracion": "1:30"}));
    let bookings = normalize_bookings(&[raw]);

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].start, at(2025, 3, 10, 14, 0));
    assert_eq!(bookings[0].end, at(2025, 3, 10, 15, 30));
}

#[test]
fn explicit_start_and_end_win() {
    let raw = record(json!({
        "id": "abc",
        "start": "2025-03-10T09:00:00",
        "end": "2025-03-10T09:45:00",
        "fecha": "2025-03-11",
        "hora": "16:00"
    }));
    let booking = normalize_booking(&raw, 30).unwrap();
    assert_eq!(booking.id, "abc");
    assert_eq!(booking.start, at(2025, 3, 10, 9, 0));
    assert_eq!(booking.end, at(2025, 3, 10, 9, 45));
}

#[test]
fn inverted_explicit_interval_falls_back_to_date_and_time() {
    let raw = record(json!({
        "start": "2025-03-10T10:00:00",
        "end": "2025-03-10T09:00:00",
        "date": "2025-03-10",
        "time": "11:00",
        "duration": 45
    }));
    let booking = normalize_booking(&raw, 30).unwrap();
    assert_eq!(booking.start, at(2025, 3, 10, 11, 0));
    assert_eq!(booking.end, at(2025, 3, 10, 11, 45));
}

#[test]
fn timestamp_wrappers_are_accepted() {
    // 2025-03-10T14:00:00Z and 15:00:00Z
    let raw = record(json!({
        "startAt": {"seconds": 1_741_615_200_i64, "nanoseconds": 0},
        "endAt": {"_seconds": 1_741_618_800_i64, "_nanoseconds": 0}
    }));
    let booking = normalize_booking(&raw, 30).unwrap();
    assert_eq!(booking.start, at(2025, 3, 10, 14, 0));
    assert_eq!(booking.end, at(2025, 3, 10, 15, 0));
}

#[test]
fn date_field_may_be_a_timestamp() {
    let raw = record(json!({
        "fecha": {"seconds": 1_741_564_800_i64},
        "horaInicio": "08:30",
        "duracionMinutos": "60"
    }));
    let booking = normalize_booking(&raw, 30).unwrap();
    assert_eq!(booking.start, at(2025, 3, 10, 8, 30));
    assert_eq!(booking.end, at(2025, 3, 10, 9, 30));
}

#[test]
fn unparsable_duration_defaults() {
    let raw = record(json!({"fecha": "2025-03-10", "hora": "14:00", "duracion": "un rato"}));
    assert_eq!(normalize_booking(&raw, 30).unwrap().duration_minutes(), 30);
    assert_eq!(normalize_booking(&raw, 45).unwrap().duration_minutes(), 45);

    let missing = record(json!({"fecha": "2025-03-10", "hora": "14:00"}));
    assert_eq!(normalize_bookings_with(&[missing], 20)[0].duration_minutes(), 20);
}

#[test]
fn unresolvable_records_are_dropped_not_fatal() {
    let good = record(json!({"id": "ok", "fecha": "2025-03-10", "hora": "10:00"}));
    let no_time = record(json!({"id": "no-time", "fecha": "2025-03-10"}));
    let garbage_date = record(json!({"id": "bad-date", "fecha": "ayer", "hora": "10:00"}));
    let blank_time = record(json!({"id": "blank-time", "fecha": "2025-03-10", "hora": " "}));
    let empty = RawBookingRecord::new();

    let bookings = normalize_bookings(&[no_time.clone(), good, garbage_date, blank_time, empty]);
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, "ok");

    assert!(matches!(
        normalize_booking(&no_time, 30),
        Err(EngineError::UnresolvableBooking(id)) if id == "no-time"
    ));
}

#[test]
fn time_with_seconds_is_placed_on_the_timeline() {
    let raw = record(json!({"fecha": "2025-03-10", "hora": "14:30:00", "duracion": 60}));
    let bookings = normalize_bookings(&[raw]);

    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].start, at(2025, 3, 10, 14, 30));
    assert_eq!(bookings[0].end, at(2025, 3, 10, 15, 30));

    let schedule = merge_schedule(
        &BusinessScheduleConfig {
            closed_days: vec![],
            turn_mode: TurnMode::FillWorkday,
            customers_per_day: None,
            slot_gap_minutes: Some(30),
            day_start: "09:00".to_string(),
            day_end: "18:00".to_string(),
            half_day_rest: None,
        },
        None,
    );
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let slots = materialize_day_slots(&schedule, date, &bookings, at(2025, 3, 10, 8, 0), 30);
    let state_at = |time: &str| slots.iter().find(|s| s.time == time).map(|s| s.state);
    assert_eq!(state_at("14:00"), Some(SlotState::Free));
    assert_eq!(state_at("14:30"), Some(SlotState::Booked));
    assert_eq!(state_at("15:00"), Some(SlotState::Booked));
    assert_eq!(state_at("15:30"), Some(SlotState::Free));
}

#[test]
fn numeric_hour_is_accepted() {
    let raw = record(json!({"id": "n", "fecha": "2025-03-10", "hora": 14}));
    let booking = normalize_booking(&raw, 30).unwrap();
    assert_eq!(booking.start, at(2025, 3, 10, 14, 0));
    assert_eq!(booking.end, at(2025, 3, 10, 14, 30));
}

#[test]
fn malformed_time_is_read_leniently() {
    let raw = record(json!({"id": "t", "fecha": "2025-03-10", "hora": "tarde"}));
    let booking = normalize_booking(&raw, 30).unwrap();
    assert_eq!(booking.start, at(2025, 3, 10, 0, 0));
}

#[test]
fn output_is_sorted_by_start() {
    let raws = vec![
        record(json!({"id": "c", "fecha": "2025-03-11", "hora": "09:00"})),
        record(json!({"id": "a", "fecha": "2025-03-10", "hora": "15:00"})),
        record(json!({"id": "b", "start": "2025-03-10T16:00:00", "end": "2025-03-10T17:00:00"})),
        record(json!({"id": "z", "fecha": "2025-03-10", "hora": "08:00"})),
    ];
    let ids: Vec<String> = normalize_bookings(&raws).into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec!["z", "a", "b", "c"]);
}

#[test]
fn metadata_is_carried_through() {
    let raw = record(json!({
        "id": 42,
        "fecha": "2025-03-10",
        "hora": "10:00",
        "bloqueado": true,
        "servicioId": "svc-1",
        "servicioNombre": "Corte",
        "cliente": {"uid": "u1", "nombre": "Ana", "email": "ana@example.com"},
        "telefono": "+54 11 5555 0000"
    }));
    let booking = normalize_booking(&raw, 30).unwrap();

    assert_eq!(booking.id, "42");
    assert!(booking.is_blocked);
    assert_eq!(booking.service_id.as_deref(), Some("svc-1"));
    assert_eq!(booking.service_name.as_deref(), Some("Corte"));
    assert_eq!(
        booking.client,
        Some(ClientRef {
            uid: Some("u1".into()),
            name: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            phone: Some("+54 11 5555 0000".into()),
        })
    );
}

#[test]
fn defaults_for_absent_metadata() {
    let raw = record(json!({"date": "2025-03-10", "time": "10:00"}));
    let booking = normalize_booking(&raw, 30).unwrap();
    assert!(!booking.is_blocked);
    assert_eq!(booking.id, "");
    assert_eq!(booking.service_id, None);
    assert_eq!(booking.client, None);
}
