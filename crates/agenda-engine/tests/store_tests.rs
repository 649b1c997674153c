//! Tests for the booking store port and its in-memory implementation.

use agenda_engine::bookings::{normalize_bookings, RawBookingRecord};
use agenda_engine::materialize::{materialize_day_slots, SlotState};
use agenda_engine::schedule::{merge_schedule, BusinessScheduleConfig, TurnMode, UnifiedSchedule};
use agenda_engine::store::{block_day_records, BookingStore, MemoryBookingStore};
use agenda_engine::EngineError;
use chrono::NaiveDate;

fn hourly(start: &str, end: &str) -> RawBookingRecord {
    RawBookingRecord::new()
        .with("fecha", "2025-03-10")
        .with("hora", start)
        .with("duracion", end)
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

#[test]
fn create_assigns_ids_and_stores_records() {
    let mut store = MemoryBookingStore::default();
    let first = store.create("ana", hourly("10:00", "60")).unwrap();
    let second = store.create("ana", hourly("11:00", "60")).unwrap();

    assert_ne!(first, second);
    assert_eq!(store.bookings_for("ana").len(), 2);
    assert!(store.bookings_for("luis").is_empty());
}

#[test]
fn overlapping_create_is_rejected() {
    let mut store = MemoryBookingStore::default();
    let id = store.create("ana", hourly("10:00", "60")).unwrap();

    let err = store.create("ana", hourly("10:30", "30")).unwrap_err();
    assert!(matches!(err, EngineError::SlotTaken { ref existing, .. } if *existing == id));
    assert_eq!(store.bookings_for("ana").len(), 1);

    // Other staff members are independent.
    assert!(store.create("luis", hourly("10:30", "30")).is_ok());
}

#[test]
fn touching_bookings_are_allowed() {
    let mut store = MemoryBookingStore::default();
    store.create("ana", hourly("10:00", "60")).unwrap();
    assert!(store.create("ana", hourly("11:00", "60")).is_ok());
    assert!(store.create("ana", hourly("09:00", "1:00")).is_ok());
}

#[test]
fn unresolvable_record_is_rejected() {
    let mut store = MemoryBookingStore::default();
    let err = store
        .create("ana", RawBookingRecord::new().with("fecha", "2025-03-10"))
        .unwrap_err();
    assert!(matches!(err, EngineError::UnresolvableBooking(_)));
}

#[test]
fn batch_is_all_or_nothing() {
    let mut store = MemoryBookingStore::default();
    store.create("ana", hourly("12:00", "60")).unwrap();

    let batch = vec![hourly("09:00", "60"), hourly("10:00", "60"), hourly("12:30", "30")];
    assert!(store.create_batch("ana", batch).is_err());
    assert_eq!(store.bookings_for("ana").len(), 1);

    // Overlap within the batch itself is rejected too.
    let inner = vec![hourly("09:00", "60"), hourly("09:30", "60")];
    assert!(matches!(
        store.create_batch("ana", inner),
        Err(EngineError::SlotTaken { .. })
    ));
    assert_eq!(store.bookings_for("ana").len(), 1);

    let ok = vec![hourly("09:00", "60"), hourly("10:00", "60")];
    assert_eq!(store.create_batch("ana", ok).unwrap().len(), 2);
    assert_eq!(store.bookings_for("ana").len(), 3);
}

#[test]
fn delete_releases_the_slot() {
    let mut store = MemoryBookingStore::default();
    let id = store.create("ana", hourly("10:00", "60")).unwrap();

    let removed = store.delete("ana", &id).unwrap();
    assert_eq!(removed.id().as_deref(), Some(id.as_str()));
    assert!(store.bookings_for("ana").is_empty());
    assert!(store.create("ana", hourly("10:00", "60")).is_ok());

    assert!(matches!(
        store.delete("ana", "nope"),
        Err(EngineError::BookingNotFound(_))
    ));
    assert!(matches!(
        store.delete("nobody", &id),
        Err(EngineError::BookingNotFound(_))
    ));
}

fn morning_schedule() -> UnifiedSchedule {
    merge_schedule(
        &BusinessScheduleConfig {
            closed_days: vec!["domingo".to_string()],
            turn_mode: TurnMode::FillWorkday,
            customers_per_day: None,
            slot_gap_minutes: Some(60),
            day_start: "09:00".to_string(),
            day_end: "13:00".to_string(),
            half_day_rest: None,
        },
        None,
    )
}

#[test]
fn failed_create_does_not_consume_an_id() {
    let mut store = MemoryBookingStore::default();
    assert_eq!(store.create("ana", hourly("10:00", "60")).unwrap(), "b1");
    assert!(store.create("ana", hourly("10:30", "30")).is_err());
    assert!(store.create("ana", RawBookingRecord::new()).is_err());
    assert_eq!(store.create("ana", hourly("12:00", "60")).unwrap(), "b2");
}

#[test]
fn generated_ids_skip_caller_supplied_ones() {
    let mut store = MemoryBookingStore::default();
    store
        .create("luis", hourly("09:00", "60").with("id", "b1"))
        .unwrap();
    store
        .create("ana", hourly("09:00", "60").with("id", "b2"))
        .unwrap();

    let generated = store.create("ana", hourly("11:00", "60")).unwrap();
    assert_eq!(generated, "b3");

    let batch = store
        .create_batch("ana", vec![hourly("12:00", "30"), hourly("12:30", "30")])
        .unwrap();
    assert_eq!(batch, vec!["b4", "b5"]);
}

#[test]
fn blocking_a_whole_day_blocks_every_slot() {
    let schedule = morning_schedule();
    let records = block_day_records(&schedule, monday(), &[], 30);
    assert_eq!(records.len(), 8);

    let mut store = MemoryBookingStore::default();
    store.create_batch("ana", records).unwrap();

    let bookings = normalize_bookings(&store.bookings_for("ana"));
    assert!(bookings.iter().all(|b| b.is_blocked));

    let now = monday().and_hms_opt(0, 0, 0).unwrap();
    let slots = materialize_day_slots(&schedule, monday(), &bookings, now, 30);
    assert!(slots.iter().all(|s| s.state == SlotState::Blocked));

    let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
    assert!(block_day_records(&schedule, sunday, &[], 30).is_empty());
}

#[test]
fn blocking_a_day_keeps_existing_bookings() {
    let schedule = morning_schedule();
    let mut store = MemoryBookingStore::default();
    let existing = store.create("ana", hourly("10:00", "60")).unwrap();

    let bookings = normalize_bookings(&store.bookings_for("ana"));
    let records = block_day_records(&schedule, monday(), &bookings, 30);
    assert_eq!(records.len(), 6);
    assert!(records
        .iter()
        .all(|r| r.0["hora"] != "10:00" && r.0["hora"] != "10:30"));

    store.create_batch("ana", records).unwrap();

    let bookings = normalize_bookings(&store.bookings_for("ana"));
    let now = monday().and_hms_opt(0, 0, 0).unwrap();
    let slots = materialize_day_slots(&schedule, monday(), &bookings, now, 30);
    assert_eq!(slots.len(), 8);
    for slot in &slots {
        let expected = if slot.time == "10:00" || slot.time == "10:30" {
            SlotState::Booked
        } else {
            SlotState::Blocked
        };
        assert_eq!(slot.state, expected, "slot {}", slot.time);
    }
    assert!(bookings.iter().any(|b| b.id == existing && !b.is_blocked));
}
