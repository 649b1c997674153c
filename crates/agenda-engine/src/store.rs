//! Booking store port.
//!
//! The engine never performs I/O; the application reads raw records through
//! a [`BookingStore`] and hands them to the normalizer. Writes are where
//! double-booking must be prevented: two clients can both see a slot as
//! free, so a create is a conditional write that re-checks overlap against
//! what is stored at write time. [`MemoryBookingStore`] is the reference
//! implementation of that contract.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::bookings::{
    normalize_booking, NormalizedBooking, RawBookingRecord, DEFAULT_BOOKING_MINUTES,
};
use crate::error::{EngineError, Result};
use crate::materialize::{materialize_day_slots, SlotState};
use crate::schedule::UnifiedSchedule;
use crate::time::intervals_overlap;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub trait BookingStore {
    /// All raw booking records of one staff member.
    fn bookings_for(&self, staff_id: &str) -> Vec<RawBookingRecord>;

    /// Create one booking, rejecting it if it overlaps a stored one.
    /// Returns the booking id.
    fn create(&mut self, staff_id: &str, record: RawBookingRecord) -> Result<String>;

    /// Create several bookings atomically: either all are stored or none.
    fn create_batch(
        &mut self,
        staff_id: &str,
        records: Vec<RawBookingRecord>,
    ) -> Result<Vec<String>>;

    /// Delete a booking, returning the removed record.
    fn delete(&mut self, staff_id: &str, booking_id: &str) -> Result<RawBookingRecord>;
}

/// In-memory [`BookingStore`] keyed by staff id.
#[derive(Debug, Clone)]
pub struct MemoryBookingStore {
    bookings: HashMap<String, Vec<RawBookingRecord>>,
    next_id: u64,
    default_minutes: u32,
}

impl Default for MemoryBookingStore {
    fn default() -> Self {
        Self::new(DEFAULT_BOOKING_MINUTES)
    }
}

impl MemoryBookingStore {
    /// `default_minutes` is the duration assumed for records without a parsable one.
    pub fn new(default_minutes: u32) -> Self {
        Self {
            bookings: HashMap::new(),
            next_id: 1,
            default_minutes,
        }
    }

    fn id_in_use(&self, id: &str, pending: &[NormalizedBooking]) -> bool {
        pending.iter().any(|b| b.id == id)
            || self
                .bookings
                .values()
                .flatten()
                .any(|r| r.id().as_deref() == Some(id))
    }

    /// Give `record` a generated id if it has none, counting from `next_id`.
    /// Generated ids skip any id already stored or pending. Returns the
    /// counter value to commit once the record is accepted.
    fn with_id(
        &self,
        mut record: RawBookingRecord,
        mut next_id: u64,
        pending: &[NormalizedBooking],
    ) -> (RawBookingRecord, u64) {
        if record.id().is_some() {
            return (record, next_id);
        }
        let id = loop {
            let id = format!("b{}", next_id);
            next_id += 1;
            if !self.id_in_use(&id, pending) {
                break id;
            }
        };
        record.0.insert("id".to_string(), id.into());
        (record, next_id)
    }

    fn stored(&self, staff_id: &str) -> Vec<NormalizedBooking> {
        self.bookings
            .get(staff_id)
            .map(|records| {
                records
                    .iter()
                    .filter_map(|r| normalize_booking(r, self.default_minutes).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn check_free(candidate: &NormalizedBooking, taken: &[NormalizedBooking]) -> Result<()> {
    match taken
        .iter()
        .find(|b| intervals_overlap(candidate.start, candidate.end, b.start, b.end))
    {
        Some(existing) => Err(EngineError::SlotTaken {
            start: candidate.start.format(ISO_FORMAT).to_string(),
            end: candidate.end.format(ISO_FORMAT).to_string(),
            existing: existing.id.clone(),
        }),
        None => Ok(()),
    }
}

impl BookingStore for MemoryBookingStore {
    fn bookings_for(&self, staff_id: &str) -> Vec<RawBookingRecord> {
        self.bookings.get(staff_id).cloned().unwrap_or_default()
    }

    fn create(&mut self, staff_id: &str, record: RawBookingRecord) -> Result<String> {
        let (record, next_id) = self.with_id(record, self.next_id, &[]);
        let candidate = normalize_booking(&record, self.default_minutes)?;
        check_free(&candidate, &self.stored(staff_id))?;

        self.next_id = next_id;
        debug!(staff_id, booking_id = %candidate.id, start = %candidate.start, "booking created");
        self.bookings
            .entry(staff_id.to_string())
            .or_default()
            .push(record);
        Ok(candidate.id)
    }

    fn create_batch(
        &mut self,
        staff_id: &str,
        records: Vec<RawBookingRecord>,
    ) -> Result<Vec<String>> {
        let mut taken = self.stored(staff_id);
        let mut accepted = Vec::with_capacity(records.len());
        let mut ids = Vec::with_capacity(records.len());
        let mut next_id = self.next_id;

        for record in records {
            let (record, next) = self.with_id(record, next_id, &taken);
            next_id = next;
            let candidate = normalize_booking(&record, self.default_minutes)?;
            check_free(&candidate, &taken)?;
            ids.push(candidate.id.clone());
            taken.push(candidate);
            accepted.push(record);
        }

        self.next_id = next_id;
        info!(staff_id, count = accepted.len(), "booking batch created");
        self.bookings
            .entry(staff_id.to_string())
            .or_default()
            .extend(accepted);
        Ok(ids)
    }

    fn delete(&mut self, staff_id: &str, booking_id: &str) -> Result<RawBookingRecord> {
        let records = self
            .bookings
            .get_mut(staff_id)
            .ok_or_else(|| EngineError::BookingNotFound(booking_id.to_string()))?;
        let index = records
            .iter()
            .position(|r| r.id().as_deref() == Some(booking_id))
            .ok_or_else(|| EngineError::BookingNotFound(booking_id.to_string()))?;
        debug!(staff_id, booking_id, "booking deleted");
        Ok(records.remove(index))
    }
}

/// Blocked records covering every free slot of `date`, ready to be written
/// with [`BookingStore::create_batch`].
///
/// Slots already taken by one of `bookings` are skipped, so the batch never
/// collides with them. Closed days produce nothing.
pub fn block_day_records(
    schedule: &UnifiedSchedule,
    date: NaiveDate,
    bookings: &[NormalizedBooking],
    granularity: u32,
) -> Vec<RawBookingRecord> {
    materialize_day_slots(schedule, date, bookings, NaiveDateTime::MIN, granularity)
        .into_iter()
        .filter(|slot| slot.state == SlotState::Free)
        .map(|slot| {
            RawBookingRecord::new()
                .with("start", slot.start.format(ISO_FORMAT).to_string())
                .with("end", slot.end.format(ISO_FORMAT).to_string())
                .with("fecha", slot.date.format("%Y-%m-%d").to_string())
                .with("hora", slot.time)
                .with("bloqueado", true)
        })
        .collect()
}
