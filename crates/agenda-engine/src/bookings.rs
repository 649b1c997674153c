//! Booking normalization.
//!
//! Stored booking records have drifted over time: the same concept lives
//! under several keys (`fecha`/`date`, `hora`/`time`/`startTime`, ...), and
//! dates arrive as ISO strings, epoch numbers or timestamp wrapper objects.
//! This module is the only place that knows about those shapes; everything
//! downstream works on [`NormalizedBooking`].

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::time::{coerce_to_date, combine_date_and_minutes, parse_time};

/// Duration given to a booking whose stored duration cannot be parsed.
pub const DEFAULT_BOOKING_MINUTES: u32 = 30;

const ID_KEYS: &[&str] = &["id", "bookingId", "turnoId"];
const START_KEYS: &[&str] = &["start", "startAt", "inicio", "fechaInicio", "startDate"];
const END_KEYS: &[&str] = &["end", "endAt", "fin", "fechaFin", "endDate"];
const DATE_KEYS: &[&str] = &["fecha", "date", "dia", "day"];
const TIME_KEYS: &[&str] = &["hora", "time", "horaInicio", "startTime"];
const DURATION_KEYS: &[&str] = &[
    "duracion",
    "duration",
    "duracionMinutos",
    "durationMinutes",
    "minutos",
];
const BLOCKED_KEYS: &[&str] = &["bloqueado", "blocked", "isBlocked"];
const SERVICE_ID_KEYS: &[&str] = &["servicioId", "serviceId"];
const SERVICE_NAME_KEYS: &[&str] = &["servicioNombre", "serviceName", "servicio", "service"];
const CLIENT_OBJECT_KEYS: &[&str] = &["cliente", "client"];
const CLIENT_UID_KEYS: &[&str] = &["clienteUid", "clientUid", "uid", "userId"];
const CLIENT_NAME_KEYS: &[&str] = &["clienteNombre", "clientName", "nombre", "name"];
const CLIENT_EMAIL_KEYS: &[&str] = &["clienteEmail", "clientEmail", "email"];
const CLIENT_PHONE_KEYS: &[&str] = &["clienteTelefono", "clientPhone", "telefono", "phone"];

/// A booking document exactly as the store returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBookingRecord(pub Map<String, Value>);

impl RawBookingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// First non-null value stored under any of `keys`.
    fn lookup(&self, keys: &[&str]) -> Option<&Value> {
        lookup_in(&self.0, keys)
    }

    /// Identifier stored under any of the known id keys.
    pub fn id(&self) -> Option<String> {
        self.lookup(ID_KEYS).and_then(value_to_string)
    }
}

impl From<Map<String, Value>> for RawBookingRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Contact details of the client who made a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRef {
    /// Account id of the client, if the booking was made while signed in.
    pub uid: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone, as stored.
    pub phone: Option<String>,
}

impl ClientRef {
    fn is_empty(&self) -> bool {
        self.uid.is_none() && self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

/// A booking placed on the timeline. `start < end` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBooking {
    /// Stored identifier; empty when the record carries none.
    pub id: String,
    /// Wall-clock start (inclusive).
    pub start: NaiveDateTime,
    /// Wall-clock end (exclusive).
    pub end: NaiveDateTime,
    /// Owner-placed hold rather than a customer booking.
    pub is_blocked: bool,
    /// Identifier of the booked service.
    pub service_id: Option<String>,
    /// Name of the booked service.
    pub service_name: Option<String>,
    /// Who booked, when any contact field is present.
    pub client: Option<ClientRef>,
}

impl NormalizedBooking {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

fn lookup_in<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "si" | "sí" | "yes"
        ),
        _ => false,
    }
}

/// Parse a stored duration into minutes.
///
/// Accepts a plain number of minutes, a numeric string, or an `"H:MM"`
/// string read as a *duration* (`"1:30"` is 90 minutes). Zero, negative
/// and unparsable values give `None`.
pub fn parse_duration(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let s = s.trim();
            if s.contains(':') {
                let (h, m) = s.split_once(':')?;
                let numeric = h.trim().parse::<u32>().is_ok() && m.trim().parse::<u32>().is_ok();
                numeric.then(|| u64::from(parse_time(s).minutes))
            } else {
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| *f > 0.0).map(|f| f.round() as u64))
            }
        }
        _ => None,
    }?;
    u32::try_from(minutes).ok().filter(|m| *m > 0)
}

/// Stored time of day in minutes since midnight.
///
/// Strings are read leniently (`"14:30:00"` is 14:30, garbage is 00:00 and
/// logged); numbers are hours. Only a missing or blank value gives `None`.
fn time_of_day(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) if !s.trim().is_empty() => {
            let parsed = parse_time(s);
            if !parsed.valid {
                warn!(time = %s, "malformed booking time, read leniently");
            }
            Some(parsed.minutes)
        }
        Value::Number(n) => n
            .as_f64()
            .filter(|h| *h >= 0.0 && *h <= 24.0)
            .map(|h| (h * 60.0).round() as u32),
        _ => None,
    }
}

fn resolve_interval(
    record: &RawBookingRecord,
    default_minutes: u32,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    // Explicit instants.
    let explicit_start = record.lookup(START_KEYS).and_then(coerce_to_date);
    let explicit_end = record.lookup(END_KEYS).and_then(coerce_to_date);
    if let (Some(start), Some(end)) = (explicit_start, explicit_end) {
        if start < end {
            return Some((start, end));
        }
    }

    // Date + time of day + duration.
    let date = record.lookup(DATE_KEYS).and_then(coerce_to_date)?.date();
    let offset = record.lookup(TIME_KEYS).and_then(time_of_day)?;
    let start = combine_date_and_minutes(date, offset);
    let minutes = record
        .lookup(DURATION_KEYS)
        .and_then(parse_duration)
        .unwrap_or(default_minutes);
    Some((start, start + Duration::minutes(i64::from(minutes))))
}

fn resolve_client(record: &RawBookingRecord) -> Option<ClientRef> {
    let nested = record.lookup(CLIENT_OBJECT_KEYS).and_then(Value::as_object);
    let field = |keys: &[&str]| {
        nested
            .and_then(|m| lookup_in(m, keys))
            .or_else(|| record.lookup(keys))
            .and_then(value_to_string)
    };
    let client = ClientRef {
        uid: field(CLIENT_UID_KEYS),
        name: field(CLIENT_NAME_KEYS),
        email: field(CLIENT_EMAIL_KEYS),
        phone: field(CLIENT_PHONE_KEYS),
    };
    (!client.is_empty()).then_some(client)
}

/// Normalize a single record.
///
/// # Errors
/// Returns `EngineError::UnresolvableBooking` when neither an explicit
/// start/end pair nor a date + time pair can be resolved.
pub fn normalize_booking(
    record: &RawBookingRecord,
    default_minutes: u32,
) -> Result<NormalizedBooking> {
    let id = record.id().unwrap_or_default();
    let (start, end) = resolve_interval(record, default_minutes).ok_or_else(|| {
        let label = if id.is_empty() { "<no id>" } else { id.as_str() };
        EngineError::UnresolvableBooking(label.to_string())
    })?;

    Ok(NormalizedBooking {
        id,
        start,
        end,
        is_blocked: record.lookup(BLOCKED_KEYS).is_some_and(value_to_bool),
        service_id: record.lookup(SERVICE_ID_KEYS).and_then(value_to_string),
        service_name: record.lookup(SERVICE_NAME_KEYS).and_then(value_to_string),
        client: resolve_client(record),
    })
}

/// Normalize a batch of records, sorted by start.
///
/// Records that cannot be placed on a timeline are logged and dropped; one
/// corrupt record never fails the batch.
pub fn normalize_bookings(raw: &[RawBookingRecord]) -> Vec<NormalizedBooking> {
    normalize_bookings_with(raw, DEFAULT_BOOKING_MINUTES)
}

/// [`normalize_bookings`] with an explicit fallback duration.
pub fn normalize_bookings_with(
    raw: &[RawBookingRecord],
    default_minutes: u32,
) -> Vec<NormalizedBooking> {
    let mut bookings: Vec<NormalizedBooking> = raw
        .iter()
        .filter_map(|record| match normalize_booking(record, default_minutes) {
            Ok(booking) => Some(booking),
            Err(e) => {
                warn!(error = %e, "dropping booking record");
                None
            }
        })
        .collect();
    bookings.sort_by_key(|b| (b.start, b.end));
    bookings
}
