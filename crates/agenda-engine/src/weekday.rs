//! Weekday name normalization.
//!
//! Stored schedules name days in free-form text (`"Miércoles"`, `"sabado "`,
//! `"3"`, `"wed"`). Everything is folded into one canonical name space:
//! lower-case unaccented Spanish names, Sunday first.

use chrono::{Datelike, NaiveDate, Weekday};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical names indexed by days from Sunday (0 = Sunday).
pub const WEEKDAY_NAMES: [&str; 7] = [
    "domingo",
    "lunes",
    "martes",
    "miercoles",
    "jueves",
    "viernes",
    "sabado",
];

/// Canonical name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_sunday() as usize]
}

/// Canonical name of the weekday `date` falls on.
pub fn weekday_name_of(date: NaiveDate) -> &'static str {
    weekday_name(date.weekday())
}

/// Lower-case, trim and strip diacritics.
fn fold(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Parse a weekday from a name (Spanish or English, any case, accents and
/// three-letter abbreviations allowed) or a `0..=6` index where 0 is Sunday.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let folded = fold(raw);
    if let Ok(index) = folded.parse::<u8>() {
        return match index {
            0 => Some(Weekday::Sun),
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            _ => None,
        };
    }
    match folded.as_str() {
        "domingo" | "dom" | "sunday" | "sun" => Some(Weekday::Sun),
        "lunes" | "lun" | "monday" | "mon" => Some(Weekday::Mon),
        "martes" | "mar" | "tuesday" | "tue" => Some(Weekday::Tue),
        "miercoles" | "mie" | "wednesday" | "wed" => Some(Weekday::Wed),
        "jueves" | "jue" | "thursday" | "thu" => Some(Weekday::Thu),
        "viernes" | "vie" | "friday" | "fri" => Some(Weekday::Fri),
        "sabado" | "sab" | "saturday" | "sat" => Some(Weekday::Sat),
        _ => None,
    }
}

/// Normalize a raw weekday name or index into the canonical name space.
///
/// Unrecognized input is returned folded (trimmed, lower-cased, unaccented)
/// so that two spellings of the same unknown token still compare equal.
pub fn normalize_weekday_name(raw: &str) -> String {
    match parse_weekday(raw) {
        Some(day) => weekday_name(day).to_string(),
        None => fold(raw),
    }
}
