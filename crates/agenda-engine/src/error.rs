//! Error types for agenda-engine boundary operations.
//!
//! Slot computation itself never fails: malformed data degrades to empty
//! lists or dropped records. Only configuration loading, JSON decoding and
//! booking-store writes surface errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A booking record could not be placed on a timeline.
    #[error("Unresolvable booking record: {0}")]
    UnresolvableBooking(String),

    /// A write would overlap an existing booking for the same staff member.
    #[error("Slot {start}..{end} is already taken by booking {existing}")]
    SlotTaken {
        start: String,
        end: String,
        existing: String,
    },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
