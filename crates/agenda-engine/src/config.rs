//! Engine defaults, loadable from TOML.
//!
//! ```toml
//! days_ahead = 21
//! slot_granularity_minutes = 15
//! timezone = "America/Argentina/Buenos_Aires"
//! ```

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of the day range offered to clients.
    pub days_ahead: u32,
    /// Step of the materialized day view.
    pub slot_granularity_minutes: u32,
    /// Gap used in fill-workday mode when the business sets none.
    pub default_gap_minutes: u32,
    /// Window kept on a half-rest day.
    pub half_day_minutes: u32,
    /// Duration given to bookings whose stored duration cannot be parsed.
    pub default_booking_minutes: u32,
    /// IANA timezone the business's wall clock runs in.
    pub timezone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            days_ahead: 14,
            slot_granularity_minutes: 30,
            default_gap_minutes: 30,
            half_day_minutes: 240,
            default_booking_minutes: 30,
            timezone: "UTC".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.days_ahead == 0 {
            return Err(EngineError::Config("days_ahead must be at least 1".to_string()));
        }
        for (name, value) in [
            ("slot_granularity_minutes", self.slot_granularity_minutes),
            ("default_gap_minutes", self.default_gap_minutes),
            ("half_day_minutes", self.half_day_minutes),
            ("default_booking_minutes", self.default_booking_minutes),
        ] {
            if value == 0 || value > 24 * 60 {
                return Err(EngineError::Config(format!(
                    "{} must be between 1 and 1440, got {}",
                    name, value
                )));
            }
        }
        self.tz()?;
        Ok(())
    }

    /// The configured timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::Config(format!("unknown timezone: {}", self.timezone)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_document_overrides() {
        let config = EngineConfig::from_toml_str(
            "days_ahead = 7\ntimezone = \"America/Argentina/Buenos_Aires\"\n",
        )
        .unwrap();
        assert_eq!(config.days_ahead, 7);
        assert_eq!(config.slot_granularity_minutes, 30);
        assert_eq!(config.tz().unwrap(), chrono_tz::America::Argentina::Buenos_Aires);
    }

    #[test]
    fn rejects_zero_granularity_and_bad_timezone() {
        assert!(matches!(
            EngineConfig::from_toml_str("slot_granularity_minutes = 0"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("timezone = \"Mars/Olympus\""),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("days_ahead = \"many\""),
            Err(EngineError::Toml(_))
        ));
    }
}
