//! Engine configuration.
//!
//! Deserializable so front ends can load it from files or the environment; every
//! field has a default.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::overlap::OverlapRule;
use crate::time_range::MINUTES_PER_DAY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone in which "now" and "today" are evaluated.
    pub timezone: String,
    pub overlap_rule: OverlapRule,
    /// Reject bookings whose ranges are not inside a published window.
    pub require_availability_for_bookings: bool,
    /// Upper bound on slot and card durations, in minutes. At most one day.
    pub max_slot_duration_minutes: u32,
    /// Booking events queued per subscriber. A subscriber that falls further
    /// behind is disconnected.
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            overlap_rule: OverlapRule::default(),
            require_availability_for_bookings: true,
            max_slot_duration_minutes: MINUTES_PER_DAY,
            event_buffer: 1024,
        }
    }
}

impl EngineConfig {
    pub fn tz(&self) -> Result<Tz, ValidationError> {
        self.timezone
            .parse()
            .map_err(|_| ValidationError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tz()?;
        let max = self.max_slot_duration_minutes;
        if max == 0 || max > MINUTES_PER_DAY {
            return Err(ValidationError::InvalidDuration(i64::from(max)));
        }
        if self.event_buffer == 0 {
            return Err(ValidationError::InvalidEventBuffer(0));
        }
        Ok(())
    }

    /// Check a requested slot duration against `(0, max_slot_duration_minutes]`.
    pub fn check_duration(&self, minutes: i64) -> Result<u32, ValidationError> {
        if minutes <= 0 || minutes > i64::from(self.max_slot_duration_minutes) {
            return Err(ValidationError::InvalidDuration(minutes));
        }
        Ok(minutes as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.overlap_rule, OverlapRule::HalfOpen);
    }

    #[test]
    fn unknown_timezone_rejected() {
        let config = EngineConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTimezone("Mars/Olympus".to_string()))
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"overlap_rule":"inclusive"}"#).unwrap();
        assert_eq!(config.overlap_rule, OverlapRule::Inclusive);
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn duration_bounds() {
        let config = EngineConfig::default();
        assert!(config.check_duration(0).is_err());
        assert!(config.check_duration(-15).is_err());
        assert!(config.check_duration(1441).is_err());
        assert_eq!(config.check_duration(30), Ok(30));
    }

    #[test]
    fn max_duration_is_capped_at_one_day() {
        let config = EngineConfig {
            max_slot_duration_minutes: u32::MAX,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidDuration(i64::from(u32::MAX)))
        );

        let zero = EngineConfig {
            max_slot_duration_minutes: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn event_buffer_must_be_positive() {
        let config = EngineConfig {
            event_buffer: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidEventBuffer(0)));
    }
}
