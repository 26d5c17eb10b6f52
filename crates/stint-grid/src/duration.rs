//! Race-length parsing.
//!
//! A race length is written as total minutes (`"90"`), hours and minutes
//! (`"1:30"`), or days, hours and minutes (`"1:02:30"`). Components are not
//! range-checked (`"0:90"` is 90 minutes) and there is no upper bound.

use std::fmt;

use chrono::TimeDelta;
use serde::Serialize;

use crate::error::{GridError, Result};

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// A strictly positive race length in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RaceDuration {
    minutes: i64,
}

impl RaceDuration {
    /// Build from a minute count; zero or negative values are rejected.
    pub fn from_minutes(minutes: i64) -> Result<Self> {
        if minutes <= 0 {
            return Err(GridError::InvalidDuration {
                spec: minutes.to_string(),
                reason: "race length must be greater than zero".to_string(),
            });
        }
        Ok(RaceDuration { minutes })
    }

    /// Parse a race-length field.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDuration`] for an empty string, a
    /// non-integer or negative component, a component count other than 1, 2
    /// or 3, a zero total, or a total that overflows.
    ///
    /// # Examples
    ///
    /// ```
    /// use stint_grid::RaceDuration;
    ///
    /// assert_eq!(RaceDuration::parse("1:30").unwrap().minutes(), 90);
    /// assert_eq!(RaceDuration::parse("1:02:30").unwrap().minutes(), 1500);
    /// assert!(RaceDuration::parse("1:2:3:4").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| GridError::InvalidDuration {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty race length"));
        }

        let mut parts = Vec::with_capacity(3);
        for component in trimmed.split(':') {
            let component = component.trim();
            if component.is_empty() {
                return Err(invalid("empty component"));
            }
            let value: i64 = component
                .parse()
                .map_err(|_| invalid(&format!("'{component}' is not an integer")))?;
            if value < 0 {
                return Err(invalid("components must not be negative"));
            }
            parts.push(value);
        }

        let total = match parts.as_slice() {
            [minutes] => Some(*minutes),
            [hours, minutes] => hours
                .checked_mul(MINUTES_PER_HOUR)
                .and_then(|h| h.checked_add(*minutes)),
            [days, hours, minutes] => days
                .checked_mul(MINUTES_PER_DAY)
                .and_then(|d| hours.checked_mul(MINUTES_PER_HOUR).and_then(|h| d.checked_add(h)))
                .and_then(|dh| dh.checked_add(*minutes)),
            _ => return Err(invalid("expected MINUTES, HH:MM or D:HH:MM")),
        }
        .ok_or_else(|| invalid("race length overflows"))?;

        if total == 0 {
            return Err(invalid("race length must be greater than zero"));
        }
        Ok(RaceDuration { minutes: total })
    }

    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    /// The length as a chrono delta, or `None` if it exceeds chrono's range.
    pub fn to_delta(&self) -> Option<TimeDelta> {
        TimeDelta::try_minutes(self.minutes)
    }
}

impl fmt::Display for RaceDuration {
    /// Formats as `D:HH:MM` when a day or more, otherwise `HH:MM`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.minutes / MINUTES_PER_DAY;
        let hours = (self.minutes % MINUTES_PER_DAY) / MINUTES_PER_HOUR;
        let minutes = self.minutes % MINUTES_PER_HOUR;
        if days > 0 {
            write!(f, "{days}:{hours:02}:{minutes:02}")
        } else {
            write!(f, "{hours:02}:{minutes:02}")
        }
    }
}
