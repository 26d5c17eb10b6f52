//! Sheet-generation request parameters.

use chrono::{NaiveDate, NaiveTime};

use crate::duration::RaceDuration;
use crate::error::{GridError, Result};

/// Block sizes offered to the user, in minutes.
pub const ALLOWED_BLOCK_MINUTES: [i64; 4] = [15, 30, 45, 60];

pub const DEFAULT_BLOCK_MINUTES: i64 = 15;
pub const DEFAULT_GREEN_FLAG_OFFSET_MINUTES: i64 = 30;

/// Parse a 24-hour `HH:MM` wall-clock time.
///
/// # Errors
///
/// Returns [`GridError::InvalidTime`] if the string is not a valid `HH:MM` time.
pub fn parse_wall_clock(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| GridError::InvalidTime(format!("'{}': {} (expected HH:MM)", s, e)))
}

/// Everything needed to generate one availability sheet, validated up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParameters {
    race_length_spec: String,
    race_length: RaceDuration,
    pub start_gmt: NaiveTime,
    /// Shared "sim time" reference clock, not tied to any driver.
    pub start_local: Option<NaiveTime>,
    pub green_flag_offset_minutes: i64,
    time_block_minutes: i64,
    /// GMT calendar day of `start_gmt`; `None` projects on the reference date.
    pub race_date: Option<NaiveDate>,
}

impl EventParameters {
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDuration`] if the race length does not
    /// parse, or [`GridError::InvalidBlockSize`] if the block size is not one
    /// of [`ALLOWED_BLOCK_MINUTES`].
    pub fn new(
        race_length_spec: &str,
        start_gmt: NaiveTime,
        start_local: Option<NaiveTime>,
        green_flag_offset_minutes: i64,
        time_block_minutes: i64,
    ) -> Result<Self> {
        let race_length = RaceDuration::parse(race_length_spec)?;
        if !ALLOWED_BLOCK_MINUTES.contains(&time_block_minutes) {
            return Err(GridError::InvalidBlockSize(time_block_minutes));
        }
        Ok(EventParameters {
            race_length_spec: race_length_spec.to_string(),
            race_length,
            start_gmt,
            start_local,
            green_flag_offset_minutes,
            time_block_minutes,
            race_date: None,
        })
    }

    pub fn with_race_date(mut self, date: NaiveDate) -> Self {
        self.race_date = Some(date);
        self
    }

    pub fn race_length_spec(&self) -> &str {
        &self.race_length_spec
    }

    pub fn race_length(&self) -> RaceDuration {
        self.race_length
    }

    pub fn time_block_minutes(&self) -> i64 {
        self.time_block_minutes
    }
}
