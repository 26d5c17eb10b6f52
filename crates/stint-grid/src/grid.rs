//! Race-time grid generation.
//!
//! The grid runs from the green flag (`start_gmt + offset`) to the race end
//! in fixed steps. The end bound is inclusive: a 90-minute race in 30-minute
//! blocks has four rows, the last one at the chequered flag.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::Serialize;

use crate::duration::RaceDuration;
use crate::error::{GridError, Result};

/// Calendar day used for projection when the event has no date.
///
/// A northern-hemisphere winter Monday, so standard-time offsets apply.
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or_default()
}

/// One row of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBlock {
    /// The absolute instant of the block.
    pub gmt_instant: DateTime<Utc>,
    /// Time since the green flag.
    #[serde(skip)]
    pub offset_from_start: TimeDelta,
}

impl TimeBlock {
    /// Whole hours since the green flag, rounded down.
    pub fn elapsed_hours(&self) -> i64 {
        self.offset_from_start.num_minutes().div_euclid(60)
    }
}

/// Generate the grid on [`reference_date`].
///
/// See [`generate_on`].
pub fn generate(
    start_gmt: NaiveTime,
    offset_minutes: i64,
    duration: RaceDuration,
    block_minutes: i64,
) -> Result<Vec<TimeBlock>> {
    generate_on(
        reference_date(),
        start_gmt,
        offset_minutes,
        duration,
        block_minutes,
    )
}

/// Generate block instants from race start through race end, inclusive.
///
/// # Arguments
///
/// * `date` — The GMT calendar day of the published start time
/// * `start_gmt` — The published start time (GMT wall clock)
/// * `offset_minutes` — Green-flag offset; may be negative
/// * `duration` — Race length
/// * `block_minutes` — Spacing between rows
///
/// # Errors
///
/// Returns [`GridError::InvalidBlockSize`] if `block_minutes <= 0`, or
/// [`GridError::InvalidInterval`] if the race window cannot be represented
/// or ends before it starts.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use stint_grid::grid::generate;
/// use stint_grid::RaceDuration;
///
/// let start = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
/// let blocks = generate(start, 30, RaceDuration::from_minutes(90).unwrap(), 30).unwrap();
/// assert_eq!(blocks.len(), 4);
/// assert_eq!(blocks[3].gmt_instant.format("%H:%M").to_string(), "16:00");
/// ```
pub fn generate_on(
    date: NaiveDate,
    start_gmt: NaiveTime,
    offset_minutes: i64,
    duration: RaceDuration,
    block_minutes: i64,
) -> Result<Vec<TimeBlock>> {
    if block_minutes <= 0 {
        return Err(GridError::InvalidBlockSize(block_minutes));
    }
    let step =
        TimeDelta::try_minutes(block_minutes).ok_or(GridError::InvalidBlockSize(block_minutes))?;

    let published = date.and_time(start_gmt).and_utc();
    let race_start = TimeDelta::try_minutes(offset_minutes)
        .and_then(|offset| published.checked_add_signed(offset))
        .ok_or_else(|| {
            GridError::InvalidInterval(format!(
                "green-flag offset of {offset_minutes} minutes is out of range"
            ))
        })?;
    let race_end = duration
        .to_delta()
        .and_then(|length| race_start.checked_add_signed(length))
        .ok_or_else(|| {
            GridError::InvalidInterval(format!("race length of {duration} is out of range"))
        })?;

    if race_end < race_start {
        return Err(GridError::InvalidInterval(format!(
            "race ends ({race_end}) before it starts ({race_start})"
        )));
    }

    let mut blocks = Vec::new();
    let mut current = race_start;
    while current <= race_end {
        blocks.push(TimeBlock {
            gmt_instant: current,
            offset_from_start: current - race_start,
        });
        match current.checked_add_signed(step) {
            Some(next) => current = next,
            None => break,
        }
    }

    tracing::debug!(
        race_start = %race_start,
        race_end = %race_end,
        block_minutes,
        blocks = blocks.len(),
        "generated race grid"
    );
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn minutes(n: i64) -> RaceDuration {
        RaceDuration::from_minutes(n).unwrap()
    }

    fn labels(blocks: &[TimeBlock]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| b.gmt_instant.format("%H:%M").to_string())
            .collect()
    }

    // ── boundaries ──────────────────────────────────────────────────────

    #[test]
    fn test_inclusive_end_with_offset() {
        let blocks = generate(time(14, 0), 30, minutes(90), 30).unwrap();
        assert_eq!(labels(&blocks), ["14:30", "15:00", "15:30", "16:00"]);
        let hours: Vec<i64> = blocks.iter().map(TimeBlock::elapsed_hours).collect();
        assert_eq!(hours, [0, 0, 1, 1]);
    }

    #[test]
    fn test_non_divisible_length_stops_before_end() {
        // 50 minutes in 30-minute blocks: 12:00, 12:30 (13:00 would pass the end)
        let blocks = generate(time(12, 0), 0, minutes(50), 30).unwrap();
        assert_eq!(labels(&blocks), ["12:00", "12:30"]);
    }

    #[test]
    fn test_block_larger_than_race() {
        let blocks = generate(time(12, 0), 0, minutes(10), 60).unwrap();
        assert_eq!(labels(&blocks), ["12:00"]);
    }

    #[test]
    fn test_first_block_is_race_start() {
        let blocks = generate(time(23, 50), 15, minutes(60), 15).unwrap();
        let first = blocks[0];
        assert_eq!(first.offset_from_start, TimeDelta::zero());
        assert_eq!(
            first.gmt_instant,
            reference_date().succ_opt().unwrap().and_time(time(0, 5)).and_utc()
        );
    }

    #[test]
    fn test_negative_offset() {
        let blocks = generate(time(12, 0), -30, minutes(30), 15).unwrap();
        assert_eq!(labels(&blocks), ["11:30", "11:45", "12:00"]);
    }

    // ── spacing & length ────────────────────────────────────────────────

    #[test]
    fn test_constant_spacing() {
        let blocks = generate(time(8, 0), 30, minutes(24 * 60), 45).unwrap();
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].gmt_instant - pair[0].gmt_instant, TimeDelta::minutes(45));
        }
    }

    #[test]
    fn test_multi_day_race_row_count_and_hours() {
        let blocks = generate_on(reference_date(), time(12, 0), 0, minutes(2 * 1440), 60).unwrap();
        assert_eq!(blocks.len(), 49);
        assert_eq!(blocks.last().unwrap().elapsed_hours(), 48);
    }

    // ── errors ──────────────────────────────────────────────────────────

    #[test]
    fn test_zero_block_rejected() {
        let err = generate(time(12, 0), 0, minutes(60), 0).unwrap_err();
        assert!(matches!(err, GridError::InvalidBlockSize(0)));
    }

    #[test]
    fn test_negative_block_rejected() {
        let err = generate(time(12, 0), 0, minutes(60), -15).unwrap_err();
        assert!(matches!(err, GridError::InvalidBlockSize(-15)));
    }

    #[test]
    fn test_unrepresentable_length_is_invalid_interval() {
        let err = generate(time(12, 0), 0, minutes(i64::MAX / 2), 60).unwrap_err();
        assert!(matches!(err, GridError::InvalidInterval(_)), "got {err:?}");
    }
}
