//! Availability matrix assembly.
//!
//! Each grid row carries the elapsed race hour, the GMT clock, an optional
//! shared sim-time clock, and for every driver (in roster order) their local
//! wall-clock time plus an editable availability status. Statuses start as
//! [`Availability::Tentative`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::Serialize;

use crate::error::Result;
use crate::grid::{self, TimeBlock};
use crate::params::EventParameters;
use crate::roster::Driver;
use crate::timezone::{TimezoneResolver, ZoneId};

const CLOCK_FORMAT: &str = "%H:%M";

// ── Availability ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Availability {
    Available,
    Monitor,
    #[default]
    Tentative,
    Sleep,
    Blocked,
}

impl Availability {
    /// All statuses in the order offered to the user.
    pub const ALL: [Availability; 5] = [
        Availability::Available,
        Availability::Monitor,
        Availability::Tentative,
        Availability::Sleep,
        Availability::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Monitor => "Monitor",
            Availability::Tentative => "Tentative",
            Availability::Sleep => "Sleep",
            Availability::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Availability::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown availability status '{s}'"))
    }
}

// ── Matrix ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverCell {
    pub local_time: String,
    pub availability: Availability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixRow {
    pub block_index: usize,
    pub elapsed_hours: i64,
    pub gmt_label: String,
    pub sim_label: Option<String>,
    /// One entry per driver, in roster order.
    pub cells: Vec<DriverCell>,
}

/// A driver column header: display name and the zone it was projected into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverColumn {
    pub name: String,
    pub zone: ZoneId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityMatrix {
    pub drivers: Vec<DriverColumn>,
    pub has_sim_time: bool,
    pub rows: Vec<MatrixRow>,
}

// ── Builder ─────────────────────────────────────────────────────────────────

pub struct AvailabilityMatrixBuilder<'r, 't> {
    resolver: &'r TimezoneResolver<'t>,
}

impl<'r, 't> AvailabilityMatrixBuilder<'r, 't> {
    pub fn new(resolver: &'r TimezoneResolver<'t>) -> Self {
        AvailabilityMatrixBuilder { resolver }
    }

    /// Project every block into every driver's local time.
    ///
    /// Zones are resolved once per driver before any row is built, so a bad
    /// timezone fails the whole build.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GridError::UnknownTimezone`] carrying the driver's name.
    pub fn build(
        &self,
        blocks: &[TimeBlock],
        roster: &[Driver],
        start_local: Option<NaiveTime>,
    ) -> Result<AvailabilityMatrix> {
        let drivers = roster
            .iter()
            .map(|driver| {
                self.resolver
                    .resolve(driver.timezone_abbrev())
                    .map(|zone| DriverColumn {
                        name: driver.name().to_string(),
                        zone,
                    })
                    .map_err(|e| e.for_driver(driver.name()))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = blocks
            .iter()
            .enumerate()
            .map(|(block_index, block)| MatrixRow {
                block_index,
                elapsed_hours: block.elapsed_hours(),
                gmt_label: block.gmt_instant.format(CLOCK_FORMAT).to_string(),
                sim_label: start_local.map(|start| {
                    let (sim, _) = start.overflowing_add_signed(block.offset_from_start);
                    sim.format(CLOCK_FORMAT).to_string()
                }),
                cells: drivers
                    .iter()
                    .map(|column| DriverCell {
                        local_time: block
                            .gmt_instant
                            .with_timezone(&column.zone.tz())
                            .format(CLOCK_FORMAT)
                            .to_string(),
                        availability: Availability::default(),
                    })
                    .collect(),
            })
            .collect();

        tracing::debug!(
            drivers = drivers.len(),
            rows = blocks.len(),
            "built availability matrix"
        );
        Ok(AvailabilityMatrix {
            drivers,
            has_sim_time: start_local.is_some(),
            rows,
        })
    }
}

/// Run the whole computation for one sheet request.
///
/// The grid is laid out on `params.race_date`, or on
/// [`grid::reference_date`] when the event has no date.
///
/// # Errors
///
/// Any failure from grid generation or timezone resolution; no partial
/// matrix is returned.
pub fn generate_matrix(
    params: &EventParameters,
    drivers: &[Driver],
    resolver: &TimezoneResolver<'_>,
) -> Result<AvailabilityMatrix> {
    let date = params.race_date.unwrap_or_else(grid::reference_date);
    let blocks = grid::generate_on(
        date,
        params.start_gmt,
        params.green_flag_offset_minutes,
        params.race_length(),
        params.time_block_minutes(),
    )?;
    // The green flag row is always emitted.
    debug_assert!(!blocks.is_empty());
    AvailabilityMatrixBuilder::new(resolver).build(&blocks, drivers, params.start_local)
}
