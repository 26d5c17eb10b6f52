//! # stint-grid
//!
//! Driver availability grids for endurance sim racing.
//!
//! Given a team roster (drivers with home timezones) and the race timing
//! (GMT start, green-flag offset, race length, block size), stint-grid lays
//! out one row per time block across the race and projects each block into
//! every driver's local clock. The result is exported as a spreadsheet the
//! team fills in by hand.
//!
//! ## Modules
//!
//! - [`timezone`] — Abbreviation → canonical zone resolution with a versioned table
//! - [`duration`] — Race-length parsing (`MINUTES`, `HH:MM`, `D:HH:MM`)
//! - [`grid`] — Time-block generation across the race window
//! - [`matrix`] — Availability matrix assembly and the end-to-end pipeline
//! - [`params`] — Sheet-generation request parameters
//! - [`roster`] — Driver roster model, editing, and CSV persistence
//! - [`export`] — XLSX rendering
//! - [`error`] — Error types

pub mod duration;
pub mod error;
pub mod export;
pub mod grid;
pub mod matrix;
pub mod params;
pub mod roster;
pub mod timezone;

pub use duration::RaceDuration;
pub use error::{GridError, Result};
pub use export::SpreadsheetExporter;
pub use grid::{generate, generate_on, reference_date, TimeBlock};
pub use matrix::{
    generate_matrix, Availability, AvailabilityMatrix, AvailabilityMatrixBuilder, DriverCell,
    DriverColumn, MatrixRow,
};
pub use params::{
    parse_wall_clock, EventParameters, ALLOWED_BLOCK_MINUTES, DEFAULT_BLOCK_MINUTES,
    DEFAULT_GREEN_FLAG_OFFSET_MINUTES,
};
pub use roster::{
    load_roster, load_roster_file, save_roster, save_roster_file, Driver, DriverDraft, EventInfo,
    Roster, RosterEditor,
};
pub use timezone::{
    AbbreviationCollision, TimezoneResolver, ZoneId, ZoneTable, AMBIGUOUS_ABBREVIATIONS,
    ZONE_TABLE_V1,
};
