//! Error types for availability-grid operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid duration: '{spec}': {reason}")]
    InvalidDuration { spec: String, reason: String },

    #[error("Unknown timezone: '{abbrev}'{}", driver_suffix(.driver))]
    UnknownTimezone {
        abbrev: String,
        driver: Option<String>,
    },

    #[error("Invalid block size: {0} minutes")]
    InvalidBlockSize(i64),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Malformed roster file (line {line}): {reason}")]
    MalformedRosterFile { line: usize, reason: String },

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid driver '{name}': {reason}")]
    InvalidDriver { name: String, reason: String },

    #[error("No {what} at position {index} (have {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Export error: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GridError {
    /// Attach a driver name to a [`GridError::UnknownTimezone`]; other variants pass through.
    pub fn for_driver(self, name: &str) -> Self {
        match self {
            GridError::UnknownTimezone { abbrev, .. } => GridError::UnknownTimezone {
                abbrev,
                driver: Some(name.to_string()),
            },
            other => other,
        }
    }
}

fn driver_suffix(driver: &Option<String>) -> String {
    match driver {
        Some(name) => format!(" for driver {name}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
