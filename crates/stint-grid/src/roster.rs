//! Team roster model and its CSV file format.
//!
//! A roster file is a small delimited document:
//!
//! ```text
//! Event Name,Team Name,Track,Car,Race Length
//! Daytona 24,Apex,Daytona,GTP,24:00
//!
//! iRating,Driver Name,Back to Back Stints,Triple Stint,Timezone,Start,Finish
//! 3200,Alice,True,False,America/New_York,True,False
//! ```
//!
//! Saved files carry canonical zone identifiers in the timezone column;
//! loading maps them back to a display abbreviation.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{GridError, Result};
use crate::timezone::TimezoneResolver;

pub const EVENT_HEADER: [&str; 5] = ["Event Name", "Team Name", "Track", "Car", "Race Length"];

pub const DRIVER_HEADER: [&str; 7] = [
    "iRating",
    "Driver Name",
    "Back to Back Stints",
    "Triple Stint",
    "Timezone",
    "Start",
    "Finish",
];

// ── Driver ──────────────────────────────────────────────────────────────────

/// A validated roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Driver {
    name: String,
    timezone_abbrev: String,
    irating: u32,
    back_to_back_ok: bool,
    triple_stint_ok: bool,
    start_eligible: bool,
    finish_eligible: bool,
}

impl Driver {
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDriver`] if the name is blank or a triple
    /// stint is allowed without back-to-back stints.
    pub fn new(
        name: &str,
        timezone_abbrev: &str,
        irating: u32,
        back_to_back_ok: bool,
        triple_stint_ok: bool,
        start_eligible: bool,
        finish_eligible: bool,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GridError::InvalidDriver {
                name: String::new(),
                reason: "driver name is empty".to_string(),
            });
        }
        if triple_stint_ok && !back_to_back_ok {
            return Err(GridError::InvalidDriver {
                name: name.to_string(),
                reason: "triple stints require back-to-back stints".to_string(),
            });
        }
        Ok(Driver {
            name: name.to_string(),
            timezone_abbrev: timezone_abbrev.trim().to_string(),
            irating,
            back_to_back_ok,
            triple_stint_ok,
            start_eligible,
            finish_eligible,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timezone_abbrev(&self) -> &str {
        &self.timezone_abbrev
    }

    pub fn irating(&self) -> u32 {
        self.irating
    }

    pub fn back_to_back_ok(&self) -> bool {
        self.back_to_back_ok
    }

    pub fn triple_stint_ok(&self) -> bool {
        self.triple_stint_ok
    }

    pub fn start_eligible(&self) -> bool {
        self.start_eligible
    }

    pub fn finish_eligible(&self) -> bool {
        self.finish_eligible
    }
}

// ── Event & roster ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventInfo {
    pub event_name: String,
    pub team_name: String,
    pub track: String,
    pub car: String,
    /// Raw race-length field, parsed later by [`crate::RaceDuration::parse`].
    pub race_length: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub event: EventInfo,
    pub drivers: Vec<Driver>,
}

// ── Editing ─────────────────────────────────────────────────────────────────

/// Unvalidated driver input as typed into an entry form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverDraft {
    pub irating: String,
    pub name: String,
    pub back_to_back_ok: bool,
    pub triple_stint_ok: bool,
    pub timezone: String,
    pub start_eligible: bool,
    pub finish_eligible: bool,
}

impl Default for DriverDraft {
    fn default() -> Self {
        DriverDraft {
            irating: String::new(),
            name: String::new(),
            back_to_back_ok: false,
            triple_stint_ok: false,
            timezone: "UTC".to_string(),
            start_eligible: false,
            finish_eligible: false,
        }
    }
}

impl DriverDraft {
    /// Validate into a [`Driver`].
    pub fn validate(&self) -> Result<Driver> {
        let irating = self.irating.trim().parse::<u32>().map_err(|_| GridError::InvalidDriver {
            name: self.name.trim().to_string(),
            reason: format!("iRating must be a non-negative integer, got '{}'", self.irating),
        })?;
        Driver::new(
            &self.name,
            &self.timezone,
            irating,
            self.back_to_back_ok,
            self.triple_stint_ok,
            self.start_eligible,
            self.finish_eligible,
        )
    }
}

/// Pending driver drafts in front of a roster.
///
/// Drafts are held by index; committing one validates it and moves it onto
/// the roster. Invalid drafts stay pending.
#[derive(Debug, Clone, Default)]
pub struct RosterEditor {
    roster: Roster,
    drafts: Vec<DriverDraft>,
}

impl RosterEditor {
    pub fn new(roster: Roster) -> Self {
        RosterEditor {
            roster,
            drafts: Vec::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn into_roster(self) -> Roster {
        self.roster
    }

    pub fn drafts(&self) -> &[DriverDraft] {
        &self.drafts
    }

    /// Append a draft; returns its index.
    pub fn push_draft(&mut self, draft: DriverDraft) -> usize {
        self.drafts.push(draft);
        self.drafts.len() - 1
    }

    pub fn remove_draft(&mut self, index: usize) -> Result<DriverDraft> {
        if index >= self.drafts.len() {
            return Err(out_of_range("draft", index, self.drafts.len()));
        }
        Ok(self.drafts.remove(index))
    }

    /// Validate the draft at `index` and append it to the roster.
    pub fn commit(&mut self, index: usize) -> Result<&Driver> {
        let draft = self
            .drafts
            .get(index)
            .ok_or_else(|| out_of_range("draft", index, self.drafts.len()))?;
        let driver = draft.validate()?;
        self.drafts.remove(index);
        self.roster.drivers.push(driver);
        Ok(&self.roster.drivers[self.roster.drivers.len() - 1])
    }

    /// Remove a committed driver by roster position.
    pub fn remove_driver(&mut self, index: usize) -> Result<Driver> {
        let len = self.roster.drivers.len();
        if index >= len {
            return Err(out_of_range("driver", index, len));
        }
        Ok(self.roster.drivers.remove(index))
    }
}

fn out_of_range(what: &'static str, index: usize, len: usize) -> GridError {
    GridError::IndexOutOfRange { what, index, len }
}

// ── Persistence ─────────────────────────────────────────────────────────────

/// Write a roster, storing each driver's canonical zone identifier.
///
/// # Errors
///
/// Returns [`GridError::UnknownTimezone`] naming the driver if any timezone
/// does not resolve; nothing is written in that case.
pub fn save_roster<W: Write>(
    roster: &Roster,
    writer: W,
    resolver: &TimezoneResolver<'_>,
) -> Result<()> {
    let zones = roster
        .drivers
        .iter()
        .map(|d| {
            resolver
                .resolve(d.timezone_abbrev())
                .map_err(|e| e.for_driver(d.name()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = csv::Writer::from_writer(writer);
    let event = &roster.event;
    out.write_record(EVENT_HEADER).map_err(csv_error)?;
    out.write_record([
        event.event_name.as_str(),
        event.team_name.as_str(),
        event.track.as_str(),
        event.car.as_str(),
        event.race_length.as_str(),
    ])
    .map_err(csv_error)?;

    // csv quotes an empty record as `""`, so the separator line is written raw.
    let mut writer = out.into_inner().map_err(|e| GridError::Io(e.into_error()))?;
    writer.write_all(b"\n")?;

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(DRIVER_HEADER).map_err(csv_error)?;
    for (driver, zone) in roster.drivers.iter().zip(&zones) {
        out.write_record([
            driver.irating().to_string().as_str(),
            driver.name(),
            flag(driver.back_to_back_ok()),
            flag(driver.triple_stint_ok()),
            zone.name(),
            flag(driver.start_eligible()),
            flag(driver.finish_eligible()),
        ])
        .map_err(csv_error)?;
    }
    out.flush()?;

    tracing::debug!(drivers = roster.drivers.len(), "saved roster");
    Ok(())
}

/// Read a roster. Any malformed row rejects the whole file.
///
/// # Errors
///
/// Returns [`GridError::MalformedRosterFile`] with the 1-based line of the
/// first problem.
pub fn load_roster<R: Read>(reader: R, resolver: &TimezoneResolver<'_>) -> Result<Roster> {
    let mut input = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in input.records() {
        let record = record.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line() as usize);
            malformed(line, &e.to_string())
        })?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line() as usize);
        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        rows.push((line, fields));
    }

    let mut rows = rows.into_iter();
    let (line, header) = rows
        .next()
        .ok_or_else(|| malformed(1, "missing event header"))?;
    if header.iter().map(String::as_str).ne(EVENT_HEADER) {
        return Err(malformed(line, "event header does not match"));
    }
    let (line, values) = rows
        .next()
        .ok_or_else(|| malformed(line + 1, "missing event values"))?;
    let event_field = |i: usize| values.get(i).cloned().unwrap_or_default();
    let event = EventInfo {
        event_name: event_field(0),
        team_name: event_field(1),
        track: event_field(2),
        car: event_field(3),
        race_length: event_field(4),
    };
    if event.race_length.is_empty() {
        return Err(malformed(line, "missing Race Length"));
    }

    let (line, header) = rows
        .next()
        .ok_or_else(|| malformed(line + 1, "missing driver header"))?;
    if header.iter().map(String::as_str).ne(DRIVER_HEADER) {
        return Err(malformed(line, "driver header does not match"));
    }

    let drivers = rows
        .map(|(line, fields)| parse_driver_row(line, &fields, resolver))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(drivers = drivers.len(), event = %event.event_name, "loaded roster");
    Ok(Roster { event, drivers })
}

pub fn load_roster_file(path: &Path, resolver: &TimezoneResolver<'_>) -> Result<Roster> {
    load_roster(File::open(path)?, resolver)
}

pub fn save_roster_file(
    roster: &Roster,
    path: &Path,
    resolver: &TimezoneResolver<'_>,
) -> Result<()> {
    // Resolve before creating the file so a failure leaves no partial output.
    let mut buffer = Vec::new();
    save_roster(roster, &mut buffer, resolver)?;
    File::create(path)?.write_all(&buffer)?;
    Ok(())
}

fn parse_driver_row(
    line: usize,
    fields: &[String],
    resolver: &TimezoneResolver<'_>,
) -> Result<Driver> {
    let [irating, name, b2b, triple, timezone, start, finish] = fields else {
        return Err(malformed(
            line,
            &format!("expected {} fields, found {}", DRIVER_HEADER.len(), fields.len()),
        ));
    };
    let irating = irating
        .parse::<u32>()
        .map_err(|_| malformed(line, &format!("iRating '{irating}' is not a non-negative integer")))?;
    let label = display_label(timezone, resolver);

    Driver::new(
        name,
        &label,
        irating,
        parse_flag(line, b2b)?,
        parse_flag(line, triple)?,
        parse_flag(line, start)?,
        parse_flag(line, finish)?,
    )
    .map_err(|e| malformed(line, &e.to_string()))
}

/// Abbreviations are kept as typed; canonical names map back to their
/// table label; anything else is kept raw and fails at build time.
fn display_label(field: &str, resolver: &TimezoneResolver<'_>) -> String {
    if resolver.is_abbreviation(field) {
        return field.to_string();
    }
    match resolver.resolve(field) {
        Ok(zone) => resolver.reverse_label(zone).to_string(),
        Err(_) => field.to_string(),
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_flag(line: usize, s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(malformed(line, &format!("'{s}' is not a true/false flag"))),
    }
}

fn malformed(line: usize, reason: &str) -> GridError {
    GridError::MalformedRosterFile {
        line,
        reason: reason.to_string(),
    }
}

fn csv_error(e: csv::Error) -> GridError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => GridError::Io(io),
        other => GridError::Io(std::io::Error::other(format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Event Name,Team Name,Track,Car,Race Length
Daytona 24,Apex,Daytona,GTP,24:00

iRating,Driver Name,Back to Back Stints,Triple Stint,Timezone,Start,Finish
3200,Alice,True,False,EST,True,False
2800,Bob,1,1,Europe/Berlin,0,yes
";

    fn resolver() -> TimezoneResolver<'static> {
        TimezoneResolver::default()
    }

    fn driver(name: &str, tz: &str) -> Driver {
        Driver::new(name, tz, 2000, true, false, false, true).unwrap()
    }

    // ── Driver ──────────────────────────────────────────────────────────

    #[test]
    fn test_triple_stint_requires_back_to_back() {
        let err = Driver::new("Carol", "UTC", 1500, false, true, false, false).unwrap_err();
        assert!(matches!(err, GridError::InvalidDriver { ref name, .. } if name == "Carol"));
        assert!(Driver::new("Carol", "UTC", 1500, true, true, false, false).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(Driver::new("   ", "UTC", 1500, false, false, false, false).is_err());
    }

    // ── RosterEditor ────────────────────────────────────────────────────

    #[test]
    fn test_commit_validates_irating() {
        let mut editor = RosterEditor::default();
        let idx = editor.push_draft(DriverDraft {
            irating: "fast".to_string(),
            name: "Dana".to_string(),
            ..Default::default()
        });
        let err = editor.commit(idx).unwrap_err().to_string();
        assert!(err.contains("iRating"), "got: {err}");
        assert_eq!(editor.drafts().len(), 1);
        assert!(editor.roster().drivers.is_empty());
    }

    #[test]
    fn test_commit_rejects_triple_without_back_to_back() {
        let mut editor = RosterEditor::default();
        let idx = editor.push_draft(DriverDraft {
            irating: "1800".to_string(),
            name: "Eve".to_string(),
            triple_stint_ok: true,
            ..Default::default()
        });
        assert!(editor.commit(idx).is_err());
        assert!(editor.roster().drivers.is_empty());
    }

    #[test]
    fn test_commit_appends_in_order() {
        let mut editor = RosterEditor::default();
        for name in ["Fay", "Gus"] {
            let idx = editor.push_draft(DriverDraft {
                irating: "2100".to_string(),
                name: name.to_string(),
                timezone: "PST".to_string(),
                ..Default::default()
            });
            editor.commit(idx).unwrap();
        }
        let names: Vec<&str> = editor.roster().drivers.iter().map(Driver::name).collect();
        assert_eq!(names, ["Fay", "Gus"]);
        assert!(editor.drafts().is_empty());
    }

    #[test]
    fn test_remove_by_index() {
        let mut editor = RosterEditor::new(Roster {
            event: EventInfo::default(),
            drivers: vec![driver("A", "UTC"), driver("B", "UTC"), driver("C", "UTC")],
        });
        let removed = editor.remove_driver(1).unwrap();
        assert_eq!(removed.name(), "B");
        assert_eq!(editor.roster().drivers.len(), 2);
        assert!(editor.remove_draft(0).is_err());

        let err = editor.remove_driver(5).unwrap_err();
        assert!(
            matches!(err, GridError::IndexOutOfRange { what: "driver", index: 5, len: 2 }),
            "got {err:?}"
        );
        assert_eq!(err.to_string(), "No driver at position 5 (have 2)");
    }

    // ── load_roster ─────────────────────────────────────────────────────

    #[test]
    fn test_load_sample() {
        let roster = load_roster(SAMPLE.as_bytes(), &resolver()).unwrap();
        assert_eq!(roster.event.event_name, "Daytona 24");
        assert_eq!(roster.event.race_length, "24:00");
        assert_eq!(roster.drivers.len(), 2);

        let alice = &roster.drivers[0];
        assert_eq!(alice.irating(), 3200);
        assert_eq!(alice.timezone_abbrev(), "EST");
        assert!(alice.back_to_back_ok());
        assert!(!alice.triple_stint_ok());

        let bob = &roster.drivers[1];
        assert_eq!(bob.timezone_abbrev(), "CET");
        assert!(bob.finish_eligible());
        assert!(!bob.start_eligible());
    }

    #[test]
    fn test_load_keeps_unknown_timezone_raw() {
        let text = SAMPLE.replace("Europe/Berlin", "Mars/Olympus");
        let roster = load_roster(text.as_bytes(), &resolver()).unwrap();
        assert_eq!(roster.drivers[1].timezone_abbrev(), "Mars/Olympus");
    }

    fn load_err(text: &str) -> (usize, String) {
        match load_roster(text.as_bytes(), &resolver()).unwrap_err() {
            GridError::MalformedRosterFile { line, reason } => (line, reason),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let (line, reason) = load_err("");
        assert_eq!(line, 1);
        assert!(reason.contains("event header"));
    }

    #[test]
    fn test_load_accepts_roster_without_drivers() {
        let text: String = SAMPLE.lines().take(4).map(|l| format!("{l}\n")).collect();
        let roster = load_roster(text.as_bytes(), &resolver()).unwrap();
        assert!(roster.drivers.is_empty());
    }

    #[test]
    fn test_load_rejects_missing_driver_header() {
        let text: String = SAMPLE.lines().take(2).map(|l| format!("{l}\n")).collect();
        let (_, reason) = load_err(&text);
        assert!(reason.contains("driver header"), "got: {reason}");
    }

    #[test]
    fn test_load_rejects_short_row() {
        let text = format!("{SAMPLE}1000,Short,True\n");
        let (line, reason) = load_err(&text);
        assert_eq!(line, 7);
        assert!(reason.contains("expected 7 fields"), "got: {reason}");
    }

    #[test]
    fn test_load_rejects_bad_irating() {
        let text = SAMPLE.replace("3200", "lots");
        let (line, _) = load_err(&text);
        assert_eq!(line, 5);
    }

    #[test]
    fn test_load_rejects_bad_flag() {
        let text = SAMPLE.replace("3200,Alice,True", "3200,Alice,maybe");
        let (_, reason) = load_err(&text);
        assert!(reason.contains("maybe"));
    }

    #[test]
    fn test_load_rejects_stint_implication_violation() {
        let text = SAMPLE.replace("2800,Bob,1,1", "2800,Bob,0,1");
        let (line, reason) = load_err(&text);
        assert_eq!(line, 6);
        assert!(reason.contains("triple"), "got: {reason}");
    }

    #[test]
    fn test_load_rejects_missing_race_length() {
        let text = SAMPLE.replace(",24:00", ",");
        let (line, reason) = load_err(&text);
        assert_eq!(line, 2);
        assert!(reason.contains("Race Length"));
    }

    #[test]
    fn test_load_rejects_wrong_header() {
        let text = SAMPLE.replace("Driver Name", "Name");
        let (line, _) = load_err(&text);
        assert_eq!(line, 4);
    }

    // ── save_roster ─────────────────────────────────────────────────────

    #[test]
    fn test_save_writes_canonical_zones() {
        let roster = Roster {
            event: EventInfo {
                event_name: "Spa 24".to_string(),
                race_length: "24:00".to_string(),
                ..Default::default()
            },
            drivers: vec![driver("Alice", "EDT"), driver("Bob", "CET")],
        };
        let mut out = Vec::new();
        save_roster(&roster, &mut out, &resolver()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Event Name,Team Name,Track,Car,Race Length"));
        assert!(text.contains("2000,Alice,True,False,America/New_York,False,True"));
        assert!(text.contains("Europe/Berlin"));

        // EDT comes back as the first abbreviation for the zone.
        let reloaded = load_roster(text.as_bytes(), &resolver()).unwrap();
        assert_eq!(reloaded.drivers[0].timezone_abbrev(), "EST");
        assert_eq!(reloaded.drivers[1].timezone_abbrev(), "CET");
        assert_eq!(reloaded.event, roster.event);
    }

    #[test]
    fn test_save_separates_sections_with_blank_line() {
        let roster = Roster {
            event: EventInfo {
                race_length: "1:00".to_string(),
                ..Default::default()
            },
            drivers: vec![driver("Alice", "UTC")],
        };
        let mut out = Vec::new();
        save_roster(&roster, &mut out, &resolver()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], ",,,,1:00");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], DRIVER_HEADER.join(","));
        assert_eq!(lines[4], "2000,Alice,True,False,UTC,False,True");
        assert_eq!(load_roster(text.as_bytes(), &resolver()).unwrap(), roster);
    }

    #[test]
    fn test_save_fails_on_unknown_zone_with_driver_name() {
        let roster = Roster {
            event: EventInfo::default(),
            drivers: vec![driver("Zed", "XYZ")],
        };
        let mut out = Vec::new();
        let err = save_roster(&roster, &mut out, &resolver()).unwrap_err();
        assert!(err.to_string().contains("for driver Zed"), "got: {err}");
        assert!(out.is_empty());
    }
}
