//! Timezone abbreviation resolution.
//!
//! Drivers enter their home timezone as a short abbreviation ("EST", "CET",
//! "AEST"). Abbreviations are not unique worldwide, so resolution goes through
//! a fixed, versioned [`ZoneTable`] that holds exactly one canonical IANA zone
//! per abbreviation. Every known collision is listed in
//! [`AMBIGUOUS_ABBREVIATIONS`].
//!
//! Unknown input is an error. The resolver never substitutes UTC for a label
//! it does not recognise.
//!
//! # Round trips
//!
//! Saved rosters store the canonical identifier. [`TimezoneResolver::reverse_label`]
//! maps it back to the first abbreviation in table order, which may differ
//! from the one originally typed (EDT comes back as EST) while still
//! denoting the same zone.

use std::fmt;

use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::error::{GridError, Result};

// ── ZoneId ──────────────────────────────────────────────────────────────────

/// A canonical (IANA) zone identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneId(Tz);

impl ZoneId {
    pub fn new(tz: Tz) -> Self {
        ZoneId(tz)
    }

    pub fn tz(&self) -> Tz {
        self.0
    }

    /// The IANA name, e.g. `"America/Chicago"`.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ZoneId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// ── Collisions ──────────────────────────────────────────────────────────────

/// An abbreviation that denotes more than one real-world zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbbreviationCollision {
    pub abbrev: &'static str,
    /// The zone the table resolves this abbreviation to.
    pub chosen: Tz,
    /// The meaning that loses.
    pub shadowed: &'static str,
}

pub const CST_COLLISION: AbbreviationCollision = AbbreviationCollision {
    abbrev: "CST",
    chosen: chrono_tz::America::Chicago,
    shadowed: "China Standard Time (Asia/Shanghai)",
};

pub const IST_COLLISION: AbbreviationCollision = AbbreviationCollision {
    abbrev: "IST",
    chosen: chrono_tz::Asia::Kolkata,
    shadowed: "Irish Standard Time (Europe/Dublin), Israel Standard Time (Asia/Jerusalem)",
};

pub const BST_COLLISION: AbbreviationCollision = AbbreviationCollision {
    abbrev: "BST",
    chosen: chrono_tz::Europe::London,
    shadowed: "Bangladesh Standard Time (Asia/Dhaka)",
};

pub const AST_COLLISION: AbbreviationCollision = AbbreviationCollision {
    abbrev: "AST",
    chosen: chrono_tz::America::Halifax,
    shadowed: "Arabia Standard Time (Asia/Riyadh)",
};

pub const AMBIGUOUS_ABBREVIATIONS: &[AbbreviationCollision] =
    &[CST_COLLISION, IST_COLLISION, BST_COLLISION, AST_COLLISION];

// ── ZoneTable ───────────────────────────────────────────────────────────────

/// An immutable abbreviation → zone mapping.
///
/// Order matters only for [`TimezoneResolver::reverse_label`]: the first
/// abbreviation listed for a zone is its display label.
#[derive(Debug)]
pub struct ZoneTable {
    pub version: &'static str,
    entries: &'static [(&'static str, Tz)],
}

impl ZoneTable {
    pub fn entries(&self) -> &'static [(&'static str, Tz)] {
        self.entries
    }

    fn lookup(&self, abbrev: &str) -> Option<Tz> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(abbrev))
            .map(|(_, tz)| *tz)
    }

    fn contains(&self, abbrev: &str) -> bool {
        self.lookup(abbrev).is_some()
    }
}

pub static ZONE_TABLE_V1: ZoneTable = ZoneTable {
    version: "1",
    entries: &[
        // Universal
        ("UTC", chrono_tz::UTC),
        ("Z", chrono_tz::UTC),
        ("GMT", chrono_tz::UTC),
        // North America
        ("EST", chrono_tz::America::New_York),
        ("EDT", chrono_tz::America::New_York),
        ("CST", chrono_tz::America::Chicago),
        ("CDT", chrono_tz::America::Chicago),
        ("MST", chrono_tz::America::Denver),
        ("MDT", chrono_tz::America::Denver),
        ("PST", chrono_tz::America::Los_Angeles),
        ("PDT", chrono_tz::America::Los_Angeles),
        ("AKST", chrono_tz::America::Anchorage),
        ("AKDT", chrono_tz::America::Anchorage),
        ("HST", chrono_tz::Pacific::Honolulu),
        ("AST", chrono_tz::America::Halifax),
        ("ADT", chrono_tz::America::Halifax),
        ("NST", chrono_tz::America::St_Johns),
        ("NDT", chrono_tz::America::St_Johns),
        // Europe
        ("WET", chrono_tz::Europe::Lisbon),
        ("WEST", chrono_tz::Europe::Lisbon),
        ("BST", chrono_tz::Europe::London),
        ("CET", chrono_tz::Europe::Berlin),
        ("CEST", chrono_tz::Europe::Berlin),
        ("EET", chrono_tz::Europe::Athens),
        ("EEST", chrono_tz::Europe::Athens),
        ("MSK", chrono_tz::Europe::Moscow),
        // Australia / Oceania
        ("AEST", chrono_tz::Australia::Sydney),
        ("AEDT", chrono_tz::Australia::Sydney),
        ("ACST", chrono_tz::Australia::Adelaide),
        ("ACDT", chrono_tz::Australia::Adelaide),
        ("AWST", chrono_tz::Australia::Perth),
        ("NZST", chrono_tz::Pacific::Auckland),
        ("NZDT", chrono_tz::Pacific::Auckland),
        // Asia
        ("IST", chrono_tz::Asia::Kolkata),
        ("JST", chrono_tz::Asia::Tokyo),
        ("KST", chrono_tz::Asia::Seoul),
        ("HKT", chrono_tz::Asia::Hong_Kong),
        ("SGT", chrono_tz::Asia::Singapore),
        ("PHT", chrono_tz::Asia::Manila),
        ("WIB", chrono_tz::Asia::Jakarta),
        ("GST", chrono_tz::Asia::Dubai),
    ],
};

// ── TimezoneResolver ────────────────────────────────────────────────────────

/// Resolves user-facing timezone labels against a [`ZoneTable`].
#[derive(Debug, Clone, Copy)]
pub struct TimezoneResolver<'t> {
    table: &'t ZoneTable,
}

impl Default for TimezoneResolver<'static> {
    fn default() -> Self {
        TimezoneResolver::new(&ZONE_TABLE_V1)
    }
}

impl<'t> TimezoneResolver<'t> {
    pub fn new(table: &'t ZoneTable) -> Self {
        TimezoneResolver { table }
    }

    pub fn table(&self) -> &'t ZoneTable {
        self.table
    }

    /// Resolve an abbreviation (or a canonical IANA name) to a [`ZoneId`].
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Table abbreviations take precedence over IANA names, so `"EST"`
    /// resolves to `America/New_York` rather than the fixed-offset `EST` zone.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnknownTimezone`] (without a driver name) when the
    /// label is neither a table abbreviation nor an IANA identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use stint_grid::TimezoneResolver;
    ///
    /// let resolver = TimezoneResolver::default();
    /// assert_eq!(resolver.resolve("cst").unwrap().name(), "America/Chicago");
    /// assert!(resolver.resolve("XYZ").is_err());
    /// ```
    pub fn resolve(&self, abbrev: &str) -> Result<ZoneId> {
        let trimmed = abbrev.trim();
        if trimmed.is_empty() {
            return Err(unknown(abbrev));
        }
        if let Some(tz) = self.table.lookup(trimmed) {
            return Ok(ZoneId(tz));
        }
        trimmed
            .parse::<Tz>()
            .map(ZoneId)
            .map_err(|_| unknown(abbrev))
    }

    /// The display abbreviation for a zone: the first table key mapping to
    /// it, or the canonical name when no abbreviation does.
    pub fn reverse_label(&self, zone: ZoneId) -> &'static str {
        self.table
            .entries
            .iter()
            .find(|(_, tz)| *tz == zone.0)
            .map(|(key, _)| *key)
            .unwrap_or_else(|| zone.name())
    }

    /// Whether `label` is one of the table's abbreviations.
    pub fn is_abbreviation(&self, label: &str) -> bool {
        self.table.contains(label.trim())
    }
}

fn unknown(abbrev: &str) -> GridError {
    GridError::UnknownTimezone {
        abbrev: abbrev.to_string(),
        driver: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn resolver() -> TimezoneResolver<'static> {
        TimezoneResolver::default()
    }

    // ── resolve ─────────────────────────────────────────────────────────

    #[test]
    fn test_utc_aliases_share_zone() {
        let r = resolver();
        let utc = r.resolve("UTC").unwrap();
        assert_eq!(r.resolve("Z").unwrap(), utc);
        assert_eq!(r.resolve("GMT").unwrap(), utc);
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_trims() {
        let r = resolver();
        assert_eq!(r.resolve("  aest ").unwrap().name(), "Australia/Sydney");
    }

    #[test]
    fn test_unknown_abbreviation_fails() {
        let err = resolver().resolve("XYZ").unwrap_err();
        match err {
            GridError::UnknownTimezone { ref abbrev, ref driver } => {
                assert_eq!(abbrev, "XYZ");
                assert!(driver.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("Unknown timezone"));
    }

    #[test]
    fn test_empty_label_fails() {
        assert!(resolver().resolve("   ").is_err());
    }

    #[test]
    fn test_canonical_name_accepted() {
        let zone = resolver().resolve("Asia/Shanghai").unwrap();
        assert_eq!(zone.name(), "Asia/Shanghai");
    }

    #[test]
    fn test_table_beats_iana_fixed_offset_names() {
        // chrono-tz knows a fixed-offset "EST"; the table wins.
        assert_eq!(resolver().resolve("EST").unwrap().name(), "America/New_York");
    }

    // ── collisions ──────────────────────────────────────────────────────

    #[test]
    fn test_collisions_resolve_to_chosen_zone() {
        let r = resolver();
        for collision in AMBIGUOUS_ABBREVIATIONS {
            assert_eq!(
                r.resolve(collision.abbrev).unwrap().tz(),
                collision.chosen,
                "{}",
                collision.abbrev
            );
        }
    }

    #[test]
    fn test_table_keys_unique() {
        let mut seen = HashSet::new();
        for (key, _) in ZONE_TABLE_V1.entries() {
            assert!(seen.insert(key.to_ascii_uppercase()), "duplicate key {key}");
        }
    }

    // ── reverse_label ───────────────────────────────────────────────────

    #[test]
    fn test_reverse_label_first_key_wins() {
        let r = resolver();
        let ny = r.resolve("EDT").unwrap();
        assert_eq!(r.reverse_label(ny), "EST");
        let utc = r.resolve("GMT").unwrap();
        assert_eq!(r.reverse_label(utc), "UTC");
    }

    #[test]
    fn test_reverse_label_falls_back_to_canonical_name() {
        let r = resolver();
        let zone = r.resolve("Asia/Shanghai").unwrap();
        assert_eq!(r.reverse_label(zone), "Asia/Shanghai");
    }

    #[test]
    fn test_reverse_label_round_trips_every_entry() {
        let r = resolver();
        for (key, _) in ZONE_TABLE_V1.entries() {
            let zone = r.resolve(key).unwrap();
            assert_eq!(r.resolve(r.reverse_label(zone)).unwrap(), zone, "{key}");
        }
    }

    #[test]
    fn test_zone_id_serializes_as_name() {
        let zone = resolver().resolve("JST").unwrap();
        assert_eq!(serde_json::to_string(&zone).unwrap(), "\"Asia/Tokyo\"");
    }
}
