//! Document-level data model for `.gw` files.
//!
//! A [`Document`] is the format-shaped intermediate representation: one is
//! built per parse, read-only afterwards, and either serialized back to text
//! or flattened into relational entities (see [`crate::entities`]).

use std::collections::BTreeMap;

use crate::gw::date::Date;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sex marker carried by person segments and child lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// Parse the one-character wire code (`h`/`f`/`u`).
    pub fn from_code(code: &str) -> Option<Sex> {
        match code {
            "h" => Some(Sex::Male),
            "f" => Some(Sex::Female),
            "u" => Some(Sex::Unknown),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "h",
            Sex::Female => "f",
            Sex::Unknown => "u",
        }
    }
}

/// Identity triple for a person: (surname, given name, occurrence).
///
/// The occurrence index disambiguates same-name persons within one file.
/// Two references sharing the triple are the same person, even across
/// unrelated families.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PersonKey {
    pub surname: String,
    pub given: String,
    pub occurrence: u32,
}

/// A person's name/occurrence/inline-tag cluster as it appears in a header,
/// child or key line. Transient: segments are folded into entities during
/// extraction and are not persisted on their own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonSegment {
    pub surname: String,
    pub given: String,
    pub occurrence: u32,
    pub sex: Sex,
    pub birth_date: Option<Date>,
    pub birth_place: Option<String>,
    pub death_date: Option<Date>,
    pub death_place: Option<String>,
    pub occupation: Option<String>,
    pub source: Option<String>,
}

impl PersonSegment {
    pub fn key(&self) -> PersonKey {
        PersonKey {
            surname: self.surname.clone(),
            given: self.given.clone(),
            occurrence: self.occurrence,
        }
    }

    /// A segment with no name at all (nothing was parsed).
    pub fn is_empty(&self) -> bool {
        self.surname.is_empty() && self.given.is_empty()
    }
}

/// One event line from a `pevt` or `fevt` block.
///
/// `raw` holds the original line unchanged; interpretation never discards
/// information, and the writer prefers the raw line when it is available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Wire tag without the leading `#`. Unknown tags are kept as-is.
    pub tag: String,
    pub date: Option<Date>,
    pub place: Option<String>,
    pub source: Option<String>,
    pub note: Option<String>,
    pub raw: String,
}

/// Family-level source line kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SourceKind {
    /// `src` — family source
    Src,
    /// `csrc` — children source
    Csrc,
}

impl SourceKind {
    pub fn keyword(self) -> &'static str {
        match self {
            SourceKind::Src => "src",
            SourceKind::Csrc => "csrc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceLine {
    pub kind: SourceKind,
    pub text: String,
}

/// One `fam` block: spouses, wedding info, sources, family events, children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Family {
    pub husband: PersonSegment,
    pub wife: PersonSegment,
    pub wedding_date: Option<Date>,
    pub wedding_place: Option<String>,
    pub wedding_source: Option<String>,
    pub sources: Vec<SourceLine>,
    /// `fevt` events, in source order.
    pub events: Vec<Event>,
    /// Children in source order; each segment's sex comes from the child code.
    pub children: Vec<PersonSegment>,
}

/// One `pevt` block: a person key plus their events in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonBlock {
    pub key: PersonSegment,
    pub events: Vec<Event>,
}

/// One `notes` block: free text attached to a person, line breaks preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub key: PersonKey,
    pub text: String,
}

/// A `rel` block, preserved verbatim. The document model carries no typed
/// relation records, so the block round-trips as raw lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationBlock {
    /// Remainder of the `rel` opener line.
    pub key_line: String,
    pub lines: Vec<String>,
}

/// Pre-block header lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Declared input encoding (`encoding: <name>`).
    pub encoding: Option<String>,
    /// Whether the `gwplus` format marker was present.
    pub gwplus: bool,
}

/// A complete parsed `.gw` file.
///
/// Built by exactly one parse over one file and immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub header: Header,
    pub families: Vec<Family>,
    /// `pevt` blocks in source order.
    pub people: Vec<PersonBlock>,
    pub relations: Vec<RelationBlock>,
    pub notes: Vec<Note>,
    /// Extended pages keyed by page name.
    pub pages: BTreeMap<String, String>,
    pub database_notes: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events across all family and person blocks.
    pub fn event_count(&self) -> usize {
        let family_events: usize = self.families.iter().map(|f| f.events.len()).sum();
        let person_events: usize = self.people.iter().map(|p| p.events.len()).sum();
        family_events + person_events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::from_code("h"), Some(Sex::Male));
        assert_eq!(Sex::from_code("f"), Some(Sex::Female));
        assert_eq!(Sex::from_code("u"), Some(Sex::Unknown));
        assert_eq!(Sex::from_code("x"), None);
        assert_eq!(Sex::Male.code(), "h");
    }

    #[test]
    fn test_segment_key() {
        let seg = PersonSegment {
            surname: "DUPONT".to_string(),
            given: "Jean".to_string(),
            occurrence: 1,
            ..Default::default()
        };
        assert_eq!(
            seg.key(),
            PersonKey {
                surname: "DUPONT".to_string(),
                given: "Jean".to_string(),
                occurrence: 1,
            }
        );
        assert!(!seg.is_empty());
        assert!(PersonSegment::default().is_empty());
    }
}
