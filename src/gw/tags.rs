//! Event tag vocabulary shared by the parser and the writer.
//!
//! Each context has a single table; the forward (tag → name) and reverse
//! (name → tag) lookups are both derived from it. The round-trip guarantee
//! depends on there being exactly one source of truth per direction pair,
//! so neither side may grow its own copy.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Person-context event tags (`pevt` blocks).
pub const PERSON_EVENT_TAGS: &[(&str, &str)] = &[
    ("birt", "birth"),
    ("bapt", "baptism"),
    ("deat", "death"),
    ("buri", "burial"),
    ("crem", "cremation"),
    ("resi", "residence"),
];

/// Family-context event tags (`fevt` blocks).
pub const FAMILY_EVENT_TAGS: &[(&str, &str)] = &[
    ("marr", "marriage"),
    ("enga", "engagement"),
    ("div", "divorce"),
    ("sep", "separation"),
    ("marc", "marriage-contract"),
    ("marb", "marriage-banns"),
    ("anul", "annulment"),
];

static PERSON_NAME_TO_TAG: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PERSON_EVENT_TAGS.iter().map(|&(tag, name)| (name, tag)).collect());

static FAMILY_NAME_TO_TAG: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FAMILY_EVENT_TAGS.iter().map(|&(tag, name)| (name, tag)).collect());

/// Which tag table applies to an event block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagContext {
    Person,
    Family,
}

impl TagContext {
    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            TagContext::Person => PERSON_EVENT_TAGS,
            TagContext::Family => FAMILY_EVENT_TAGS,
        }
    }

    /// Human-readable name for a wire tag, or `None` when the tag is unknown.
    pub fn name_of(self, tag: &str) -> Option<&'static str> {
        self.table().iter().find(|(t, _)| *t == tag).map(|&(_, name)| name)
    }

    /// Wire tag for a human-readable name; exact inverse of [`Self::name_of`].
    pub fn tag_of(self, name: &str) -> Option<&'static str> {
        match self {
            TagContext::Person => PERSON_NAME_TO_TAG.get(name).copied(),
            TagContext::Family => FAMILY_NAME_TO_TAG.get(name).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(TagContext::Person.name_of("birt"), Some("birth"));
        assert_eq!(TagContext::Family.name_of("marr"), Some("marriage"));
        assert_eq!(TagContext::Person.name_of("marr"), None);
        assert_eq!(TagContext::Person.name_of("zzzz"), None);
    }

    #[test]
    fn test_tables_are_bijective() {
        // Every tag maps to a name that maps back to the same tag, in both
        // contexts. This is the property entity-level round-tripping rests on.
        for context in [TagContext::Person, TagContext::Family] {
            for &(tag, name) in context.table() {
                assert_eq!(context.name_of(tag), Some(name));
                assert_eq!(context.tag_of(name), Some(tag));
            }
        }
    }

    #[test]
    fn test_no_duplicate_names() {
        for table in [PERSON_EVENT_TAGS, FAMILY_EVENT_TAGS] {
            let mut names: Vec<&str> = table.iter().map(|&(_, name)| name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), table.len());
        }
    }
}
