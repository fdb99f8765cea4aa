//! Flat relational entities and the extraction pass that produces them.
//!
//! Extraction flattens a [`Document`] into identifier-keyed person, family,
//! child-link and event records. Identifiers are indices into per-call
//! arenas, generated deterministically from the (surname, given name,
//! occurrence) triple, so the same source person always yields the same id
//! within one extraction run and repeated runs over the same document are
//! reproducible. The inverse direction, [`EntitySet::to_document`], is the
//! normalize step the serializer consumes; it is where the
//! serialization-contract checks live.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::gw::date::{Date, parse_date};
use crate::gw::tags::TagContext;
use crate::model::{
    Document, Event, Family, Note, PersonBlock, PersonKey, PersonSegment, Sex, SourceLine,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a person within one [`EntitySet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PersonId(pub u32);

/// Identifier of a family within one [`EntitySet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FamilyId(pub u32);

/// Identifier of an event within one [`EntitySet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventId(pub u32);

/// A flattened person record. Dates are carried as raw `.gw` date tokens.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PersonEntity {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub occurrence: u32,
    pub sex: Sex,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub death_date: Option<String>,
    pub death_place: Option<String>,
    pub occupation: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// A flattened family record.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FamilyEntity {
    pub id: FamilyId,
    pub husband_id: Option<PersonId>,
    pub wife_id: Option<PersonId>,
    pub marriage_date: Option<String>,
    pub marriage_place: Option<String>,
    pub marriage_source: Option<String>,
    pub sources: Vec<SourceLine>,
    /// Free-form notes; left empty by extraction, available to storage.
    pub notes: Option<String>,
}

/// Links a child to the family it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChildLink {
    pub family_id: FamilyId,
    pub child_id: PersonId,
}

/// The single owner of an event: a person or a family, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventOwner {
    Person(PersonId),
    Family(FamilyId),
}

/// A flattened event record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventEntity {
    pub id: EventId,
    pub owner: EventOwner,
    /// Human-readable event name resolved through the tag tables, or the
    /// raw tag text when the tag is unknown.
    pub name: String,
    pub date: Option<String>,
    pub place: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
}

/// All entities produced by one extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntitySet {
    pub persons: Vec<PersonEntity>,
    pub families: Vec<FamilyEntity>,
    pub children: Vec<ChildLink>,
    pub events: Vec<EventEntity>,
}

impl EntitySet {
    /// Look up a person by id. Extraction output indexes persons by id, so
    /// this is O(1) there; sets reshaped by storage fall back to a scan.
    pub fn person(&self, id: PersonId) -> Option<&PersonEntity> {
        if let Some(person) = self.persons.get(id.0 as usize)
            && person.id == id
        {
            return Some(person);
        }
        self.persons.iter().find(|person| person.id == id)
    }

    pub fn family(&self, id: FamilyId) -> Option<&FamilyEntity> {
        if let Some(family) = self.families.get(id.0 as usize)
            && family.id == id
        {
            return Some(family);
        }
        self.families.iter().find(|family| family.id == id)
    }

    /// Rebuild a [`Document`] from the flat records — the normalize step in
    /// front of serialization. Every referenced id must resolve within this
    /// set; a dangling reference is a contract error, not invalid output.
    pub fn to_document(&self) -> Result<Document> {
        let mut doc = Document::new();

        let mut children_by_family: HashMap<u32, Vec<PersonId>> = HashMap::new();
        for link in &self.children {
            if self.family(link.family_id).is_none() {
                return Err(Error::UnknownFamily(link.family_id.0));
            }
            if self.person(link.child_id).is_none() {
                return Err(Error::UnknownPerson(link.child_id.0));
            }
            children_by_family
                .entry(link.family_id.0)
                .or_default()
                .push(link.child_id);
        }

        let mut family_events: HashMap<u32, Vec<&EventEntity>> = HashMap::new();
        let mut person_order: Vec<PersonId> = Vec::new();
        let mut person_events: HashMap<u32, Vec<&EventEntity>> = HashMap::new();
        for event in &self.events {
            match event.owner {
                EventOwner::Family(id) => {
                    if self.family(id).is_none() {
                        return Err(Error::UnknownFamily(id.0));
                    }
                    family_events.entry(id.0).or_default().push(event);
                }
                EventOwner::Person(id) => {
                    if self.person(id).is_none() {
                        return Err(Error::UnknownPerson(id.0));
                    }
                    if !person_events.contains_key(&id.0) {
                        person_order.push(id);
                    }
                    person_events.entry(id.0).or_default().push(event);
                }
            }
        }

        // Vital fields are attached to a person's first appearance only
        let mut emitted_vitals: HashSet<u32> = HashSet::new();

        for family_entity in &self.families {
            let mut family = Family {
                husband: match family_entity.husband_id {
                    Some(id) => self.spouse_segment(id, Sex::Male, &mut emitted_vitals)?,
                    None => unknown_segment(),
                },
                wife: match family_entity.wife_id {
                    Some(id) => self.spouse_segment(id, Sex::Female, &mut emitted_vitals)?,
                    None => unknown_segment(),
                },
                wedding_date: family_entity.marriage_date.as_deref().map(parse_date),
                wedding_place: family_entity.marriage_place.clone(),
                wedding_source: family_entity.marriage_source.clone(),
                sources: family_entity.sources.clone(),
                ..Default::default()
            };
            if let Some(events) = family_events.remove(&family_entity.id.0) {
                family.events = events
                    .into_iter()
                    .map(|event| entity_event(event, TagContext::Family))
                    .collect();
            }
            if let Some(child_ids) = children_by_family.remove(&family_entity.id.0) {
                for child_id in child_ids {
                    family
                        .children
                        .push(self.child_segment(child_id, &mut emitted_vitals)?);
                }
            }
            doc.families.push(family);
        }

        for person_id in person_order {
            let person = self
                .person(person_id)
                .ok_or(Error::UnknownPerson(person_id.0))?;
            let events = person_events
                .remove(&person_id.0)
                .unwrap_or_default()
                .into_iter()
                .map(|event| entity_event(event, TagContext::Person))
                .collect();
            doc.people.push(PersonBlock {
                key: name_segment(person),
                events,
            });
        }

        for person in &self.persons {
            if let Some(notes) = &person.notes
                && !notes.is_empty()
            {
                doc.notes.push(Note {
                    key: person_key(person),
                    text: notes.clone(),
                });
            }
        }

        Ok(doc)
    }

    /// Segment for a spouse position. The positional default (husband male,
    /// wife female) is left implicit; an explicit `#sex` marker is only
    /// produced when the record contradicts it.
    fn spouse_segment(
        &self,
        id: PersonId,
        positional: Sex,
        emitted_vitals: &mut HashSet<u32>,
    ) -> Result<PersonSegment> {
        let person = self.person(id).ok_or(Error::UnknownPerson(id.0))?;
        let mut segment = name_segment(person);
        if person.sex != positional && person.sex != Sex::Unknown {
            segment.sex = person.sex;
        }
        if emitted_vitals.insert(id.0) {
            attach_vitals(&mut segment, person);
        }
        Ok(segment)
    }

    fn child_segment(
        &self,
        id: PersonId,
        emitted_vitals: &mut HashSet<u32>,
    ) -> Result<PersonSegment> {
        let person = self.person(id).ok_or(Error::UnknownPerson(id.0))?;
        let mut segment = name_segment(person);
        segment.sex = person.sex;
        if emitted_vitals.insert(id.0) {
            attach_vitals(&mut segment, person);
        }
        Ok(segment)
    }
}

fn person_key(person: &PersonEntity) -> PersonKey {
    PersonKey {
        surname: person.last_name.clone(),
        given: person.first_name.clone(),
        occurrence: person.occurrence,
    }
}

fn name_segment(person: &PersonEntity) -> PersonSegment {
    PersonSegment {
        surname: person.last_name.clone(),
        given: person.first_name.clone(),
        occurrence: person.occurrence,
        ..Default::default()
    }
}

fn attach_vitals(segment: &mut PersonSegment, person: &PersonEntity) {
    segment.birth_date = person.birth_date.as_deref().map(parse_date);
    segment.birth_place = person.birth_place.clone();
    segment.death_date = person.death_date.as_deref().map(parse_date);
    segment.death_place = person.death_place.clone();
    segment.occupation = person.occupation.clone();
    segment.source = person.source.clone();
}

/// Placeholder segment for a missing spouse reference.
fn unknown_segment() -> PersonSegment {
    PersonSegment {
        surname: "?".to_string(),
        given: "?".to_string(),
        ..Default::default()
    }
}

fn entity_event(event: &EventEntity, context: TagContext) -> Event {
    Event {
        tag: context
            .tag_of(&event.name)
            .map(str::to_string)
            .unwrap_or_else(|| event.name.clone()),
        date: event.date.as_deref().map(parse_date),
        place: event.place.clone(),
        source: event.source.clone(),
        note: event.description.clone(),
        raw: String::new(),
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Per-call arena mapping identity triples to person ids.
#[derive(Default)]
struct PersonArena {
    index: HashMap<PersonKey, PersonId>,
    persons: Vec<PersonEntity>,
}

impl PersonArena {
    fn intern(&mut self, key: PersonKey) -> PersonId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = PersonId(self.persons.len() as u32);
        self.persons.push(PersonEntity {
            id,
            first_name: key.given.clone(),
            last_name: key.surname.clone(),
            occurrence: key.occurrence,
            ..Default::default()
        });
        self.index.insert(key, id);
        id
    }

    /// Intern a segment and merge its fields into the person record.
    /// Non-empty values win over empty ones; on a tie the first-seen value
    /// is kept.
    fn intern_segment(&mut self, segment: &PersonSegment) -> PersonId {
        let id = self.intern(segment.key());
        let person = &mut self.persons[id.0 as usize];
        if person.sex == Sex::Unknown {
            person.sex = segment.sex;
        }
        merge(
            &mut person.birth_date,
            segment.birth_date.as_ref().map(Date::to_gw),
        );
        merge(&mut person.birth_place, segment.birth_place.clone());
        merge(
            &mut person.death_date,
            segment.death_date.as_ref().map(Date::to_gw),
        );
        merge(&mut person.death_place, segment.death_place.clone());
        merge(&mut person.occupation, segment.occupation.clone());
        merge(&mut person.source, segment.source.clone());
        id
    }

    fn default_sex(&mut self, id: PersonId, sex: Sex) {
        let person = &mut self.persons[id.0 as usize];
        if person.sex == Sex::Unknown {
            person.sex = sex;
        }
    }

    /// Fill a person's vital fields from a `pevt` event when they are still
    /// blank (e.g. a birth date the family header never carried).
    fn merge_vitals(&mut self, id: PersonId, event: &Event) {
        let person = &mut self.persons[id.0 as usize];
        match event.tag.as_str() {
            "birt" => {
                merge(&mut person.birth_date, event.date.as_ref().map(Date::to_gw));
                merge(&mut person.birth_place, event.place.clone());
            }
            "deat" => {
                merge(&mut person.death_date, event.date.as_ref().map(Date::to_gw));
                merge(&mut person.death_place, event.place.clone());
            }
            _ => {}
        }
    }

    fn merge_notes(&mut self, id: PersonId, text: &str) {
        merge(&mut self.persons[id.0 as usize].notes, Some(text.to_string()));
    }
}

fn merge(slot: &mut Option<String>, value: Option<String>) {
    if slot.as_deref().is_none_or(str::is_empty)
        && let Some(value) = value
        && !value.is_empty()
    {
        *slot = Some(value);
    }
}

/// Flatten a document into relational entities.
///
/// One single-threaded pass over the whole document; child-before-parent
/// ordering in the source file does not matter because every reference is
/// interned through the same arena.
pub fn extract_entities(doc: &Document) -> EntitySet {
    let mut arena = PersonArena::default();
    let mut families = Vec::new();
    let mut children = Vec::new();
    let mut events = Vec::new();

    for (index, family) in doc.families.iter().enumerate() {
        let family_id = FamilyId(index as u32);

        let husband_id = (!family.husband.is_empty()).then(|| {
            let id = arena.intern_segment(&family.husband);
            arena.default_sex(id, Sex::Male);
            id
        });
        let wife_id = (!family.wife.is_empty()).then(|| {
            let id = arena.intern_segment(&family.wife);
            arena.default_sex(id, Sex::Female);
            id
        });

        families.push(FamilyEntity {
            id: family_id,
            husband_id,
            wife_id,
            marriage_date: family.wedding_date.as_ref().map(Date::to_gw),
            marriage_place: family.wedding_place.clone(),
            marriage_source: family.wedding_source.clone(),
            sources: family.sources.clone(),
            notes: None,
        });

        for event in &family.events {
            push_event(
                &mut events,
                EventOwner::Family(family_id),
                event,
                TagContext::Family,
            );
        }

        for child in &family.children {
            let child_id = arena.intern_segment(child);
            children.push(ChildLink {
                family_id,
                child_id,
            });
        }
    }

    for block in &doc.people {
        let person_id = arena.intern_segment(&block.key);
        for event in &block.events {
            push_event(
                &mut events,
                EventOwner::Person(person_id),
                event,
                TagContext::Person,
            );
            arena.merge_vitals(person_id, event);
        }
    }

    for note in &doc.notes {
        let person_id = arena.intern(note.key.clone());
        arena.merge_notes(person_id, &note.text);
    }

    EntitySet {
        persons: arena.persons,
        families,
        children,
        events,
    }
}

fn push_event(
    events: &mut Vec<EventEntity>,
    owner: EventOwner,
    event: &Event,
    context: TagContext,
) {
    let id = EventId(events.len() as u32);
    events.push(EventEntity {
        id,
        owner,
        name: context
            .name_of(&event.tag)
            .map(str::to_string)
            .unwrap_or_else(|| event.tag.clone()),
        date: event.date.as_ref().map(Date::to_gw),
        place: event.place.clone(),
        source: event.source.clone(),
        description: event.note.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gw::parse;

    #[test]
    fn test_end_to_end_scenario() {
        let doc = parse("fam DUPONT Jean + DURAND Marie\nbeg\n- h DUPONT Paul\nend\n").unwrap();
        let set = extract_entities(&doc);

        assert_eq!(set.persons.len(), 3);
        assert_eq!(set.families.len(), 1);
        assert_eq!(set.children.len(), 1);

        let jean = &set.persons[0];
        assert_eq!((jean.last_name.as_str(), jean.first_name.as_str()), ("DUPONT", "Jean"));
        assert_eq!(jean.sex, Sex::Male);
        let marie = &set.persons[1];
        assert_eq!(marie.last_name, "DURAND");
        assert_eq!(marie.sex, Sex::Female);
        let paul = &set.persons[2];
        assert_eq!(paul.first_name, "Paul");
        assert_eq!(paul.sex, Sex::Male);

        let family = &set.families[0];
        assert_eq!(family.husband_id, Some(jean.id));
        assert_eq!(family.wife_id, Some(marie.id));
        assert_eq!(set.children[0].family_id, family.id);
        assert_eq!(set.children[0].child_id, paul.id);
    }

    #[test]
    fn test_occurrence_disambiguation() {
        let input = "fam Doe John + Roe Jane\n\
                     fam Doe John.1 + Poe Anna\n\
                     pevt Doe John.1\n#birt 1850\nend pevt\n";
        let doc = parse(input).unwrap();
        let set = extract_entities(&doc);

        let john0 = set
            .persons
            .iter()
            .find(|p| p.first_name == "John" && p.occurrence == 0)
            .unwrap();
        let john1 = set
            .persons
            .iter()
            .find(|p| p.first_name == "John" && p.occurrence == 1)
            .unwrap();
        assert_ne!(john0.id, john1.id);

        // The pevt reference resolved to the occurrence-1 person
        assert_eq!(john1.birth_date.as_deref(), Some("1850"));
        assert_eq!(john0.birth_date, None);
        assert_eq!(set.families[1].husband_id, Some(john1.id));
    }

    #[test]
    fn test_child_linkage_invariant() {
        let input = "fam A B + C D\nbeg\n- h A E\n- f A F\nend\n\
                     fam G H + I J\nbeg\n- u G K\nend\n";
        let doc = parse(input).unwrap();
        let set = extract_entities(&doc);
        for link in &set.children {
            assert!(set.family(link.family_id).is_some());
            assert!(set.person(link.child_id).is_some());
        }
    }

    #[test]
    fn test_event_owner_is_exclusive() {
        let input = "fam A B + C D\nfevt\n#marr 1850\nend fevt\n\
                     pevt A B\n#birt 1820\nend pevt\n";
        let doc = parse(input).unwrap();
        let set = extract_entities(&doc);
        assert_eq!(set.events.len(), 2);
        assert!(matches!(set.events[0].owner, EventOwner::Family(_)));
        assert_eq!(set.events[0].name, "marriage");
        assert!(matches!(set.events[1].owner, EventOwner::Person(_)));
        assert_eq!(set.events[1].name, "birth");
    }

    #[test]
    fn test_merge_prefers_first_seen_non_empty() {
        // Birth date comes from the header; the pevt event must not override
        let input = "fam A B #bd 1800 + C D\npevt A B\n#birt 1801\nend pevt\n";
        let doc = parse(input).unwrap();
        let set = extract_entities(&doc);
        let person = set.persons.iter().find(|p| p.last_name == "A").unwrap();
        assert_eq!(person.birth_date.as_deref(), Some("1800"));
    }

    #[test]
    fn test_pevt_fills_blank_vitals() {
        let input = "fam A B + C D\npevt A B\n#birt 1801 #p Lyon\nend pevt\n";
        let doc = parse(input).unwrap();
        let set = extract_entities(&doc);
        let person = set.persons.iter().find(|p| p.last_name == "A").unwrap();
        assert_eq!(person.birth_date.as_deref(), Some("1801"));
        assert_eq!(person.birth_place.as_deref(), Some("Lyon"));
    }

    #[test]
    fn test_notes_attach_to_person() {
        let input = "fam A B + C D\nnotes A B\nbeg\nremembered fondly\nend notes\n";
        let doc = parse(input).unwrap();
        let set = extract_entities(&doc);
        let person = set.persons.iter().find(|p| p.last_name == "A").unwrap();
        assert_eq!(person.notes.as_deref(), Some("remembered fondly"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let input = "fam A B + C D\nbeg\n- h A E\nend\npevt C D\n#birt 1820\nend pevt\n";
        let doc = parse(input).unwrap();
        assert_eq!(extract_entities(&doc), extract_entities(&doc));
    }

    #[test]
    fn test_to_document_contract_errors() {
        let mut set = EntitySet::default();
        set.families.push(FamilyEntity {
            id: FamilyId(0),
            ..Default::default()
        });
        set.children.push(ChildLink {
            family_id: FamilyId(0),
            child_id: PersonId(42),
        });
        assert!(matches!(
            set.to_document().unwrap_err(),
            Error::UnknownPerson(42)
        ));

        let mut set = EntitySet::default();
        set.events.push(EventEntity {
            id: EventId(0),
            owner: EventOwner::Family(FamilyId(7)),
            name: "marriage".to_string(),
            date: None,
            place: None,
            source: None,
            description: None,
        });
        assert!(matches!(
            set.to_document().unwrap_err(),
            Error::UnknownFamily(7)
        ));
    }
}
