//! Entity-extraction tests: deterministic ids, linkage invariants, and the
//! end-to-end scenario.

use arbre::{EventOwner, Sex, extract_entities, parse, serialize_entities};

const ROYAL_GW: &str = include_str!("fixtures/royal.gw");

#[test]
fn test_end_to_end_scenario() {
    let text = "fam DUPONT Jean + DURAND Marie\nbeg\n- h DUPONT Paul\nend\n";
    let set = extract_entities(&parse(text).unwrap());

    assert_eq!(set.persons.len(), 3);
    assert_eq!(set.families.len(), 1);
    assert_eq!(set.children.len(), 1);

    let jean = set.persons.iter().find(|p| p.first_name == "Jean").unwrap();
    let marie = set.persons.iter().find(|p| p.first_name == "Marie").unwrap();
    let paul = set.persons.iter().find(|p| p.first_name == "Paul").unwrap();
    assert!(set.persons.iter().all(|p| p.occurrence == 0));

    let family = &set.families[0];
    assert_eq!(family.husband_id, Some(jean.id));
    assert_eq!(family.wife_id, Some(marie.id));
    assert_eq!(set.children[0].family_id, family.id);
    assert_eq!(set.children[0].child_id, paul.id);

    // Serializing the entity set reproduces the same header and child line
    let out = serialize_entities(&set).unwrap();
    assert!(out.contains("fam DUPONT Jean + DURAND Marie"));
    assert!(out.contains("- h DUPONT Paul"));
}

#[test]
fn test_fixture_extraction() {
    let set = extract_entities(&parse(ROYAL_GW).unwrap());

    // Hugues, Adelaide, Robert.1, Hedwige, Constance, Henri, Robert.2
    assert_eq!(set.persons.len(), 7);
    assert_eq!(set.families.len(), 2);
    assert_eq!(set.children.len(), 4);
    assert_eq!(set.events.len(), 7);
}

#[test]
fn test_same_person_across_blocks() {
    let set = extract_entities(&parse(ROYAL_GW).unwrap());

    // Robert.1 appears as a child of family 1, the husband of family 2 and
    // the subject of a pevt block; all three resolve to one entity.
    let robert = set
        .persons
        .iter()
        .find(|p| p.first_name == "Robert" && p.occurrence == 1)
        .unwrap();
    assert_eq!(set.families[1].husband_id, Some(robert.id));
    assert!(set.children.iter().any(|link| link.child_id == robert.id));
    assert!(set.events.iter().any(|event| event.owner == EventOwner::Person(robert.id)));

    // His vitals were merged from the child line and the pevt block
    assert_eq!(robert.birth_date.as_deref(), Some("972"));
    assert_eq!(robert.death_date.as_deref(), Some("20/7/1031"));
    assert_eq!(robert.death_place.as_deref(), Some("Melun"));
    assert_eq!(robert.notes.as_deref().map(|n| n.starts_with("Known as")), Some(true));
}

#[test]
fn test_occurrence_zero_and_one_are_distinct() {
    // Robert.1 (son of Hugues) and Robert.2 must not collapse, and neither
    // may collide with a hypothetical occurrence-0 Robert.
    let set = extract_entities(&parse(ROYAL_GW).unwrap());
    let roberts: Vec<_> = set
        .persons
        .iter()
        .filter(|p| p.first_name == "Robert")
        .collect();
    assert_eq!(roberts.len(), 2);
    assert_ne!(roberts[0].id, roberts[1].id);
    assert_ne!(roberts[0].occurrence, roberts[1].occurrence);
}

#[test]
fn test_linkage_invariant_on_fixture() {
    let set = extract_entities(&parse(ROYAL_GW).unwrap());
    for link in &set.children {
        assert!(set.family(link.family_id).is_some());
        assert!(set.person(link.child_id).is_some());
    }
    for event in &set.events {
        match event.owner {
            EventOwner::Person(id) => assert!(set.person(id).is_some()),
            EventOwner::Family(id) => assert!(set.family(id).is_some()),
        }
    }
}

#[test]
fn test_spouse_sex_defaults() {
    let set = extract_entities(&parse("fam A B + C D\n").unwrap());
    assert_eq!(set.persons[0].sex, Sex::Male);
    assert_eq!(set.persons[1].sex, Sex::Female);
}

#[test]
fn test_explicit_sex_beats_position() {
    let set = extract_entities(&parse("fam A B #sex f + C D\n").unwrap());
    assert_eq!(set.persons[0].sex, Sex::Female);
}

#[test]
fn test_extraction_runs_are_reproducible() {
    let doc = parse(ROYAL_GW).unwrap();
    let first = extract_entities(&doc);
    let second = extract_entities(&doc);
    assert_eq!(first, second);
}
