//! Parsing tests over the Capetian fixture.
//!
//! These exercise the block parser against a file that uses every block
//! type: families with sources, events and children, person-event blocks,
//! person notes, database notes and an extended page.

use arbre::{DateKind, Sex, parse, read_gw, write_gw};

const ROYAL_GW: &str = include_str!("fixtures/royal.gw");

#[test]
fn test_fixture_header() {
    let doc = parse(ROYAL_GW).unwrap();
    assert_eq!(doc.header.encoding.as_deref(), Some("utf-8"));
    assert!(doc.header.gwplus);
}

#[test]
fn test_fixture_structure() {
    let doc = parse(ROYAL_GW).unwrap();
    assert_eq!(doc.families.len(), 2);
    assert_eq!(doc.people.len(), 2);
    assert_eq!(doc.notes.len(), 1);
    assert_eq!(doc.pages.len(), 1);
    assert!(doc.database_notes.is_some());
    assert_eq!(doc.event_count(), 7);
}

#[test]
fn test_first_family() {
    let doc = parse(ROYAL_GW).unwrap();
    let family = &doc.families[0];

    assert_eq!(family.husband.surname, "CAPET");
    assert_eq!(family.husband.given, "Hugues");
    assert_eq!(family.wife.given, "Adelaide");
    assert_eq!(family.wedding_place.as_deref(), Some("Paris"));

    // The wedding date is a free-text literal
    let date = family.wedding_date.as_ref().unwrap();
    assert_eq!(date.kind, DateKind::Literal("vers 968".to_string()));
    assert_eq!(date.raw, "0(vers_968)");

    assert_eq!(family.sources.len(), 1);
    assert_eq!(family.sources[0].text, "chronicle of Richer");

    assert_eq!(family.events.len(), 1);
    assert_eq!(family.events[0].tag, "marr");

    assert_eq!(family.children.len(), 2);
    let robert = &family.children[0];
    assert_eq!(robert.given, "Robert");
    assert_eq!(robert.occurrence, 1);
    assert_eq!(robert.sex, Sex::Male);
    assert_eq!(robert.birth_place.as_deref(), Some("Orleans"));
    assert_eq!(family.children[1].sex, Sex::Female);
}

#[test]
fn test_second_family_links_to_same_person() {
    let doc = parse(ROYAL_GW).unwrap();
    let family = &doc.families[1];
    // Robert.1 is a child of family 1 and the husband of family 2
    assert_eq!(family.husband.key(), doc.families[0].children[0].key());
    assert_eq!(family.wife.surname, "DE PROVENCE");
}

#[test]
fn test_person_events() {
    let doc = parse(ROYAL_GW).unwrap();
    let robert = &doc.people[0];
    assert_eq!(robert.key.occurrence, 1);
    assert_eq!(robert.events.len(), 3);
    assert_eq!(robert.events[0].tag, "birt");
    assert_eq!(robert.events[1].place.as_deref(), Some("Melun"));

    // Unknown tag survives with its raw text
    assert_eq!(robert.events[2].tag, "crowned");
    assert_eq!(robert.events[2].raw, "#crowned 987 #p Noyon");

    let hedwige = &doc.people[1];
    assert!(matches!(
        hedwige.events[0].date.as_ref().unwrap().kind,
        DateKind::Qualified(_, _)
    ));
    assert!(matches!(
        hedwige.events[1].date.as_ref().unwrap().kind,
        DateKind::Alternatives(_)
    ));
    assert!(matches!(
        hedwige.events[2].date.as_ref().unwrap().kind,
        DateKind::Qualified(_, _)
    ));
}

#[test]
fn test_raw_text_blocks() {
    let doc = parse(ROYAL_GW).unwrap();
    assert_eq!(
        doc.notes[0].text,
        "Known as Robert the Pious.\nCrowned co-king during his father's lifetime."
    );
    assert_eq!(doc.database_notes.as_deref(), Some("Capetian test base."));
    assert_eq!(
        doc.pages.get("sources/chronicles").map(String::as_str),
        Some("Richer of Reims, Historiae.")
    );
}

#[test]
fn test_file_io_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("royal.gw");
    std::fs::write(&path, ROYAL_GW).unwrap();

    let doc = read_gw(&path).unwrap();
    assert_eq!(doc.families.len(), 2);

    let copy = dir.path().join("copy.gw");
    write_gw(&doc, &copy).unwrap();
    assert_eq!(read_gw(&copy).unwrap(), doc);
}

#[test]
fn test_latin1_file_decodes_via_header_hint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.gw");

    // "DESGRÉES" in ISO-8859-1; the header declares the encoding
    let mut bytes = b"encoding: iso-8859-1\nfam DESGR\xC9ES Jean + DURAND Marie\n".to_vec();
    bytes.push(b'\n');
    std::fs::write(&path, bytes).unwrap();

    let doc = read_gw(&path).unwrap();
    assert_eq!(doc.families[0].husband.surname, "DESGRÉES");
}
