//! Serializer producing `.gw` text from a [`Document`].
//!
//! One sub-serializer per block type, composed by [`GwWriter::write_document`],
//! which fixes the cross-block order. Emission uses the same tag vocabulary
//! the parser recognizes (see [`crate::gw::tags`]); fields without a value
//! are omitted rather than written empty, and raw fields captured during
//! parsing are written back verbatim to keep diffs quiet.

use crate::gw::lexer::encode_value;
use crate::model::{
    Document, Event, Family, Header, Note, PersonBlock, PersonKey, PersonSegment, RelationBlock,
    Sex,
};

/// Configuration for `.gw` output.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Separate top-level blocks with a blank line.
    pub blank_line_between_blocks: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            blank_line_between_blocks: true,
        }
    }
}

/// Writer for `.gw` output.
#[derive(Debug, Clone, Default)]
pub struct GwWriter {
    config: WriterConfig,
}

impl GwWriter {
    /// Create a writer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with the specified configuration.
    pub fn with_config(config: WriterConfig) -> Self {
        GwWriter { config }
    }

    /// Serialize a document. Cross-block order is fixed: families,
    /// person-event blocks, relations, database notes, person notes,
    /// extended pages.
    pub fn write_document(&self, doc: &Document) -> String {
        let mut out = String::new();

        if write_file_header(&mut out, &doc.header) {
            self.block_gap(&mut out);
        }
        for family in &doc.families {
            write_family(&mut out, family);
            self.block_gap(&mut out);
        }
        for block in &doc.people {
            write_person_block(&mut out, block);
            self.block_gap(&mut out);
        }
        for relation in &doc.relations {
            write_relation(&mut out, relation);
            self.block_gap(&mut out);
        }
        if let Some(text) = &doc.database_notes {
            write_database_notes(&mut out, text);
            self.block_gap(&mut out);
        }
        for note in &doc.notes {
            write_note(&mut out, note);
            self.block_gap(&mut out);
        }
        for (name, text) in &doc.pages {
            write_page(&mut out, name, text);
            self.block_gap(&mut out);
        }

        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    fn block_gap(&self, out: &mut String) {
        if self.config.blank_line_between_blocks && !out.is_empty() {
            out.push('\n');
        }
    }
}

// ============================================================================
// Sub-serializers, one per block type
// ============================================================================

fn write_file_header(out: &mut String, header: &Header) -> bool {
    let mut wrote = false;
    if let Some(encoding) = &header.encoding {
        out.push_str("encoding: ");
        out.push_str(encoding);
        out.push('\n');
        wrote = true;
    }
    if header.gwplus {
        out.push_str("gwplus\n");
        wrote = true;
    }
    wrote
}

fn write_family(out: &mut String, family: &Family) {
    out.push_str("fam ");
    out.push_str(&segment_to_gw(&family.husband, true));
    out.push_str(" +");
    if let Some(date) = &family.wedding_date {
        out.push_str(&date.to_gw());
    }
    if let Some(place) = nonempty(&family.wedding_place) {
        out.push_str(" #mp ");
        out.push_str(&encode_value(place));
    }
    if let Some(source) = nonempty(&family.wedding_source) {
        out.push_str(" #ms ");
        out.push_str(&encode_value(source));
    }
    out.push(' ');
    out.push_str(&segment_to_gw(&family.wife, true));
    out.push('\n');

    for line in &family.sources {
        out.push_str(line.kind.keyword());
        out.push(' ');
        out.push_str(&line.text);
        out.push('\n');
    }

    if !family.events.is_empty() {
        out.push_str("fevt\n");
        for event in &family.events {
            write_event(out, event);
        }
        out.push_str("end fevt\n");
    }

    if !family.children.is_empty() {
        out.push_str("beg\n");
        for child in &family.children {
            out.push_str("- ");
            out.push_str(child.sex.code());
            out.push(' ');
            out.push_str(&segment_to_gw(child, false));
            out.push('\n');
        }
        out.push_str("end\n");
    }
}

fn write_event(out: &mut String, event: &Event) {
    // The raw line captured at parse time is authoritative
    if !event.raw.is_empty() {
        out.push_str(&event.raw);
        out.push('\n');
        return;
    }

    out.push('#');
    out.push_str(&event.tag);
    if let Some(date) = &event.date {
        out.push(' ');
        out.push_str(&date.to_gw());
    }
    if let Some(note) = nonempty(&event.note) {
        out.push(' ');
        out.push_str(note);
    }
    if let Some(place) = nonempty(&event.place) {
        out.push_str(" #p ");
        out.push_str(place);
    }
    if let Some(source) = nonempty(&event.source) {
        out.push_str(" #s ");
        out.push_str(source);
    }
    out.push('\n');
}

fn write_person_block(out: &mut String, block: &PersonBlock) {
    out.push_str("pevt ");
    out.push_str(&key_to_gw(&block.key.key()));
    out.push('\n');
    for event in &block.events {
        write_event(out, event);
    }
    out.push_str("end pevt\n");
}

fn write_note(out: &mut String, note: &Note) {
    out.push_str("notes ");
    out.push_str(&key_to_gw(&note.key));
    out.push_str("\nbeg\n");
    if !note.text.is_empty() {
        out.push_str(&note.text);
        out.push('\n');
    }
    out.push_str("end notes\n");
}

fn write_relation(out: &mut String, relation: &RelationBlock) {
    out.push_str("rel ");
    out.push_str(&relation.key_line);
    out.push('\n');
    for line in &relation.lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("end rel\n");
}

fn write_database_notes(out: &mut String, text: &str) {
    out.push_str("notes-db\n");
    if !text.is_empty() {
        out.push_str(text);
        out.push('\n');
    }
    out.push_str("end notes-db\n");
}

fn write_page(out: &mut String, name: &str, text: &str) {
    out.push_str("page-ext ");
    out.push_str(name);
    out.push('\n');
    if !text.is_empty() {
        out.push_str(text);
        out.push('\n');
    }
    out.push_str("end page-ext\n");
}

// ============================================================================
// Segments and keys
// ============================================================================

/// Render a segment: name tokens, then the inline tags that have values.
/// `include_sex` is false for children, whose sex code is carried by the
/// child line itself.
fn segment_to_gw(segment: &PersonSegment, include_sex: bool) -> String {
    let mut s = String::new();
    s.push_str(&name_token(&segment.surname));
    s.push(' ');
    s.push_str(&name_token(&segment.given));
    if segment.occurrence != 0 {
        s.push('.');
        s.push_str(&segment.occurrence.to_string());
    }
    if include_sex && segment.sex != Sex::Unknown {
        s.push_str(" #sex ");
        s.push_str(segment.sex.code());
    }
    if let Some(date) = &segment.birth_date {
        s.push_str(" #bd ");
        s.push_str(&date.to_gw());
    }
    if let Some(place) = nonempty(&segment.birth_place) {
        s.push_str(" #bp ");
        s.push_str(&encode_value(place));
    }
    if let Some(date) = &segment.death_date {
        s.push_str(" #dd ");
        s.push_str(&date.to_gw());
    }
    if let Some(place) = nonempty(&segment.death_place) {
        s.push_str(" #dp ");
        s.push_str(&encode_value(place));
    }
    if let Some(occupation) = nonempty(&segment.occupation) {
        s.push_str(" #occu ");
        s.push_str(&encode_value(occupation));
    }
    if let Some(source) = nonempty(&segment.source) {
        s.push_str(" #src ");
        s.push_str(&encode_value(source));
    }
    s
}

fn key_to_gw(key: &PersonKey) -> String {
    let mut s = String::new();
    s.push_str(&name_token(&key.surname));
    s.push(' ');
    s.push_str(&name_token(&key.given));
    if key.occurrence != 0 {
        s.push('.');
        s.push_str(&key.occurrence.to_string());
    }
    s
}

/// A name as a single token; an absent name becomes the `?` placeholder so
/// the line stays parseable.
fn name_token(name: &str) -> String {
    if name.is_empty() {
        "?".to_string()
    } else {
        encode_value(name)
    }
}

fn nonempty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
