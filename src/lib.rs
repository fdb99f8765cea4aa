//! # arbre
//!
//! A fast, lightweight library for reading and writing GeneWeb `.gw`
//! genealogy files.
//!
//! ## Features
//!
//! - Parse `.gw` text into a typed [`Document`] tree
//! - Flatten a document into relational person/family/child/event records
//! - Serialize documents or entity sets back to valid `.gw` text
//! - Semantic round-trip guarantee: what is parsed is what is written
//!
//! ## Quick Start
//!
//! ```
//! use arbre::{extract_entities, parse, serialize};
//!
//! let text = "fam DUPONT Jean + DURAND Marie\nbeg\n- h DUPONT Paul\nend\n";
//! let doc = parse(text).unwrap();
//!
//! let entities = extract_entities(&doc);
//! assert_eq!(entities.persons.len(), 3);
//! assert_eq!(entities.families.len(), 1);
//!
//! let out = serialize(&doc);
//! assert_eq!(parse(&out).unwrap(), doc);
//! ```
//!
//! ## Error handling
//!
//! Parsing is deliberately forgiving: odd dates, unknown event tags and
//! malformed occurrence suffixes degrade to raw text inside the document.
//! Only structural damage (an unterminated `{...}` literal, an empty `fam`
//! header) surfaces as an [`Error`], as do entity sets handed to the
//! serializer with dangling id references.

pub mod entities;
pub mod error;
pub mod gw;
pub mod model;
pub(crate) mod util;

pub use entities::{
    ChildLink, EntitySet, EventEntity, EventId, EventOwner, FamilyEntity, FamilyId, PersonEntity,
    PersonId, extract_entities,
};
pub use error::{Error, Result};
pub use gw::date::{Calendar, Date, DateKind, DateValue, Qualifier, parse_date};
pub use gw::{GwWriter, WriterConfig, parse, serialize, serialize_entities};
pub use model::{Document, Event, Family, Note, PersonBlock, PersonKey, PersonSegment, Sex};

use std::path::Path;

/// Read and parse a `.gw` file, honoring its declared encoding.
pub fn read_gw<P: AsRef<Path>>(path: P) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    let hint = util::extract_gw_encoding(&bytes);
    let text = util::decode_text(&bytes, hint);
    parse(&text)
}

/// Serialize a document and write it to a file as UTF-8.
pub fn write_gw<P: AsRef<Path>>(doc: &Document, path: P) -> Result<()> {
    std::fs::write(path, serialize(doc))?;
    Ok(())
}
