//! The `.gw` text format: grammar, block parser and writer.
//!
//! `parse` and `serialize` are pure functions over in-memory text; file
//! reading and writing stay with the caller (see the crate-level
//! `read_gw`/`write_gw` conveniences).

pub mod date;
pub mod event;
pub mod lexer;
pub mod parser;
pub mod tags;
pub mod writer;

pub use parser::parse;
pub use writer::{GwWriter, WriterConfig};

use crate::entities::EntitySet;
use crate::error::Result;
use crate::model::Document;

/// Serialize a document with the default configuration.
pub fn serialize(doc: &Document) -> String {
    GwWriter::new().write_document(doc)
}

/// Serialize a flat entity set: normalize it back into a document, then
/// write that. Fails when the set references ids it does not contain.
pub fn serialize_entities(set: &EntitySet) -> Result<String> {
    Ok(GwWriter::new().write_document(&set.to_document()?))
}
