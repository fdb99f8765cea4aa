//! Error types for arbre operations.

use thiserror::Error;

/// Errors that can occur while parsing or serializing `.gw` files.
///
/// Malformed dates, tags and name fields never surface here: they degrade to
/// raw/literal representations inside the document. Only structural damage
/// (a brace literal that never closes, a block opener with nothing to parse)
/// and serialization-contract violations are reported.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: unterminated brace literal")]
    UnterminatedBrace { line: usize },

    #[error("line {line}: malformed block: {message}")]
    MalformedBlock { line: usize, message: String },

    #[error("entity set references unknown person id {0}")]
    UnknownPerson(u32),

    #[error("entity set references unknown family id {0}")]
    UnknownFamily(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
