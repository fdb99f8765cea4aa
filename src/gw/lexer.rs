//! Line tokenizer and person-segment parsing.
//!
//! Lines are split into whitespace-separated tokens, except that a
//! `{...}` span is one opaque token even when it contains spaces. Multi-word
//! values outside braces encode their spaces as underscores, so decoding and
//! encoding of single-token values also lives here.

use memchr::memchr;

use crate::error::{Error, Result};
use crate::gw::date::parse_date;
use crate::model::{PersonSegment, Sex};

/// Split a line into tokens. `line_no` is only used for error reporting.
///
/// An opening brace with no closing brace on the same line is a structural
/// error: the literal would swallow everything that follows.
pub fn tokenize(line: &str, line_no: usize) -> Result<Vec<&str>> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
        } else if bytes[i] == b'{' {
            match memchr(b'}', &bytes[i..]) {
                Some(offset) => {
                    tokens.push(&line[i..=i + offset]);
                    i += offset + 1;
                }
                None => return Err(Error::UnterminatedBrace { line: line_no }),
            }
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            tokens.push(&line[start..i]);
        }
    }

    Ok(tokens)
}

/// Decode a single-token value: strip `{...}` quoting, or turn underscores
/// into spaces.
pub fn decode_value(token: &str) -> String {
    if let Some(inner) = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        inner.to_string()
    } else {
        token.replace('_', " ")
    }
}

/// Encode a value as a single token: spaces become underscores.
pub fn encode_value(value: &str) -> String {
    value.replace(' ', "_")
}

/// Split a trailing `.N` occurrence suffix off a given-name token.
/// Malformed suffixes leave the token intact with occurrence 0.
pub fn split_occurrence(token: &str) -> (&str, u32) {
    if let Some((name, digits)) = token.rsplit_once('.')
        && !name.is_empty()
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
    {
        return (name, digits.parse().unwrap_or(0));
    }
    (token, 0)
}

/// Parse one person segment starting at `*pos`: a surname token, a given-name
/// token with optional occurrence suffix, then inline tags. Advances past
/// everything consumed; stops at `+`, at an unrecognized token, or at the end
/// of the token list.
pub fn parse_segment(tokens: &[&str], pos: &mut usize) -> PersonSegment {
    let mut segment = PersonSegment::default();

    if let Some(&token) = tokens.get(*pos)
        && token != "+"
        && !token.starts_with('#')
    {
        segment.surname = decode_value(token);
        *pos += 1;
    }

    if let Some(&token) = tokens.get(*pos)
        && token != "+"
        && !token.starts_with('#')
        && !token.starts_with('+')
    {
        let (given, occurrence) = split_occurrence(token);
        segment.given = decode_value(given);
        segment.occurrence = occurrence;
        *pos += 1;
    }

    apply_inline_tags(&mut segment, tokens, pos);
    segment
}

/// Consume the inline tags a segment may carry (`#sex`, `#bd`, `#bp`, `#dd`,
/// `#dp`, `#occu`, `#src`). Stops at the first token that is not one of them.
/// A tag missing its argument is dropped silently; the enclosing parse
/// continues.
pub fn apply_inline_tags(segment: &mut PersonSegment, tokens: &[&str], pos: &mut usize) {
    while let Some(&token) = tokens.get(*pos) {
        let arg = tokens.get(*pos + 1).copied();
        let consumed = match token {
            "#sex" => {
                if let Some(code) = arg.and_then(Sex::from_code) {
                    segment.sex = code;
                    true
                } else {
                    false
                }
            }
            "#bd" => set_date(&mut segment.birth_date, arg),
            "#bp" => set_text(&mut segment.birth_place, arg),
            "#dd" => set_date(&mut segment.death_date, arg),
            "#dp" => set_text(&mut segment.death_place, arg),
            "#occu" => set_text(&mut segment.occupation, arg),
            "#src" => set_text(&mut segment.source, arg),
            _ => break,
        };
        if consumed {
            *pos += 2;
        } else {
            // Tag without a usable argument: skip the tag alone
            *pos += 1;
        }
    }
}

fn set_date(slot: &mut Option<crate::gw::date::Date>, arg: Option<&str>) -> bool {
    match arg {
        Some(token) => {
            *slot = Some(parse_date(token));
            true
        }
        None => false,
    }
}

fn set_text(slot: &mut Option<String>, arg: Option<&str>) -> bool {
    match arg {
        Some(token) => {
            *slot = Some(decode_value(token));
            true
        }
        None => false,
    }
}
