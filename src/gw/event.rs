//! Event-line grammar.
//!
//! One event line is `#tag [date] [note...] [#p place...] [#s source...]`.
//! The tag is resolved against the context's table from [`crate::gw::tags`];
//! an unknown tag is kept as raw text rather than rejected. The original
//! line is always retained on the event.

use tracing::debug;

use crate::error::Result;
use crate::gw::date::{looks_like_date, parse_date};
use crate::gw::lexer::tokenize;
use crate::gw::tags::TagContext;
use crate::model::Event;

/// Parse one event line. Fails only on structural tokenizer errors; every
/// grammar-level oddity degrades into the raw-preserving fields.
pub fn parse_event(line: &str, line_no: usize, context: TagContext) -> Result<Event> {
    let tokens = tokenize(line, line_no)?;

    let mut event = Event {
        raw: line.to_string(),
        ..Default::default()
    };

    let Some(&first) = tokens.first() else {
        return Ok(event);
    };
    event.tag = first.trim_start_matches('#').to_string();

    let mut pos = 1;

    // Optional date directly after the tag
    if let Some(&token) = tokens.get(pos)
        && looks_like_date(token)
    {
        event.date = Some(parse_date(token));
        pos += 1;
    }

    let mut note_parts: Vec<&str> = Vec::new();
    while pos < tokens.len() {
        match tokens[pos] {
            "#p" => {
                pos += 1;
                event.place = Some(collect_until_tag(&tokens, &mut pos));
            }
            "#s" => {
                pos += 1;
                event.source = Some(collect_until_tag(&tokens, &mut pos));
            }
            token => {
                note_parts.push(token);
                pos += 1;
            }
        }
    }
    if !note_parts.is_empty() {
        event.note = Some(note_parts.join(" "));
    }

    if context.name_of(&event.tag).is_none() {
        debug!(line = line_no, tag = %event.tag, "unknown event tag kept as raw text");
    }

    Ok(event)
}

/// Collect tokens until the next `#`-prefixed token (or end of line),
/// joined with single spaces and with underscore coding decoded.
fn collect_until_tag(tokens: &[&str], pos: &mut usize) -> String {
    let mut parts = Vec::new();
    while let Some(&token) = tokens.get(*pos) {
        if token.starts_with('#') {
            break;
        }
        parts.push(crate::gw::lexer::decode_value(token));
        *pos += 1;
    }
    parts.join(" ")
}
