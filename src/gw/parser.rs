//! Block parser that assembles a [`Document`] from `.gw` text.
//!
//! The whole parse is one sequential scan: the input is pre-split into a
//! line array and an explicit cursor walks it, dispatching on the first
//! token of each non-blank line. Nested blocks (`fevt`, `beg`, note bodies)
//! are handled by helper loops that either consume their closing keyword or
//! close implicitly — legacy files are sometimes missing an `end` marker,
//! and reaching end of input inside a block is not an error.
//!
//! Error policy: individual dates, tags and name fields that fail their
//! sub-grammar degrade to raw text and the scan continues. Only an
//! unterminated brace literal or a `fam` opener with nothing behind it
//! aborts, because continuing would silently corrupt the tree.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::gw::date::{looks_like_date, parse_date};
use crate::gw::event::parse_event;
use crate::gw::lexer::{apply_inline_tags, decode_value, parse_segment, split_occurrence, tokenize};
use crate::gw::tags::TagContext;
use crate::model::{
    Document, Family, Note, PersonBlock, PersonSegment, RelationBlock, Sex, SourceKind, SourceLine,
};
use crate::util::split_lines;

/// Parse `.gw` text into a [`Document`].
pub fn parse(text: &str) -> Result<Document> {
    Parser::new(text).run()
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    /// Index of the next line to read. The 1-based number of the line just
    /// consumed is therefore equal to `pos`.
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            lines: split_lines(text),
            pos: 0,
        }
    }

    fn run(mut self) -> Result<Document> {
        let mut doc = Document::new();
        self.parse_header(&mut doc);

        while let Some(line) = self.next_content_line() {
            let line_no = self.pos;
            if let Some(rest) = keyword(line, "fam") {
                let family = self.parse_family(rest, line_no)?;
                doc.families.push(family);
            } else if let Some(rest) = keyword(line, "pevt") {
                let block = self.parse_person_events(rest, line_no)?;
                doc.people.push(block);
            } else if keyword(line, "notes-db").is_some() {
                doc.database_notes = Some(self.parse_raw_body("end notes-db"));
            } else if let Some(rest) = keyword(line, "notes") {
                let note = self.parse_note(rest, line_no)?;
                doc.notes.push(note);
            } else if let Some(rest) = keyword(line, "page-ext") {
                let name = rest.trim().to_string();
                let text = self.parse_raw_body("end page-ext");
                doc.pages.insert(name, text);
            } else if let Some(rest) = keyword(line, "rel") {
                doc.relations.push(self.parse_relation(rest));
            } else {
                warn!(line = line_no, "skipping unrecognized top-level line");
            }
        }

        Ok(doc)
    }

    // --- Cursor ---

    /// The next non-blank line, without consuming it. Blank lines before it
    /// are consumed; they carry no content at block level.
    fn peek_content_line(&mut self) -> Option<&'a str> {
        while self.pos < self.lines.len() && self.lines[self.pos].trim().is_empty() {
            self.pos += 1;
        }
        self.lines.get(self.pos).copied()
    }

    fn next_content_line(&mut self) -> Option<&'a str> {
        let line = self.peek_content_line()?;
        self.pos += 1;
        Some(line)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    // --- Header ---

    /// Optional leading lines before the first block: `encoding: <name>`
    /// and the `gwplus` format marker.
    fn parse_header(&mut self, doc: &mut Document) {
        while let Some(line) = self.peek_content_line() {
            let trimmed = line.trim();
            if let Some(rest) = trimmed.strip_prefix("encoding:") {
                doc.header.encoding = Some(rest.trim().to_string());
                self.advance();
            } else if trimmed == "gwplus" {
                doc.header.gwplus = true;
                self.advance();
            } else {
                break;
            }
        }
    }

    // --- Family blocks ---

    /// Header line: husband segment, `+` separator (the wedding date may be
    /// attached to it), optional `#mp`/`#ms` wedding tags, wife segment.
    fn parse_family(&mut self, header: &str, line_no: usize) -> Result<Family> {
        let tokens = tokenize(header, line_no)?;
        if tokens.is_empty() {
            return Err(Error::MalformedBlock {
                line: line_no,
                message: "family header has no content".to_string(),
            });
        }

        let mut family = Family::default();
        let mut pos = 0;
        family.husband = parse_segment(&tokens, &mut pos);

        if let Some(&token) = tokens.get(pos)
            && let Some(attached) = token.strip_prefix('+')
        {
            pos += 1;
            if !attached.is_empty() {
                family.wedding_date = Some(parse_date(attached));
            } else if let Some(&next) = tokens.get(pos)
                && looks_like_date(next)
            {
                family.wedding_date = Some(parse_date(next));
                pos += 1;
            }
        }

        loop {
            match tokens.get(pos) {
                Some(&"#mp") | Some(&"#p") => {
                    pos += 1;
                    if let Some(&value) = tokens.get(pos) {
                        family.wedding_place = Some(decode_value(value));
                        pos += 1;
                    }
                }
                Some(&"#ms") | Some(&"#s") => {
                    pos += 1;
                    if let Some(&value) = tokens.get(pos) {
                        family.wedding_source = Some(decode_value(value));
                        pos += 1;
                    }
                }
                _ => break,
            }
        }

        family.wife = parse_segment(&tokens, &mut pos);
        if pos < tokens.len() {
            debug!(line = line_no, "trailing tokens on family header ignored");
        }

        self.parse_family_body(&mut family)?;
        Ok(family)
    }

    /// Lines following a family header: `src`/`csrc` source lines, an
    /// optional `fevt` block, and an optional `beg ... end` children block,
    /// which closes the family. Any other line ends the family implicitly.
    fn parse_family_body(&mut self, family: &mut Family) -> Result<()> {
        while let Some(line) = self.peek_content_line() {
            if let Some(rest) = keyword(line, "src") {
                family.sources.push(SourceLine {
                    kind: SourceKind::Src,
                    text: rest.to_string(),
                });
                self.advance();
            } else if let Some(rest) = keyword(line, "csrc") {
                family.sources.push(SourceLine {
                    kind: SourceKind::Csrc,
                    text: rest.to_string(),
                });
                self.advance();
            } else if keyword(line, "fevt").is_some() {
                self.advance();
                self.parse_event_block(&mut family.events, "end fevt", TagContext::Family)?;
            } else if keyword(line, "beg").is_some() {
                self.advance();
                self.parse_children(family)?;
                return Ok(());
            } else {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Event lines until the closing keyword. A recognized block keyword
    /// closes the block implicitly (missing `end`), anything else that is
    /// not an event line is skipped.
    fn parse_event_block(
        &mut self,
        events: &mut Vec<crate::model::Event>,
        terminator: &str,
        context: TagContext,
    ) -> Result<()> {
        while let Some(line) = self.peek_content_line() {
            let trimmed = line.trim();
            if trimmed == terminator {
                self.advance();
                return Ok(());
            }
            if is_block_keyword(trimmed) {
                debug!(line = self.pos + 1, "event block closed implicitly");
                return Ok(());
            }
            self.advance();
            let line_no = self.pos;
            if trimmed.starts_with('#') {
                events.push(parse_event(trimmed, line_no, context)?);
            } else {
                warn!(line = line_no, "skipping non-event line in event block");
            }
        }
        Ok(())
    }

    /// Child lines (`- h SURNAME Given ...`) until `end`. A child line with
    /// a single name token names the given name only; the surname is
    /// inherited from the husband.
    fn parse_children(&mut self, family: &mut Family) -> Result<()> {
        while let Some(line) = self.peek_content_line() {
            let trimmed = line.trim();
            if trimmed == "end" {
                self.advance();
                return Ok(());
            }
            if let Some(rest) = trimmed.strip_prefix('-') {
                self.advance();
                let line_no = self.pos;
                let child = parse_child(rest, line_no, &family.husband)?;
                family.children.push(child);
            } else {
                debug!(line = self.pos + 1, "children block closed implicitly");
                return Ok(());
            }
        }
        Ok(())
    }

    // --- Person event blocks ---

    fn parse_person_events(&mut self, key_line: &str, line_no: usize) -> Result<PersonBlock> {
        let tokens = tokenize(key_line, line_no)?;
        let mut pos = 0;
        let key = parse_segment(&tokens, &mut pos);
        let mut block = PersonBlock {
            key,
            events: Vec::new(),
        };
        self.parse_event_block(&mut block.events, "end pevt", TagContext::Person)?;
        Ok(block)
    }

    // --- Raw text blocks ---

    fn parse_note(&mut self, key_line: &str, line_no: usize) -> Result<Note> {
        let tokens = tokenize(key_line, line_no)?;
        let mut pos = 0;
        let key = parse_segment(&tokens, &mut pos).key();

        // The body is conventionally opened by a `beg` line
        if self.peek_content_line().map(str::trim) == Some("beg") {
            self.advance();
        }

        Ok(Note {
            key,
            text: self.parse_raw_body("end notes"),
        })
    }

    fn parse_relation(&mut self, key_line: &str) -> RelationBlock {
        let mut block = RelationBlock {
            key_line: key_line.to_string(),
            lines: Vec::new(),
        };
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.advance();
            if line.trim() == "end rel" {
                break;
            }
            block.lines.push(line.to_string());
        }
        block
    }

    /// Collect raw lines verbatim (blank lines included) until the exact
    /// terminator or end of input. Keywords inside the body are body text:
    /// only the terminator closes a raw block.
    fn parse_raw_body(&mut self, terminator: &str) -> String {
        let mut body: Vec<&str> = Vec::new();
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            self.advance();
            if line.trim() == terminator {
                break;
            }
            body.push(line);
        }
        // Trailing blank lines are block separation, not content
        while body.last().is_some_and(|line| line.trim().is_empty()) {
            body.pop();
        }
        body.join("\n")
    }
}

fn parse_child(rest: &str, line_no: usize, husband: &PersonSegment) -> Result<PersonSegment> {
    let tokens = tokenize(rest, line_no)?;
    let mut pos = 0;

    let mut sex = Sex::Unknown;
    if let Some(&code) = tokens.first()
        && let Some(parsed) = Sex::from_code(code)
    {
        sex = parsed;
        pos = 1;
    }

    let name_tokens = tokens[pos..]
        .iter()
        .take_while(|token| !token.starts_with('#'))
        .count();

    let mut child = if name_tokens == 1 {
        let mut segment = PersonSegment::default();
        let (given, occurrence) = split_occurrence(tokens[pos]);
        segment.surname = husband.surname.clone();
        segment.given = decode_value(given);
        segment.occurrence = occurrence;
        pos += 1;
        apply_inline_tags(&mut segment, &tokens, &mut pos);
        segment
    } else {
        parse_segment(&tokens, &mut pos)
    };
    child.sex = sex;
    Ok(child)
}

/// Match a block keyword at the start of a line: the keyword alone, or the
/// keyword followed by whitespace. Returns the trimmed remainder.
fn keyword<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let trimmed = line.trim();
    if trimmed == kw {
        return Some("");
    }
    if let Some(rest) = trimmed.strip_prefix(kw)
        && rest.starts_with(char::is_whitespace)
    {
        return Some(rest.trim_start());
    }
    None
}

fn is_block_keyword(line: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "fam", "pevt", "fevt", "beg", "end", "notes", "notes-db", "page-ext", "rel", "src", "csrc",
    ];
    KEYWORDS.iter().any(|kw| keyword(line, kw).is_some())
}
