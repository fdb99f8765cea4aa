//! Date grammar for `.gw` date tokens.
//!
//! A date is a single whitespace-delimited token: `1850`, `<1849`, `~1750`,
//! `1850..1860`, `1850|1851`, or the free-text wrapper `0(5_Mai_1990)`.
//! Parsing is total: anything that does not match the grammar degrades to a
//! [`DateKind::Literal`] carrying the raw text, so an odd date never aborts
//! the enclosing parse. The original token is always kept in [`Date::raw`]
//! and is emitted verbatim on output.

use std::fmt;

/// Calendar system a date value was recorded in.
///
/// Encoded on the wire as a single-letter suffix on the value
/// (`1850J` = 1850 in the Julian calendar). Gregorian is the default and
/// carries no suffix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Calendar {
    #[default]
    Gregorian,
    Julian,
    FrenchRepublican,
    Hebrew,
}

impl Calendar {
    fn from_suffix(c: char) -> Option<Calendar> {
        match c {
            'G' => Some(Calendar::Gregorian),
            'J' => Some(Calendar::Julian),
            'F' => Some(Calendar::FrenchRepublican),
            'H' => Some(Calendar::Hebrew),
            _ => None,
        }
    }

    /// The wire suffix, or `None` for the Gregorian default.
    pub fn suffix(self) -> Option<char> {
        match self {
            Calendar::Gregorian => None,
            Calendar::Julian => Some('J'),
            Calendar::FrenchRepublican => Some('F'),
            Calendar::Hebrew => Some('H'),
        }
    }
}

/// Qualifier attached to an inexact date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    /// `<` — before the value
    Before,
    /// `>` — after the value
    After,
    /// `~` — approximately the value
    About,
    /// `?` — uncertain
    Maybe,
}

impl Qualifier {
    fn from_prefix(c: char) -> Option<Qualifier> {
        match c {
            '<' => Some(Qualifier::Before),
            '>' => Some(Qualifier::After),
            '~' => Some(Qualifier::About),
            '?' => Some(Qualifier::Maybe),
            _ => None,
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Qualifier::Before => '<',
            Qualifier::After => '>',
            Qualifier::About => '~',
            Qualifier::Maybe => '?',
        }
    }
}

/// One date value with its calendar system. The text is kept opaque
/// (`1850`, `25/11/1850`, ...); only the calendar suffix is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    pub text: String,
    pub calendar: Calendar,
}

impl DateValue {
    fn to_gw(&self) -> String {
        match self.calendar.suffix() {
            Some(suffix) => format!("{}{}", self.text, suffix),
            None => self.text.clone(),
        }
    }
}

/// The interpreted form of a date token. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateKind {
    Exact(DateValue),
    Qualified(Qualifier, DateValue),
    Range(DateValue, DateValue),
    Alternatives(Vec<DateValue>),
    Literal(String),
}

impl DateKind {
    /// Reconstruct the wire token for this interpretation.
    pub fn to_gw(&self) -> String {
        match self {
            DateKind::Exact(value) => value.to_gw(),
            DateKind::Qualified(qualifier, value) => {
                format!("{}{}", qualifier.prefix(), value.to_gw())
            }
            DateKind::Range(low, high) => format!("{}..{}", low.to_gw(), high.to_gw()),
            DateKind::Alternatives(values) => values
                .iter()
                .map(DateValue::to_gw)
                .collect::<Vec<_>>()
                .join("|"),
            DateKind::Literal(text) => format!("0({})", text.replace(' ', "_")),
        }
    }
}

/// A parsed date: the interpretation plus the untouched input token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Date {
    /// Original token text, kept so output can reproduce it verbatim.
    pub raw: String,
    pub kind: DateKind,
}

impl Date {
    /// Build a date from an interpretation alone (no source token).
    pub fn from_kind(kind: DateKind) -> Date {
        Date {
            raw: String::new(),
            kind,
        }
    }

    /// The wire token for this date. The raw token, when present, is
    /// authoritative; the interpretation is only re-rendered for dates
    /// constructed programmatically.
    pub fn to_gw(&self) -> String {
        if !self.raw.is_empty() {
            return self.raw.clone();
        }
        self.kind.to_gw()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_gw())
    }
}

/// Parse a single date token. Total: never fails, never panics.
pub fn parse_date(token: &str) -> Date {
    Date {
        raw: token.to_string(),
        kind: classify(token),
    }
}

/// Whether a token sits in date position. Date tokens start with a
/// qualifier or a digit (the `0(...)` wrapper starts with a digit too);
/// anything else is a name or free text.
pub(crate) fn looks_like_date(token: &str) -> bool {
    match token.chars().next() {
        Some(c) => Qualifier::from_prefix(c).is_some() || c.is_ascii_digit(),
        None => false,
    }
}

fn classify(token: &str) -> DateKind {
    if token.is_empty() {
        return DateKind::Literal(String::new());
    }

    // Free-text wrapper: 0(...) with underscores standing in for spaces
    if let Some(inner) = token.strip_prefix("0(") {
        return match inner.strip_suffix(')') {
            Some(text) => DateKind::Literal(text.replace('_', " ")),
            // Unclosed wrapper: keep the whole token as literal text
            None => DateKind::Literal(token.to_string()),
        };
    }

    let first = token.chars().next().unwrap();
    if let Some(qualifier) = Qualifier::from_prefix(first) {
        let rest = &token[first.len_utf8()..];
        if rest.is_empty() {
            return DateKind::Literal(token.to_string());
        }
        return DateKind::Qualified(qualifier, parse_value(rest));
    }

    if let Some((low, high)) = token.split_once("..") {
        if low.is_empty() || high.is_empty() {
            return DateKind::Literal(token.to_string());
        }
        return DateKind::Range(parse_value(low), parse_value(high));
    }

    if token.contains('|') {
        let values: Vec<DateValue> = token
            .split('|')
            .filter(|part| !part.is_empty())
            .map(parse_value)
            .collect();
        if values.len() >= 2 {
            return DateKind::Alternatives(values);
        }
        return DateKind::Literal(token.to_string());
    }

    DateKind::Exact(parse_value(token))
}

/// Split a trailing calendar suffix off a value. The suffix is only
/// recognized directly after a digit, so `5_Mai` is not read as Hebrew.
fn parse_value(text: &str) -> DateValue {
    let bytes = text.as_bytes();
    if bytes.len() >= 2
        && bytes[bytes.len() - 2].is_ascii_digit()
        && let Some(calendar) = Calendar::from_suffix(bytes[bytes.len() - 1] as char)
    {
        return DateValue {
            text: text[..text.len() - 1].to_string(),
            calendar,
        };
    }
    DateValue {
        text: text.to_string(),
        calendar: Calendar::Gregorian,
    }
}
