//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Booking feeds only need the property name, a few parameters (`VALUE`,
//! `TZID`, `CN`) and the raw value, so a line is read up to its first
//! unquoted colon and the rest is kept verbatim.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{ContentLine, Parameter};

/// Splits a feed body into unfolded content lines, numbered from 1.
///
/// CRLF and bare LF are both accepted. A line starting with a space or tab
/// continues the previous one, minus that first character. Blank lines are
/// dropped.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (number, raw) in (1..).zip(input.split('\n')) {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let Some(first) = raw.chars().next() else {
            continue;
        };
        let folded = matches!(first, ' ' | '\t');

        match lines.last_mut() {
            Some((_, open)) if folded => open.push_str(&raw[1..]),
            _ if folded => lines.push((number, raw[1..].to_string())),
            _ => lines.push((number, raw.to_string())),
        }
    }

    lines
}

/// Read position inside one unfolded line.
struct Cursor<'a> {
    line: &'a str,
    pos: usize,
    line_num: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.line[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line_num, self.pos + 1)
    }

    /// Property or parameter name: ASCII letters, digits and `-`.
    fn name(&mut self) -> &'a str {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            self.pos += 1;
        }
        &self.line[start..self.pos]
    }

    /// `name "=" value *("," value)`, positioned after the `;`.
    fn parameter(&mut self) -> ParseResult<Parameter> {
        let name = self.name();
        if name.is_empty() || self.peek() != Some('=') {
            return Err(self.error(ParseErrorKind::InvalidParameter));
        }
        self.pos += 1;

        let mut values = vec![self.param_value()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            values.push(self.param_value()?);
        }
        Ok(Parameter::with_values(name.to_ascii_uppercase(), values))
    }

    fn param_value(&mut self) -> ParseResult<String> {
        if self.peek() != Some('"') {
            let start = self.pos;
            while self.peek().is_some_and(|c| !matches!(c, ',' | ';' | ':')) {
                self.bump();
            }
            return Ok(self.line[start..self.pos].to_string());
        }

        let open = self.pos;
        self.pos += 1;
        let mut value = String::new();
        while let Some(c) = self.bump() {
            match c {
                '"' => return Ok(value),
                '^' => value.push(self.caret_escape()),
                other => value.push(other),
            }
        }
        Err(ParseError::new(
            ParseErrorKind::UnclosedQuote,
            self.line_num,
            open + 1,
        ))
    }

    /// RFC 6868 escapes inside quoted values; a caret before anything else
    /// is literal.
    fn caret_escape(&mut self) -> char {
        let decoded = match self.peek() {
            Some('^') => '^',
            Some('n') => '\n',
            Some('\'') => '"',
            _ => return '^',
        };
        self.pos += 1;
        decoded
    }
}

/// Parses one unfolded content line: `name *(";" param) ":" value`.
///
/// ## Errors
/// Returns a positioned error for a missing or invalid name, a malformed
/// parameter, an unterminated quote or a missing colon.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut cursor = Cursor {
        line,
        pos: 0,
        line_num,
    };

    let name = cursor.name();
    if name.is_empty() {
        let kind = match cursor.peek() {
            Some(';' | ':') => ParseErrorKind::MissingPropertyName,
            Some(_) => ParseErrorKind::InvalidPropertyName,
            None => ParseErrorKind::MissingColon,
        };
        return Err(cursor.error(kind));
    }

    let mut params = Vec::new();
    loop {
        match cursor.peek() {
            Some(':') => break,
            Some(';') => {
                cursor.pos += 1;
                params.push(cursor.parameter()?);
            }
            Some(c) => {
                let kind = if params.is_empty() {
                    ParseErrorKind::InvalidPropertyName
                } else {
                    ParseErrorKind::InvalidParameter
                };
                return Err(cursor
                    .error(kind)
                    .with_context(format!("unexpected character '{c}'")));
            }
            None => return Err(cursor.error(ParseErrorKind::MissingColon)),
        }
    }

    Ok(ContentLine {
        name: name.to_ascii_uppercase(),
        params,
        raw_value: line[cursor.pos + 1..].to_string(),
    })
}
