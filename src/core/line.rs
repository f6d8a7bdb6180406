// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Source line parser.
//!
//! Splits a raw line into label, mnemonic, and operand fields. The parser
//! is total: it never fails, and unknown mnemonics are reported by Pass 1.

use crate::core::text_utils::{is_space, split_fields};

/// A parsed source line.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub line_num: u32,
    /// Original text, kept verbatim for the listing.
    pub text: String,
    pub body: LineBody,
}

#[derive(Debug, Clone)]
pub enum LineBody {
    /// Blank line or `.` comment; also used for retained macro-definition
    /// lines so the listing can show them without an address.
    Comment,
    Statement(Statement),
}

/// The label/mnemonic/operand fields of a statement.
#[derive(Debug, Clone)]
pub struct Statement {
    pub label: Option<String>,
    pub mnemonic: String,
    pub operand: Option<String>,
    /// Set when the mnemonic carried the `+` extended-format prefix.
    pub extended: bool,
}

impl SourceLine {
    pub fn comment(line_num: u32, text: &str) -> Self {
        Self {
            line_num,
            text: text.to_string(),
            body: LineBody::Comment,
        }
    }

    #[must_use]
    pub fn statement(&self) -> Option<&Statement> {
        match &self.body {
            LineBody::Statement(stmt) => Some(stmt),
            LineBody::Comment => None,
        }
    }
}

impl Statement {
    pub fn new(label: Option<&str>, mnemonic: &str, operand: Option<&str>) -> Self {
        let (mnemonic, extended) = match mnemonic.strip_prefix('+') {
            Some(rest) => (rest.to_string(), true),
            None => (mnemonic.to_string(), false),
        };
        Self {
            label: label.map(str::to_string),
            mnemonic,
            operand: operand.map(str::to_string),
            extended,
        }
    }

    /// Reassemble the fields into listing-friendly source text.
    pub fn render(&self) -> String {
        let label = self.label.as_deref().unwrap_or("");
        let prefix = if self.extended { "+" } else { "" };
        match &self.operand {
            Some(operand) => format!("{label:<9}{prefix}{:<7}{operand}", self.mnemonic),
            None => format!("{label:<9}{prefix}{}", self.mnemonic),
        }
    }
}

/// Parse one raw source line.
///
/// A label is present when column 0 holds a non-whitespace character.
/// Fields past the operand are a trailing comment and are dropped; quoted
/// `C'…'`/`X'…'` bodies keep their embedded blanks.
pub fn parse_line(text: &str, line_num: u32) -> SourceLine {
    let trimmed = text.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('.') {
        return SourceLine::comment(line_num, text);
    }

    let has_label = !is_space(text.as_bytes()[0]);
    let fields = split_fields(text);

    let stmt = if fields.len() == 1 {
        // A lone field is a mnemonic (RSUB, LTORG) regardless of column.
        Statement::new(None, &fields[0], None)
    } else if has_label {
        Statement::new(
            Some(&fields[0]),
            &fields[1],
            fields.get(2).map(String::as_str),
        )
    } else {
        Statement::new(None, &fields[0], fields.get(1).map(String::as_str))
    };

    SourceLine {
        line_num,
        text: text.to_string(),
        body: LineBody::Statement(stmt),
    }
}

/// Parse a whole source file into lines, numbering from 1.
pub fn parse_source(source: &str) -> Vec<SourceLine> {
    source
        .lines()
        .enumerate()
        .map(|(idx, text)| parse_line(text, idx as u32 + 1))
        .collect()
}
