// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Object program records and the record writer.
//!
//! One record per line; the record type is the first character. Fields
//! are fixed-width hex or space-padded six-character names.

use std::fmt::Write as _;

use crate::core::text_utils::hexstr;

/// Text records carry at most 30 object bytes.
pub const TEXT_RECORD_CAP: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub start: u32,
    pub bytes: Vec<u8>,
}

/// A modification record: patch `half_bytes` half-bytes at `addr` by the
/// value of `symbol` (or of the section's own load address when the
/// symbol is implicit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModRecord {
    pub addr: u32,
    pub half_bytes: u8,
    pub sign: char,
    pub symbol: Option<String>,
}

/// All records of one control section, in emit order.
#[derive(Debug)]
pub struct ObjectSection {
    pub name: String,
    pub start: u32,
    pub length: u32,
    pub defs: Vec<(String, u32)>,
    pub refs: Vec<String>,
    pub texts: Vec<TextRecord>,
    pub mods: Vec<ModRecord>,
    /// Entry point; only the first section carries one.
    pub entry: Option<u32>,
}

/// Accumulates object bytes into text records, breaking on the 30-byte
/// cap and on address gaps left by reservations.
#[derive(Debug, Default)]
pub struct TextRecordBuilder {
    current: Option<TextRecord>,
    records: Vec<TextRecord>,
}

impl TextRecordBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, addr: u32, bytes: &[u8]) {
        let mut addr = addr;
        for &byte in bytes {
            let start_new = match &self.current {
                Some(record) => {
                    record.bytes.len() >= TEXT_RECORD_CAP
                        || record.start + record.bytes.len() as u32 != addr
                }
                None => true,
            };
            if start_new {
                self.break_record();
                self.current = Some(TextRecord {
                    start: addr,
                    bytes: Vec::new(),
                });
            }
            self.current
                .as_mut()
                .expect("open text record")
                .bytes
                .push(byte);
            addr += 1;
        }
    }

    /// Close the open record; the next byte starts a fresh one.
    pub fn break_record(&mut self) {
        if let Some(record) = self.current.take() {
            if !record.bytes.is_empty() {
                self.records.push(record);
            }
        }
    }

    pub fn finish(mut self) -> Vec<TextRecord> {
        self.break_record();
        self.records
    }
}

/// Render the object program for all sections, in source order.
pub fn write_object(sections: &[ObjectSection]) -> String {
    let mut out = String::new();
    for section in sections {
        let _ = writeln!(
            out,
            "H{:<6}{}{}",
            truncate(&section.name, 6),
            hexstr(section.start, 6),
            hexstr(section.length, 6)
        );
        if !section.defs.is_empty() {
            let mut body = String::new();
            for (name, addr) in &section.defs {
                let _ = write!(body, "{:<6}{}", truncate(name, 6), hexstr(*addr, 6));
            }
            let _ = writeln!(out, "D{body}");
        }
        if !section.refs.is_empty() {
            let mut body = String::new();
            for name in &section.refs {
                let _ = write!(body, "{:<6}", truncate(name, 6));
            }
            let _ = writeln!(out, "R{}", body.trim_end());
        }
        for record in &section.texts {
            let mut body = String::new();
            for byte in &record.bytes {
                let _ = write!(body, "{byte:02X}");
            }
            let _ = writeln!(
                out,
                "T{}{}{}",
                hexstr(record.start, 6),
                hexstr(record.bytes.len() as u32, 2),
                body
            );
        }
        for m in &section.mods {
            match &m.symbol {
                Some(name) => {
                    let _ = writeln!(
                        out,
                        "M{}{}{}{}",
                        hexstr(m.addr, 6),
                        hexstr(m.half_bytes as u32, 2),
                        m.sign,
                        name
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "M{}{}",
                        hexstr(m.addr, 6),
                        hexstr(m.half_bytes as u32, 2)
                    );
                }
            }
        }
        match section.entry {
            Some(entry) => {
                let _ = writeln!(out, "E{}", hexstr(entry, 6));
            }
            None => {
                let _ = writeln!(out, "E");
            }
        }
    }
    out
}

fn truncate(name: &str, max: usize) -> &str {
    &name[..name.len().min(max)]
}
