// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Listing file generation.

use std::io::Write;

use crate::core::error::PassCounts;
use crate::core::section::ControlSection;

/// Data for a single listing line.
pub struct ListingLine<'a> {
    pub line_num: u32,
    /// Blank for comments, macro definitions, and EQU-style lines.
    pub addr: Option<u32>,
    pub source: &'a str,
    pub bytes: &'a [u8],
}

/// Writer for listing file output.
pub struct ListingWriter<W: Write> {
    out: W,
}

impl<W: Write> ListingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn header(&mut self, title: &str) -> std::io::Result<()> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "LINE  LOC     SOURCE STATEMENT                 OBJECT CODE")?;
        writeln!(self.out, "----  ------  -------------------------------  -----------")?;
        Ok(())
    }

    pub fn write_line(&mut self, line: ListingLine<'_>) -> std::io::Result<()> {
        let loc = match line.addr {
            Some(addr) => format!("{addr:06X}"),
            None => String::new(),
        };
        writeln!(
            self.out,
            "{:>4}  {:<6}  {:<31}  {}",
            line.line_num,
            loc,
            line.source,
            format_bytes(line.bytes)
        )
    }

    pub fn footer(&mut self, counts: &PassCounts, sections: &[ControlSection]) -> std::io::Result<()> {
        writeln!(
            self.out,
            "\nLines: {}  Errors: {}  Warnings: {}",
            counts.lines, counts.errors, counts.warnings
        )?;
        for section in sections {
            writeln!(self.out, "\nSYMBOL TABLE [{}]\n", section.name)?;
            section.symbols.dump(&mut self.out)?;
        }
        Ok(())
    }
}

/// Format object bytes as contiguous hex.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_address_and_bytes() {
        let mut out = Vec::new();
        let mut listing = ListingWriter::new(&mut out);
        listing
            .write_line(ListingLine {
                line_num: 2,
                addr: Some(0x3E8),
                source: "         LDA     FIVE",
                bytes: &[0x03, 0x20, 0x00],
            })
            .unwrap();
        listing
            .write_line(ListingLine {
                line_num: 3,
                addr: None,
                source: ". comment",
                bytes: &[],
            })
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("   2  0003E8"));
        assert!(lines[0].ends_with("032000"));
        assert!(lines[1].contains(". comment"));
        assert!(!lines[1].contains("0003E8"));
    }
}
