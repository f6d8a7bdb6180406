// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! SIC/XE assembler - main entry point.
//!
//! Ties together macro expansion, the Pass 1 / Pass 2 pipeline with the
//! format relaxation loop, and the object/listing writers.

pub mod cli;


use std::collections::BTreeSet;
use std::fs;

use clap::Parser;

use crate::core::error::{
    AsmError, AsmErrorKind, AsmRunError, AsmRunReport, Diagnostic, PassCounts, Severity,
};
use crate::core::line::parse_source;
use crate::core::listing::{ListingLine, ListingWriter};
use crate::core::macro_processor::MacroProcessor;
use crate::core::optab::{Directive, OpcodeTable};
use crate::core::pass1::Pass1;
use crate::core::pass2::{find_promotions, Pass2};
use crate::core::records::write_object;
use crate::core::section::ControlSection;

use cli::{input_base_from_path, resolve_output_path, validate_cli, Cli};

pub use cli::VERSION;

/// Run the assembler with command-line arguments.
pub fn run() -> Result<Vec<AsmRunReport>, AsmRunError> {
    let cli = Cli::parse();
    validate_cli(&cli)?;

    let mut reports = Vec::new();
    for path in &cli.infiles {
        let base = match &cli.outfile {
            Some(base) => base.clone(),
            None => input_base_from_path(path)?,
        };
        let obj_path = resolve_output_path(&base, cli.obj_name.as_deref(), "obj");
        let list_path = resolve_output_path(&base, cli.list_name.as_deref(), "lst");

        let source = fs::read_to_string(path).map_err(|err| {
            AsmRunError::new(
                AsmError::new(AsmErrorKind::Io, &err.to_string(), path.to_str()),
                Vec::new(),
                Vec::new(),
            )
        })?;

        let assembly = Assembler::new().assemble(&source)?;

        // Outputs are only written after a fully successful assembly.
        write_output(&obj_path, &assembly.object)?;
        write_output(&list_path, &assembly.listing)?;

        let source_lines = source.lines().map(str::to_string).collect();
        reports.push(AsmRunReport::new(Vec::new(), source_lines));
    }
    Ok(reports)
}

fn write_output(path: &str, contents: &str) -> Result<(), AsmRunError> {
    fs::write(path, contents).map_err(|_| {
        AsmRunError::new(
            AsmError::new(AsmErrorKind::Io, "Error opening file for write", Some(path)),
            Vec::new(),
            Vec::new(),
        )
    })
}

/// A fully assembled translation unit.
pub struct AssembledProgram {
    /// Object program text, one record per line.
    pub object: String,
    /// Side-by-side listing text.
    pub listing: String,
    /// Control sections with final layouts and symbol tables.
    pub sections: Vec<ControlSection>,
    pub counts: PassCounts,
}

/// Core assembler state.
pub struct Assembler {
    optab: OpcodeTable,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            optab: OpcodeTable::standard(),
        }
    }

    /// Assemble one source text to an object program and listing.
    pub fn assemble(&self, source: &str) -> Result<AssembledProgram, AsmRunError> {
        let raw_lines: Vec<String> = source.lines().map(str::to_string).collect();
        let parsed = parse_source(source);

        let expanded = MacroProcessor::new().expand(&parsed).map_err(|err| {
            let error = AsmError::new(AsmErrorKind::Macro, err.message(), None);
            let diagnostics = err
                .line()
                .map(|line| vec![Diagnostic::new(line, Severity::Error, error.clone())])
                .unwrap_or_default();
            AsmRunError::new(error, diagnostics, raw_lines.clone())
        })?;

        // Relaxation loop: rerun Pass 1 until the set of format-4
        // promotions stops growing, so both passes agree on every length.
        let mut promoted = BTreeSet::new();
        let p1 = loop {
            let (p1, diagnostics) = Pass1::new(&self.optab, &promoted).run(&expanded);
            if !diagnostics.is_empty() {
                return Err(run_error(diagnostics, raw_lines));
            }
            let found = find_promotions(&p1);
            if found.is_subset(&promoted) {
                break p1;
            }
            promoted.extend(found);
        };

        let (p2, diagnostics) = Pass2::new(&self.optab).run(&p1);
        if !diagnostics.is_empty() {
            return Err(run_error(diagnostics, raw_lines));
        }

        let object = write_object(&p2.object_sections);
        let counts = PassCounts {
            lines: raw_lines.len() as u32,
            errors: 0,
            warnings: 0,
        };

        let mut listing_buf = Vec::new();
        {
            let mut listing = ListingWriter::new(&mut listing_buf);
            listing
                .header(&format!("sicForge SIC/XE Assembler v{VERSION}"))
                .and_then(|()| {
                    for (idx, aline) in p1.lines.iter().enumerate() {
                        let addr = listing_address(&p1, aline);
                        listing.write_line(ListingLine {
                            line_num: aline.line.line_num,
                            addr,
                            source: &aline.line.text,
                            bytes: &p2.line_bytes[idx],
                        })?;
                    }
                    listing.footer(&counts, &p1.sections)
                })
                .map_err(|err| {
                    AsmRunError::new(
                        AsmError::new(AsmErrorKind::Io, &err.to_string(), None),
                        Vec::new(),
                        Vec::new(),
                    )
                })?;
        }
        let listing = String::from_utf8(listing_buf).expect("listing is valid UTF-8");

        Ok(AssembledProgram {
            object,
            listing,
            sections: p1.sections,
            counts,
        })
    }
}

/// Listing address column: blank for comments (including retained macro
/// definition lines) and for EQU, which names a value rather than a
/// location.
fn listing_address(
    p1: &crate::core::section::Pass1Output,
    aline: &crate::core::section::AssignedLine,
) -> Option<u32> {
    let stmt = aline.line.statement()?;
    if Directive::from_mnemonic(&stmt.mnemonic) == Some(Directive::Equ) {
        return None;
    }
    Some(p1.address(aline))
}

fn run_error(diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> AsmRunError {
    AsmRunError::new(
        AsmError::new(
            AsmErrorKind::Assembler,
            "Errors detected in source. No output files created.",
            None,
        ),
        diagnostics,
        source_lines,
    )
}
