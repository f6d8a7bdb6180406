// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Pass 1: address assignment, symbol tables, and literal pools.
//!
//! Walks the expanded line stream once, assigns every statement its
//! control section, program block, and in-block offset, and closes with
//! the contiguous block layout. Reruns with a grown promotion set when
//! the relaxation loop upgrades instructions to format 4.

use std::collections::BTreeSet;

use crate::core::error::{AsmError, AsmErrorKind, Diagnostic, Severity};
use crate::core::expr::{eval_expr, EvalContext, Resolved};
use crate::core::line::{LineBody, SourceLine, Statement};
use crate::core::literal::decode_const;
use crate::core::optab::{Directive, FormatSet, OpcodeTable};
use crate::core::section::{
    finalize_layout, AssignedLine, ControlSection, InstFormat, Pass1Output, ProgramBlock,
};
use crate::core::symbol_table::{SymbolKind, SymbolTableResult};
use crate::core::text_utils::split_commas;

/// Reservations above this flush pending literals first, keeping pools
/// inside the PC-relative window of the code that references them.
const AUTO_POOL_LIMIT: u32 = 100;

const DEFAULT_PROGRAM_NAME: &str = "NONAME";

pub struct Pass1<'a> {
    optab: &'a OpcodeTable,
    promoted: &'a BTreeSet<usize>,
    diagnostics: Vec<Diagnostic>,
    sections: Vec<ControlSection>,
    blocks: Vec<Vec<ProgramBlock>>,
    cur_section: usize,
    cur_block: usize,
    out: Vec<AssignedLine>,
    end_operand: Option<String>,
}

impl<'a> Pass1<'a> {
    pub fn new(optab: &'a OpcodeTable, promoted: &'a BTreeSet<usize>) -> Self {
        Self {
            optab,
            promoted,
            diagnostics: Vec::new(),
            sections: Vec::new(),
            blocks: Vec::new(),
            cur_section: 0,
            cur_block: 0,
            out: Vec::new(),
            end_operand: None,
        }
    }

    pub fn run(mut self, lines: &[SourceLine]) -> (Pass1Output, Vec<Diagnostic>) {
        for (stream, line) in lines.iter().enumerate() {
            let stmt = match &line.body {
                LineBody::Statement(stmt) => stmt.clone(),
                LineBody::Comment => {
                    self.push_passive(line.clone(), stream);
                    continue;
                }
            };
            let ended = self.process(line, &stmt, stream);
            if ended {
                break;
            }
        }

        if self.end_operand.is_none() && !self.sections.is_empty() {
            // Missing END: close the last section anyway.
            self.flush_literals(lines.len().saturating_sub(1), 0);
        }

        for (section, blocks) in self.sections.iter_mut().zip(self.blocks.iter_mut()) {
            finalize_layout(section, blocks);
        }
        self.check_extdefs();
        let entry_point = self.resolve_entry_point();

        (
            Pass1Output {
                sections: self.sections,
                blocks: self.blocks,
                lines: self.out,
                entry_point,
            },
            self.diagnostics,
        )
    }

    /// Process one statement; returns true on END.
    fn process(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) -> bool {
        let line_num = line.line_num;

        match Directive::from_mnemonic(&stmt.mnemonic) {
            Some(Directive::Start) => {
                self.handle_start(line, stmt, stream);
                return false;
            }
            Some(Directive::Csect) => {
                self.handle_csect(line, stmt, stream);
                return false;
            }
            _ => {}
        }
        self.ensure_section(line_num);

        match Directive::from_mnemonic(&stmt.mnemonic) {
            Some(Directive::End) => {
                self.flush_literals(stream, line_num);
                self.push_passive(line.clone(), stream);
                self.end_operand = Some(stmt.operand.clone().unwrap_or_default());
                true
            }
            Some(Directive::Ltorg) => {
                self.push_passive(line.clone(), stream);
                self.flush_literals(stream, line_num);
                false
            }
            Some(Directive::Use) => {
                self.handle_use(line, stmt, stream);
                false
            }
            Some(Directive::Equ) => {
                self.handle_equ(line, stmt, stream);
                false
            }
            Some(Directive::Org) => {
                self.handle_org(line, stmt, stream);
                false
            }
            Some(Directive::Extdef) => {
                self.handle_extref_list(stmt, false);
                self.push_passive(line.clone(), stream);
                false
            }
            Some(Directive::Extref) => {
                self.handle_extref_list(stmt, true);
                self.define_externals(stmt, line_num);
                self.push_passive(line.clone(), stream);
                false
            }
            Some(Directive::Byte) => {
                self.define_label(stmt, line_num);
                let size = self.byte_length(stmt, line_num);
                self.assign(line.clone(), stream, size, None);
                false
            }
            Some(Directive::Word) => {
                self.define_label(stmt, line_num);
                self.assign(line.clone(), stream, 3, None);
                false
            }
            Some(Directive::Resb) | Some(Directive::Resw) => {
                self.handle_reservation(line, stmt, stream);
                false
            }
            Some(Directive::Base) | Some(Directive::Nobase) => {
                self.define_label(stmt, line_num);
                self.push_passive(line.clone(), stream);
                false
            }
            Some(Directive::Start) | Some(Directive::Csect) => unreachable!("handled above"),
            None => {
                self.handle_instruction(line, stmt, stream);
                false
            }
        }
    }

    fn handle_start(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) {
        if !self.sections.is_empty() {
            self.error(
                line.line_num,
                AsmErrorKind::Directive,
                "START must be the first statement",
                None,
            );
            self.push_passive(line.clone(), stream);
            return;
        }
        let start_addr = match stmt.operand.as_deref() {
            Some(text) => match text.trim().parse::<u32>() {
                Ok(addr) => addr,
                Err(_) => {
                    self.error(
                        line.line_num,
                        AsmErrorKind::Expression,
                        "Invalid START address",
                        Some(text),
                    );
                    0
                }
            },
            None => 0,
        };
        let name = stmt.label.as_deref().unwrap_or(DEFAULT_PROGRAM_NAME);
        self.open_section(name, start_addr, line.line_num);
        self.push_passive(line.clone(), stream);
    }

    fn handle_csect(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) {
        let name = stmt
            .label
            .as_deref()
            .or(stmt.operand.as_deref())
            .unwrap_or("");
        if name.is_empty() {
            self.error(
                line.line_num,
                AsmErrorKind::Directive,
                "CSECT requires a section name",
                None,
            );
        }
        if !self.sections.is_empty() {
            // Pending literals belong to the closing section.
            self.flush_literals(stream, line.line_num);
        }
        self.open_section(name, 0, line.line_num);
        self.push_passive(line.clone(), stream);
    }

    fn open_section(&mut self, name: &str, start_addr: u32, line_num: u32) {
        self.sections.push(ControlSection::new(name, start_addr));
        self.blocks.push(vec![ProgramBlock {
            name: String::new(),
            locctr: 0,
            base: 0,
        }]);
        self.cur_section = self.sections.len() - 1;
        self.cur_block = 0;
        if !name.is_empty() {
            let _ = self.sections[self.cur_section].symbols.add(
                name,
                0,
                SymbolKind::Label,
                true,
                0,
                line_num,
            );
        }
    }

    fn ensure_section(&mut self, line_num: u32) {
        if self.sections.is_empty() {
            self.open_section(DEFAULT_PROGRAM_NAME, 0, line_num);
        }
    }

    fn handle_use(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) {
        self.define_label(stmt, line.line_num);
        let name = stmt.operand.as_deref().unwrap_or("").trim();
        let blocks = &mut self.blocks[self.cur_section];
        let idx = match blocks.iter().position(|block| block.name == name) {
            Some(idx) => idx,
            None => {
                blocks.push(ProgramBlock {
                    name: name.to_string(),
                    locctr: 0,
                    base: 0,
                });
                blocks.len() - 1
            }
        };
        self.cur_block = idx;
        self.push_passive(line.clone(), stream);
    }

    fn handle_equ(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) {
        let Some(label) = stmt.label.as_deref() else {
            self.error(
                line.line_num,
                AsmErrorKind::Directive,
                "EQU requires a label",
                None,
            );
            self.push_passive(line.clone(), stream);
            return;
        };
        let Some(operand) = stmt.operand.as_deref() else {
            self.error(
                line.line_num,
                AsmErrorKind::Expression,
                "EQU requires an expression",
                None,
            );
            self.push_passive(line.clone(), stream);
            return;
        };
        let ctx = SectionCtx {
            section: &self.sections[self.cur_section],
            locctr: self.locctr() as i64,
        };
        match eval_expr(operand, &ctx) {
            Ok(value) => {
                let block = self.cur_block;
                let result = self.sections[self.cur_section].symbols.add(
                    label,
                    value.value,
                    SymbolKind::Equate,
                    value.relocatable,
                    block,
                    line.line_num,
                );
                if result == SymbolTableResult::Duplicate {
                    self.error(
                        line.line_num,
                        AsmErrorKind::Symbol,
                        "Duplicate symbol",
                        Some(label),
                    );
                }
            }
            Err(err) => {
                self.error(
                    line.line_num,
                    AsmErrorKind::Expression,
                    &err.message,
                    None,
                );
            }
        }
        self.push_passive(line.clone(), stream);
    }

    fn handle_org(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) {
        self.define_label(stmt, line.line_num);
        let Some(operand) = stmt.operand.as_deref() else {
            self.error(
                line.line_num,
                AsmErrorKind::Expression,
                "ORG requires an expression",
                None,
            );
            self.push_passive(line.clone(), stream);
            return;
        };
        let ctx = SectionCtx {
            section: &self.sections[self.cur_section],
            locctr: self.locctr() as i64,
        };
        match eval_expr(operand, &ctx) {
            Ok(value) if value.value >= 0 => {
                self.blocks[self.cur_section][self.cur_block].locctr = value.value as u32;
            }
            Ok(_) => {
                self.error(
                    line.line_num,
                    AsmErrorKind::Expression,
                    "ORG target is negative",
                    Some(operand),
                );
            }
            Err(err) => {
                self.error(line.line_num, AsmErrorKind::Expression, &err.message, None);
            }
        }
        self.push_passive(line.clone(), stream);
    }

    fn handle_extref_list(&mut self, stmt: &Statement, is_ref: bool) {
        let names = stmt
            .operand
            .as_deref()
            .map(split_commas)
            .unwrap_or_default();
        let section = &mut self.sections[self.cur_section];
        let list = if is_ref {
            &mut section.extrefs
        } else {
            &mut section.extdefs
        };
        for name in names {
            if !list.contains(&name) {
                list.push(name);
            }
        }
    }

    fn define_externals(&mut self, stmt: &Statement, line_num: u32) {
        let names = stmt
            .operand
            .as_deref()
            .map(split_commas)
            .unwrap_or_default();
        for name in names {
            let result = self.sections[self.cur_section].symbols.add(
                &name,
                0,
                SymbolKind::External,
                false,
                self.cur_block,
                line_num,
            );
            if result == SymbolTableResult::Duplicate {
                self.error(
                    line_num,
                    AsmErrorKind::Symbol,
                    "Duplicate symbol",
                    Some(&name),
                );
            }
        }
    }

    fn handle_reservation(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) {
        let per_unit = if stmt.mnemonic == "RESW" { 3 } else { 1 };
        let count = match stmt.operand.as_deref().map(str::trim) {
            Some(text) => match text.parse::<u32>() {
                Ok(n) => n,
                Err(_) => {
                    self.error(
                        line.line_num,
                        AsmErrorKind::Expression,
                        "Invalid reservation count",
                        Some(text),
                    );
                    0
                }
            },
            None => 0,
        };
        let size = per_unit * count;
        // Large reservations push pending literals out of PC-relative
        // reach, so the pool goes in front of them. The label lands
        // after the pool, on the reservation itself.
        if size > AUTO_POOL_LIMIT
            && self.sections[self.cur_section].literals.has_pending()
        {
            self.flush_literals(stream, line.line_num);
        }
        self.define_label(stmt, line.line_num);
        self.assign(line.clone(), stream, size, None);
    }

    fn handle_instruction(&mut self, line: &SourceLine, stmt: &Statement, stream: usize) {
        let Some(entry) = self.optab.lookup(&stmt.mnemonic) else {
            self.error(
                line.line_num,
                AsmErrorKind::Mnemonic,
                "Unknown mnemonic",
                Some(&stmt.mnemonic),
            );
            self.push_passive(line.clone(), stream);
            return;
        };
        let format = match entry.formats {
            FormatSet::One | FormatSet::Two if stmt.extended => {
                self.error(
                    line.line_num,
                    AsmErrorKind::Format,
                    "Extended format is only valid for format 3/4 mnemonics",
                    Some(&stmt.mnemonic),
                );
                self.push_passive(line.clone(), stream);
                return;
            }
            FormatSet::One => InstFormat::One,
            FormatSet::Two => InstFormat::Two,
            FormatSet::ThreeFour => {
                if stmt.extended || self.promoted.contains(&stream) {
                    InstFormat::Four
                } else {
                    InstFormat::Three
                }
            }
        };
        self.define_label(stmt, line.line_num);
        if let Some(operand) = stmt.operand.as_deref() {
            if operand.starts_with('=') {
                if let Err(msg) = self.sections[self.cur_section].literals.register(operand) {
                    self.error(line.line_num, AsmErrorKind::Literal, &msg, None);
                }
            }
        }
        self.assign(line.clone(), stream, format.size(), Some(format));
    }

    fn byte_length(&mut self, stmt: &Statement, line_num: u32) -> u32 {
        match stmt.operand.as_deref() {
            Some(operand) => match decode_const(operand) {
                Ok(bytes) => bytes.len() as u32,
                Err(msg) => {
                    self.error(line_num, AsmErrorKind::Literal, &msg, None);
                    0
                }
            },
            None => {
                self.error(line_num, AsmErrorKind::Literal, "BYTE requires an operand", None);
                0
            }
        }
    }

    fn define_label(&mut self, stmt: &Statement, line_num: u32) {
        let Some(label) = stmt.label.as_deref() else {
            return;
        };
        let value = self.locctr() as i64;
        let block = self.cur_block;
        let result = self.sections[self.cur_section].symbols.add(
            label,
            value,
            SymbolKind::Label,
            true,
            block,
            line_num,
        );
        if result == SymbolTableResult::Duplicate {
            self.error(line_num, AsmErrorKind::Symbol, "Duplicate symbol", Some(label));
        }
    }

    /// Place all pending literals of the current section at the current
    /// LOCCTR, emitting one synthetic `*` line per literal.
    fn flush_literals(&mut self, stream: usize, line_num: u32) {
        if self.sections.is_empty() {
            return;
        }
        let block = self.cur_block;
        let offset = self.locctr();
        let placed = self.sections[self.cur_section]
            .literals
            .place_pending(block, offset);
        for lit in placed {
            let stmt = Statement::new(None, "*", Some(&lit.text));
            let line = SourceLine {
                line_num,
                text: stmt.render(),
                body: LineBody::Statement(stmt),
            };
            let size = lit.bytes.len() as u32;
            self.assign(line, stream, size, None);
        }
    }

    fn locctr(&self) -> u32 {
        self.blocks[self.cur_section][self.cur_block].locctr
    }

    fn assign(&mut self, line: SourceLine, stream: usize, size: u32, format: Option<InstFormat>) {
        let offset = self.locctr();
        self.out.push(AssignedLine {
            line,
            stream,
            section: self.cur_section,
            block: self.cur_block,
            offset,
            size,
            format,
        });
        self.blocks[self.cur_section][self.cur_block].locctr = offset + size;
    }

    /// Record a line that holds a position but no storage.
    fn push_passive(&mut self, line: SourceLine, stream: usize) {
        let (offset, section, block) = if self.sections.is_empty() {
            (0, 0, 0)
        } else {
            (self.locctr(), self.cur_section, self.cur_block)
        };
        self.out.push(AssignedLine {
            line,
            stream,
            section,
            block,
            offset,
            size: 0,
            format: None,
        });
    }

    fn check_extdefs(&mut self) {
        let mut errors = Vec::new();
        for section in &self.sections {
            for name in &section.extdefs {
                match section.symbols.entry(name) {
                    Some(entry) if entry.kind != SymbolKind::External => {}
                    _ => errors.push(name.clone()),
                }
            }
        }
        for name in errors {
            self.error(
                0,
                AsmErrorKind::Symbol,
                "EXTDEF name is not defined in its section",
                Some(&name),
            );
        }
    }

    fn resolve_entry_point(&mut self) -> u32 {
        let resolved = {
            let Some(first) = self.sections.first() else {
                return 0;
            };
            let default = first.start_addr;
            let operand = self.end_operand.as_deref().unwrap_or("").trim();
            if operand.is_empty() {
                return default;
            }
            match first.symbols.entry(operand) {
                Some(entry) if entry.kind != SymbolKind::External => Ok(entry.value as u32),
                _ => Err((default, operand.to_string())),
            }
        };
        match resolved {
            Ok(entry) => entry,
            Err((default, operand)) => {
                self.error(
                    0,
                    AsmErrorKind::Symbol,
                    "END operand is not a symbol of the first section",
                    Some(&operand),
                );
                default
            }
        }
    }

    fn error(&mut self, line: u32, kind: AsmErrorKind, msg: &str, param: Option<&str>) {
        self.diagnostics.push(Diagnostic::new(
            line,
            Severity::Error,
            AsmError::new(kind, msg, param),
        ));
    }
}

/// Expression context over one section's symbols during Pass 1.
struct SectionCtx<'a> {
    section: &'a ControlSection,
    locctr: i64,
}

impl EvalContext for SectionCtx<'_> {
    fn resolve(&self, name: &str) -> Option<Resolved> {
        self.section.symbols.entry(name).map(|entry| {
            if entry.kind == SymbolKind::External {
                Resolved::External
            } else {
                Resolved::Value {
                    value: entry.value,
                    relocatable: entry.relocatable,
                }
            }
        })
    }

    fn locctr(&self) -> i64 {
        self.locctr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::line::parse_source;
    use crate::core::optab::OpcodeTable;

    fn run(source: &str) -> (Pass1Output, Vec<Diagnostic>) {
        let optab = OpcodeTable::standard();
        let lines = parse_source(source);
        let promoted = BTreeSet::new();
        Pass1::new(&optab, &promoted).run(&lines)
    }

    fn run_ok(source: &str) -> Pass1Output {
        let (out, diagnostics) = run(source);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            diagnostics.iter().map(|d| d.format()).collect::<Vec<_>>()
        );
        out
    }

    #[test]
    fn assigns_sequential_addresses() {
        let out = run_ok(
            "COPY     START   1000\n         LDA     FIVE\nFIVE     WORD    5\n         END     COPY\n",
        );
        assert_eq!(out.sections.len(), 1);
        let section = &out.sections[0];
        assert_eq!(section.name, "COPY");
        assert_eq!(section.start_addr, 1000);
        assert_eq!(section.length, 6);
        assert_eq!(section.symbols.lookup("FIVE"), Some(1003));
        assert_eq!(out.entry_point, 1000);
    }

    #[test]
    fn extended_instructions_take_four_bytes() {
        let out = run_ok(
            "COPY     START   0\n         +JSUB   X\nX        RSUB\n         END\n",
        );
        assert_eq!(out.sections[0].symbols.lookup("X"), Some(4));
    }

    #[test]
    fn duplicate_label_in_one_section_is_an_error() {
        let (_, diagnostics) = run(
            "COPY     START   0\nLOOP     RSUB\nLOOP     RSUB\n         END\n",
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].format().contains("Duplicate symbol: LOOP"));
    }

    #[test]
    fn same_label_in_two_sections_is_fine() {
        let out = run_ok(
            "PROG     START   0\nLOOP     J       LOOP\nSECB     CSECT\nLOOP     J       LOOP\n         END\n",
        );
        assert_eq!(out.sections.len(), 2);
        assert_eq!(out.sections[0].symbols.lookup("LOOP"), Some(0));
        assert_eq!(out.sections[1].symbols.lookup("LOOP"), Some(0));
    }

    #[test]
    fn equ_and_org_track_the_location_counter() {
        let out = run_ok(
            "COPY     START   0\nBUFFER   RESB    16\nBUFEND   EQU     *\nMAXLEN   EQU     BUFEND-BUFFER\n         END\n",
        );
        let section = &out.sections[0];
        assert_eq!(section.symbols.lookup("BUFEND"), Some(16));
        assert_eq!(section.symbols.lookup("MAXLEN"), Some(16));
        assert!(!section.symbols.entry("MAXLEN").unwrap().relocatable);
    }

    #[test]
    fn use_blocks_are_laid_out_contiguously() {
        let out = run_ok(
            "COPY     START   0\n         LDA     FIVE\n         USE     CDATA\nFIVE     WORD    5\n         USE\n         RSUB\n         END\n",
        );
        let section = &out.sections[0];
        // Default block: LDA + RSUB = 6 bytes; CDATA follows at 6.
        assert_eq!(section.symbols.lookup("FIVE"), Some(6));
        assert_eq!(section.length, 9);
    }

    #[test]
    fn ltorg_places_pending_literals() {
        let out = run_ok(
            "COPY     START   0\n         LDA     =C'EOF'\n         LTORG\n         END\n",
        );
        let section = &out.sections[0];
        let lit = section.literals.get("=C'EOF'").unwrap();
        assert_eq!(lit.address, Some(3));
        // The pool line shows up in the assigned stream.
        assert!(out
            .lines
            .iter()
            .any(|line| line.line.statement().map(|s| s.mnemonic.as_str()) == Some("*")));
    }

    #[test]
    fn large_reservation_flushes_literals_first() {
        let out = run_ok(
            "COPY     START   0\n         LDA     =C'EOF'\nBUF      RESB    4096\n         END\n",
        );
        let section = &out.sections[0];
        assert_eq!(section.literals.get("=C'EOF'").unwrap().address, Some(3));
        // The label lands after the pool.
        assert_eq!(section.symbols.lookup("BUF"), Some(6));
        assert_eq!(section.length, 6 + 4096);
    }

    #[test]
    fn end_flushes_literals() {
        let out = run_ok(
            "COPY     START   0\n         LDA     =X'05'\n         END\n",
        );
        assert_eq!(
            out.sections[0].literals.get("=X'05'").unwrap().address,
            Some(3)
        );
        assert_eq!(out.sections[0].length, 4);
    }

    #[test]
    fn unknown_mnemonic_is_reported() {
        let (_, diagnostics) = run("COPY     START   0\n         LDQ     X\n         END\n");
        assert!(diagnostics
            .iter()
            .any(|d| d.format().contains("Unknown mnemonic: LDQ")));
    }

    #[test]
    fn plus_on_format_two_is_a_format_error() {
        let (_, diagnostics) = run("COPY     START   0\n         +CLEAR  A\n         END\n");
        assert!(diagnostics
            .iter()
            .any(|d| d.format().contains("Extended format")));
    }

    #[test]
    fn extref_names_enter_the_symbol_table() {
        let out = run_ok(
            "PROG     START   0\n         EXTREF  LISTB,ENDB\n         +LDA    LISTB\n         END\n",
        );
        let section = &out.sections[0];
        assert!(section.symbols.is_external("LISTB"));
        assert_eq!(section.extrefs, vec!["LISTB", "ENDB"]);
    }

    #[test]
    fn undefined_extdef_is_an_error() {
        let (_, diagnostics) = run("PROG     START   0\n         EXTDEF  GONE\n         END\n");
        assert!(diagnostics
            .iter()
            .any(|d| d.format().contains("EXTDEF name is not defined")));
    }

    #[test]
    fn promotions_grow_instruction_size() {
        let optab = OpcodeTable::standard();
        let lines = parse_source(
            "COPY     START   0\n         LDA     X\nX        RSUB\n         END\n",
        );
        let mut promoted = BTreeSet::new();
        promoted.insert(1);
        let (out, diagnostics) = Pass1::new(&optab, &promoted).run(&lines);
        assert!(diagnostics.is_empty());
        assert_eq!(out.sections[0].symbols.lookup("X"), Some(4));
        let lda = out
            .lines
            .iter()
            .find(|line| line.line.statement().map(|s| s.mnemonic.as_str()) == Some("LDA"))
            .unwrap();
        assert_eq!(lda.format, Some(InstFormat::Four));
    }
}
