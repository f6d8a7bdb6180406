// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! SIC/XE opcode table, assembler directives, and register numbering.
//!
//! The table is consumed as a pre-built mapping; [`OpcodeTable::standard`]
//! constructs it from the built-in instruction set, and
//! [`OpcodeTable::from_entries`] accepts an externally loaded set.

use std::collections::HashMap;

/// Permitted encodings for a mnemonic.
///
/// Mnemonics in the 3/4 set can be emitted as format 3 or, with the `+`
/// prefix (or by relaxation), as format 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSet {
    One,
    Two,
    ThreeFour,
}

/// A single opcode table entry.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    pub mnemonic: &'static str,
    pub opcode: u8,
    pub formats: FormatSet,
}

/// The standard SIC/XE instruction set.
///
/// Small enough that the table is kept as a flat list and loaded into a
/// map once at startup.
pub static INSTRUCTION_TABLE: &[OpcodeEntry] = &[
    // Format 1
    OpcodeEntry { mnemonic: "FIX", opcode: 0xC4, formats: FormatSet::One },
    OpcodeEntry { mnemonic: "FLOAT", opcode: 0xC0, formats: FormatSet::One },
    OpcodeEntry { mnemonic: "HIO", opcode: 0xF4, formats: FormatSet::One },
    OpcodeEntry { mnemonic: "NORM", opcode: 0xC8, formats: FormatSet::One },
    OpcodeEntry { mnemonic: "SIO", opcode: 0xF0, formats: FormatSet::One },
    OpcodeEntry { mnemonic: "TIO", opcode: 0xF8, formats: FormatSet::One },
    // Format 2
    OpcodeEntry { mnemonic: "ADDR", opcode: 0x90, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "CLEAR", opcode: 0xB4, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "COMPR", opcode: 0xA0, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "DIVR", opcode: 0x9C, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "MULR", opcode: 0x98, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "RMO", opcode: 0xAC, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "SHIFTL", opcode: 0xA4, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "SHIFTR", opcode: 0xA8, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "SUBR", opcode: 0x94, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "SVC", opcode: 0xB0, formats: FormatSet::Two },
    OpcodeEntry { mnemonic: "TIXR", opcode: 0xB8, formats: FormatSet::Two },
    // Format 3/4
    OpcodeEntry { mnemonic: "ADD", opcode: 0x18, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "ADDF", opcode: 0x58, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "AND", opcode: 0x40, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "COMP", opcode: 0x28, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "COMPF", opcode: 0x88, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "DIV", opcode: 0x24, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "DIVF", opcode: 0x64, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "J", opcode: 0x3C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "JEQ", opcode: 0x30, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "JGT", opcode: 0x34, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "JLT", opcode: 0x38, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "JSUB", opcode: 0x48, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDA", opcode: 0x00, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDB", opcode: 0x68, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDCH", opcode: 0x50, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDF", opcode: 0x70, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDL", opcode: 0x08, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDS", opcode: 0x6C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDT", opcode: 0x74, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LDX", opcode: 0x04, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "LPS", opcode: 0xD0, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "MUL", opcode: 0x20, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "MULF", opcode: 0x60, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "OR", opcode: 0x44, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "RD", opcode: 0xD8, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "RSUB", opcode: 0x4C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "SSK", opcode: 0xEC, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STA", opcode: 0x0C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STB", opcode: 0x78, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STCH", opcode: 0x54, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STF", opcode: 0x80, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STI", opcode: 0xD4, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STL", opcode: 0x14, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STS", opcode: 0x7C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STSW", opcode: 0xE8, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STT", opcode: 0x84, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "STX", opcode: 0x10, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "SUB", opcode: 0x1C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "SUBF", opcode: 0x5C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "TD", opcode: 0xE0, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "TIX", opcode: 0x2C, formats: FormatSet::ThreeFour },
    OpcodeEntry { mnemonic: "WD", opcode: 0xDC, formats: FormatSet::ThreeFour },
];

/// Immutable mnemonic lookup table.
pub struct OpcodeTable {
    entries: HashMap<&'static str, OpcodeEntry>,
}

impl OpcodeTable {
    /// Build the table from the built-in SIC/XE instruction set.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_entries(INSTRUCTION_TABLE)
    }

    /// Build the table from a pre-parsed entry list.
    #[must_use]
    pub fn from_entries(entries: &[OpcodeEntry]) -> Self {
        let entries = entries
            .iter()
            .map(|entry| (entry.mnemonic, *entry))
            .collect();
        Self { entries }
    }

    /// Look up a mnemonic. Matching is exact; source is conventionally
    /// upper-case.
    #[must_use]
    pub fn lookup(&self, mnemonic: &str) -> Option<&OpcodeEntry> {
        self.entries.get(mnemonic)
    }
}

/// Assembler directives, recognized by the pass drivers rather than the
/// opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Start,
    End,
    Byte,
    Word,
    Resb,
    Resw,
    Base,
    Nobase,
    Ltorg,
    Equ,
    Use,
    Csect,
    Extdef,
    Extref,
    Org,
}

impl Directive {
    #[must_use]
    pub fn from_mnemonic(mnemonic: &str) -> Option<Directive> {
        Some(match mnemonic {
            "START" => Directive::Start,
            "END" => Directive::End,
            "BYTE" => Directive::Byte,
            "WORD" => Directive::Word,
            "RESB" => Directive::Resb,
            "RESW" => Directive::Resw,
            "BASE" => Directive::Base,
            "NOBASE" => Directive::Nobase,
            "LTORG" => Directive::Ltorg,
            "EQU" => Directive::Equ,
            "USE" => Directive::Use,
            "CSECT" => Directive::Csect,
            "EXTDEF" => Directive::Extdef,
            "EXTREF" => Directive::Extref,
            "ORG" => Directive::Org,
            _ => return None,
        })
    }
}

/// Map a register name to its SIC/XE register number.
#[must_use]
pub fn register_number(name: &str) -> Option<u8> {
    Some(match name {
        "A" => 0,
        "X" => 1,
        "L" => 2,
        "B" => 3,
        "S" => 4,
        "T" => 5,
        "F" => 6,
        "PC" => 8,
        "SW" => 9,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_knows_common_mnemonics() {
        let optab = OpcodeTable::standard();
        let lda = optab.lookup("LDA").unwrap();
        assert_eq!(lda.opcode, 0x00);
        assert_eq!(lda.formats, FormatSet::ThreeFour);
        let clear = optab.lookup("CLEAR").unwrap();
        assert_eq!(clear.opcode, 0xB4);
        assert_eq!(clear.formats, FormatSet::Two);
        assert!(optab.lookup("FIX").is_some());
        assert!(optab.lookup("NOPE").is_none());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let optab = OpcodeTable::standard();
        assert!(optab.lookup("lda").is_none());
    }

    #[test]
    fn directives_are_not_opcodes() {
        let optab = OpcodeTable::standard();
        assert!(optab.lookup("START").is_none());
        assert_eq!(Directive::from_mnemonic("START"), Some(Directive::Start));
        assert_eq!(Directive::from_mnemonic("LTORG"), Some(Directive::Ltorg));
        assert_eq!(Directive::from_mnemonic("LDA"), None);
    }

    #[test]
    fn register_numbers_match_the_architecture() {
        assert_eq!(register_number("A"), Some(0));
        assert_eq!(register_number("X"), Some(1));
        assert_eq!(register_number("PC"), Some(8));
        assert_eq!(register_number("SW"), Some(9));
        assert_eq!(register_number("Q"), None);
    }
}
