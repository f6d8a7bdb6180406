// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand descriptors for format 3/4 instructions.
//!
//! All operand string picking happens here; the passes work from the
//! descriptor instead of re-inspecting substrings.

/// Addressing prefix on the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrPrefix {
    /// No prefix: n=1, i=1.
    Simple,
    /// `#`: n=0, i=1.
    Immediate,
    /// `@`: n=1, i=0.
    Indirect,
}

/// What the operand refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Symbol(String),
    Constant(i64),
    /// A literal reference; carries the full `=…` text.
    Literal(String),
    /// `*` or `*±n`: offset from the current instruction address.
    Here(i64),
}

/// Decoded operand of a format 3/4 instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandDesc {
    pub prefix: AddrPrefix,
    pub indexed: bool,
    pub target: Target,
}

/// Decode the operand field of a format 3/4 instruction.
pub fn parse_operand(text: &str) -> Result<OperandDesc, String> {
    let text = text.trim();
    if let Some(literal) = text.strip_prefix('=') {
        if literal.is_empty() {
            return Err("Empty literal".to_string());
        }
        return Ok(OperandDesc {
            prefix: AddrPrefix::Simple,
            indexed: false,
            target: Target::Literal(text.to_string()),
        });
    }

    let (prefix, rest) = if let Some(rest) = text.strip_prefix('#') {
        (AddrPrefix::Immediate, rest)
    } else if let Some(rest) = text.strip_prefix('@') {
        (AddrPrefix::Indirect, rest)
    } else {
        (AddrPrefix::Simple, text)
    };

    let (rest, indexed) = match rest.strip_suffix(",X") {
        Some(bare) => (bare.trim(), true),
        None => (rest.trim(), false),
    };
    if rest.is_empty() {
        return Err("Empty operand".to_string());
    }

    let target = if let Some(offset) = rest.strip_prefix('*') {
        let offset = if offset.is_empty() {
            0
        } else {
            offset
                .parse()
                .map_err(|_| format!("Invalid offset from *: {rest}"))?
        };
        Target::Here(offset)
    } else if let Ok(value) = rest.parse::<i64>() {
        Target::Constant(value)
    } else {
        Target::Symbol(rest.to_string())
    };

    Ok(OperandDesc {
        prefix,
        indexed,
        target,
    })
}

impl OperandDesc {
    /// The n/i addressing bits packed into the opcode's low two bits.
    #[must_use]
    pub fn ni_bits(&self) -> u8 {
        match self.prefix {
            AddrPrefix::Simple => 0b11,
            AddrPrefix::Immediate => 0b01,
            AddrPrefix::Indirect => 0b10,
        }
    }
}
