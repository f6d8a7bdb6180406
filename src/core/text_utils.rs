// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text utilities for line splitting and scanning.

/// Check if a byte is a valid identifier start character (letter or underscore).
#[inline]
pub fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Check if a byte is a valid identifier continuation character.
#[inline]
pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Check if a byte is whitespace (space or tab).
#[inline]
pub fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Split a line into whitespace-separated fields, keeping single-quoted
/// runs intact so `C'TWO WORDS'` stays one field.
pub fn split_fields(line: &str) -> Vec<String> {
    let bytes = line.as_bytes();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for &c in bytes {
        if c == b'\'' {
            in_quote = !in_quote;
            current.push(c as char);
        } else if is_space(c) && !in_quote {
            if !current.is_empty() {
                fields.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c as char);
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

/// Split a comma-separated list, keeping commas inside single quotes.
/// Used for macro arguments and EXTDEF/EXTREF name lists.
pub fn split_commas(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for &c in bytes {
        if c == b'\'' {
            in_quote = !in_quote;
            current.push(c as char);
        } else if c == b',' && !in_quote {
            items.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c as char);
        }
    }
    items.push(current.trim().to_string());
    items.retain(|item| !item.is_empty());
    items
}

/// Format a value as zero-padded upper-case hex.
pub fn hexstr(value: u32, width: usize) -> String {
    format!("{value:0width$X}")
}
