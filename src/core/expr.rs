// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Expression evaluation for EQU, ORG, and WORD operands.
//!
//! EQU/ORG expressions are a single term or `A±B` (one operator). WORD
//! operands may chain more terms; external terms are returned for the
//! caller to turn into modification records.

use std::fmt;

/// Error returned from expression evaluation.
#[derive(Debug, Clone)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Result of resolving a name in the evaluation context.
#[derive(Debug, Clone, Copy)]
pub enum Resolved {
    Value { value: i64, relocatable: bool },
    External,
}

/// Symbol and location access for expression evaluation.
pub trait EvalContext {
    fn resolve(&self, name: &str) -> Option<Resolved>;
    /// Current LOCCTR, the value of `*`.
    fn locctr(&self) -> i64;
}

/// Value of an EQU/ORG expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprValue {
    pub value: i64,
    pub relocatable: bool,
}

/// Evaluate an EQU/ORG expression: `*`, a constant, a symbol, or `A±B`.
pub fn eval_expr(text: &str, ctx: &dyn EvalContext) -> Result<ExprValue, EvalError> {
    let text = text.trim();
    match split_binary(text) {
        Some((lhs, op, rhs)) => {
            let l = eval_term(lhs, ctx)?;
            let r = eval_term(rhs, ctx)?;
            let value = if op == '+' { l.value + r.value } else { l.value - r.value };
            let relocatable = match (l.relocatable, r.relocatable, op) {
                (true, true, '-') => false,
                (true, true, '+') => {
                    return Err(EvalError::new(format!(
                        "Cannot add two relocatable terms: {text}"
                    )))
                }
                (false, true, '-') => {
                    return Err(EvalError::new(format!(
                        "Cannot negate a relocatable term: {text}"
                    )))
                }
                (l, r, _) => l || r,
            };
            Ok(ExprValue { value, relocatable })
        }
        None => eval_term(text, ctx),
    }
}

/// Split `A±B` at the single top-level operator. A sign in column 0
/// belongs to the first term.
fn split_binary(text: &str) -> Option<(&str, char, &str)> {
    let bytes = text.as_bytes();
    for idx in 1..bytes.len() {
        if bytes[idx] == b'+' || bytes[idx] == b'-' {
            return Some((
                text[..idx].trim(),
                bytes[idx] as char,
                text[idx + 1..].trim(),
            ));
        }
    }
    None
}

fn eval_term(text: &str, ctx: &dyn EvalContext) -> Result<ExprValue, EvalError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EvalError::new("Empty expression term"));
    }
    if text == "*" {
        return Ok(ExprValue {
            value: ctx.locctr(),
            relocatable: true,
        });
    }
    if let Ok(value) = text.parse::<i64>() {
        return Ok(ExprValue {
            value,
            relocatable: false,
        });
    }
    match ctx.resolve(text) {
        Some(Resolved::Value { value, relocatable }) => Ok(ExprValue { value, relocatable }),
        Some(Resolved::External) => Err(EvalError::new(format!(
            "External symbol not allowed here: {text}"
        ))),
        None => Err(EvalError::new(format!("Undefined symbol: {text}"))),
    }
}

/// Value of a WORD operand expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordValue {
    /// Folded value of all constant and internal terms.
    pub value: i64,
    /// External terms with their signs, in source order.
    pub externals: Vec<(char, String)>,
    /// Net count of relocatable internal terms (+1 per added, -1 per
    /// subtracted). 0 is absolute, 1 needs a plain relocation.
    pub reloc_net: i32,
}

/// Evaluate a WORD operand: a constant or a `±`-chained expression whose
/// terms are constants, internal symbols, or external references.
pub fn eval_word_expr(text: &str, ctx: &dyn EvalContext) -> Result<WordValue, EvalError> {
    let mut value = 0i64;
    let mut externals = Vec::new();
    let mut reloc_net = 0i32;

    for (sign, term) in split_terms(text.trim())? {
        if let Ok(constant) = term.parse::<i64>() {
            value += apply_sign(sign, constant);
            continue;
        }
        match ctx.resolve(&term) {
            Some(Resolved::Value {
                value: sym_value,
                relocatable,
            }) => {
                value += apply_sign(sign, sym_value);
                if relocatable {
                    reloc_net += if sign == '+' { 1 } else { -1 };
                }
            }
            Some(Resolved::External) => externals.push((sign, term)),
            None => return Err(EvalError::new(format!("Undefined symbol: {term}"))),
        }
    }

    if reloc_net != 0 && reloc_net != 1 {
        return Err(EvalError::new(format!(
            "Expression is not relocatable: {text}"
        )));
    }
    Ok(WordValue {
        value,
        externals,
        reloc_net,
    })
}

fn apply_sign(sign: char, value: i64) -> i64 {
    if sign == '+' {
        value
    } else {
        -value
    }
}

fn split_terms(text: &str) -> Result<Vec<(char, String)>, EvalError> {
    let mut terms = Vec::new();
    let mut sign = '+';
    let mut current = String::new();
    for c in text.chars() {
        if c == '+' || c == '-' {
            if current.trim().is_empty() {
                // Sign on the leading term.
                sign = c;
                continue;
            }
            terms.push((sign, current.trim().to_string()));
            current.clear();
            sign = c;
        } else {
            current.push(c);
        }
    }
    if current.trim().is_empty() {
        return Err(EvalError::new(format!("Malformed expression: {text}")));
    }
    terms.push((sign, current.trim().to_string()));
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestCtx {
        symbols: HashMap<String, Resolved>,
        locctr: i64,
    }

    impl TestCtx {
        fn new() -> Self {
            let mut symbols = HashMap::new();
            symbols.insert(
                "BUFFER".to_string(),
                Resolved::Value {
                    value: 0x36,
                    relocatable: true,
                },
            );
            symbols.insert(
                "BUFEND".to_string(),
                Resolved::Value {
                    value: 0x1036,
                    relocatable: true,
                },
            );
            symbols.insert(
                "MAXLEN".to_string(),
                Resolved::Value {
                    value: 0x1000,
                    relocatable: false,
                },
            );
            symbols.insert("LISTB".to_string(), Resolved::External);
            Self {
                symbols,
                locctr: 0x50,
            }
        }
    }

    impl EvalContext for TestCtx {
        fn resolve(&self, name: &str) -> Option<Resolved> {
            self.symbols.get(name).copied()
        }

        fn locctr(&self) -> i64 {
            self.locctr
        }
    }

    #[test]
    fn evaluates_terms() {
        let ctx = TestCtx::new();
        assert_eq!(
            eval_expr("*", &ctx).unwrap(),
            ExprValue {
                value: 0x50,
                relocatable: true
            }
        );
        assert_eq!(eval_expr("4096", &ctx).unwrap().value, 4096);
        assert_eq!(eval_expr("-5", &ctx).unwrap().value, -5);
        assert_eq!(eval_expr("BUFFER", &ctx).unwrap().value, 0x36);
    }

    #[test]
    fn difference_of_relocatables_is_absolute() {
        let ctx = TestCtx::new();
        let val = eval_expr("BUFEND-BUFFER", &ctx).unwrap();
        assert_eq!(val.value, 0x1000);
        assert!(!val.relocatable);
    }

    #[test]
    fn sum_of_relocatables_is_rejected() {
        let ctx = TestCtx::new();
        assert!(eval_expr("BUFEND+BUFFER", &ctx).is_err());
    }

    #[test]
    fn relocatable_plus_constant_stays_relocatable() {
        let ctx = TestCtx::new();
        let val = eval_expr("BUFFER+10", &ctx).unwrap();
        assert_eq!(val.value, 0x40);
        assert!(val.relocatable);
    }

    #[test]
    fn undefined_symbol_is_an_error() {
        let ctx = TestCtx::new();
        assert!(eval_expr("NOPE", &ctx).is_err());
        assert!(eval_expr("NOPE-BUFFER", &ctx).is_err());
    }

    #[test]
    fn word_expression_collects_externals() {
        let ctx = TestCtx::new();
        let word = eval_word_expr("LISTB-MAXLEN", &ctx).unwrap();
        assert_eq!(word.value, -0x1000);
        assert_eq!(word.externals, vec![('+', "LISTB".to_string())]);
        assert_eq!(word.reloc_net, 0);
    }

    #[test]
    fn word_expression_folds_internals() {
        let ctx = TestCtx::new();
        let word = eval_word_expr("BUFEND-BUFFER", &ctx).unwrap();
        assert_eq!(word.value, 0x1000);
        assert!(word.externals.is_empty());
        assert_eq!(word.reloc_net, 0);
    }

    #[test]
    fn word_constant() {
        let ctx = TestCtx::new();
        assert_eq!(eval_word_expr("5", &ctx).unwrap().value, 5);
    }
}
