// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MACRO/MEND expansion over the parsed line stream.
//!
//! Definitions are collected verbatim and removed from the assembly
//! stream (they stay visible to the listing as address-less lines);
//! invocations are replaced by the body with `&NAME` parameter
//! substitution. A macro may invoke an earlier macro; self-invocation is
//! an error.

use std::collections::HashMap;

use crate::core::line::{LineBody, SourceLine, Statement};
use crate::core::text_utils::{is_ident_char, split_commas};

#[derive(Debug, Clone)]
pub struct MacroError {
    message: String,
    line: Option<u32>,
}

impl MacroError {
    fn new(message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

#[derive(Debug, Clone)]
struct MacroDef {
    /// Formal parameter names without the `&`.
    params: Vec<String>,
    body: Vec<SourceLine>,
}

pub struct MacroProcessor {
    macros: HashMap<String, MacroDef>,
    max_depth: usize,
}

impl Default for MacroProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroProcessor {
    pub fn new() -> Self {
        Self {
            macros: HashMap::new(),
            max_depth: 64,
        }
    }

    /// Expand the line stream. Definition lines come back as comment
    /// bodies so the listing can show them without an address.
    pub fn expand(&mut self, lines: &[SourceLine]) -> Result<Vec<SourceLine>, MacroError> {
        let mut out = Vec::with_capacity(lines.len());
        let mut current: Option<(String, MacroDef)> = None;

        for line in lines {
            let stmt = match line.statement() {
                Some(stmt) => stmt.clone(),
                None => {
                    if let Some((_, def)) = current.as_mut() {
                        def.body.push(line.clone());
                    }
                    out.push(line.clone());
                    continue;
                }
            };

            if stmt.mnemonic == "MACRO" {
                if current.is_some() {
                    return Err(MacroError::new(
                        "Nested MACRO definitions are not supported",
                        Some(line.line_num),
                    ));
                }
                let name = stmt.label.clone().ok_or_else(|| {
                    MacroError::new("MACRO requires a name label", Some(line.line_num))
                })?;
                if self.macros.contains_key(&name) {
                    return Err(MacroError::new(
                        format!("Macro already defined: {name}"),
                        Some(line.line_num),
                    ));
                }
                let params = parse_params(stmt.operand.as_deref(), line.line_num)?;
                current = Some((
                    name,
                    MacroDef {
                        params,
                        body: Vec::new(),
                    },
                ));
                out.push(SourceLine::comment(line.line_num, &line.text));
                continue;
            }

            if stmt.mnemonic == "MEND" {
                let (name, def) = current.take().ok_or_else(|| {
                    MacroError::new("MEND outside a macro definition", Some(line.line_num))
                })?;
                self.macros.insert(name, def);
                out.push(SourceLine::comment(line.line_num, &line.text));
                continue;
            }

            if let Some((_, def)) = current.as_mut() {
                def.body.push(line.clone());
                out.push(SourceLine::comment(line.line_num, &line.text));
                continue;
            }

            if self.macros.contains_key(&stmt.mnemonic) {
                let mut active = Vec::new();
                self.expand_invocation(&stmt, line.line_num, 0, &mut active, &mut out)?;
                continue;
            }

            out.push(line.clone());
        }

        if current.is_some() {
            return Err(MacroError::new("MACRO without matching MEND", None));
        }
        Ok(out)
    }

    fn expand_invocation(
        &self,
        stmt: &Statement,
        line_num: u32,
        depth: usize,
        active: &mut Vec<String>,
        out: &mut Vec<SourceLine>,
    ) -> Result<(), MacroError> {
        if depth > self.max_depth {
            return Err(MacroError::new(
                "Macro expansion exceeded maximum depth",
                Some(line_num),
            ));
        }
        if active.iter().any(|name| name == &stmt.mnemonic) {
            return Err(MacroError::new(
                format!("Recursive macro invocation: {}", stmt.mnemonic),
                Some(line_num),
            ));
        }
        let def = self
            .macros
            .get(&stmt.mnemonic)
            .expect("invocation of registered macro");

        let args = match stmt.operand.as_deref() {
            Some(operand) => split_commas(operand),
            None => Vec::new(),
        };
        if args.len() != def.params.len() {
            return Err(MacroError::new(
                format!(
                    "Macro {} expects {} arguments, got {}",
                    stmt.mnemonic,
                    def.params.len(),
                    args.len()
                ),
                Some(line_num),
            ));
        }
        let subst: HashMap<&str, &str> = def
            .params
            .iter()
            .map(String::as_str)
            .zip(args.iter().map(String::as_str))
            .collect();

        // A label on the invocation line is defined at the expansion
        // address via a zero-length reservation.
        if let Some(label) = &stmt.label {
            let marker = Statement::new(Some(label), "RESB", Some("0"));
            out.push(SourceLine {
                line_num,
                text: marker.render(),
                body: LineBody::Statement(marker),
            });
        }

        active.push(stmt.mnemonic.clone());
        for body_line in &def.body {
            // Body comments already appear at the definition site.
            let Some(body_stmt) = body_line.statement() else {
                continue;
            };
            let expanded = substitute_statement(body_stmt, &subst);
            if self.macros.contains_key(&expanded.mnemonic) {
                self.expand_invocation(&expanded, line_num, depth + 1, active, out)?;
            } else {
                out.push(SourceLine {
                    line_num,
                    text: expanded.render(),
                    body: LineBody::Statement(expanded),
                });
            }
        }
        active.pop();
        Ok(())
    }
}

fn parse_params(operand: Option<&str>, line_num: u32) -> Result<Vec<String>, MacroError> {
    let Some(operand) = operand else {
        return Ok(Vec::new());
    };
    let mut params = Vec::new();
    for item in split_commas(operand) {
        let name = item.strip_prefix('&').ok_or_else(|| {
            MacroError::new(
                format!("Macro parameter must start with &: {item}"),
                Some(line_num),
            )
        })?;
        params.push(name.to_string());
    }
    Ok(params)
}

fn substitute_statement(stmt: &Statement, subst: &HashMap<&str, &str>) -> Statement {
    let mut out = stmt.clone();
    if let Some(label) = &out.label {
        out.label = Some(substitute_text(label, subst));
    }
    out.mnemonic = substitute_text(&out.mnemonic, subst);
    if let Some(operand) = &out.operand {
        out.operand = Some(substitute_text(operand, subst));
    }
    out
}

/// Replace every `&NAME` token. The parameter name is the maximal
/// identifier run after `&`, so `&D1` never substitutes for `&D`.
fn substitute_text(text: &str, subst: &HashMap<&str, &str>) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'&' {
            let start = idx + 1;
            let mut end = start;
            while end < bytes.len() && is_ident_char(bytes[end]) {
                end += 1;
            }
            let name = &text[start..end];
            match subst.get(name) {
                Some(actual) if end > start => {
                    out.push_str(actual);
                    idx = end;
                    continue;
                }
                _ => {}
            }
        }
        out.push(bytes[idx] as char);
        idx += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::line::parse_source;

    fn expand(source: &str) -> Vec<SourceLine> {
        let lines = parse_source(source);
        MacroProcessor::new().expand(&lines).expect("expansion")
    }

    fn statements(lines: &[SourceLine]) -> Vec<String> {
        lines
            .iter()
            .filter_map(|line| line.statement())
            .map(|stmt| {
                let operand = stmt.operand.as_deref().unwrap_or("");
                format!("{} {}", stmt.mnemonic, operand).trim().to_string()
            })
            .collect()
    }

    #[test]
    fn expands_parameterized_invocation() {
        let out = expand(
            "RDBUFF   MACRO   &D\n         OPEN    &D\n         READ    &D\n         MEND\n         RDBUFF  INPUT\n",
        );
        assert_eq!(statements(&out), vec!["OPEN INPUT", "READ INPUT"]);
    }

    #[test]
    fn definitions_become_addressless_lines() {
        let out = expand("M1       MACRO\n         RSUB\n         MEND\n");
        assert!(out.iter().all(|line| line.statement().is_none()));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn macro_may_invoke_earlier_macro() {
        let out = expand(
            "INNER    MACRO   &R\n         LDA     &R\n         MEND\nOUTER    MACRO   &R\n         INNER   &R\n         RSUB\n         MEND\n         OUTER   FIVE\n",
        );
        assert_eq!(statements(&out), vec!["LDA FIVE", "RSUB"]);
    }

    #[test]
    fn invocation_label_is_kept_as_zero_reservation() {
        let out = expand("M1       MACRO\n         RSUB\n         MEND\nHERE     M1\n");
        let stmts: Vec<_> = out.iter().filter_map(|line| line.statement()).collect();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].label.as_deref(), Some("HERE"));
        assert_eq!(stmts[0].mnemonic, "RESB");
        assert_eq!(stmts[0].operand.as_deref(), Some("0"));
        assert_eq!(stmts[1].mnemonic, "RSUB");
    }

    #[test]
    fn partial_parameter_names_do_not_substitute() {
        let out = expand(
            "M1       MACRO   &D\n         LDA     &DX\n         MEND\n         M1      INPUT\n",
        );
        assert_eq!(statements(&out), vec!["LDA &DX"]);
    }

    #[test]
    fn argument_count_mismatch_is_an_error() {
        let lines = parse_source(
            "M1       MACRO   &A,&B\n         LDA     &A\n         MEND\n         M1      ONE\n",
        );
        let err = MacroProcessor::new().expand(&lines).unwrap_err();
        assert!(err.message().contains("expects 2 arguments"));
    }

    #[test]
    fn unterminated_definition_is_an_error() {
        let lines = parse_source("M1       MACRO\n         RSUB\n");
        let err = MacroProcessor::new().expand(&lines).unwrap_err();
        assert!(err.message().contains("without matching MEND"));
    }

    #[test]
    fn mend_outside_definition_is_an_error() {
        let lines = parse_source("         MEND\n");
        let err = MacroProcessor::new().expand(&lines).unwrap_err();
        assert!(err.message().contains("MEND outside"));
    }

    #[test]
    fn recursive_invocation_is_an_error() {
        // A and B invoke each other; the cycle is caught at expansion.
        let lines = parse_source(
            "A        MACRO\n         B\n         MEND\nB        MACRO\n         A\n         MEND\n         B\n",
        );
        let mut mp = MacroProcessor::new();
        let err = mp.expand(&lines).unwrap_err();
        assert!(err.message().contains("Recursive macro invocation"));
    }
}
