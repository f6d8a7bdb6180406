// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for sicForge.

fn main() {
    match sicforge::assembler::run() {
        Ok(reports) => {
            for report in reports {
                for diag in report.diagnostics() {
                    eprintln!("{}", diag.format_with_context(Some(report.source_lines())));
                }
            }
        }
        Err(err) => {
            for diag in err.diagnostics() {
                eprintln!("{}", diag.format_with_context(Some(err.source_lines())));
            }
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
