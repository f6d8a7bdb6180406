// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::core::error::{AsmError, AsmErrorKind, AsmRunError};

pub const VERSION: &str = "1.0";

const LONG_ABOUT: &str = "SIC/XE two-pass assembler with control sections, program blocks, \
literals and macros.

Each input is assembled to an object program (<base>.obj) and a listing
(<base>.lst) next to the input. Use -o/--outfile to change the base name,
or -l/--list and --obj to name the outputs directly.";

#[derive(Parser, Debug)]
#[command(
    name = "sicforge",
    version = VERSION,
    about = "SIC/XE two-pass assembler",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "BASE",
        long_help = "Output filename base. Defaults to the input base. Only valid with a single input file."
    )]
    pub outfile: Option<String>,
    #[arg(
        short = 'l',
        long = "list",
        value_name = "FILE",
        long_help = "Listing filename. When omitted, the output base is used and a .lst extension is added."
    )]
    pub list_name: Option<String>,
    #[arg(
        long = "obj",
        value_name = "FILE",
        long_help = "Object program filename. When omitted, the output base is used and a .obj extension is added."
    )]
    pub obj_name: Option<String>,
    #[arg(value_name = "FILE", required = true, long_help = "Input assembly files.")]
    pub infiles: Vec<PathBuf>,
}

/// Check CLI consistency before assembling anything.
pub fn validate_cli(cli: &Cli) -> Result<(), AsmRunError> {
    if cli.infiles.len() > 1 && (cli.outfile.is_some() || cli.list_name.is_some() || cli.obj_name.is_some())
    {
        return Err(AsmRunError::new(
            AsmError::new(
                AsmErrorKind::Io,
                "Explicit output names are only valid with a single input file",
                None,
            ),
            Vec::new(),
            Vec::new(),
        ));
    }
    Ok(())
}

/// Base name for outputs: the input path without its extension.
pub fn input_base_from_path(path: &Path) -> Result<String, AsmRunError> {
    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
        AsmRunError::new(
            AsmError::new(
                AsmErrorKind::Io,
                "Invalid input filename",
                path.to_str(),
            ),
            Vec::new(),
            Vec::new(),
        )
    })?;
    let base = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.join(stem).to_string_lossy().to_string()
        }
        _ => stem.to_string(),
    };
    Ok(base)
}

/// Resolve an output path from an optional explicit name, falling back
/// to `<base>.<extension>`.
pub fn resolve_output_path(base: &str, name: Option<&str>, extension: &str) -> String {
    match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{base}.{extension}"),
    }
}
