//! `qdash standardize` command - preview label standardization

use std::io::{self, BufRead, IsTerminal};

use clap::ValueEnum;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::output::{emit, Tabular};
use crate::cli::GlobalOpts;
use crate::core::standardize::{standardize_repair_code, standardize_station};

#[derive(clap::Args, Debug)]
pub struct StandardizeArgs {
    /// Kind of label
    #[arg(value_enum)]
    pub kind: LabelKind,

    /// Labels to standardize (read one per line from stdin when omitted)
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LabelKind {
    Station,
    Repair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mapping {
    pub raw: String,
    pub standard: String,
}

impl LabelKind {
    pub fn standardize(&self, raw: &str) -> String {
        let standard = match self {
            LabelKind::Station => standardize_station(Some(raw)),
            LabelKind::Repair => standardize_repair_code(Some(raw)),
        };
        standard.unwrap_or_default()
    }
}

/// Run the standardize command
pub fn run(args: StandardizeArgs, global: &GlobalOpts) -> Result<()> {
    let values = if args.values.is_empty() {
        read_stdin_lines()?
    } else {
        args.values
    };

    let mappings: Vec<Mapping> = values
        .into_iter()
        .map(|raw| Mapping {
            standard: args.kind.standardize(&raw),
            raw,
        })
        .collect();

    let mut table = Tabular::new(&["RAW", "STANDARD"]);
    for m in &mappings {
        table.push(vec![m.raw.clone(), m.standard.clone()]);
    }
    emit(global.output, &mappings, &table)?;
    Ok(())
}

fn read_stdin_lines() -> Result<Vec<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(miette::miette!("no labels given: pass them as arguments or pipe them on stdin"));
    }
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.into_diagnostic()?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}
