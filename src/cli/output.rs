//! Output formatting utilities

use std::io::IsTerminal;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::escape_csv;
use crate::cli::OutputFormat;

/// Determine the effective output format based on context
///
/// `auto` draws a table on a terminal and falls back to TSV when piped.
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if std::io::stdout().is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Tsv
            }
        }
        other => other,
    }
}

/// Header plus string rows, rendered as a table or delimited text
#[derive(Debug, Clone, Default)]
pub struct Tabular {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Tabular {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().cloned());
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    /// CSV (escaped) or TSV (tabs and newlines in cells replaced by spaces)
    pub fn render_delimited(&self, delimiter: char) -> String {
        let cell = |s: &str| -> String {
            if delimiter == ',' {
                escape_csv(s)
            } else {
                s.replace(['\t', '\n'], " ")
            }
        };
        let sep = delimiter.to_string();

        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(|h| cell(h.to_lowercase().as_str())).collect();
        out.push_str(&header.join(&sep));
        out.push('\n');
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| cell(c.as_str())).collect();
            out.push_str(&cells.join(&sep));
            out.push('\n');
        }
        out
    }
}

/// Print `value` as JSON or YAML, or `table` in the tabular formats
///
/// Returns the format actually used so callers can add table-only extras.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, table: &Tabular) -> Result<OutputFormat> {
    let format = effective_format(format);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
        OutputFormat::Csv => print!("{}", table.render_delimited(',')),
        OutputFormat::Tsv => print!("{}", table.render_delimited('\t')),
        OutputFormat::Table | OutputFormat::Auto => {
            if table.is_empty() {
                println!("No records in window.");
            } else {
                println!("{}", table.render_table());
            }
        }
    }
    Ok(format)
}
