//! `qdash pareto` command - rank defect categories

use clap::ValueEnum;
use console::style;
use miette::Result;

use crate::cli::args::WindowArgs;
use crate::cli::helpers::{fetch_observations, load_config};
use crate::cli::output::{emit, Tabular};
use crate::cli::viz::render_pareto_bars;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::pareto::{compute_pareto_with_limit, ParetoEntry};
use crate::core::standardize::{standardize_repair_code, standardize_station};
use crate::entities::observation::{EventKind, Observation};

#[derive(clap::Args, Debug)]
pub struct ParetoArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// What to rank
    #[arg(long, value_enum, default_value_t = ParetoField::RepairCode)]
    pub by: ParetoField,

    /// Categories to keep (default: pareto.top_n from config)
    #[arg(long, short = 'n')]
    pub top: Option<usize>,

    /// Draw bars under the table
    #[arg(long)]
    pub chart: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ParetoField {
    /// Standardized repair codes from repair records
    RepairCode,
    /// Standardized station of each failing test record
    FailureStation,
    /// Defect code attached to failing test records
    DefectCode,
}

impl ParetoField {
    /// Category of a record for this ranking, if it has one
    pub fn category(&self, obs: &Observation) -> Option<String> {
        match self {
            ParetoField::RepairCode => {
                if obs.kind != EventKind::Repair {
                    return None;
                }
                standardize_repair_code(obs.code.as_deref())
            }
            ParetoField::FailureStation => {
                if !obs.is_fail() {
                    return None;
                }
                standardize_station(Some(&obs.station))
            }
            ParetoField::DefectCode => {
                if !obs.is_fail() {
                    return None;
                }
                obs.code.as_deref().map(|c| c.trim().to_uppercase())
            }
        }
    }
}

/// Run the pareto command
pub fn run(args: ParetoArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let (observations, query) = fetch_observations(global, &config, &args.window)?;

    let limit = args.top.unwrap_or(config.pareto.top_n);
    let entries = compute_pareto_with_limit(&observations, |o| args.by.category(o), limit);
    tracing::debug!(categories = entries.len(), limit, "computed pareto");

    let format = emit(global.output, &entries, &pareto_table(&entries))?;
    if format == OutputFormat::Table {
        let total: u64 = entries.iter().map(|e| e.count).sum();
        println!(
            "{} records ranked in {}",
            style(total).cyan(),
            style(query.window).dim()
        );
        if args.chart && !entries.is_empty() {
            println!();
            println!("{}", render_pareto_bars(&entries));
        }
    }
    Ok(())
}

fn pareto_table(entries: &[ParetoEntry]) -> Tabular {
    let mut table = Tabular::new(&["RANK", "CATEGORY", "COUNT", "CUMULATIVE"]);
    for (i, entry) in entries.iter().enumerate() {
        table.push(vec![
            (i + 1).to_string(),
            entry.category.clone(),
            entry.count.to_string(),
            format!("{:.4}", entry.cumulative_fraction),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::observation::TestStatus;
    use chrono::NaiveDateTime;

    fn ts() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-04 08:00", "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_categories_per_field() {
        let repair = Observation::repair("SN1", "REPAIR", "M100", ts(), " nff ");
        let fail = Observation::test("SN2", "ft1", "M100", ts(), TestStatus::Fail).with_code("short ");
        let pass = Observation::test("SN3", "FI", "M100", ts(), TestStatus::Pass).with_code("X");

        assert_eq!(ParetoField::RepairCode.category(&repair).as_deref(), Some("NFF"));
        assert_eq!(ParetoField::RepairCode.category(&fail), None);

        assert_eq!(ParetoField::FailureStation.category(&fail).as_deref(), Some("FCT"));
        assert_eq!(ParetoField::FailureStation.category(&pass), None);

        assert_eq!(ParetoField::DefectCode.category(&fail).as_deref(), Some("SHORT"));
        assert_eq!(ParetoField::DefectCode.category(&pass), None);
    }

    #[test]
    fn test_pareto_table_rows() {
        let table = pareto_table(&[ParetoEntry {
            category: "BENT PIN".to_string(),
            count: 2,
            cumulative_fraction: 1.0,
        }]);
        assert_eq!(
            table.render_delimited(','),
            "rank,category,count,cumulative\n1,BENT PIN,2,1.0000\n"
        );
    }
}
