//! Command-line argument definitions

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, pareto::ParetoArgs, pchart::PchartArgs, rollup::RollupArgs,
    standardize::StandardizeArgs, stations::StationsArgs, yields::YieldArgs,
};
use crate::core::week::WeekId;

#[derive(Parser, Debug)]
#[command(name = "qdash")]
#[command(version, about = "Manufacturing quality metrics: Pareto, yield, p-charts and weekly rollups")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// CSV export file or directory of exports (overrides data_path in config)
    #[arg(long, global = true, env = "QDASH_DATA")]
    pub data: Option<PathBuf>,

    /// Config file (default: ./qdash.yaml, then the user config dir)
    #[arg(long, global = true, env = "QDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank defect categories (repair codes, failing stations, defect codes)
    Pareto(ParetoArgs),

    /// Pass/fail counts and failure rate per station
    Stations(StationsArgs),

    /// Proportion-defective control chart with per-period limits
    Pchart(PchartArgs),

    /// First-pass and throughput yield
    Yield(YieldArgs),

    /// Weekly rollup, optionally saved to the rollup store
    Rollup(RollupArgs),

    /// Show how raw station names or repair codes are standardized
    Standardize(StandardizeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Table on a terminal
    #[default]
    Auto,
    Table,
    Json,
    Yaml,
    Csv,
    Tsv,
}

/// Report window and record filters shared by the reporting commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long, conflicts_with = "week")]
    pub from: Option<NaiveDate>,

    /// Last day of the window, inclusive (YYYY-MM-DD, default: today)
    #[arg(long, conflicts_with = "week")]
    pub to: Option<NaiveDate>,

    /// A single week (YYYY-Www)
    #[arg(long)]
    pub week: Option<WeekId>,

    /// Only this product model
    #[arg(long)]
    pub model: Option<String>,

    /// Only this station (aliases such as FI1 or FT match)
    #[arg(long)]
    pub station: Option<String>,
}
