//! `qdash rollup` command - weekly rollups, computed or read from the store

use std::path::PathBuf;

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::args::WindowArgs;
use crate::cli::filters::GroupByFilter;
use crate::cli::helpers::{build_query, data_path, fetch_observations, format_pct, load_config};
use crate::cli::output::{emit, Tabular};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::rollup::{daily_buckets, weekly_rollup};
use crate::core::source::CsvSource;
use crate::core::store::{source_fingerprint, RollupStore};
use crate::entities::bucket::{GroupBy, WeeklyBucket};

#[derive(clap::Args, Debug)]
pub struct RollupArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Bucket key
    #[arg(long, value_enum, default_value_t = GroupByFilter::Station)]
    pub group_by: GroupByFilter,

    /// Save the computed weeks to the rollup store
    #[arg(long, conflicts_with = "stored")]
    pub save: bool,

    /// Read saved weeks instead of recomputing
    #[arg(long)]
    pub stored: bool,

    /// Rollup store file (default: store_path from config)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl RollupArgs {
    fn grouping(&self) -> GroupBy {
        self.group_by.into()
    }
}

fn store_path(args: &RollupArgs, config: &Config) -> Result<PathBuf> {
    args.store
        .clone()
        .or_else(|| config.store_path.clone())
        .ok_or_else(|| {
            miette::miette!("no rollup store configured: pass --store <PATH> or set store_path in qdash.yaml")
        })
}

/// Fingerprint of the CSV exports under the data path
fn data_fingerprint(global: &GlobalOpts, config: &Config) -> Result<String> {
    let source = CsvSource::new(data_path(global, config)?);
    let files = source.files().into_diagnostic()?;
    source_fingerprint(&files).into_diagnostic()
}

/// Run the rollup command
pub fn run(args: RollupArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;

    let weeks = if args.stored {
        load_stored(&args, global, &config)?
    } else {
        let (observations, _) = fetch_observations(global, &config, &args.window)?;
        let weeks = weekly_rollup(&daily_buckets(&observations, args.grouping()));

        if args.save {
            let path = store_path(&args, &config)?;
            let fingerprint = data_fingerprint(global, &config)?;
            let mut store = RollupStore::open(&path).into_diagnostic()?;
            let rows = store
                .save_weekly(args.grouping(), &weeks, &fingerprint)
                .into_diagnostic()?;
            eprintln!(
                "{} Saved {} weekly row(s) to {}",
                style("✓").green(),
                rows,
                path.display()
            );
        }
        weeks
    };

    let mut table = Tabular::new(&[
        "WEEK", "KEY", "DAYS", "TESTS", "FAIL", "UNITS", "DEFECTIVE", "P_BAR", "UCL", "LCL",
    ]);
    for w in &weeks {
        table.push(vec![
            w.week.to_string(),
            w.key.clone(),
            w.days.to_string(),
            w.total.to_string(),
            w.fail.to_string(),
            w.sample_size.to_string(),
            w.defects.to_string(),
            format_pct(w.center_line()),
            format_pct(w.limits.ucl),
            format_pct(w.limits.lcl),
        ]);
    }

    if emit(global.output, &weeks, &table)? == OutputFormat::Table {
        println!(
            "{} week/{} bucket(s)",
            style(weeks.len()).cyan(),
            args.grouping()
        );
    }
    Ok(())
}

fn load_stored(args: &RollupArgs, global: &GlobalOpts, config: &Config) -> Result<Vec<WeeklyBucket>> {
    let path = store_path(args, config)?;
    if !path.is_file() {
        return Err(miette::miette!("rollup store not found: {}", path.display()));
    }
    let store = RollupStore::open(&path).into_diagnostic()?;
    let query = build_query(&args.window, config)?;
    let weeks = store
        .load_weekly(args.grouping(), Some(&query.window))
        .into_diagnostic()?;

    // Staleness is only checked when the exports are reachable
    if let Ok(fingerprint) = data_fingerprint(global, config) {
        if !store.is_current(args.grouping(), &fingerprint).into_diagnostic()? {
            tracing::warn!(store = %path.display(), "stored rollup is older than the data");
            eprintln!(
                "{} Stored rollup does not match the current data; rerun with --save",
                style("!").yellow()
            );
        }
    }
    Ok(weeks)
}
