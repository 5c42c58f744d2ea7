//! `qdash yield` command - first-pass and throughput yield

use clap::ValueEnum;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::args::WindowArgs;
use crate::cli::filters::ScopeFilter;
use crate::cli::helpers::{fetch_observations, format_pct, load_config};
use crate::cli::output::{emit, Tabular};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::yields::{
    first_pass_yield, throughput_yield, yield_by_day, yield_by_model, yield_by_week,
    FirstPassYield, StationScope, ThroughputYield, YieldSummary,
};
use crate::entities::observation::Observation;

#[derive(clap::Args, Debug)]
pub struct YieldArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Station subset (default: yield.default_scope from config)
    #[arg(long, value_enum)]
    pub scope: Option<ScopeFilter>,

    /// Explicit station list, overriding the scope
    #[arg(long, value_delimiter = ',')]
    pub stations: Option<Vec<String>>,

    /// Break the figures down per day, week or model
    #[arg(long, value_enum, default_value_t = YieldGrain::Total)]
    pub by: YieldGrain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum YieldGrain {
    Total,
    Day,
    Week,
    Model,
}

/// Yield over the whole window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldReport {
    pub scope: String,
    pub stations: Vec<String>,
    pub first_pass: FirstPassYield,
    pub throughput: ThroughputYield,
}

/// Stations a run uses: explicit list first, then the configured scope
pub fn selected_stations(args: &YieldArgs, config: &Config) -> (String, Vec<String>) {
    if let Some(stations) = &args.stations {
        return ("custom".to_string(), stations.clone());
    }
    let scope = args
        .scope
        .map(StationScope::from)
        .unwrap_or(config.yields.default_scope);
    (scope.to_string(), config.stations(scope).to_vec())
}

/// Run the yield command
pub fn run(args: YieldArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let (observations, _) = fetch_observations(global, &config, &args.window)?;
    let (scope, stations) = selected_stations(&args, &config);
    if stations.is_empty() {
        tracing::warn!(%scope, "no stations configured for scope; yields will be zero");
    }

    match args.by {
        YieldGrain::Total => {
            let report = total_report(&observations, scope, stations);
            let mut table = Tabular::new(&["STATION", "PASSED", "TOTAL", "YIELD"]);
            for s in &report.throughput.stations {
                table.push(vec![
                    s.station.clone(),
                    s.passed.to_string(),
                    s.total.to_string(),
                    format_pct(s.yield_rate),
                ]);
            }
            if emit(global.output, &report, &table)? == OutputFormat::Table {
                print_summary(&report);
            }
        }
        grain => {
            let summaries = match grain {
                YieldGrain::Day => yield_by_day(&observations, &stations),
                YieldGrain::Week => yield_by_week(&observations, &stations),
                _ => yield_by_model(&observations, &stations),
            };
            emit(global.output, &summaries, &summary_table(&summaries))?;
        }
    }
    Ok(())
}

fn total_report(observations: &[Observation], scope: String, stations: Vec<String>) -> YieldReport {
    YieldReport {
        first_pass: first_pass_yield(observations, &stations),
        throughput: throughput_yield(observations, &stations),
        scope,
        stations,
    }
}

fn summary_table(summaries: &[YieldSummary]) -> Tabular {
    let mut table = Tabular::new(&[
        "KEY",
        "STARTED",
        "FIRST_PASS",
        "COMPLETED",
        "FPY",
        "FPY_COMPLETED",
        "TPY",
    ]);
    for s in summaries {
        table.push(vec![
            s.key.clone(),
            s.first_pass.parts_started.to_string(),
            s.first_pass.first_pass_success.to_string(),
            s.first_pass.completed.to_string(),
            format_pct(s.first_pass.traditional),
            format_pct(s.first_pass.completed_only),
            format_pct(s.throughput.overall),
        ]);
    }
    table
}

fn print_summary(report: &YieldReport) {
    let fpy = &report.first_pass;
    println!(
        "{} ({}: {})",
        style("Yield").bold(),
        report.scope,
        report.stations.join(", ")
    );
    println!("{}", "-".repeat(40));
    println!(
        "  Parts started     {:>8}",
        fpy.parts_started
    );
    println!(
        "  First-pass        {:>8}  FPY {}",
        fpy.first_pass_success,
        style(format_pct(fpy.traditional)).cyan()
    );
    println!(
        "  Completed         {:>8}  FPY {}",
        fpy.completed,
        style(format_pct(fpy.completed_only)).cyan()
    );
    println!(
        "  Throughput yield            {}",
        style(format_pct(report.throughput.overall)).cyan().bold()
    );
}
