//! `qdash stations` command - pass/fail per station

use console::style;
use miette::Result;

use crate::cli::args::WindowArgs;
use crate::cli::helpers::{fetch_observations, format_pct, load_config};
use crate::cli::output::{emit, Tabular};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::yields::{station_performance, StationPerformance};

#[derive(clap::Args, Debug)]
pub struct StationsArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Sort by failure rate, worst first
    #[arg(long)]
    pub worst: bool,
}

/// Run the stations command
pub fn run(args: StationsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let (observations, _) = fetch_observations(global, &config, &args.window)?;

    let mut stations = station_performance(&observations);
    if args.worst {
        stations.sort_by(|a, b| b.failure_rate.total_cmp(&a.failure_rate));
    }

    let mut table = Tabular::new(&["STATION", "PASS", "FAIL", "FAILURE_RATE"]);
    for s in &stations {
        table.push(vec![
            s.station.clone(),
            s.pass.to_string(),
            s.fail.to_string(),
            format_pct(s.failure_rate),
        ]);
    }

    if emit(global.output, &stations, &table)? == OutputFormat::Table {
        if let Some(worst) = worst_station(&stations) {
            println!(
                "Highest failure rate: {} ({})",
                style(&worst.station).red().bold(),
                format_pct(worst.failure_rate)
            );
        }
    }
    Ok(())
}

fn worst_station(stations: &[StationPerformance]) -> Option<&StationPerformance> {
    stations
        .iter()
        .filter(|s| s.fail > 0)
        .max_by(|a, b| a.failure_rate.total_cmp(&b.failure_rate))
}
