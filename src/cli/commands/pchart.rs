//! `qdash pchart` command - proportion-defective control chart

use clap::ValueEnum;
use console::style;
use miette::Result;

use crate::cli::args::WindowArgs;
use crate::cli::helpers::{fetch_observations, load_config};
use crate::cli::output::{emit, Tabular};
use crate::cli::viz::{render_p_chart, CHART_HEIGHT, CHART_WIDTH};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::pchart::{compute_p_chart, daily_samples, PChart};
use crate::core::rollup::{daily_buckets, weekly_p_chart, weekly_rollup};
use crate::entities::bucket::GroupBy;
use crate::entities::observation::Observation;

#[derive(clap::Args, Debug)]
pub struct PchartArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// One point per day or per week
    #[arg(long, value_enum, default_value_t = Grain::Day)]
    pub by: Grain,

    /// Draw a braille chart under the table
    #[arg(long)]
    pub chart: bool,

    /// Chart width in pixels (2 per column)
    #[arg(long, default_value_t = CHART_WIDTH)]
    pub width: u32,

    /// Chart height in pixels (4 per row)
    #[arg(long, default_value_t = CHART_HEIGHT)]
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Grain {
    Day,
    Week,
}

/// Build the chart for the fetched observations
pub fn build_chart(observations: &[Observation], grain: Grain) -> PChart {
    let daily = daily_buckets(observations, GroupBy::All);
    match grain {
        Grain::Day => compute_p_chart(&daily_samples(&daily)),
        Grain::Week => weekly_p_chart(&weekly_rollup(&daily)),
    }
}

/// Run the pchart command
pub fn run(args: PchartArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let (observations, query) = fetch_observations(global, &config, &args.window)?;

    let chart = build_chart(&observations, args.by);
    let flagged = chart.out_of_control_points();
    if !flagged.is_empty() {
        tracing::warn!(points = flagged.len(), "out-of-control points in window");
    }

    let mut table = Tabular::new(&["DATE", "N", "DEFECTS", "RATE_PCT", "UCL_PCT", "LCL_PCT", "OOC"]);
    for p in &chart.daily_points {
        table.push(vec![
            p.date.to_string(),
            p.sample_size.to_string(),
            p.defects.to_string(),
            format!("{:.2}", p.defect_rate),
            format!("{:.2}", p.upper_control_limit),
            format!("{:.2}", p.lower_control_limit),
            if p.out_of_control { "yes" } else { "" }.to_string(),
        ]);
    }

    if emit(global.output, &chart, &table)? == OutputFormat::Table {
        println!(
            "Center line {}  parts {}  defects {}  window {}",
            style(format!("{:.2}%", chart.center_line)).cyan().bold(),
            chart.weekly_totals.total_parts,
            chart.weekly_totals.total_defects,
            style(query.window).dim()
        );
        if chart.in_control() {
            println!("{}", style("Process in control").green());
        } else {
            println!(
                "{} {} point(s) out of control",
                style("!").red().bold(),
                flagged.len()
            );
        }
        if args.chart {
            println!();
            println!("{}", render_p_chart(&chart, args.width, args.height));
        }
    }
    Ok(())
}
