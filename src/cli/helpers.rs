//! Shared helper functions for CLI commands
//!
//! Config loading, window resolution and data fetching are the same for
//! every reporting command and live here.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use miette::{IntoDiagnostic, Result};

use crate::cli::args::WindowArgs;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::source::{CsvSource, ObservationQuery, ObservationSource};
use crate::core::stats::percent;
use crate::core::week::DateWindow;
use crate::entities::observation::Observation;

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// A proportion as a percentage string with 2 decimals
pub fn format_pct(proportion: f64) -> String {
    format!("{:.2}%", percent(proportion))
}

/// Load the config named by `--config` or found in the usual places
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    Ok(Config::load(global.config.as_deref())?)
}

/// Data path from `--data`, falling back to the config
pub fn data_path(global: &GlobalOpts, config: &Config) -> Result<PathBuf> {
    global
        .data
        .clone()
        .or_else(|| config.data_path.clone())
        .ok_or_else(|| {
            miette::miette!("no data path configured: pass --data <PATH> or set data_path in qdash.yaml")
        })
}

/// Resolve the report window
///
/// `--week` wins; otherwise `--from`/`--to`, where a missing end is `today`
/// and a missing start gives `default_days` ending on the end date.
pub fn resolve_window(args: &WindowArgs, default_days: u32, today: NaiveDate) -> Result<DateWindow> {
    if let Some(week) = args.week {
        return Ok(week.window());
    }

    let end = args.to.unwrap_or(today);
    let window = match args.from {
        Some(start) => DateWindow::new(start, end),
        None => DateWindow::last_days(end, default_days),
    };
    if window.is_empty() {
        return Err(miette::miette!(
            "window start {} is after its end {}",
            window.start,
            window.end
        ));
    }
    Ok(window)
}

/// Build the observation query for a command's window flags
pub fn build_query(args: &WindowArgs, config: &Config) -> Result<ObservationQuery> {
    let today = Local::now().date_naive();
    let window = resolve_window(args, config.default_window_days, today)?;

    let mut query = ObservationQuery::new(window);
    if let Some(model) = &args.model {
        query = query.with_model(model.clone());
    }
    if let Some(station) = &args.station {
        query = query.with_station(station.clone());
    }
    Ok(query)
}

/// Fetch the observations a reporting command works on
pub fn fetch_observations(
    global: &GlobalOpts,
    config: &Config,
    args: &WindowArgs,
) -> Result<(Vec<Observation>, ObservationQuery)> {
    let path = data_path(global, config)?;
    let query = build_query(args, config)?;
    let source = CsvSource::new(path);
    let observations = source.fetch(&query).into_diagnostic()?;
    tracing::info!(
        count = observations.len(),
        window = %query.window,
        "loaded observations"
    );
    Ok((observations, query))
}
