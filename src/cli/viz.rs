//! Terminal charts using braille graphics
//!
//! drawille packs 2x4 pixels into each braille character, so a canvas of
//! `width x height` pixels prints as `width/2` columns by `height/4` rows.

use console::style;
use drawille::Canvas;

use crate::core::pareto::ParetoEntry;
use crate::core::pchart::PChart;

/// Default canvas size for the p-chart
pub const CHART_WIDTH: u32 = 120;
pub const CHART_HEIGHT: u32 = 40;

/// Widest Pareto bar in characters
pub const PARETO_BAR_WIDTH: usize = 40;

/// Render the defect-rate series against its control limits
///
/// The rate is drawn as a connected line, the UCL as a dotted line and the
/// center line as a dashed line. Out-of-control points are listed under the
/// chart since braille has no color per pixel.
pub fn render_p_chart(chart: &PChart, width: u32, height: u32) -> String {
    let points = &chart.daily_points;
    if points.is_empty() {
        return "  (no data)".to_string();
    }

    let top = points
        .iter()
        .map(|p| p.defect_rate.max(p.upper_control_limit))
        .fold(chart.center_line, f64::max)
        .max(0.01)
        * 1.1;

    let width = width.max(4);
    let height = height.max(4);
    let x_of = |i: usize| -> u32 {
        if points.len() == 1 {
            width / 2
        } else {
            (i as f64 / (points.len() - 1) as f64 * (width - 1) as f64).round() as u32
        }
    };
    let y_of = |v: f64| -> u32 {
        let scaled = (v / top).clamp(0.0, 1.0) * (height - 1) as f64;
        (height - 1) - scaled.round() as u32
    };

    let mut canvas = Canvas::new(width, height);

    // Center line, dashed
    let cl_y = y_of(chart.center_line);
    for x in (0..width).filter(|x| x % 6 < 3) {
        canvas.set(x, cl_y);
    }

    // UCL per point, dotted between neighbours
    for (i, pair) in points.windows(2).enumerate() {
        let (x0, x1) = (x_of(i), x_of(i + 1));
        let (y0, y1) = (y_of(pair[0].upper_control_limit), y_of(pair[1].upper_control_limit));
        for x in (x0..=x1).step_by(3) {
            let t = if x1 > x0 { (x - x0) as f64 / (x1 - x0) as f64 } else { 0.0 };
            let y = y0 as f64 + (y1 as f64 - y0 as f64) * t;
            canvas.set(x, y.round() as u32);
        }
    }

    // Rate series
    for (i, pair) in points.windows(2).enumerate() {
        canvas.line(
            x_of(i),
            y_of(pair[0].defect_rate),
            x_of(i + 1),
            y_of(pair[1].defect_rate),
        );
    }
    for (i, p) in points.iter().enumerate() {
        canvas.set(x_of(i), y_of(p.defect_rate));
    }

    let mut output = String::new();
    output.push_str(&format!(
        "Defect rate % (center {:.2}%, max axis {:.2}%)\n",
        chart.center_line, top
    ));
    output.push_str(&canvas.frame());
    output.push_str(&format!(
        "\n  {} .. {}",
        points[0].date,
        points[points.len() - 1].date
    ));

    let flagged = chart.out_of_control_points();
    if !flagged.is_empty() {
        let dates: Vec<String> = flagged.iter().map(|d| d.to_string()).collect();
        output.push_str(&format!(
            "\n  {} {}",
            style("out of control:").red().bold(),
            dates.join(", ")
        ));
    }

    output
}

/// Render Pareto bars with the cumulative percentage beside each
pub fn render_pareto_bars(entries: &[ParetoEntry]) -> String {
    let max_count = entries.iter().map(|e| e.count).max().unwrap_or(0);
    if max_count == 0 {
        return "  (no data)".to_string();
    }
    let label_width = entries
        .iter()
        .map(|e| e.category.chars().count())
        .max()
        .unwrap_or(0)
        .min(32);

    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let bar_width =
            ((entry.count as f64 / max_count as f64) * PARETO_BAR_WIDTH as f64).round() as usize;
        let label: String = entry.category.chars().take(label_width).collect();
        lines.push(format!(
            "  {:<label_width$} {} {} ({:.1}%)",
            label,
            style("█".repeat(bar_width.max(1))).cyan(),
            entry.count,
            entry.cumulative_fraction * 100.0,
            label_width = label_width
        ));
    }
    lines.join("\n")
}
