//! Text rendering of published snapshots.
//!
//! Each panel is rendered from the snapshot's [`Panel`] accessors, so a
//! loading or unavailable session shows the same placeholder in all three.

use std::fmt::Write as _;

use clap::ValueEnum;

use crate::aggregate::AggregationBucket;
use crate::coordinator::{ChartView, Panel, Snapshot, TableView};
use crate::donor::DonorRecord;
use crate::error::Result;
use crate::facets::FacetCatalog;
use crate::geo::MapView;

/// Placeholder shown while donors load.
pub const LOADING_MESSAGE: &str = "Loading donor data...";

/// Placeholder for a table with no matching rows.
pub const NO_DONORS_MESSAGE: &str = "No donors found matching your criteria.";

/// Placeholder for a chart with no buckets.
pub const NO_CHART_MESSAGE: &str = "No blood group data for this selection.";

/// Longest bar drawn by [`render_buckets`]; larger counts are scaled down.
const MAX_BAR_WIDTH: usize = 40;

const TABLE_HEADERS: [&str; 5] = ["Name", "Blood Group", "Contact", "Last Donation", "Address"];

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

/// Render a full snapshot: filter line plus the three panels.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn render_snapshot(snapshot: &Snapshot, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(snapshot)?);
    }

    let scope = snapshot.filter().city.to_string();
    let mut out = String::new();
    let _ = writeln!(out, "Filter: {}", snapshot.filter());
    out.push('\n');

    out.push_str(&heading("Donor Details"));
    out.push_str(&render_table(snapshot.table(), format));
    out.push('\n');

    out.push_str(&heading(&format!("Blood Group Distribution ({scope})")));
    out.push_str(&render_chart(snapshot.chart()));
    out.push('\n');

    out.push_str(&heading(&format!("Donor Locations ({scope})")));
    out.push_str(&render_map(snapshot.map()));
    Ok(out)
}

/// Render the selector options.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn render_catalog(catalog: &FacetCatalog, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(catalog)?);
    }
    Ok(format!(
        "Cities:       {}\nBlood groups: {}\n",
        catalog.cities().join(", "),
        catalog.blood_groups().join(", ")
    ))
}

/// Render a bucket list as a horizontal bar chart.
///
/// Bars are one `#` per donor until the largest count exceeds
/// `MAX_BAR_WIDTH`, then proportional with non-zero counts kept visible.
#[must_use]
pub fn render_buckets(buckets: &[AggregationBucket]) -> String {
    let key_width = buckets
        .iter()
        .map(|b| b.key.chars().count())
        .max()
        .unwrap_or(0);
    let max_count = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let count_width = buckets
        .iter()
        .map(|b| b.count.to_string().len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for bucket in buckets {
        let _ = writeln!(
            out,
            "{:<key_width$}  {:>count_width$}  {}",
            bucket.key,
            bucket.count,
            "#".repeat(bar_length(bucket.count, max_count))
        );
    }
    out
}

fn bar_length(count: usize, max_count: usize) -> usize {
    if max_count <= MAX_BAR_WIDTH {
        count
    } else {
        (count * MAX_BAR_WIDTH).div_ceil(max_count)
    }
}

fn heading(title: &str) -> String {
    format!("{title}\n{}\n", "-".repeat(title.chars().count()))
}

fn placeholder<T>(panel: &Panel<'_, T>, empty: &str) -> Option<String> {
    match panel {
        Panel::Loading => Some(format!("{LOADING_MESSAGE}\n")),
        Panel::Unavailable(reason) => Some(format!("Donor data unavailable: {reason}\n")),
        Panel::Empty => Some(format!("{empty}\n")),
        Panel::Content(_) => None,
    }
}

fn render_table(panel: Panel<'_, TableView>, format: OutputFormat) -> String {
    if let Some(text) = placeholder(&panel, NO_DONORS_MESSAGE) {
        // The caption still counts zero rows when loaded.
        return match panel {
            Panel::Empty => format!("Showing 0 donors matching your criteria\n{text}"),
            _ => text,
        };
    }
    let Panel::Content(table) = panel else {
        return String::new();
    };

    let mut out = format!("{}\n", table.caption());
    match format {
        OutputFormat::Table => out.push_str(&aligned_rows(&table.rows)),
        _ => {
            for donor in &table.rows {
                let _ = writeln!(out, "- {}", row_cells(donor).join(" | "));
            }
        }
    }
    out
}

fn row_cells(donor: &DonorRecord) -> [String; 5] {
    [
        donor.name().to_string(),
        donor.blood_group().to_string(),
        donor.contact().to_string(),
        donor.last_donation().to_string(),
        donor.address().to_string(),
    ]
}

fn aligned_rows(rows: &[DonorRecord]) -> String {
    let cells: Vec<[String; 5]> = rows.iter().map(row_cells).collect();
    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |values: &[&str]| {
        values
            .iter()
            .zip(widths)
            .map(|(value, width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(&TABLE_HEADERS[..]));
    let _ = writeln!(out, "{}", widths.map(|w| "-".repeat(w)).join("  "));
    for row in &cells {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}", line(&values[..]));
    }
    out
}

fn render_chart(panel: Panel<'_, ChartView>) -> String {
    if let Some(text) = placeholder(&panel, NO_CHART_MESSAGE) {
        return text;
    }
    match panel {
        Panel::Content(chart) => render_buckets(&chart.buckets),
        _ => String::new(),
    }
}

fn render_map(panel: Panel<'_, MapView>) -> String {
    if let Some(text) = placeholder(&panel, "") {
        return text;
    }
    let Panel::Content(map) = panel else {
        return String::new();
    };

    let mut out = format!(
        "Center: {}  Zoom: {}\nMarkers: {}\n",
        map.viewport.center(),
        map.viewport.zoom(),
        map.markers.len()
    );
    for marker in &map.markers {
        let _ = writeln!(
            out,
            "  {} ({}) @ {}",
            marker.label, marker.popup.blood_group, marker.coordinates
        );
    }
    out
}
