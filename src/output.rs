//! Output formatting and persistence for chart data.
//!
//! Supports pretty-printing, JSON serialization, CSV files and a plain-text table.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

use crate::aggregate::types::ChartData;

/// Logs chart data using Rust's debug pretty-print format.
pub fn print_pretty(data: &ChartData) {
    debug!("{:#?}", data);
}

/// Chart data as pretty-printed JSON.
pub fn to_json(data: &ChartData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Writes chart data as pretty-printed JSON to `out`.
pub fn print_json(data: &ChartData, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", to_json(data)?)?;
    Ok(())
}

/// A rate as `12.34%`, or an em dash when there is none.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{v:.2}%"),
        _ => "—".to_string(),
    }
}

/// Variation keys in column order, each listed once.
fn column_keys(data: &ChartData) -> Vec<&str> {
    let mut keys: Vec<&str> = Vec::with_capacity(data.variations.len());
    for v in &data.variations {
        if !keys.contains(&v.key.as_str()) {
            keys.push(&v.key);
        }
    }
    keys
}

/// Writes one CSV row per chart point: `timestamp,label,<key>...`.
///
/// Null rates are written as empty cells.
pub fn write_points_csv(path: &str, data: &ChartData) -> Result<()> {
    debug!(path, points = data.points.len(), "Writing CSV");

    let file = File::create(path).with_context(|| format!("Failed to create '{path}'"))?;
    write_points_csv_to(file, data)?;

    info!(path, "CSV written");
    Ok(())
}

pub fn write_points_csv_to(out: impl Write, data: &ChartData) -> Result<()> {
    let keys = column_keys(data);
    let mut writer = WriterBuilder::new().from_writer(out);

    let mut header = vec!["timestamp", "label"];
    header.extend(keys.iter().copied());
    writer.write_record(&header)?;

    for point in &data.points {
        let mut record = vec![point.timestamp.to_string(), point.label.clone()];
        record.extend(
            keys.iter()
                .map(|k| point.value(k).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Renders chart data as an aligned text table with a `leader` column.
pub fn render_table(data: &ChartData) -> String {
    let keys = column_keys(data);

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(data.points.len() + 1);
    let mut header = vec!["label".to_string()];
    header.extend(keys.iter().map(|k| k.to_string()));
    header.push("leader".to_string());
    rows.push(header);

    for point in &data.points {
        let mut row = vec![point.label.clone()];
        row.extend(keys.iter().map(|k| format_percent(point.value(k))));
        let leaders = point.leaders();
        row.push(if leaders.is_empty() {
            "—".to_string()
        } else {
            leaders.join(", ")
        });
        rows.push(row);
    }

    let columns = rows[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|i| rows.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
        .collect();

    let mut table = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        table.push_str(line.join("  ").trim_end());
        table.push('\n');
    }
    table
}
