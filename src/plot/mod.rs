//! Plot dispatch: a numeric plot-type code selects one of five fixed chart
//! routines, rendered with plotters into the results directory.

pub mod render;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::DeckError;
use crate::table::DataTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Scatter,
    Line,
    Histogram,
    BoxPlot,
    Pair,
}

impl PlotKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PlotKind::Scatter),
            2 => Some(PlotKind::Line),
            3 => Some(PlotKind::Histogram),
            4 => Some(PlotKind::BoxPlot),
            5 => Some(PlotKind::Pair),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            PlotKind::Scatter => 1,
            PlotKind::Line => 2,
            PlotKind::Histogram => 3,
            PlotKind::BoxPlot => 4,
            PlotKind::Pair => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlotKind::Scatter => "Scatter Plot",
            PlotKind::Line => "Line Plot",
            PlotKind::Histogram => "Histogram",
            PlotKind::BoxPlot => "Box Plot",
            PlotKind::Pair => "Pair Plot",
        }
    }

    pub fn all() -> [PlotKind; 5] {
        [
            PlotKind::Scatter,
            PlotKind::Line,
            PlotKind::Histogram,
            PlotKind::BoxPlot,
            PlotKind::Pair,
        ]
    }
}

/// Render the chosen chart and return the generated filename (relative to
/// the results directory).
pub fn render_plot(
    table: &DataTable,
    x: &str,
    y: &str,
    kind: PlotKind,
    csv_path: &Path,
    results_dir: &Path,
) -> Result<String, DeckError> {
    let file = output_filename(csv_path, x, y, kind, Utc::now());
    let out = results_dir.join(&file);
    render::render_to(&out, table, x, y, kind)?;
    Ok(file)
}

/// `<csv-stem>_<x>_vs_<y>_<code>_<timestamp>.png`
pub fn output_filename(
    csv_path: &Path,
    x: &str,
    y: &str,
    kind: PlotKind,
    at: DateTime<Utc>,
) -> String {
    let stem = csv_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    format!(
        "{}_{}_vs_{}_{}_{}.png",
        clean(stem),
        clean(x),
        clean(y),
        kind.code(),
        at.format("%Y%m%d%H%M%S")
    )
}

/// Column names and stems come from user input; squash anything that is not
/// filesystem-safe.
fn clean(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.' || c == '_') {
        "col".to_string()
    } else {
        cleaned
    }
}
