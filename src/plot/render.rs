//! The five chart routines. Each one is an independent branch into
//! plotters; they share only axis bounds, tick configuration, and the
//! label formatter.

use std::cmp::Ordering;
use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::DeckError;
use crate::plot::PlotKind;
use crate::table::DataTable;

const SINGLE: (u32, u32) = (1000, 600);
const DUAL: (u32, u32) = (1400, 600);
const GRID: (u32, u32) = (1000, 1000);
const TICKS: usize = 10;
const BINS: usize = 10;

pub(crate) fn render_to(
    path: &Path,
    table: &DataTable,
    x: &str,
    y: &str,
    kind: PlotKind,
) -> Result<(), DeckError> {
    match kind {
        PlotKind::Scatter => {
            let pairs = table.numeric_pairs(x, y)?;
            let root = BitMapBackend::new(path, SINGLE).into_drawing_area();
            root.fill(&WHITE).map_err(DeckError::plot)?;
            scatter_on(
                &root,
                &pairs,
                x,
                y,
                Some(&format!("Scatter Plot of {x} vs {y}")),
            )?;
            root.present().map_err(DeckError::plot)
        }
        PlotKind::Line => {
            let mut pairs = table.numeric_pairs(x, y)?;
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            let root = BitMapBackend::new(path, SINGLE).into_drawing_area();
            root.fill(&WHITE).map_err(DeckError::plot)?;
            line_on(&root, &pairs, x, y)?;
            root.present().map_err(DeckError::plot)
        }
        PlotKind::Histogram => {
            let xs = table.numeric_column(x)?;
            let ys = table.numeric_column(y)?;
            let root = BitMapBackend::new(path, DUAL).into_drawing_area();
            root.fill(&WHITE).map_err(DeckError::plot)?;
            let halves = root.split_evenly((1, 2));
            histogram_on(&halves[0], &xs, x)?;
            histogram_on(&halves[1], &ys, y)?;
            root.present().map_err(DeckError::plot)
        }
        PlotKind::BoxPlot => {
            let xs = table.numeric_column(x)?;
            let ys = table.numeric_column(y)?;
            let root = BitMapBackend::new(path, DUAL).into_drawing_area();
            root.fill(&WHITE).map_err(DeckError::plot)?;
            let halves = root.split_evenly((1, 2));
            boxplot_on(&halves[0], &xs, x)?;
            boxplot_on(&halves[1], &ys, y)?;
            root.present().map_err(DeckError::plot)
        }
        PlotKind::Pair => {
            let pairs = table.numeric_pairs(x, y)?;
            let flipped: Vec<(f64, f64)> = pairs.iter().map(|&(a, b)| (b, a)).collect();
            let xs = table.numeric_column(x)?;
            let ys = table.numeric_column(y)?;
            let root = BitMapBackend::new(path, GRID).into_drawing_area();
            root.fill(&WHITE).map_err(DeckError::plot)?;
            let cells = root.split_evenly((2, 2));
            histogram_on(&cells[0], &xs, x)?;
            scatter_on(&cells[1], &flipped, y, x, None)?;
            scatter_on(&cells[2], &pairs, x, y, None)?;
            histogram_on(&cells[3], &ys, y)?;
            root.present().map_err(DeckError::plot)
        }
    }
}

fn scatter_on<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    pairs: &[(f64, f64)],
    x: &str,
    y: &str,
    caption: Option<&str>,
) -> Result<(), DeckError> {
    let xr = padded(bounds(pairs.iter().map(|p| p.0)));
    let yr = padded(bounds(pairs.iter().map(|p| p.1)));

    let mut builder = ChartBuilder::on(area);
    builder.margin(10).x_label_area_size(40).y_label_area_size(50);
    if let Some(title) = caption {
        builder.caption(title, ("sans-serif", 24).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d(xr, yr)
        .map_err(DeckError::plot)?;

    chart
        .configure_mesh()
        .x_desc(x)
        .y_desc(y)
        .x_labels(TICKS)
        .y_labels(TICKS)
        .x_label_formatter(&fmt_tick)
        .y_label_formatter(&fmt_tick)
        .draw()
        .map_err(DeckError::plot)?;

    chart
        .draw_series(pairs.iter().map(|&(px, py)| Circle::new((px, py), 3, BLUE.filled())))
        .map_err(DeckError::plot)?;
    Ok(())
}

fn line_on<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    pairs: &[(f64, f64)],
    x: &str,
    y: &str,
) -> Result<(), DeckError> {
    let xr = padded(bounds(pairs.iter().map(|p| p.0)));
    let yr = padded(bounds(pairs.iter().map(|p| p.1)));

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("Line Plot of {x} vs {y}"),
            ("sans-serif", 24).into_font(),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(xr, yr)
        .map_err(DeckError::plot)?;

    chart
        .configure_mesh()
        .x_desc(x)
        .y_desc(y)
        .x_labels(TICKS)
        .y_labels(TICKS)
        .x_label_formatter(&fmt_tick)
        .y_label_formatter(&fmt_tick)
        .draw()
        .map_err(DeckError::plot)?;

    chart
        .draw_series(LineSeries::new(pairs.iter().copied(), &BLUE))
        .map_err(DeckError::plot)?;
    Ok(())
}

fn histogram_on<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
    name: &str,
) -> Result<(), DeckError> {
    let (min, max) = bounds(values.iter().copied());
    let binned = bin(values, min, max);
    let peak = binned.iter().map(|&(_, count)| count).max().unwrap_or(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Histogram of {name}"), ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(padded((min, max)), 0.0..peak * 1.1)
        .map_err(DeckError::plot)?;

    chart
        .configure_mesh()
        .x_desc(name)
        .y_desc("count")
        .x_labels(TICKS)
        .y_labels(TICKS)
        .x_label_formatter(&fmt_tick)
        .y_label_formatter(&fmt_tick)
        .draw()
        .map_err(DeckError::plot)?;

    chart
        .draw_series(binned.iter().map(|&((lo, hi), count)| {
            Rectangle::new([(lo, 0.0), (hi, count as f64)], BLUE.mix(0.5).filled())
        }))
        .map_err(DeckError::plot)?;
    chart
        .draw_series(
            binned
                .iter()
                .map(|&((lo, hi), count)| Rectangle::new([(lo, 0.0), (hi, count as f64)], BLUE)),
        )
        .map_err(DeckError::plot)?;
    Ok(())
}

fn boxplot_on<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    values: &[f64],
    name: &str,
) -> Result<(), DeckError> {
    let (min, q1, median, q3, max) = five_number_summary(values);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Box Plot of {name}"), ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..2.0, padded((min, max)))
        .map_err(DeckError::plot)?;

    chart
        .configure_mesh()
        .x_desc(name)
        .y_desc("value")
        .x_labels(0)
        .y_labels(TICKS)
        .y_label_formatter(&fmt_tick)
        .draw()
        .map_err(DeckError::plot)?;

    // whisker, caps, box fill, box border, median line
    chart
        .draw_series([
            PathElement::new(vec![(1.0, min), (1.0, max)], BLACK),
            PathElement::new(vec![(0.85, min), (1.15, min)], BLACK),
            PathElement::new(vec![(0.85, max), (1.15, max)], BLACK),
        ])
        .map_err(DeckError::plot)?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(0.7, q1), (1.3, q3)],
            BLUE.mix(0.35).filled(),
        )))
        .map_err(DeckError::plot)?;
    chart
        .draw_series(std::iter::once(Rectangle::new([(0.7, q1), (1.3, q3)], BLUE)))
        .map_err(DeckError::plot)?;
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(0.7, median), (1.3, median)],
            BLACK,
        )))
        .map_err(DeckError::plot)?;
    Ok(())
}

/// Shared tick-label formatter: integers print bare, everything else with
/// two decimals.
fn fmt_tick(v: &f64) -> String {
    if v.fract().abs() < 1e-9 && v.abs() < 1e9 {
        format!("{}", *v as i64)
    } else {
        format!("{v:.2}")
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    (min, max)
}

fn padded((min, max): (f64, f64)) -> Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span == 0.0 {
        return (min - 1.0)..(max + 1.0);
    }
    let margin = span * 0.05;
    (min - margin)..(max + margin)
}

/// Equal-width bins over [min, max]; the top edge is inclusive.
fn bin(values: &[f64], min: f64, max: f64) -> Vec<((f64, f64), usize)> {
    let span = max - min;
    let (min, width) = if span == 0.0 {
        (min - 0.5, 1.0 / BINS as f64)
    } else {
        (min, span / BINS as f64)
    };
    let mut counts = vec![0usize; BINS];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(BINS - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lo = min + width * i as f64;
            ((lo, lo + width), count)
        })
        .collect()
}

/// Minimum, quartiles by linear interpolation, maximum.
fn five_number_summary(values: &[f64]) -> (f64, f64, f64, f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let pct = |p: f64| -> f64 {
        let rank = p * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    };
    (
        sorted[0],
        pct(0.25),
        pct(0.5),
        pct(0.75),
        sorted[sorted.len() - 1],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_formatter_trims_integers() {
        assert_eq!(fmt_tick(&4.0), "4");
        assert_eq!(fmt_tick(&4.25), "4.25");
        assert_eq!(fmt_tick(&-0.5), "-0.50");
    }

    #[test]
    fn bins_cover_the_full_range() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let binned = bin(&values, 0.0, 10.0);
        assert_eq!(binned.len(), BINS);
        let total: usize = binned.iter().map(|&(_, c)| c).sum();
        assert_eq!(total, values.len());
        // the max lands in the last (inclusive) bin
        assert!(binned[BINS - 1].1 >= 1);
    }

    #[test]
    fn quartiles_interpolate() {
        let (min, q1, med, q3, max) = five_number_summary(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(min, 1.0);
        assert_eq!(q1, 1.75);
        assert_eq!(med, 2.5);
        assert_eq!(q3, 3.25);
        assert_eq!(max, 4.0);
    }

    #[test]
    fn degenerate_range_still_pads() {
        let r = padded((3.0, 3.0));
        assert!(r.start < 3.0 && r.end > 3.0);
    }
}
