//! Plot rendering for autocorrelation and spectrum data.
//!
//! Static PNGs are drawn with the plotters bitmap backend. The crate is built
//! without a font backend, so the charts carry no captions or tick labels;
//! the numeric extents are returned to the caller and shown next to the image
//! in the report. Interactive pages live in [`interactive`].

pub mod interactive;

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::core::transforms::SymmetrizedAutocorrelation;
use crate::core::writers::{ensure_parent_dirs, WriteError};

pub use interactive::{render_interactive_spectrum, write_interactive_spectrum};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to plot")]
    EmptySeries,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Default plot width in pixels.
const DEFAULT_WIDTH: u32 = 1000;

/// Default plot height in pixels.
const DEFAULT_HEIGHT: u32 = 600;

const AUTOCORR_COLOR: RGBColor = RGBColor(31, 119, 180);
const SPECTRUM_COLOR: RGBColor = RGBColor(214, 39, 40);
const BASELINE_COLOR: RGBColor = RGBColor(160, 160, 160);
const LIGHT_GRID_COLOR: RGBColor = RGBColor(235, 235, 235);
const BOLD_GRID_COLOR: RGBColor = RGBColor(210, 210, 210);

/// Data bounds of a plotted series, before padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotExtents {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Plot the symmetrized autocorrelation (lag vs value) and save as PNG.
///
/// A grey baseline marks zero.
pub fn plot_autocorrelation(
    output_path: &Path,
    autocorr: &SymmetrizedAutocorrelation,
) -> Result<PlotExtents> {
    let points: Vec<(f64, f64)> = autocorr
        .points()
        .map(|(lag, value)| (lag as f64, value))
        .collect();
    draw_line_chart(output_path, &points, AUTOCORR_COLOR, Some(0.0))
}

/// Plot spectrum points (frequency vs dB) and save as PNG.
///
/// `points` should come from `PowerSpectrum::display_points`, the same series
/// the interactive page receives.
pub fn plot_spectrum(output_path: &Path, points: &[(f64, f64)]) -> Result<PlotExtents> {
    draw_line_chart(output_path, points, SPECTRUM_COLOR, None)
}

fn draw_line_chart(
    output_path: &Path,
    points: &[(f64, f64)],
    color: RGBColor,
    baseline: Option<f64>,
) -> Result<PlotExtents> {
    if points.is_empty() {
        return Err(VisualizationError::EmptySeries);
    }
    ensure_parent_dirs(output_path)?;

    let extents = compute_bounds(points);
    let (x_min, x_max) = widen(extents.x_min, extents.x_max);
    let (y_min, y_max) = widen(extents.y_min, extents.y_max);
    let y_padding = (y_max - y_min) * 0.05;

    // NaN never updates the bounds, and an infinite range hangs the mesh
    let ranges = [x_min, x_max, y_min - y_padding, y_max + y_padding];
    if !ranges.iter().all(|v| v.is_finite()) || x_min > x_max || y_min > y_max {
        return Err(VisualizationError::PlottingError(format!(
            "non-finite plot range: x {}..{}, y {}..{}",
            extents.x_min, extents.x_max, extents.y_min, extents.y_max
        )));
    }

    let root = BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT))
        .into_drawing_area();

    root.fill(&WHITE).map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    // No label areas: nothing here needs a font
    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .build_cartesian_2d(x_min..x_max, (y_min - y_padding)..(y_max + y_padding))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .light_line_style(&LIGHT_GRID_COLOR)
        .bold_line_style(&BOLD_GRID_COLOR)
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    if let Some(level) = baseline {
        chart
            .draw_series(LineSeries::new(
                vec![(x_min, level), (x_max, level)],
                &BASELINE_COLOR,
            ))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
    }

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &color))
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present().map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(extents)
}

/// Compute the bounds (min/max) for x and y coordinates.
fn compute_bounds(points: &[(f64, f64)]) -> PlotExtents {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for &(x, y) in points {
        if x < x_min { x_min = x; }
        if x > x_max { x_max = x; }
        if y < y_min { y_min = y; }
        if y > y_max { y_max = y; }
    }

    PlotExtents { x_min, x_max, y_min, y_max }
}

/// Give a degenerate axis a unit span so the chart has a valid range.
fn widen(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

/// Escape text for HTML element content and attribute values.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
