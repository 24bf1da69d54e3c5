//! Standalone interactive spectrum pages.
//!
//! The page loads plotly.js from its CDN and embeds the series as JSON, so it
//! opens straight from disk with pan and zoom.

use std::path::Path;

use serde::Serialize;

use super::{escape_html, Result, VisualizationError};
use crate::core::writers::write_text;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Serialize)]
struct Trace<'a> {
    x: Vec<f64>,
    y: Vec<f64>,
    mode: &'static str,
    name: &'a str,
    line: LineStyle,
}

#[derive(Serialize)]
struct LineStyle {
    color: &'static str,
    width: f64,
}

/// Build the HTML for an interactive spectrum plot.
///
/// `points` are `(frequency, dB)` pairs, the same series as the static plot.
pub fn render_interactive_spectrum(title: &str, points: &[(f64, f64)]) -> Result<String> {
    if points.is_empty() {
        return Err(VisualizationError::EmptySeries);
    }

    let trace = Trace {
        x: points.iter().map(|p| p.0).collect(),
        y: points.iter().map(|p| p.1).collect(),
        mode: "lines",
        name: "Power spectrum",
        line: LineStyle {
            color: "#d62728",
            width: 1.0,
        },
    };

    // "</" inside a script block would end it early
    let data_json = serde_json::to_string(&[trace])?.replace("</", "<\\/");
    let title_json = serde_json::to_string(title)?.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title_html}</title>
    <script src="{cdn}"></script>
    <style>
        html, body {{ margin: 0; height: 100%; font-family: sans-serif; }}
        #spectrum {{ width: 100%; height: 100%; }}
    </style>
</head>
<body>
    <div id="spectrum"></div>
    <script>
        const data = {data_json};
        const layout = {{
            title: {{ text: {title_json} }},
            xaxis: {{ title: {{ text: "Frequency (Hz)" }} }},
            yaxis: {{ title: {{ text: "Power (dB)" }} }},
            dragmode: "pan"
        }};
        Plotly.newPlot("spectrum", data, layout, {{ responsive: true, scrollZoom: true }});
    </script>
</body>
</html>
"#,
        title_html = escape_html(title),
        cdn = PLOTLY_CDN,
        data_json = data_json,
        title_json = title_json,
    ))
}

/// Render and write an interactive spectrum page.
pub fn write_interactive_spectrum(
    output_path: &Path,
    title: &str,
    points: &[(f64, f64)],
) -> Result<()> {
    let html = render_interactive_spectrum(title, points)?;
    write_text(output_path, &html)?;
    Ok(())
}
