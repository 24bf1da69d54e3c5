//! HTML report assembly.
//!
//! The report only references artifacts by their file names, so it must be
//! written into the same directory as the artifacts.

use std::fmt::Write as FmtWrite;
use std::path::Path;

use chrono::{DateTime, Local};

use super::pipeline::{FileReport, SegmentArtifacts};
use crate::core::writers::{write_text, Result};
use crate::visualization::{escape_html, PlotExtents};

/// Default report title.
pub const REPORT_TITLE: &str = "Spectrum Analysis Report";

const AUTOCORR_NOTE: &str = "The autocorrelation function shows how strongly the \
signal at one moment is related to the signal a given lag later.";

const SPECTRUM_NOTE: &str = "The power spectrum shows how the signal power is \
distributed over frequency. Higher dB values mean more power at that frequency.";

/// Collects per-file artifacts and renders them as one HTML document.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    title: String,
    files: Vec<FileReport>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(REPORT_TITLE)
    }
}

impl ReportBuilder {
    /// Creates an empty report with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            files: Vec::new(),
        }
    }

    /// Appends one file section. Files without any artifact are dropped.
    pub fn add_file(&mut self, report: FileReport) {
        if report.has_artifacts() {
            self.files.push(report);
        }
    }

    /// Number of file sections.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no file section was added.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Render the document with the given generation time.
    pub fn render(&self, generated_at: &DateTime<Local>) -> String {
        let mut html = String::with_capacity(4096 + self.files.len() * 4096);
        let title = escape_html(&self.title);

        // Writing into a String cannot fail
        let _ = writeln!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
             <title>{}</title>\n</head>\n<body>",
            title
        );
        let _ = writeln!(html, "<h1>{}</h1>", title);
        let _ = writeln!(
            html,
            "<p>Generated: {}</p>",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        );

        for file in &self.files {
            render_file_section(&mut html, file);
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Render with the current local time and write to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_text(path, &self.render(&Local::now()))
    }
}

fn render_file_section(html: &mut String, file: &FileReport) {
    let name = escape_html(&file.file_name);
    let anchor = anchor_id(&file.file_name);
    let _ = writeln!(html, "<div class=\"file-section\">");
    let _ = writeln!(html, "  <h2>Data file: {}</h2>", name);

    for segment in &file.segments {
        render_segment(html, &name, &anchor, segment);
    }

    let _ = writeln!(html, "</div>");
}

fn render_segment(html: &mut String, file_name: &str, anchor: &str, segment: &SegmentArtifacts) {
    let n = segment.index;
    let _ = writeln!(html, "  <div class=\"segment\" id=\"{}-pcal{}\">", anchor, n);
    let _ = writeln!(
        html,
        "    <h3>Autocorrelation function {} of {} ({} samples)</h3>",
        n, file_name, segment.samples
    );

    if let Some(png) = &segment.autocorr_png {
        let _ = writeln!(html, "    <p><strong>Autocorrelation function {}:</strong></p>", n);
        let _ = writeln!(
            html,
            "    <img src=\"{}\" alt=\"Autocorrelation {}\" width=\"800\">",
            escape_html(png),
            n
        );
        if let Some(extents) = &segment.autocorr_extents {
            let _ = writeln!(
                html,
                "    <p class=\"extents\">{}</p>",
                describe_extents("lag", "value", extents)
            );
        }
    }

    if let Some(png) = &segment.spectrum_png {
        let _ = writeln!(html, "    <p><strong>Power spectrum {}:</strong></p>", n);
        let _ = writeln!(
            html,
            "    <img src=\"{}\" alt=\"Power spectrum {}\" width=\"800\">",
            escape_html(png),
            n
        );
        if let Some(extents) = &segment.spectrum_extents {
            let _ = writeln!(
                html,
                "    <p class=\"extents\">{}</p>",
                describe_extents("frequency (Hz)", "power (dB)", extents)
            );
        }
    }

    if let Some(page) = &segment.interactive_html {
        let _ = writeln!(
            html,
            "    <p><strong>Interactive power spectrum {}:</strong> \
             <a href=\"{}\" target=\"_blank\">Open</a></p>",
            n,
            escape_html(page)
        );
    }

    let mut data_links = Vec::with_capacity(2);
    if let Some(file) = &segment.autocorr_data {
        data_links.push(format!("<a href=\"{}\">autocorrelation data</a>", escape_html(file)));
    }
    if let Some(file) = &segment.spectrum_data {
        data_links.push(format!("<a href=\"{}\">spectrum data</a>", escape_html(file)));
    }
    if !data_links.is_empty() {
        let _ = writeln!(html, "    <p>Data: {}</p>", data_links.join(" | "));
    }

    let _ = writeln!(html, "    <p>{}</p>", SPECTRUM_NOTE);
    let _ = writeln!(html, "    <p>{}</p>", AUTOCORR_NOTE);
    let _ = writeln!(html, "    <hr>");
    let _ = writeln!(html, "  </div>");
}

/// Element id built from a file name: ASCII letters, digits, `-`, `_` and `.`
/// are kept, anything else becomes `_`.
fn anchor_id(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn describe_extents(x_label: &str, y_label: &str, extents: &PlotExtents) -> String {
    format!(
        "{} {:.3} to {:.3}; {} {:.4e} to {:.4e}",
        x_label, extents.x_min, extents.x_max, y_label, extents.y_min, extents.y_max
    )
}
