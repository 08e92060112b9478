use crate::model::LicenseReport;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Renders the license report as a markdown table.
pub fn render_markdown(report: &LicenseReport) -> String {
    let head = report.head.join(" | ");
    let separator = vec!["---"; report.head.len()].join(" | ");
    let rows = report
        .entries
        .iter()
        .map(|entry| entry.columns().join(" | "))
        .collect::<Vec<_>>()
        .join("\n");

    format!("# License report\n\n{}\n{}\n{}\n", head, separator, rows)
}

/// Writes the markdown report to `path`, replacing any previous report.
pub fn write_markdown(report: &LicenseReport, path: &Path) -> Result<()> {
    fs::write(path, render_markdown(report))
        .with_context(|| format!("Failed to write {}", path.display()))
}
