mod cli;
mod json;
mod markdown;

pub use cli::{print_check_banner, print_check_outcome, print_cli_table};
pub use json::print_json;
pub use markdown::{render_markdown, write_markdown};

use crate::model::LicenseReport;
use anyhow::Result;

/// Output format for the license listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
    /// The markdown report, printed instead of written
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!(
                "Unknown format: {}. Use 'table', 'json', or 'markdown'",
                s
            )),
        }
    }
}

pub fn print_report(report: &LicenseReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report),
        OutputFormat::Json => print_json(report),
        OutputFormat::Markdown => {
            print!("{}", render_markdown(report));
            Ok(())
        }
    }
}
