use crate::model::{LicenseReport, Violation};
use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct LicenseRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "License")]
    license: String,
    #[tabled(rename = "Repository")]
    url: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
}

pub fn print_cli_table(report: &LicenseReport) -> Result<()> {
    println!();

    if report.entries.is_empty() {
        println!("No direct dependencies found.");
        return Ok(());
    }

    println!("Found {} direct dependencies:", report.entries.len());
    println!();

    let rows: Vec<LicenseRow> = report
        .entries
        .iter()
        .map(|e| LicenseRow {
            name: truncate(&e.name, 40),
            version: e.version.clone(),
            license: e.license.clone(),
            url: truncate(&e.url, 60),
            vendor: if e.vendor_name.is_empty() {
                "-".to_string()
            } else {
                truncate(&e.vendor_name, 30)
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    println!();
    println!("Licenses: {}", license_summary(report).join(", "));

    Ok(())
}

/// License counts, most common first.
fn license_summary(report: &LicenseReport) -> Vec<String> {
    let mut by_license: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in &report.entries {
        *by_license.entry(entry.license.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<_> = by_license.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(license, count)| format!("{} {}", count, license))
        .collect()
}

/// Title printed above the license check results.
pub const CHECK_TITLE: &str = "Swan license check";

pub fn print_check_banner() {
    for line in check_banner() {
        println!("{}", line);
    }
}

fn check_banner() -> [String; 4] {
    [
        "---".white().to_string(),
        CHECK_TITLE.green().to_string(),
        "---".white().to_string(),
        String::new(),
    ]
}

/// Prints each violation on stderr, or a success line when there are none.
pub fn print_check_outcome(violations: &[Violation]) {
    if violations.is_empty() {
        println!("{}", "All good!".green());
        return;
    }

    for v in violations {
        eprintln!(
            "{}@{} has unauthorized license {}",
            v.name.blue(),
            v.version.bright_black(),
            v.license.red()
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
