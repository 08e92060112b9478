use crate::model::LicenseReport;
use anyhow::Result;

pub fn print_json(report: &LicenseReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}
