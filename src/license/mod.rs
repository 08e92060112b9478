//! License crawling and deny-list checking.
//!
//! [`crawl`] intersects the package manager's license table with the
//! workspace's direct dependencies, and [`DenyList::check`] flags the
//! licenses that are not allowed.

mod deny;

pub use deny::DenyList;

use crate::config::LicenseConfig;
use crate::error::Result;
use crate::model::{LicenseEntry, LicenseReport};
use crate::workspace::{direct_dependencies, PackageManager};
use std::path::Path;
use tracing::{debug, info};

/// Collects the license rows of every direct, third-party dependency.
///
/// Rows keep the order the package manager reported them in.
pub async fn crawl(
    manager: &dyn PackageManager,
    root: &Path,
    config: &LicenseConfig,
) -> Result<LicenseReport> {
    let locations = manager.workspace_locations(root).await?;
    info!(
        package_manager = manager.name(),
        workspaces = locations.len(),
        "Discovered workspaces"
    );

    let direct = direct_dependencies(root, &locations)?;
    let table = manager.license_table(root).await?;
    debug!(
        direct = direct.len(),
        reported = table.body.len(),
        "Read license table"
    );

    let entries: Vec<LicenseEntry> = table
        .body
        .into_iter()
        .filter(|entry| direct.contains(&entry.name) && !config.is_first_party(&entry.name))
        .map(normalize)
        .collect();

    info!(dependencies = entries.len(), "Collected direct dependency licenses");
    Ok(LicenseReport::new(table.head, entries))
}

/// Strips the `git+` scheme prefix from repository URLs.
fn normalize(mut entry: LicenseEntry) -> LicenseEntry {
    entry.url = strip_git_prefix(&entry.url);
    entry.vendor_url = strip_git_prefix(&entry.vendor_url);
    entry
}

fn strip_git_prefix(url: &str) -> String {
    url.strip_prefix("git+").unwrap_or(url).to_string()
}
