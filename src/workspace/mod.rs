//! Package manager integration.
//!
//! This module provides the [`PackageManager`] trait, used by the license
//! crawler to discover workspaces and read the license table, and the
//! [`Yarn`] implementation that shells out to `yarn --json`.
//!
//! # Example
//!
//! ```no_run
//! use banking_toolkit::workspace::{direct_dependencies, PackageManager, Yarn};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = Path::new(".");
//!     let locations = Yarn.workspace_locations(root).await?;
//!     let deps = direct_dependencies(root, &locations)?;
//!     println!("{} direct dependencies", deps.len());
//!     Ok(())
//! }
//! ```

mod yarn;

pub use yarn::Yarn;

use crate::error::{CrawlError, Result};
use crate::model::{LicenseTable, PackageManifest};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Source of workspace layout and license metadata.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Returns the human-readable name of this package manager.
    fn name(&self) -> &'static str;

    /// Returns every workspace location, relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be run or its
    /// output cannot be parsed.
    async fn workspace_locations(&self, root: &Path) -> Result<Vec<String>>;

    /// Returns the license table for every installed package.
    async fn license_table(&self, root: &Path) -> Result<LicenseTable>;
}

/// Collects the direct dependency names declared by every workspace.
///
/// Reads `<root>/<location>/package.json` for each location and unions the
/// keys of `dependencies` and `devDependencies`.
pub fn direct_dependencies(root: &Path, locations: &[String]) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();

    for location in locations {
        let path = root.join(location).join("package.json");
        let content = fs::read_to_string(&path).map_err(|source| CrawlError::ManifestRead {
            path: path.clone(),
            source,
        })?;
        let manifest: PackageManifest = serde_json::from_str(&content)
            .map_err(|source| CrawlError::ManifestParse { path: path.clone(), source })?;

        let before = names.len();
        names.extend(manifest.direct_dependency_names().map(str::to_string));
        debug!(
            location = %location,
            added = names.len() - before,
            "Read workspace manifest"
        );
    }

    Ok(names)
}
