use serde::Deserialize;
use std::collections::BTreeMap;

/// The subset of `package.json` the crawler reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: Option<String>,
    pub dependencies: Option<BTreeMap<String, String>>,
    pub dev_dependencies: Option<BTreeMap<String, String>>,
}

impl PackageManifest {
    /// Names from both `dependencies` and `devDependencies`.
    pub fn direct_dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .chain(self.dev_dependencies.iter())
            .flat_map(|deps| deps.keys().map(String::as_str))
    }
}
