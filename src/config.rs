//! Configuration file handling.
//!
//! This module provides loading and saving of banking-toolkit configuration
//! from a TOML file, with environment overrides applied on top.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/banking-toolkit/config.toml`
//! - macOS: `~/Library/Application Support/banking-toolkit/config.toml`
//! - Windows: `%APPDATA%\banking-toolkit\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [licenses]
//! deny_list = ["GPL", "AGPL"]
//! first_party = ["@swan-io/*"]
//! report_file = "LICENSE_REPORT.md"
//!
//! [graphql]
//! base_url = "http://localhost:8080"
//! project_id = "my-project"
//! mode = "multi_project"
//! idless_objects = ["Amount", "Address"]
//! ```
//!
//! # Environment
//!
//! - `SWAN_PROJECT_ID` overrides `graphql.project_id`
//! - `BANKING_URL` overrides `graphql.base_url`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::graphql::{ProjectConfiguration, ProjectMode};

const PROJECT_ID_ENV: &str = "SWAN_PROJECT_ID";
const BASE_URL_ENV: &str = "BANKING_URL";

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use banking_toolkit::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Deny list: {:?}", config.licenses.deny_list);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// License crawler settings.
    pub licenses: LicenseConfig,

    /// Partner GraphQL client settings.
    pub graphql: GraphqlConfig,
}

/// License crawler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// License identifiers that fail `--check`.
    ///
    /// Each entry matches as a whole word, so `GPL` does not match `LGPL`.
    /// Default: `["GPL", "AGPL"]`
    pub deny_list: Vec<String>,

    /// First-party package patterns, excluded from the report and the check.
    ///
    /// Supports glob patterns (e.g., "@swan-io/*").
    pub first_party: Vec<String>,

    /// Report file name, relative to the workspace root.
    ///
    /// Default: "LICENSE_REPORT.md"
    pub report_file: String,
}

impl LicenseConfig {
    /// Check if a package is first-party.
    pub fn is_first_party(&self, package: &str) -> bool {
        self.first_party.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, package)
            } else {
                pattern == package
            }
        })
    }
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            deny_list: vec!["GPL".to_string(), "AGPL".to_string()],
            first_party: vec!["@swan-io/*".to_string()],
            report_file: "LICENSE_REPORT.md".to_string(),
        }
    }
}

/// Partner GraphQL client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphqlConfig {
    /// Origin the `/api/...` paths are resolved against.
    pub base_url: String,

    /// Project the session belongs to, if any.
    pub project_id: Option<String>,

    /// Whether the deployment serves several projects.
    pub mode: ProjectMode,

    /// JSON file listing object types without an identity.
    pub idless_objects_file: Option<PathBuf>,

    /// Additional id-less object types.
    pub idless_objects: Vec<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GraphqlConfig {
    /// Returns the project configuration, if a project id is set.
    pub fn project(&self) -> Option<ProjectConfiguration> {
        self.project_id.as_ref().map(|project_id| ProjectConfiguration {
            project_id: project_id.clone(),
            mode: self.mode,
        })
    }
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            project_id: None,
            mode: ProjectMode::SingleProject,
            idless_objects_file: None,
            idless_objects: Vec::new(),
            timeout_secs: 30,
        }
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    let first = parts[0];
    if !first.is_empty() {
        match remaining.strip_prefix(first) {
            Some(rest) => remaining = rest,
            None => return false,
        }
    }

    let last = parts[parts.len() - 1];
    if !last.is_empty() {
        match remaining.strip_suffix(last) {
            Some(rest) => remaining = rest,
            None => return false,
        }
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }

    true
}

impl Config {
    /// Loads configuration from the default config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment overrides are applied either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`, falling back to defaults when it
    /// doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies environment overrides, read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(project_id) = lookup(PROJECT_ID_ENV).filter(|v| !v.is_empty()) {
            self.graphql.project_id = Some(project_id);
        }
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.graphql.base_url = base_url;
        }
    }

    /// Saves the configuration to the default config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("banking-toolkit")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("react", "react"));
        assert!(!glob_match("react", "react-dom"));
    }

    #[test]
    fn test_glob_match_scoped() {
        assert!(glob_match("@swan-io/*", "@swan-io/lake"));
        assert!(glob_match("@swan-io/*", "@swan-io/boxed"));
        assert!(!glob_match("@swan-io/*", "@urql/core"));
        assert!(!glob_match("@swan-io/*", "swan-io"));
    }

    #[test]
    fn test_glob_match_suffix_and_contains() {
        assert!(glob_match("*-loader", "css-loader"));
        assert!(!glob_match("*-loader", "loader-utils"));
        assert!(glob_match("*graphql*", "@urql/exchange-graphql-cache"));
    }

    #[test]
    fn test_first_party_defaults() {
        let config = LicenseConfig::default();

        assert!(config.is_first_party("@swan-io/lake"));
        assert!(config.is_first_party("@swan-io/shared-business"));
        assert!(!config.is_first_party("react"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.licenses.deny_list, vec!["GPL", "AGPL"]);
        assert_eq!(config.licenses.report_file, "LICENSE_REPORT.md");
        assert_eq!(config.graphql.mode, ProjectMode::SingleProject);
        assert!(config.graphql.project().is_none());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[graphql]
project_id = "acme"
mode = "multi_project"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        let project = config.graphql.project().unwrap();

        assert_eq!(project.project_id, "acme");
        assert_eq!(project.mode, ProjectMode::MultiProject);
        assert_eq!(config.licenses.deny_list, vec!["GPL", "AGPL"]);
    }

    #[test]
    fn test_load_invalid_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "licenses = 3").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("SWAN_PROJECT_ID", "from-env"),
            ("BANKING_URL", "https://banking.example.com"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.graphql.project_id.as_deref(), Some("from-env"));
        assert_eq!(config.graphql.base_url, "https://banking.example.com");
    }

    #[test]
    fn test_empty_environment_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some(String::new()));

        assert!(config.graphql.project_id.is_none());
        assert_eq!(config.graphql.base_url, "http://localhost:8080");
    }
}
