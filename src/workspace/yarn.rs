use crate::error::{CrawlError, Result};
use crate::model::{LicenseEntry, LicenseTable};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Yarn (classic) workspaces, queried through `yarn --json`.
pub struct Yarn;

/// One line of `yarn --json` output.
#[derive(Deserialize)]
struct JsonLine<T> {
    #[serde(rename = "type")]
    kind: Option<String>,
    data: T,
}

#[derive(Deserialize)]
struct WorkspaceInfo {
    location: String,
}

#[derive(Deserialize)]
struct RawTable {
    head: Vec<String>,
    body: Vec<Vec<String>>,
}

#[async_trait]
impl super::PackageManager for Yarn {
    fn name(&self) -> &'static str {
        "yarn"
    }

    async fn workspace_locations(&self, root: &Path) -> Result<Vec<String>> {
        let stdout = run_yarn(root, &["--json", "workspaces", "info"])?;
        parse_workspaces_info(&stdout)
    }

    async fn license_table(&self, root: &Path) -> Result<LicenseTable> {
        let stdout = run_yarn(root, &["--json", "licenses", "list"])?;
        parse_licenses_list(&stdout)
    }
}

fn yarn_command() -> &'static str {
    if cfg!(target_os = "windows") {
        "yarn.cmd"
    } else {
        "yarn"
    }
}

fn run_yarn(root: &Path, args: &[&str]) -> Result<String> {
    let command = format!("{} {}", yarn_command(), args.join(" "));
    debug!(command = %command, root = %root.display(), "Running package manager");

    let output = Command::new(yarn_command())
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|source| CrawlError::Spawn {
            command: command.clone(),
            source,
        })?;

    // yarn can exit non-zero on warnings while still printing usable JSON
    if !output.status.success() && output.stdout.is_empty() {
        return Err(CrawlError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extracts workspace locations from `yarn --json workspaces info`.
///
/// The `data` field of the log line is itself a JSON document, encoded as a
/// string, mapping workspace names to their info.
fn parse_workspaces_info(stdout: &str) -> Result<Vec<String>> {
    let command = "yarn --json workspaces info";

    // Warnings also carry string data, so keep the first payload that
    // actually decodes as the workspace map.
    let workspaces = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<JsonLine<serde_json::Value>>(line.trim()).ok())
        .filter(|line| matches!(line.kind.as_deref(), None | Some("log")))
        .filter_map(|line| match line.data {
            serde_json::Value::String(data) => Some(data),
            _ => None,
        })
        .chain(
            // Some yarn versions pretty-print the whole document
            serde_json::from_str::<JsonLine<String>>(stdout.trim())
                .ok()
                .map(|line| line.data),
        )
        .find_map(|data| serde_json::from_str::<BTreeMap<String, WorkspaceInfo>>(&data).ok())
        .ok_or_else(|| CrawlError::UnexpectedOutput {
            command: command.to_string(),
            reason: "no workspace data found".to_string(),
        })?;

    Ok(workspaces.into_values().map(|info| info.location).collect())
}

/// Extracts the license table from `yarn --json licenses list`.
///
/// Only the last line carries the table; earlier lines are progress output.
fn parse_licenses_list(stdout: &str) -> Result<LicenseTable> {
    let command = "yarn --json licenses list";

    let last = stdout
        .trim()
        .lines()
        .last()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| CrawlError::UnexpectedOutput {
            command: command.to_string(),
            reason: "empty output".to_string(),
        })?;

    let line: JsonLine<RawTable> =
        serde_json::from_str(last).map_err(|e| CrawlError::UnexpectedOutput {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(kind) = line.kind.as_deref() {
        if kind != "table" {
            return Err(CrawlError::UnexpectedOutput {
                command: command.to_string(),
                reason: format!("expected a table, got `{}`", kind),
            });
        }
    }

    let body = line
        .data
        .body
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            let columns: [String; 6] = std::array::from_fn(|_| cells.next().unwrap_or_default());
            LicenseEntry::from(columns)
        })
        .collect();

    Ok(LicenseTable {
        head: line.data.head,
        body,
    })
}
