use serde::{Deserialize, Serialize};

/// Whether the deployment serves one project or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectMode {
    #[default]
    SingleProject,
    MultiProject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfiguration {
    pub project_id: String,
    pub mode: ProjectMode,
}

pub const UNAUTHENTICATED_PATH: &str = "/api/unauthenticated";

/// Path of the partner API for the given project configuration.
///
/// Only multi-project deployments scope the API by project.
pub fn partner_path(project: Option<&ProjectConfiguration>) -> String {
    match project {
        Some(ProjectConfiguration {
            project_id,
            mode: ProjectMode::MultiProject,
        }) => format!("/api/projects/{}/partner", project_id),
        _ => "/api/partner".to_string(),
    }
}

/// Path of the login route, flagged as a session expiry.
pub fn login_path(project: Option<&ProjectConfiguration>) -> String {
    match project {
        Some(project) => format!("/projects/{}/login?sessionExpired=true", project.project_id),
        None => "/login?sessionExpired=true".to_string(),
    }
}

/// Joins an absolute path onto a base URL.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
