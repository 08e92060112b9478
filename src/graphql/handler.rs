use super::endpoint::{join_url, login_path, ProjectConfiguration};
use super::error::CombinedError;
use super::operation::Operation;
use std::sync::Arc;
use tracing::{error, warn};

/// Where the user is sent when their session expires.
pub trait Navigator: Send + Sync {
    /// Returns true if the user is already on the login route.
    fn is_on_login(&self) -> bool;

    /// Replaces the current location.
    fn replace(&self, location: &str);
}

/// Navigator for terminal sessions: tells the user where to sign in again.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn is_on_login(&self) -> bool {
        false
    }

    fn replace(&self, location: &str) {
        warn!(location = %location, "Session expired, sign in again");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// The session expired; the user is sent to this login URL.
    RedirectToLogin(String),
    /// The session expired but the user is already on the login route.
    AlreadyOnLogin,
    /// Any other failure, reported to the logs.
    Report,
}

/// Decides what happens when an operation fails.
pub struct ErrorHandler {
    login_url: String,
    navigator: Arc<dyn Navigator>,
}

impl ErrorHandler {
    pub fn new(
        base_url: &str,
        project: Option<&ProjectConfiguration>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            login_url: join_url(base_url, &login_path(project)),
            navigator,
        }
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn disposition(&self, error: &CombinedError) -> ErrorDisposition {
        if !error.is_unauthorized() {
            ErrorDisposition::Report
        } else if self.navigator.is_on_login() {
            ErrorDisposition::AlreadyOnLogin
        } else {
            ErrorDisposition::RedirectToLogin(self.login_url.clone())
        }
    }

    pub fn on_error(
        &self,
        error: &CombinedError,
        operation: &Operation,
        request_id: &str,
    ) -> ErrorDisposition {
        let disposition = self.disposition(error);
        match &disposition {
            ErrorDisposition::RedirectToLogin(location) => self.navigator.replace(location),
            ErrorDisposition::AlreadyOnLogin => {}
            ErrorDisposition::Report => log_backend_error(error, operation, request_id),
        }
        disposition
    }
}

pub fn log_backend_error(err: &CombinedError, operation: &Operation, request_id: &str) {
    error!(
        operation = operation.name(),
        kind = operation.kind.as_str(),
        request_id = %request_id,
        status = ?err.response_status,
        "{}",
        err.message()
    );
}
