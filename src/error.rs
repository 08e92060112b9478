use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while collecting license data from the package manager.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Failed to execute `{command}`. Is it installed?")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected output from `{command}`: {reason}")]
    UnexpectedOutput { command: String, reason: String },

    #[error("Failed to read manifest {}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid deny-list pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
