pub mod config;
pub mod error;
pub mod graphql;
pub mod license;
pub mod logger;
pub mod model;
pub mod output;
pub mod workspace;

pub use config::Config;
pub use error::CrawlError;
pub use model::{LicenseEntry, LicenseReport, LicenseTable, Violation};
pub use workspace::{PackageManager, Yarn};
