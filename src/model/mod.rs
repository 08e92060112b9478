//! Core data types for license crawling.
//!
//! - [`LicenseEntry`] - One dependency row reported by the package manager
//! - [`LicenseTable`] - The raw license table (head + rows)
//! - [`LicenseReport`] - Direct, third-party dependencies after filtering
//! - [`Violation`] - An entry whose license is on the deny list
//! - [`PackageManifest`] - The parts of a `package.json` we read
//!
//! # Example
//!
//! ```
//! use banking_toolkit::model::LicenseEntry;
//!
//! let entry = LicenseEntry::new("react", "18.3.1", "MIT");
//! assert_eq!(entry.to_string(), "react@18.3.1");
//! ```

mod license;
mod manifest;

pub use license::*;
pub use manifest::*;
