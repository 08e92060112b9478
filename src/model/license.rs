use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column names used when the package manager does not provide any.
pub const DEFAULT_HEAD: [&str; 6] = ["Name", "Version", "License", "URL", "VendorUrl", "VendorName"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseEntry {
    pub name: String,
    pub version: String,
    pub license: String,
    pub url: String,
    pub vendor_url: String,
    pub vendor_name: String,
}

impl LicenseEntry {
    pub fn new(name: impl Into<String>, version: impl Into<String>, license: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            license: license.into(),
            url: String::new(),
            vendor_url: String::new(),
            vendor_name: String::new(),
        }
    }

    pub fn with_urls(mut self, url: impl Into<String>, vendor_url: impl Into<String>) -> Self {
        self.url = url.into();
        self.vendor_url = vendor_url.into();
        self
    }

    pub fn with_vendor(mut self, vendor_name: impl Into<String>) -> Self {
        self.vendor_name = vendor_name.into();
        self
    }

    /// The six columns in report order.
    pub fn columns(&self) -> [&str; 6] {
        [
            &self.name,
            &self.version,
            &self.license,
            &self.url,
            &self.vendor_url,
            &self.vendor_name,
        ]
    }
}

impl From<[String; 6]> for LicenseEntry {
    fn from([name, version, license, url, vendor_url, vendor_name]: [String; 6]) -> Self {
        Self {
            name,
            version,
            license,
            url,
            vendor_url,
            vendor_name,
        }
    }
}

impl std::fmt::Display for LicenseEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// License table as printed by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseTable {
    pub head: Vec<String>,
    pub body: Vec<LicenseEntry>,
}

impl LicenseTable {
    pub fn new(body: Vec<LicenseEntry>) -> Self {
        Self {
            head: DEFAULT_HEAD.iter().map(|h| h.to_string()).collect(),
            body,
        }
    }
}

/// Direct, third-party dependencies of the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseReport {
    pub head: Vec<String>,
    pub entries: Vec<LicenseEntry>,
    pub generated_at: DateTime<Utc>,
}

impl LicenseReport {
    pub fn new(head: Vec<String>, entries: Vec<LicenseEntry>) -> Self {
        Self {
            head,
            entries,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub name: String,
    pub version: String,
    pub license: String,
}

impl From<&LicenseEntry> for Violation {
    fn from(entry: &LicenseEntry) -> Self {
        Self {
            name: entry.name.clone(),
            version: entry.version.clone(),
            license: entry.license.clone(),
        }
    }
}
