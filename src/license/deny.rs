use crate::error::Result;
use crate::model::{LicenseEntry, Violation};
use regex::Regex;

/// License identifiers that are not allowed, matched as whole words.
#[derive(Debug, Clone)]
pub struct DenyList {
    pattern: Option<Regex>,
}

impl DenyList {
    /// Builds a deny list from license identifiers such as `GPL`.
    ///
    /// An empty list denies nothing.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = names
            .iter()
            // ASCII word boundaries: `éGPL` still counts as `GPL`
            .map(|name| format!(r"(?-u:\b){}(?-u:\b)", regex::escape(name.as_ref())))
            .collect();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&alternatives.join("|"))?)
        };

        Ok(Self { pattern })
    }

    pub fn is_denied(&self, license: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(license))
    }

    /// Returns every entry whose license is denied, in input order.
    pub fn check(&self, entries: &[LicenseEntry]) -> Vec<Violation> {
        entries
            .iter()
            .filter(|entry| self.is_denied(&entry.license))
            .map(Violation::from)
            .collect()
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_ref().map(Regex::as_str).unwrap_or_default()
    }
}
