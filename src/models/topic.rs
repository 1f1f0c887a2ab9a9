//! Monitoring topic definition.

use serde::{Deserialize, Serialize};

/// One configured monitoring target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    /// Unique display name, also used to derive the state file name
    #[serde(rename = "topic", default)]
    pub name: String,

    /// Results page to poll
    #[serde(default)]
    pub url: String,

    /// Disabled topics are skipped by scans
    #[serde(default)]
    pub disabled: bool,
}

impl Topic {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            disabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// File stem of this topic's state file.
    pub fn storage_key(&self) -> String {
        storage_key(&self.name)
    }
}

/// Normalize a topic name into a state file stem.
///
/// Whitespace and path separators become `_`. Distinct names can map to the
/// same key; `Config::validate` rejects such configurations.
pub fn storage_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}
