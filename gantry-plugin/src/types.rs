//! Version handling types shared by descriptors and validators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version requirement for slot compatibility checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRequirement {
    /// Version requirement string (e.g. "^1.0", ">=2.0.0")
    pub requirement: String,
    #[serde(skip)]
    parsed: Option<semver::VersionReq>,
}

impl VersionRequirement {
    /// Create a new version requirement
    pub fn new(requirement: impl Into<String>) -> Result<Self, semver::Error> {
        let requirement = requirement.into();
        let parsed = semver::VersionReq::parse(&requirement)?;
        Ok(Self {
            requirement,
            parsed: Some(parsed),
        })
    }

    /// Check if a version matches this requirement
    pub fn matches(&self, version: &semver::Version) -> bool {
        if let Some(ref parsed) = self.parsed {
            parsed.matches(version)
        } else {
            // Try to parse on demand if not already parsed
            semver::VersionReq::parse(&self.requirement)
                .map(|req| req.matches(version))
                .unwrap_or(false)
        }
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.requirement)
    }
}
