use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error type for version identifier parsing
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("Invalid version format: '{0}'")]
    InvalidFormat(String),
    #[error("Version parse error: {0}")]
    ParseError(String),
}

/// A plugin version identifier of the form `major.minor.service.qualifier`.
///
/// Missing numeric components default to zero; everything after the third
/// dot is the qualifier. Ordering compares the numeric components first and
/// the qualifier lexicographically last, so `1.0.0.beta` sorts above `1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub service: u32,
    pub qualifier: String,
}

impl PluginVersion {
    /// Creates a new version identifier without a qualifier.
    pub fn new(major: u32, minor: u32, service: u32) -> Self {
        Self {
            major,
            minor,
            service,
            qualifier: String::new(),
        }
    }

    /// Creates a new version identifier with a qualifier.
    pub fn with_qualifier(major: u32, minor: u32, service: u32, qualifier: &str) -> Self {
        Self {
            major,
            minor,
            service,
            qualifier: qualifier.to_string(),
        }
    }

    /// The fallback identifier used when a declared version cannot be parsed.
    pub fn sentinel() -> Self {
        Self::new(1, 0, 0)
    }

    /// Parses a version string like "1", "1.2", "1.2.3" or "1.2.3.qualifier".
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(VersionError::InvalidFormat(version.to_string()));
        }

        let parse_part = |part: &str| -> Result<u32, VersionError> {
            part.parse::<u32>()
                .map_err(|e| VersionError::ParseError(format!("'{}': {}", part, e)))
        };

        let mut parts = trimmed.splitn(4, '.');
        let major = match parts.next() {
            Some(p) => parse_part(p)?,
            None => return Err(VersionError::InvalidFormat(version.to_string())),
        };
        let minor = parts.next().map(parse_part).transpose()?.unwrap_or(0);
        let service = parts.next().map(parse_part).transpose()?.unwrap_or(0);
        let qualifier = parts.next().unwrap_or("").to_string();

        Ok(Self {
            major,
            minor,
            service,
            qualifier,
        })
    }

    /// Parses a version string, falling back to the `1.0.0` sentinel when the
    /// string does not form a valid identifier.
    pub fn parse_lenient(version: &str) -> Self {
        Self::parse(version).unwrap_or_else(|_| Self::sentinel())
    }

    /// Exact-match rule: same major and minor components, and at least the
    /// required service level (qualifier breaks service-level ties).
    pub fn is_equivalent_to(&self, required: &PluginVersion) -> bool {
        self.major == required.major
            && self.minor == required.minor
            && (self.service, self.qualifier.as_str())
                >= (required.service, required.qualifier.as_str())
    }

    /// Compatible-match rule: same major component and an overall version at
    /// least as high as the required one.
    pub fn is_compatible_with(&self, required: &PluginVersion) -> bool {
        self.major == required.major && self >= required
    }

    /// Strict total-order comparison.
    pub fn is_greater_than(&self, other: &PluginVersion) -> bool {
        self > other
    }
}

impl FromStr for PluginVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluginVersion::parse(s)
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.service)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}
