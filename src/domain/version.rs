use crate::error::{Result, VersionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric part of a semantic version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a bare `X.Y.Z` version, ignoring any pre-release or build suffix
    ///
    /// A leading `v`/`V` is accepted so literals copied from tags work.
    pub fn parse(text: &str) -> Result<Self> {
        let clean = text.trim().trim_start_matches(['v', 'V']);
        let parsed = semver::Version::parse(clean)
            .map_err(|e| VersionError::version(format!("Invalid version '{}': {}", text, e)))?;
        Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Apply an increment; higher fields reset the lower ones.
    ///
    /// Fails when the bumped field is already `u64::MAX`.
    pub fn bump(&self, kind: IncrementKind) -> Result<Self> {
        let overflow = || VersionError::version(format!("Cannot apply {} increment to {}", kind, self));
        Ok(match kind {
            IncrementKind::Major => Version::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            IncrementKind::Minor => {
                Version::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0)
            }
            IncrementKind::Patch => {
                Version::new(self.major, self.minor, self.patch.checked_add(1).ok_or_else(overflow)?)
            }
            IncrementKind::None => *self,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// How much a version must be bumped
///
/// Variants are declared in severity order so `Ord` gives
/// `None < Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncrementKind {
    None,
    Patch,
    Minor,
    Major,
}

impl fmt::Display for IncrementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IncrementKind::None => "none",
            IncrementKind::Patch => "patch",
            IncrementKind::Minor => "minor",
            IncrementKind::Major => "major",
        };
        f.write_str(name)
    }
}
