use crate::domain::Version;
use crate::error::{Result, VersionError};
use git2::Oid;
use regex::Regex;

/// A tag and the commit it points at (annotated tags already peeled)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    pub target: Oid,
    /// Populated by [`TagPattern::annotate`] when the name is a version
    pub version: Option<Version>,
}

impl TagRef {
    pub fn new(name: impl Into<String>, target: Oid) -> Self {
        TagRef {
            name: name.into(),
            target,
            version: None,
        }
    }
}

/// Recognises version tags such as `v1.2.3` or `release-1.2.3`
///
/// Only release tags qualify: a tag carrying a pre-release or build suffix
/// is not a base version.
#[derive(Debug, Clone)]
pub struct TagPattern {
    regex: Regex,
}

impl TagPattern {
    /// Build from a prefix regex (`[vV]?` by default)
    pub fn new(prefix: &str) -> Result<Self> {
        let pattern = format!(r"^(?:{})(?P<version>\d+\.\d+\.\d+)$", prefix);
        let regex = Regex::new(&pattern).map_err(|e| {
            VersionError::config(format!("Invalid tag_prefix '{}': {}", prefix, e))
        })?;
        Ok(TagPattern { regex })
    }

    /// Extract the version from a tag name
    pub fn parse(&self, tag_name: &str) -> Option<Version> {
        let captures = self.regex.captures(tag_name)?;
        Version::parse(captures.name("version")?.as_str()).ok()
    }

    /// Fill in `version` for every tag whose name matches
    pub fn annotate(&self, tags: Vec<TagRef>) -> Vec<TagRef> {
        tags.into_iter()
            .map(|mut tag| {
                tag.version = self.parse(&tag.name);
                tag
            })
            .collect()
    }
}
