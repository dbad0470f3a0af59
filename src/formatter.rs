//! Rendering the final version

use crate::branch_config::EffectiveConfiguration;
use crate::config::FormatConfig;
use crate::domain::{BaseVersionCandidate, CommitRef, EffectiveVersion, Increment, Template, TemplateVars};
use crate::error::{Result, VersionError};
use semver::{BuildMetadata, Prerelease};

/// Combines base version, increment and branch label into an
/// [`EffectiveVersion`]. Pure: equal inputs give equal output.
#[derive(Debug, Clone)]
pub struct VersionFormatter {
    prerelease: Template,
    build_metadata: Template,
    short_sha_length: usize,
}

impl VersionFormatter {
    pub fn new(format: &FormatConfig) -> Self {
        VersionFormatter {
            prerelease: Template::new(&format.prerelease),
            build_metadata: Template::new(&format.build_metadata),
            short_sha_length: format.short_sha_length,
        }
    }

    pub fn format(
        &self,
        base: &BaseVersionCandidate,
        increment: Increment,
        branch: &EffectiveConfiguration,
        current: &CommitRef,
    ) -> Result<EffectiveVersion> {
        let numbers = base.version.bump(increment.kind)?;
        let short_sha = current.short_id(self.short_sha_length);

        let mut vars = TemplateVars {
            label: "",
            branch: &branch.branch_name,
            count: increment.count,
            sha: &short_sha,
        };
        let label = Template::new(&branch.label).render(&vars);
        vars.label = &label;

        let mut version = semver::Version::new(numbers.major, numbers.minor, numbers.patch);
        if !label.is_empty() {
            let text = self.prerelease.render(&vars);
            version.pre = Prerelease::new(&text).map_err(|e| {
                VersionError::version(format!("Invalid pre-release '{}': {}", text, e))
            })?;
        }
        if !self.build_metadata.is_empty() {
            let text = self.build_metadata.render(&vars);
            version.build = BuildMetadata::new(&text).map_err(|e| {
                VersionError::version(format!("Invalid build metadata '{}': {}", text, e))
            })?;
        }

        Ok(EffectiveVersion::new(
            version,
            increment.count,
            current,
            short_sha,
            branch.branch_name.clone(),
            base.source,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IncrementKind, Version};
    use git2::Oid;

    fn current() -> CommitRef {
        CommitRef::new(Oid::from_bytes(&[0xab; 20]).unwrap(), vec![], "work", 0)
    }

    fn base(version: Version) -> BaseVersionCandidate {
        BaseVersionCandidate {
            version,
            anchor: current(),
            should_increment: true,
            priority: 4,
            distance: 5,
            source: "tagged-commit",
        }
    }

    fn branch(name: &str, label: &str) -> EffectiveConfiguration {
        EffectiveConfiguration {
            branch_name: name.to_string(),
            config_name: "test".to_string(),
            increment: IncrementKind::Patch,
            label: label.to_string(),
            is_release_branch: false,
            tracks_merge_target: false,
            source_branches: Vec::new(),
        }
    }

    fn patch(count: usize) -> Increment {
        Increment {
            kind: IncrementKind::Patch,
            count,
        }
    }

    #[test]
    fn test_patch_with_beta_label() {
        let formatter = VersionFormatter::new(&FormatConfig::default());
        let version = formatter
            .format(&base(Version::new(1, 2, 3)), patch(5), &branch("release/1.2", "beta"), &current())
            .unwrap();

        assert_eq!(version.major_minor_patch(), Version::new(1, 2, 4));
        let tag = version.pre_release_tag().unwrap();
        assert!(tag.contains('5'));
        assert!(tag.contains(version.short_sha()));
        assert_eq!(version.to_string(), "1.2.4-beta.5.gabababa");
    }

    #[test]
    fn test_deterministic() {
        let formatter = VersionFormatter::new(&FormatConfig::default());
        let render = || {
            formatter
                .format(&base(Version::new(1, 2, 3)), patch(5), &branch("release/1.2", "beta"), &current())
                .unwrap()
                .to_string()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_empty_label_is_release() {
        let formatter = VersionFormatter::new(&FormatConfig::default());
        let version = formatter
            .format(&base(Version::new(2, 0, 0)), patch(3), &branch("main", ""), &current())
            .unwrap();
        assert_eq!(version.to_string(), "2.0.1");
        assert_eq!(version.pre_release_tag(), None);
        assert_eq!(version.commits_since_base(), 3);
    }

    #[test]
    fn test_branch_label_is_sanitized() {
        let formatter = VersionFormatter::new(&FormatConfig::default());
        let increment = Increment {
            kind: IncrementKind::Minor,
            count: 2,
        };
        let version = formatter
            .format(&base(Version::new(1, 2, 3)), increment, &branch("feature/JIRA_12", "{branch}"), &current())
            .unwrap();
        assert_eq!(version.to_string(), "1.3.0-feature-JIRA-12.2.gabababa");
    }

    #[test]
    fn test_numeric_branch_label_is_valid() {
        let formatter = VersionFormatter::new(&FormatConfig::default());
        let version = formatter
            .format(&base(Version::new(1, 2, 3)), patch(1), &branch("007", "{branch}"), &current())
            .unwrap();
        assert_eq!(version.to_string(), "1.2.4-7.1.gabababa");
    }

    #[test]
    fn test_build_metadata_template() {
        let formatter = VersionFormatter::new(&FormatConfig {
            prerelease: "{label}.{count}".to_string(),
            build_metadata: "sha.{sha}".to_string(),
            short_sha_length: 8,
        });
        let version = formatter
            .format(&base(Version::new(0, 1, 0)), patch(1), &branch("develop", "alpha"), &current())
            .unwrap();
        assert_eq!(version.to_string(), "0.1.1-alpha.1+sha.abababab");
        assert_eq!(version.sha(), "ab".repeat(20));
    }

    #[test]
    fn test_invalid_prerelease_is_version_error() {
        let formatter = VersionFormatter::new(&FormatConfig {
            prerelease: "{label}..{count}".to_string(),
            ..FormatConfig::default()
        });
        let result = formatter.format(&base(Version::new(1, 0, 0)), patch(1), &branch("x", "beta"), &current());
        assert!(matches!(result, Err(VersionError::Version(_))));
    }

    #[test]
    fn test_overflowing_bump_is_version_error() {
        let formatter = VersionFormatter::new(&FormatConfig::default());
        let result = formatter.format(&base(Version::new(1, 0, u64::MAX)), patch(1), &branch("main", ""), &current());
        assert!(matches!(result, Err(VersionError::Version(_))));
    }
}
