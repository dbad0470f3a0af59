use crate::domain::{IncrementKind, TagPattern, Version};
use crate::error::{Result, VersionError};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for in the working directory and the user config dir
pub const CONFIG_FILE_NAME: &str = "GitSemver.toml";

/// Represents the complete configuration for version resolution.
///
/// Read-only for the engine; every field has a default so an empty document
/// is a valid configuration.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Regex that must precede `X.Y.Z` in a version tag
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Literal version override used by the config-next-version strategy
    #[serde(default)]
    pub next_version: Option<String>,

    #[serde(default = "default_initial_version")]
    pub initial_version: String,

    #[serde(default)]
    pub commit_message_incrementing: CommitMessageIncrementing,

    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    #[serde(default)]
    pub increments: IncrementPatterns,

    /// Regexes with a named `version` group matched against merge commits
    #[serde(default = "default_merge_message_patterns")]
    pub merge_message_patterns: Vec<String>,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub format: FormatConfig,

    /// Fallback used when no entry in `branches` matches
    #[serde(default = "default_fallback_branch")]
    pub default_branch: BranchConfig,

    /// Evaluated in declaration order, first match wins
    #[serde(default = "default_branches")]
    pub branches: Vec<BranchConfig>,
}

/// Increment requested by a branch configuration
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IncrementMode {
    Major,
    Minor,
    Patch,
    None,
    /// Take the increment of the first source branch that has one
    Inherit,
}

impl IncrementMode {
    /// The concrete increment, or `None` for `Inherit`
    pub fn concrete(self) -> Option<IncrementKind> {
        match self {
            IncrementMode::Major => Some(IncrementKind::Major),
            IncrementMode::Minor => Some(IncrementKind::Minor),
            IncrementMode::Patch => Some(IncrementKind::Patch),
            IncrementMode::None => Some(IncrementKind::None),
            IncrementMode::Inherit => None,
        }
    }
}

/// Which commits may carry increment triggers in their message
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CommitMessageIncrementing {
    #[default]
    Enabled,
    Disabled,
    MergeMessageOnly,
}

/// Base version strategies that can be enabled
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    TaggedCommit,
    MergeMessage,
    ConfigNextVersion,
    Mainline,
}

/// Configuration for one branch pattern
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchConfig {
    pub name: String,

    /// Case-insensitive regex searched in the short branch name
    #[serde(default)]
    pub pattern: String,

    #[serde(default = "default_increment_mode")]
    pub increment: IncrementMode,

    /// Pre-release label template; empty means a plain release version
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub is_release_branch: bool,

    #[serde(default)]
    pub tracks_merge_target: bool,

    /// Names of other branch configurations consulted by `inherit`
    #[serde(default)]
    pub source_branches: Vec<String>,
}

impl BranchConfig {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, increment: IncrementMode) -> Self {
        BranchConfig {
            name: name.into(),
            pattern: pattern.into(),
            increment,
            label: String::new(),
            is_release_branch: false,
            tracks_merge_target: false,
            source_branches: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn release(mut self) -> Self {
        self.is_release_branch = true;
        self
    }

    pub fn tracking_merge_target(mut self) -> Self {
        self.tracks_merge_target = true;
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_branches = sources.into_iter().map(Into::into).collect();
        self
    }
}

/// Commit message regexes per increment severity
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IncrementPatterns {
    #[serde(default = "default_major_patterns")]
    pub major: Vec<String>,

    #[serde(default = "default_minor_patterns")]
    pub minor: Vec<String>,

    #[serde(default = "default_patch_patterns")]
    pub patch: Vec<String>,

    #[serde(default = "default_none_patterns")]
    pub none: Vec<String>,
}

impl Default for IncrementPatterns {
    fn default() -> Self {
        IncrementPatterns {
            major: default_major_patterns(),
            minor: default_minor_patterns(),
            patch: default_patch_patterns(),
            none: default_none_patterns(),
        }
    }
}

/// Retry settings for repository I/O
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Additional attempts after the first; signed so a negative value in
    /// the document is reported instead of failing deserialization
    #[serde(default = "default_max_retries")]
    pub max_retries: i64,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Output templates
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FormatConfig {
    #[serde(default = "default_prerelease_format")]
    pub prerelease: String,

    #[serde(default)]
    pub build_metadata: String,

    #[serde(default = "default_short_sha_length")]
    pub short_sha_length: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            prerelease: default_prerelease_format(),
            build_metadata: String::new(),
            short_sha_length: default_short_sha_length(),
        }
    }
}

fn default_tag_prefix() -> String {
    "[vV]?".to_string()
}

fn default_initial_version() -> String {
    "0.1.0".to_string()
}

fn default_strategies() -> Vec<StrategyKind> {
    vec![
        StrategyKind::TaggedCommit,
        StrategyKind::MergeMessage,
        StrategyKind::ConfigNextVersion,
        StrategyKind::Mainline,
    ]
}

fn default_increment_mode() -> IncrementMode {
    IncrementMode::Inherit
}

fn default_major_patterns() -> Vec<String> {
    vec![
        r"\+semver:\s?(breaking|major)".to_string(),
        r"^[a-z]+(\([^)]*\))?!:".to_string(),
        r"BREAKING[ -]CHANGE:".to_string(),
    ]
}

fn default_minor_patterns() -> Vec<String> {
    vec![
        r"\+semver:\s?(feature|minor)".to_string(),
        r"^feat(\([^)]*\))?:".to_string(),
    ]
}

fn default_patch_patterns() -> Vec<String> {
    vec![
        r"\+semver:\s?(fix|patch)".to_string(),
        r"^(fix|perf)(\([^)]*\))?:".to_string(),
    ]
}

fn default_none_patterns() -> Vec<String> {
    vec![r"\+semver:\s?(none|skip)".to_string()]
}

fn default_merge_message_patterns() -> Vec<String> {
    vec![
        r"^Merge branch '(?:[^']*[/-])?[vV]?(?P<version>\d+\.\d+\.\d+)'".to_string(),
        r"^Merge pull request #\d+ from \S*?[/-][vV]?(?P<version>\d+\.\d+\.\d+)".to_string(),
        r"^Finish (?:release )?[vV]?(?P<version>\d+\.\d+\.\d+)".to_string(),
    ]
}

fn default_max_retries() -> i64 {
    6
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_prerelease_format() -> String {
    "{label}.{count}.g{sha}".to_string()
}

fn default_short_sha_length() -> usize {
    7
}

fn default_fallback_branch() -> BranchConfig {
    BranchConfig::new("default", "", IncrementMode::Patch).with_label("{branch}")
}

fn default_branches() -> Vec<BranchConfig> {
    vec![
        BranchConfig::new("main", "^(master|main)$", IncrementMode::Patch),
        BranchConfig::new("develop", "^dev(elop)?(ment)?$", IncrementMode::Minor)
            .with_label("alpha")
            .tracking_merge_target(),
        BranchConfig::new("release", "^releases?[/-]", IncrementMode::Patch)
            .with_label("beta")
            .release(),
        BranchConfig::new("hotfix", "^hotfix(es)?[/-]", IncrementMode::Patch).with_label("beta"),
        BranchConfig::new("feature", "^features?[/-]", IncrementMode::Inherit)
            .with_label("{branch}")
            .with_sources(["develop", "main"]),
        BranchConfig::new("pull-request", "^(pull|pull-requests|pr)[/-]", IncrementMode::Inherit)
            .with_label("PullRequest")
            .with_sources(["develop", "main"]),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tag_prefix: default_tag_prefix(),
            next_version: None,
            initial_version: default_initial_version(),
            commit_message_incrementing: CommitMessageIncrementing::default(),
            strategies: default_strategies(),
            increments: IncrementPatterns::default(),
            merge_message_patterns: default_merge_message_patterns(),
            retry: RetryConfig::default(),
            format: FormatConfig::default(),
            default_branch: default_fallback_branch(),
            branches: default_branches(),
        }
    }
}

impl Config {
    /// Parse a TOML document and validate it
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)
            .map_err(|e| VersionError::config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that would otherwise fail halfway through a run
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_retries < 0 {
            return Err(VersionError::config(format!(
                "retry.max_retries must not be negative (got {})",
                self.retry.max_retries
            )));
        }
        if self.default_branch.increment == IncrementMode::Inherit {
            return Err(VersionError::config(
                "default_branch must declare a concrete increment, not inherit",
            ));
        }
        if !(4..=40).contains(&self.format.short_sha_length) {
            return Err(VersionError::config(format!(
                "format.short_sha_length must be between 4 and 40 (got {})",
                self.format.short_sha_length
            )));
        }

        TagPattern::new(&self.tag_prefix)?;
        Version::parse(&self.initial_version)
            .map_err(|e| VersionError::config(format!("initial_version: {}", e)))?;
        if let Some(next) = &self.next_version {
            Version::parse(next).map_err(|e| VersionError::config(format!("next_version: {}", e)))?;
        }

        compile_patterns("increments.major", &self.increments.major)?;
        compile_patterns("increments.minor", &self.increments.minor)?;
        compile_patterns("increments.patch", &self.increments.patch)?;
        compile_patterns("increments.none", &self.increments.none)?;
        for regex in compile_patterns("merge_message_patterns", &self.merge_message_patterns)? {
            if !regex.capture_names().any(|name| name == Some("version")) {
                return Err(VersionError::config(format!(
                    "merge_message_patterns entry '{}' has no (?P<version>...) group",
                    regex.as_str()
                )));
            }
        }

        let mut seen = HashSet::new();
        for branch in &self.branches {
            if !seen.insert(branch.name.as_str()) {
                return Err(VersionError::config(format!(
                    "Duplicate branch configuration '{}'",
                    branch.name
                )));
            }
            compile_branch_pattern(branch)?;
        }
        Ok(())
    }
}

/// Compile a list of regexes, naming the offending option on failure
pub fn compile_patterns(option: &str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| {
                VersionError::config(format!("Invalid regex in {}: '{}': {}", option, pattern, e))
            })
        })
        .collect()
}

/// Compile a branch pattern for case-insensitive search
pub fn compile_branch_pattern(branch: &BranchConfig) -> Result<Regex> {
    RegexBuilder::new(&branch.pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| {
            VersionError::config(format!(
                "Invalid pattern for branch '{}': '{}': {}",
                branch.name, branch.pattern, e
            ))
        })
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `GitSemver.toml` in the given working directory
/// 3. `<config dir>/git-semver/GitSemver.toml`
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded and validated, or default configuration
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>, work_dir: &Path) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(work_dir),
    };

    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            let text = fs::read_to_string(&path)?;
            Config::from_toml(&text)
        }
        None => {
            tracing::debug!("no configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn discover_config(work_dir: &Path) -> Option<PathBuf> {
    let local = work_dir.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("git-semver").join(CONFIG_FILE_NAME);
    user.exists().then_some(user)
}
