//! Terminal output for the command line front end

use crate::domain::EffectiveVersion;
use clap::ValueEnum;
use console::style;

/// A single field of the resolved version, selected with `--show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowField {
    Semver,
    Major,
    Minor,
    Patch,
    Prerelease,
    Sha,
    Branch,
    Commits,
}

/// Text printed for `field`; an absent pre-release renders empty
pub fn field_value(version: &EffectiveVersion, field: ShowField) -> String {
    match field {
        ShowField::Semver => version.to_string(),
        ShowField::Major => version.semver().major.to_string(),
        ShowField::Minor => version.semver().minor.to_string(),
        ShowField::Patch => version.semver().patch.to_string(),
        ShowField::Prerelease => version.pre_release_tag().unwrap_or_default().to_string(),
        ShowField::Sha => version.sha().to_string(),
        ShowField::Branch => version.branch().to_string(),
        ShowField::Commits => version.commits_since_base().to_string(),
    }
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Print a short human-readable summary to stderr, keeping stdout for the
/// version itself
pub fn display_summary(version: &EffectiveVersion) {
    eprintln!(
        "{} {} on {} ({} commits since {} base, {})",
        style("→").yellow(),
        style(version).green().bold(),
        style(version.branch()).cyan(),
        version.commits_since_base(),
        version.base_source(),
        version.short_sha()
    );
}
