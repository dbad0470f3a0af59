/// The branch being versioned, reduced to its short name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub name: String,
}

impl BranchContext {
    /// Create a branch context, stripping any `refs/heads/` or remote prefix
    pub fn new(name: impl AsRef<str>) -> Self {
        BranchContext {
            name: short_name(name.as_ref()).to_string(),
        }
    }

    /// Branch name usable inside a semver identifier
    pub fn sanitized(&self) -> String {
        sanitize_identifier(&self.name)
    }
}

/// Strip `refs/heads/`, `refs/remotes/<remote>/` and `remotes/<remote>/`
pub fn short_name(name: &str) -> &str {
    if let Some(rest) = name.strip_prefix("refs/heads/") {
        return rest;
    }
    let remote_path = name
        .strip_prefix("refs/remotes/")
        .or_else(|| name.strip_prefix("remotes/"));
    match remote_path {
        Some(rest) => rest.split_once('/').map_or(rest, |(_, branch)| branch),
        None => name,
    }
}

/// Replace everything outside `[0-9A-Za-z-]` with `-`.
///
/// A purely numeric result loses its leading zeros, which semver forbids
/// in numeric identifiers.
pub fn sanitize_identifier(text: &str) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    if !sanitized.is_empty() && sanitized.bytes().all(|b| b.is_ascii_digit()) {
        let trimmed = sanitized.trim_start_matches('0');
        return if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() };
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name() {
        assert_eq!(BranchContext::new("main").name, "main");
        assert_eq!(BranchContext::new("release/1.0").name, "release/1.0");
    }

    #[test]
    fn test_strips_local_prefix() {
        assert_eq!(BranchContext::new("refs/heads/feature/login").name, "feature/login");
    }

    #[test]
    fn test_strips_remote_prefix() {
        assert_eq!(BranchContext::new("refs/remotes/origin/develop").name, "develop");
        assert_eq!(BranchContext::new("remotes/upstream/release/2.0").name, "release/2.0");
    }

    #[test]
    fn test_sanitized() {
        assert_eq!(BranchContext::new("feature/JIRA_12").sanitized(), "feature-JIRA-12");
    }

    #[test]
    fn test_numeric_name_drops_leading_zeros() {
        assert_eq!(sanitize_identifier("007"), "7");
        assert_eq!(sanitize_identifier("000"), "0");
        assert_eq!(sanitize_identifier("42"), "42");
        assert_eq!(sanitize_identifier("007-fix"), "007-fix");
    }
}
