//! Pre-release and build-metadata templates
//!
//! Templates use `{name}` placeholders. Recognised names are `label`,
//! `branch`, `count` and `sha`; anything else is left verbatim so a typo
//! shows up in the output instead of silently vanishing.

use crate::domain::branch::sanitize_identifier;

/// Values available to a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars<'a> {
    pub label: &'a str,
    pub branch: &'a str,
    pub count: usize,
    pub sha: &'a str,
}

/// A `{placeholder}` template string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pattern: String,
}

impl Template {
    pub fn new(pattern: impl Into<String>) -> Self {
        Template {
            pattern: pattern.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.trim().is_empty()
    }

    /// Whether the template asks for a given placeholder
    pub fn uses(&self, name: &str) -> bool {
        self.pattern.contains(&format!("{{{}}}", name))
    }

    pub fn render(&self, vars: &TemplateVars<'_>) -> String {
        self.pattern
            .replace("{label}", vars.label)
            .replace("{branch}", &sanitize_identifier(vars.branch))
            .replace("{count}", &vars.count.to_string())
            .replace("{sha}", vars.sha)
    }
}
