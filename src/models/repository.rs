//! Repository identity and scope.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Identity of a monitored repository.
///
/// Ordering is lexicographic over `(platform, organization, name)`, which is
/// also the order the database is serialized in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId {
    /// Hosting platform (e.g., "github.com")
    pub platform: String,

    /// Owning organization or user
    #[serde(rename = "org", alias = "organization")]
    pub organization: String,

    /// Repository name
    #[serde(rename = "repo", alias = "name")]
    pub name: String,
}

impl RepositoryId {
    pub fn new(
        platform: impl Into<String>,
        organization: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            organization: organization.into(),
            name: name.into(),
        }
    }

    /// `org/repo` without the platform.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organization, self.name)
    }

    /// Check that every segment is a usable path component.
    ///
    /// Names may start with `.`, `_` or `-` (e.g. `.github`); only `.` and
    /// `..` are refused among dot names.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("platform", &self.platform),
            ("org", &self.organization),
            ("repo", &self.name),
        ] {
            let is_relative = value.as_str() == "." || value.as_str() == "..";
            if is_relative || !segment_pattern().is_match(value) {
                return Err(AppError::validation(format!(
                    "invalid {field} '{value}' in repository {}",
                    self
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.platform, self.organization, self.name)
    }
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid regex"))
}

/// Ordered set of repositories to query in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    repositories: Vec<RepositoryId>,
}

impl Scope {
    /// Build a scope, rejecting invalid or duplicated entries.
    pub fn new(repositories: Vec<RepositoryId>) -> Result<Self> {
        let scope = Self { repositories };
        scope.validate()?;
        Ok(scope)
    }

    /// Parse and validate a scope document.
    pub fn from_json(content: &str) -> Result<Self> {
        let scope: Self = serde_json::from_str(content).map_err(|e| {
            AppError::validation(format!("scope file is corrupted: {e}"))
        })?;
        scope.validate()?;
        Ok(scope)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for id in &self.repositories {
            id.validate()?;
            if !seen.insert(id) {
                return Err(AppError::validation(format!(
                    "repository {id} is listed more than once in scope"
                )));
            }
        }
        Ok(())
    }

    /// Append repositories that are not yet in scope, keeping their order.
    ///
    /// Returns how many were added.
    pub fn extend_missing(&mut self, discovered: impl IntoIterator<Item = RepositoryId>) -> usize {
        let mut known: HashSet<RepositoryId> = self.repositories.iter().cloned().collect();
        let before = self.repositories.len();
        for id in discovered {
            if known.insert(id.clone()) {
                self.repositories.push(id);
            }
        }
        self.repositories.len() - before
    }

    pub fn repositories(&self) -> &[RepositoryId] {
        &self.repositories
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryId> {
        self.repositories.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope_document() {
        let scope = Scope::from_json(
            r#"[
                {"platform": "github.com", "org": "ossf", "repo": "scorecard"},
                {"platform": "github.com", "organization": "acme", "name": "widget"}
            ]"#,
        )
        .unwrap();

        assert_eq!(scope.len(), 2);
        assert_eq!(scope.repositories()[0].full_name(), "ossf/scorecard");
        assert_eq!(scope.repositories()[1].to_string(), "github.com/acme/widget");
    }

    #[test]
    fn test_scope_rejects_duplicates() {
        let id = RepositoryId::new("github.com", "acme", "widget");
        assert!(Scope::new(vec![id.clone(), id]).is_err());
    }

    #[test]
    fn test_scope_rejects_malformed_document() {
        assert!(Scope::from_json(r#"{"github.com": []}"#).is_err());
        assert!(Scope::from_json(r#"[{"platform": "github.com", "org": "acme"}]"#).is_err());
    }

    #[test]
    fn test_scope_rejects_path_segments() {
        let id = RepositoryId::new("github.com", "acme", "../etc");
        assert!(Scope::new(vec![id]).is_err());

        let id = RepositoryId::new("github.com", "", "widget");
        assert!(Scope::new(vec![id]).is_err());
    }

    #[test]
    fn test_scope_accepts_dot_prefixed_names() {
        let scope = Scope::from_json(r#"[{"platform": "github.com", "org": "ossf", "repo": ".github"}]"#)
            .unwrap();
        assert_eq!(scope.repositories()[0].name, ".github");

        let mut scope = Scope::default();
        scope.extend_missing(vec![
            RepositoryId::new("github.com", "ossf", ".github"),
            RepositoryId::new("github.com", "_internal", "-legacy"),
        ]);
        assert!(scope.validate().is_ok());
    }

    #[test]
    fn test_scope_rejects_relative_segments() {
        for name in [".", "..", "a/b", "a\\b", "with space"] {
            let id = RepositoryId::new("github.com", "acme", name);
            assert!(id.validate().is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn test_extend_missing_keeps_order() {
        let mut scope = Scope::new(vec![RepositoryId::new("github.com", "acme", "b")]).unwrap();
        let added = scope.extend_missing(vec![
            RepositoryId::new("github.com", "acme", "a"),
            RepositoryId::new("github.com", "acme", "b"),
            RepositoryId::new("github.com", "acme", "c"),
        ]);

        assert_eq!(added, 2);
        let names: Vec<_> = scope.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
