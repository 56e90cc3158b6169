//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input and output document locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Scorecard API access and fetch concurrency
    #[serde(default)]
    pub scorecard: ScorecardConfig,

    /// Report rendering
    #[serde(default)]
    pub report: ReportConfig,

    /// Issue creation for changed scores
    #[serde(default)]
    pub issue: IssueConfig,

    /// Commit and push of updated documents
    #[serde(default)]
    pub git: GitConfig,

    /// GitHub API access
    #[serde(default)]
    pub github: GithubConfig,

    /// Organization-wide scope discovery
    #[serde(default)]
    pub auto_scope: AutoScopeConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Configured GitHub token, ignoring blank values.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scorecard.max_request_in_parallel == 0 {
            return Err(AppError::config(
                "scorecard.max_request_in_parallel must be >= 1",
            ));
        }
        if self.scorecard.timeout_secs == 0 {
            return Err(AppError::config("scorecard.timeout_secs must be > 0"));
        }
        if self.scorecard.user_agent.trim().is_empty() {
            return Err(AppError::config("scorecard.user_agent is empty"));
        }
        if self.report.start_tag.is_empty() || self.report.end_tag.is_empty() {
            return Err(AppError::config("report start and end tags must not be empty"));
        }
        if self.report.start_tag == self.report.end_tag {
            return Err(AppError::config("report start and end tags must differ"));
        }

        let needs_token = self.git.auto_commit
            || self.git.auto_push
            || self.issue.enabled
            || self.auto_scope.enabled;
        if needs_token && self.github_token().is_none() {
            return Err(AppError::config(
                "a GitHub token is required for push, commit, issue creation and auto scope",
            ));
        }
        if self.issue.enabled && self.github.repository.is_none() {
            return Err(AppError::config(
                "github.repository (owner/name) is required to create issues",
            ));
        }
        if let Some(repository) = &self.github.repository {
            if repository.split('/').filter(|s| !s.is_empty()).count() != 2 {
                return Err(AppError::config(format!(
                    "github.repository '{repository}' must be in owner/name form"
                )));
            }
        }
        if self.auto_scope.enabled && self.auto_scope.orgs.is_empty() {
            return Err(AppError::config(
                "auto scope is enabled but no organizations were provided",
            ));
        }
        Ok(())
    }
}

/// Document locations, relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::scope_path")]
    pub scope: String,

    #[serde(default = "defaults::database_path")]
    pub database: String,

    #[serde(default = "defaults::report_path")]
    pub report: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scope: defaults::scope_path(),
            database: defaults::database_path(),
            report: defaults::report_path(),
        }
    }
}

/// Scorecard API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardConfig {
    /// Base URL of the scorecard API
    #[serde(default = "defaults::api_base_url")]
    pub api_base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum fetches in flight at once
    #[serde(default = "defaults::max_request_in_parallel")]
    pub max_request_in_parallel: usize,
}

impl Default for ScorecardConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::api_base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_request_in_parallel: defaults::max_request_in_parallel(),
        }
    }
}

/// Where report rows link to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportTool {
    #[default]
    ScorecardVisualizer,
    DepsDev,
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Embed the report between tags in an existing document
    #[serde(default)]
    pub tags_enabled: bool,

    #[serde(default = "defaults::start_tag")]
    pub start_tag: String,

    #[serde(default = "defaults::end_tag")]
    pub end_tag: String,

    /// Show a scorecard badge next to each score
    #[serde(default)]
    pub render_badge: bool,

    #[serde(default)]
    pub tool: ReportTool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            tags_enabled: false,
            start_tag: defaults::start_tag(),
            end_tag: defaults::end_tag(),
            render_badge: false,
            tool: ReportTool::default(),
        }
    }
}

/// Issue creation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "defaults::issue_title")]
    pub title: String,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            title: defaults::issue_title(),
        }
    }
}

/// Commit and push settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default)]
    pub auto_commit: bool,

    #[serde(default)]
    pub auto_push: bool,

    #[serde(default = "defaults::remote")]
    pub remote: String,

    /// Branch to push to; the current HEAD's upstream when unset
    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default = "defaults::git_user_name")]
    pub user_name: String,

    #[serde(default = "defaults::git_user_email")]
    pub user_email: String,

    #[serde(default = "defaults::commit_message")]
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            auto_commit: false,
            auto_push: false,
            remote: defaults::remote(),
            branch: None,
            user_name: defaults::git_user_name(),
            user_email: defaults::git_user_email(),
            commit_message: defaults::commit_message(),
        }
    }
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API token; the CLI fills it from `GITHUB_TOKEN` when unset
    #[serde(default)]
    pub token: Option<String>,

    /// Repository that receives issues and pushes, as `owner/name`
    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default = "defaults::github_api_base_url")]
    pub api_base_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repository: None,
            api_base_url: defaults::github_api_base_url(),
        }
    }
}

/// Organization discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoScopeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Organizations whose repositories are added to the scope
    #[serde(default)]
    pub orgs: Vec<String>,

    #[serde(default)]
    pub include_archived: bool,
}

mod defaults {
    // Path defaults
    pub fn scope_path() -> String {
        "scope.json".into()
    }
    pub fn database_path() -> String {
        "database.json".into()
    }
    pub fn report_path() -> String {
        "report.md".into()
    }

    // Scorecard defaults
    pub fn api_base_url() -> String {
        "https://api.securityscorecards.dev".into()
    }
    pub fn user_agent() -> String {
        "scorecard-monitor/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_request_in_parallel() -> usize {
        10
    }

    // Report defaults
    pub fn start_tag() -> String {
        "<!-- OPENSSF-SCORECARD-MONITOR:START -->".into()
    }
    pub fn end_tag() -> String {
        "<!-- OPENSSF-SCORECARD-MONITOR:END -->".into()
    }
    pub fn issue_title() -> String {
        "OpenSSF Scorecard Report Updated!".into()
    }

    // Git defaults
    pub fn remote() -> String {
        "origin".into()
    }
    pub fn git_user_name() -> String {
        "github-actions".into()
    }
    pub fn git_user_email() -> String {
        "github-actions@github.com".into()
    }
    pub fn commit_message() -> String {
        "Updated Scorecard Report".into()
    }

    pub fn github_api_base_url() -> String {
        "https://api.github.com".into()
    }
}
