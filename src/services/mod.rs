//! Service layer for the scorecard monitor.
//!
//! This module contains the adapters to external systems:
//! - Score fetching (`ScorecardClient`)
//! - Issue creation and organization discovery (`GithubClient`)
//! - Commit and push (`GitCli`)

mod git;
mod github;
mod scorecard;

pub use git::{GitCli, VersionControl};
pub use github::{
    GITHUB_PLATFORM, GithubClient, IssueRef, IssueTracker, RepositoryDiscovery, split_repository,
};
pub use scorecard::{ScoreFetcher, ScorecardClient, parse_project_body};
