// src/models/mod.rs

//! Domain models for the scorecard monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod database;
mod repository;
mod snapshot;

// Re-export all public types
pub use config::{
    AutoScopeConfig, Config, GitConfig, GithubConfig, IssueConfig, PathsConfig, ReportConfig,
    ReportTool, ScorecardConfig,
};
pub use database::Database;
pub use repository::{RepositoryId, Scope};
pub use snapshot::{FetchFailure, MAX_SCORE, RepositoryHistory, ScoreResult, ScoreSnapshot};
