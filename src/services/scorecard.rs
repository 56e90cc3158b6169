// src/services/scorecard.rs

//! Scorecard API client.
//!
//! Fetches the latest published score of a single repository from
//! `GET {api}/projects/{platform}/{org}/{repo}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{FetchFailure, RepositoryId, ScoreResult, ScoreSnapshot, ScorecardConfig};
use crate::utils::http::create_async_client;
use crate::utils::join_segments;

/// Source of current repository scores.
#[async_trait]
pub trait ScoreFetcher: Send + Sync {
    /// Fetch the current score of one repository.
    async fn fetch(&self, id: &RepositoryId) -> std::result::Result<ScoreResult, FetchFailure>;
}

/// Relevant part of the scorecard API response.
#[derive(Debug, Deserialize)]
struct ProjectResponse {
    score: f64,
    date: String,
    #[serde(default)]
    repo: Option<ProjectRepo>,
}

#[derive(Debug, Deserialize)]
struct ProjectRepo {
    #[serde(default)]
    commit: Option<String>,
}

/// HTTP implementation of [`ScoreFetcher`].
pub struct ScorecardClient {
    client: Client,
    api_base_url: String,
}

impl ScorecardClient {
    pub fn new(config: &ScorecardConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            api_base_url: config.api_base_url.clone(),
        })
    }

    /// Project endpoint for a repository.
    pub fn project_url(&self, id: &RepositoryId) -> Result<url::Url> {
        join_segments(
            &self.api_base_url,
            &["projects", &id.platform, &id.organization, &id.name],
        )
    }

    async fn fetch_snapshot(&self, id: &RepositoryId) -> Result<ScoreSnapshot> {
        let url = self.project_url(id)?;
        log::debug!("Getting project score for {} from {}", id, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(id, format!("unexpected status {status}")));
        }

        let body = response.text().await?;
        let snapshot = parse_project_body(&body).map_err(|e| AppError::fetch(id, e))?;
        log::debug!(
            "Got project score for {}: {} ({})",
            id,
            snapshot.score,
            snapshot.date
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl ScoreFetcher for ScorecardClient {
    async fn fetch(&self, id: &RepositoryId) -> std::result::Result<ScoreResult, FetchFailure> {
        match self.fetch_snapshot(id).await {
            Ok(snapshot) => Ok(ScoreResult {
                id: id.clone(),
                snapshot,
            }),
            Err(AppError::Fetch { message, .. }) => Err(FetchFailure {
                id: id.clone(),
                message,
            }),
            Err(e) => Err(FetchFailure {
                id: id.clone(),
                message: e.to_string(),
            }),
        }
    }
}

/// Parse a project response body into a validated snapshot.
pub fn parse_project_body(body: &str) -> Result<ScoreSnapshot> {
    let response: ProjectResponse = serde_json::from_str(body)?;
    let snapshot = ScoreSnapshot::new(
        response.score,
        response.date,
        response.repo.and_then(|r| r.commit),
    );
    snapshot.validate()?;
    Ok(snapshot)
}
