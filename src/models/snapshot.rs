//! Score snapshots and per-repository history.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::RepositoryId;

/// Highest score the scorecard service publishes.
pub const MAX_SCORE: f64 = 10.0;

/// One recorded score observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    /// Aggregate score, 0.0 to 10.0
    pub score: f64,

    /// ISO-8601 date of the scorecard run, as returned by the service
    pub date: String,

    /// Commit the scorecard was computed for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl ScoreSnapshot {
    pub fn new(score: f64, date: impl Into<String>, commit: Option<String>) -> Self {
        Self {
            score,
            date: date.into(),
            commit,
        }
    }

    /// Check score range and date format.
    pub fn validate(&self) -> Result<()> {
        if !self.score.is_finite() || !(0.0..=MAX_SCORE).contains(&self.score) {
            return Err(AppError::validation(format!(
                "score {} is outside 0-{MAX_SCORE}",
                self.score
            )));
        }
        let parses = DateTime::parse_from_rfc3339(&self.date).is_ok()
            || NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_ok();
        if !parses {
            return Err(AppError::validation(format!(
                "date '{}' is not an ISO-8601 date",
                self.date
            )));
        }
        Ok(())
    }
}

/// A successfully fetched score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub id: RepositoryId,
    pub snapshot: ScoreSnapshot,
}

/// A fetch that did not produce a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub id: RepositoryId,
    pub message: String,
}

impl From<FetchFailure> for AppError {
    fn from(failure: FetchFailure) -> Self {
        AppError::fetch(&failure.id, failure.message)
    }
}

/// Score history of a single repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryHistory {
    /// Latest observation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ScoreSnapshot>,

    /// Older observations, oldest first
    #[serde(default)]
    pub previous: Vec<ScoreSnapshot>,
}

impl RepositoryHistory {
    /// Record a new observation, retiring the current one to `previous`.
    pub fn record(&mut self, snapshot: ScoreSnapshot) {
        if let Some(current) = self.current.take() {
            self.previous.push(current);
        }
        self.current = Some(snapshot);
    }

    /// Most recent retired observation.
    pub fn last_previous(&self) -> Option<&ScoreSnapshot> {
        self.previous.last()
    }

    pub fn validate(&self) -> Result<()> {
        self.current
            .iter()
            .chain(self.previous.iter())
            .try_for_each(ScoreSnapshot::validate)
    }
}
