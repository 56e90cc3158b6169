//! Score deltas between runs.
//!
//! Compares a freshly fetched snapshot with the latest stored one. A
//! repository seen for the first time has no delta and is never reported as
//! changed, so the first run over a new scope does not notify about every
//! repository in it.

use serde::Serialize;

use crate::models::{RepositoryHistory, RepositoryId, ScoreSnapshot};

/// Outcome of comparing one repository's new score with its history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRecord {
    pub id: RepositoryId,
    pub current: ScoreSnapshot,
    pub previous_score: Option<f64>,
    pub previous_commit: Option<String>,
    pub delta: Option<f64>,
    pub changed: bool,
}

impl DiffRecord {
    /// Whether there was no stored score before this run.
    pub fn is_first_observation(&self) -> bool {
        self.previous_score.is_none()
    }
}

/// Calculator for score deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffCalculator;

impl DiffCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Diff `snapshot` against the history as it was before this run.
    pub fn diff(
        &self,
        id: &RepositoryId,
        before: Option<&RepositoryHistory>,
        snapshot: &ScoreSnapshot,
    ) -> DiffRecord {
        let previous = before.and_then(|h| h.current.as_ref());
        let previous_score = previous.map(|p| p.score);
        let delta = previous_score.map(|p| round_score(snapshot.score - p));
        let changed = matches!(delta, Some(d) if d != 0.0);

        DiffRecord {
            id: id.clone(),
            current: snapshot.clone(),
            previous_score,
            previous_commit: previous.and_then(|p| p.commit.clone()),
            delta,
            changed,
        }
    }
}

/// Round to the one-decimal precision scores are published at.
///
/// Normalizes `-0.0` to `0.0`.
pub fn round_score(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}
