//! The score database.
//!
//! In memory the database is a single map keyed by the composite
//! [`RepositoryId`]. On disk it keeps the nested layout
//! `platform -> org -> repo -> history`:
//!
//! ```json
//! {
//!   "github.com": {
//!     "ossf": {
//!       "scorecard": {
//!         "current": { "score": 7.2, "date": "2024-01-01", "commit": "abc" },
//!         "previous": []
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{RepositoryHistory, RepositoryId, ScoreResult};

type NestedDatabase = BTreeMap<String, BTreeMap<String, BTreeMap<String, RepositoryHistory>>>;

/// Per-repository score histories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "NestedDatabase", into = "NestedDatabase")]
pub struct Database {
    entries: BTreeMap<RepositoryId, RepositoryHistory>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a database document.
    pub fn from_json(content: &str) -> Result<Self> {
        let database: Self = serde_json::from_str(content).map_err(|e| {
            AppError::validation(format!("database file is corrupted: {e}"))
        })?;
        database.validate()?;
        Ok(database)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        for (id, history) in &self.entries {
            id.validate()?;
            history.validate().map_err(|e| {
                AppError::validation(format!("database entry {id} is corrupted: {e}"))
            })?;
        }
        Ok(())
    }

    pub fn get(&self, id: &RepositoryId) -> Option<&RepositoryHistory> {
        self.entries.get(id)
    }

    /// History for `id`, created empty if absent.
    pub fn get_or_create(&mut self, id: &RepositoryId) -> &mut RepositoryHistory {
        self.entries.entry(id.clone()).or_default()
    }

    /// Record a fetched score as the repository's latest observation.
    ///
    /// Not idempotent: merging the same result twice retires a duplicate
    /// snapshot into `previous`.
    pub fn merge(&mut self, result: &ScoreResult) {
        self.get_or_create(&result.id)
            .record(result.snapshot.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RepositoryId, &RepositoryHistory)> {
        self.entries.iter()
    }
}

impl From<NestedDatabase> for Database {
    fn from(nested: NestedDatabase) -> Self {
        let entries = nested
            .into_iter()
            .flat_map(|(platform, orgs)| {
                orgs.into_iter().flat_map(move |(org, repos)| {
                    let platform = platform.clone();
                    repos.into_iter().map(move |(repo, history)| {
                        (RepositoryId::new(platform.clone(), org.clone(), repo), history)
                    })
                })
            })
            .collect();
        Self { entries }
    }
}

impl From<Database> for NestedDatabase {
    fn from(database: Database) -> Self {
        let mut nested = NestedDatabase::new();
        for (id, history) in database.entries {
            nested
                .entry(id.platform)
                .or_default()
                .entry(id.organization)
                .or_default()
                .insert(id.name, history);
        }
        nested
    }
}
