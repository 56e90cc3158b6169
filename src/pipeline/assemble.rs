// src/pipeline/assemble.rs

//! Report and notification row assembly.

use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, ReportTool, RepositoryId};
use crate::pipeline::DiffRecord;
use crate::utils::join_segments;

const VISUALIZER_BASE: &str = "https://ossf.github.io/scorecard-visualizer/#/projects";
const DEPS_DEV_BASE: &str = "https://deps.dev/project";

/// One repository line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub id: RepositoryId,
    pub score: f64,
    pub date: String,
    pub commit: Option<String>,
    pub previous_score: Option<f64>,
    pub delta: Option<f64>,
    pub changed: bool,
    pub report_url: String,
    pub badge_url: Option<String>,
}

/// Builds row views from diff records.
#[derive(Debug, Clone)]
pub struct ContentAssembler {
    tool: ReportTool,
    api_base_url: String,
    render_badge: bool,
}

impl ContentAssembler {
    pub fn new(config: &Config) -> Self {
        Self {
            tool: config.report.tool,
            api_base_url: config.scorecard.api_base_url.clone(),
            render_badge: config.report.render_badge,
        }
    }

    /// One row per record, in record order.
    pub fn report_rows(&self, records: &[DiffRecord]) -> Result<Vec<ReportRow>> {
        records.iter().map(|record| self.row(record)).collect()
    }

    /// Rows of changed repositories only; `None` when nothing changed.
    pub fn notification_rows(&self, rows: &[ReportRow]) -> Option<Vec<ReportRow>> {
        let changed: Vec<ReportRow> = rows.iter().filter(|r| r.changed).cloned().collect();
        if changed.is_empty() { None } else { Some(changed) }
    }

    fn row(&self, record: &DiffRecord) -> Result<ReportRow> {
        let badge_url = if self.render_badge {
            Some(self.badge_url(&record.id)?.to_string())
        } else {
            None
        };

        Ok(ReportRow {
            id: record.id.clone(),
            score: record.current.score,
            date: record.current.date.clone(),
            commit: record.current.commit.clone(),
            previous_score: record.previous_score,
            delta: record.delta,
            changed: record.changed,
            report_url: self.report_url(
                &record.id,
                record.current.commit.as_deref(),
                record.previous_commit.as_deref(),
            )?,
            badge_url,
        })
    }

    /// Link to a visual report of the repository.
    ///
    /// With the visualizer, two distinct commits give a compare view and a
    /// single or repeated commit gives a single-commit view. Without a commit, or with deps.dev as the
    /// tool, the deps.dev project page is used.
    pub fn report_url(
        &self,
        id: &RepositoryId,
        commit: Option<&str>,
        previous_commit: Option<&str>,
    ) -> Result<String> {
        match (self.tool, commit, previous_commit) {
            (ReportTool::ScorecardVisualizer, Some(commit), Some(previous))
                if previous != commit =>
            {
                Ok(format!(
                    "{VISUALIZER_BASE}/{}/{}/{}/compare/{previous}/{commit}",
                    id.platform, id.organization, id.name
                ))
            }
            (ReportTool::ScorecardVisualizer, Some(commit), _) => Ok(format!(
                "{VISUALIZER_BASE}/{}/{}/{}/commit/{commit}",
                id.platform, id.organization, id.name
            )),
            _ => deps_dev_url(id),
        }
    }

    fn badge_url(&self, id: &RepositoryId) -> Result<url::Url> {
        join_segments(
            &self.api_base_url,
            &["projects", &id.platform, &id.organization, &id.name, "badge"],
        )
    }
}

/// deps.dev project page, e.g. `.../project/github/acme%2Fwidget`.
fn deps_dev_url(id: &RepositoryId) -> Result<String> {
    let system = id
        .platform
        .split('.')
        .next()
        .unwrap_or(&id.platform)
        .to_lowercase();
    let project = format!(
        "{}/{}",
        id.organization.to_lowercase(),
        id.name.to_lowercase()
    );
    Ok(join_segments(DEPS_DEV_BASE, &[system.as_str(), project.as_str()])?.to_string())
}
