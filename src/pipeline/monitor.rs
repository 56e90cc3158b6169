// src/pipeline/monitor.rs

//! The monitor run: fetch, merge, compare, persist, publish.

use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{Config, Database, RepositoryId, ScoreResult, Scope};
use crate::pipeline::{
    BatchScheduler, ContentAssembler, DiffCalculator, DiffRecord, MarkdownRenderer, ReportRow,
    has_changed, splice_segment,
};
use crate::services::{IssueRef, IssueTracker, RepositoryDiscovery, ScoreFetcher, VersionControl};
use crate::storage::MonitorStorage;
use crate::utils::console;

const TOTAL_STEPS: usize = 5;

/// External collaborators of a run.
pub struct Services<'a> {
    pub fetcher: &'a dyn ScoreFetcher,
    pub discovery: Option<&'a dyn RepositoryDiscovery>,
    pub issues: Option<&'a dyn IssueTracker>,
    pub vcs: Option<&'a dyn VersionControl>,
}

/// Database after merging a run's scores, with one diff per repository.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub database: Database,
    /// In scope order
    pub records: Vec<DiffRecord>,
}

/// Rendered outputs of a run.
#[derive(Debug, Clone)]
pub struct Content {
    pub report_rows: Vec<ReportRow>,
    pub report: String,
    /// `None` when no repository changed
    pub issue: Option<String>,
}

/// What a run did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub repositories: usize,
    pub changed_repositories: usize,
    pub database_changed: bool,
    pub committed: bool,
    pub pushed: bool,
    pub issue: Option<IssueRef>,
}

/// Merge fetched scores into a copy of `database`, in scope order.
///
/// A snapshot identical to the stored `current` is the same observation
/// seen again and is not merged, which keeps an unchanged re-run a no-op.
pub fn aggregate(scope: &Scope, database: &Database, results: Vec<ScoreResult>) -> Result<Aggregation> {
    let mut by_id: HashMap<RepositoryId, ScoreResult> =
        results.into_iter().map(|r| (r.id.clone(), r)).collect();

    let calculator = DiffCalculator::new();
    let mut updated = database.clone();
    let mut records = Vec::with_capacity(scope.len());

    for id in scope.iter() {
        let result = by_id
            .remove(id)
            .ok_or_else(|| AppError::fetch(id, "no score was fetched"))?;

        let before = updated.get(id);
        let record = calculator.diff(id, before, &result.snapshot);
        let is_new_observation = before.and_then(|h| h.current.as_ref()) != Some(&result.snapshot);

        if is_new_observation {
            updated.merge(&result);
        } else {
            log::debug!("Score for {} is unchanged since {}", id, result.snapshot.date);
        }
        records.push(record);
    }

    Ok(Aggregation {
        database: updated,
        records,
    })
}

/// Render report and issue content.
///
/// In tag mode the report is spliced into `previous_report`; otherwise it
/// replaces it.
pub fn build_content(config: &Config, records: &[DiffRecord], previous_report: &str) -> Result<Content> {
    let assembler = ContentAssembler::new(config);
    let renderer = MarkdownRenderer::new(config.report.tags_enabled);

    let report_rows = assembler.report_rows(records)?;
    let rendered = renderer.render_report(&report_rows);
    let report = if config.report.tags_enabled {
        splice_segment(
            previous_report,
            &rendered,
            &config.report.start_tag,
            &config.report.end_tag,
        )?
    } else {
        rendered
    };

    let issue = assembler
        .notification_rows(&report_rows)
        .map(|rows| renderer.render_issue(&rows));

    Ok(Content {
        report_rows,
        report,
        issue,
    })
}

/// Add organization repositories to the scope.
pub async fn expand_scope(
    scope: &mut Scope,
    orgs: &[String],
    discovery: &dyn RepositoryDiscovery,
) -> Result<usize> {
    let mut added = 0;
    for org in orgs {
        let discovered = discovery.list_org_repositories(org).await?;
        added += scope.extend_missing(discovered);
    }
    scope.validate()?;
    Ok(added)
}

/// Run the full monitor.
pub async fn run_monitor(
    config: &Config,
    storage: &dyn MonitorStorage,
    services: &Services<'_>,
) -> Result<RunSummary> {
    config.validate()?;
    console::header("OpenSSF Scorecard Monitor");

    console::step(1, TOTAL_STEPS, "Checking scope and database");
    let mut scope = storage.load_scope().await?;
    if config.auto_scope.enabled {
        let discovery = services
            .discovery
            .ok_or_else(|| AppError::config("auto scope is enabled but no discovery service is available"))?;
        log::info!("Starting auto-scope for {:?}", config.auto_scope.orgs);
        let added = expand_scope(&mut scope, &config.auto_scope.orgs, discovery).await?;
        console::sub_item(&format!("Auto-scope added {added} repositories"));
    }
    let database = storage.load_database().await?;
    let previous_report = if config.report.tags_enabled {
        storage.load_report().await?
    } else {
        String::new()
    };
    console::sub_item(&format!(
        "{} repositories in scope, {} in database",
        scope.len(),
        database.len()
    ));

    console::step(2, TOTAL_STEPS, "Fetching scores");
    let results = BatchScheduler::new(services.fetcher, config.scorecard.max_request_in_parallel)
        .run(scope.repositories())
        .await
        .into_results()?;

    console::step(3, TOTAL_STEPS, "Merging scores");
    let aggregation = aggregate(&scope, &database, results)?;
    let mut summary = RunSummary {
        repositories: aggregation.records.len(),
        changed_repositories: aggregation.records.iter().filter(|r| r.changed).count(),
        ..RunSummary::default()
    };

    if !has_changed(&database, &aggregation.database) {
        log::info!("No changes to database, skipping the rest of the process");
        return Ok(summary);
    }
    summary.database_changed = true;

    console::step(4, TOTAL_STEPS, "Saving database and report");
    let content = build_content(config, &aggregation.records, &previous_report)?;
    storage.save_database(&aggregation.database).await?;
    storage.save_report(&content.report).await?;

    console::step(5, TOTAL_STEPS, "Publishing");
    if config.git.auto_commit || config.git.auto_push {
        let vcs = services
            .vcs
            .ok_or_else(|| AppError::config("git publishing is enabled but no repository is available"))?;
        if config.git.auto_commit {
            log::info!("Committing changes to database and report");
            vcs.commit(&storage.document_paths()).await?;
            summary.committed = true;
        }
        if config.git.auto_push {
            log::info!("Pushing changes to database and report");
            vcs.push().await?;
            summary.pushed = true;
        }
    }

    if config.issue.enabled {
        match &content.issue {
            Some(body) => {
                let tracker = services
                    .issues
                    .ok_or_else(|| AppError::config("issue creation is enabled but no tracker is available"))?;
                log::info!("Creating issue...");
                let issue = tracker.create_issue(&config.issue.title, body).await?;
                console::sub_item(&format!("Issue #{} created: {}", issue.number, issue.html_url));
                summary.issue = Some(issue);
            }
            None => log::info!("No score changes, skipping issue creation"),
        }
    }

    console::summary(
        "Scorecard run",
        &[
            ("Repositories", summary.repositories.to_string()),
            ("Changed scores", summary.changed_repositories.to_string()),
            ("Committed", summary.committed.to_string()),
            ("Pushed", summary.pushed.to_string()),
            (
                "Issue",
                summary
                    .issue
                    .as_ref()
                    .map(|i| i.html_url.clone())
                    .unwrap_or_else(|| "none".into()),
            ),
        ],
    );
    Ok(summary)
}
