// src/pipeline/render.rs

//! Markdown rendering of report and issue bodies.
//!
//! Templates use `{placeholder}` substitution:
//! - report: `{heading}`, `{rows}`
//! - issue: `{rows}`

use crate::pipeline::ReportRow;

const REPORT_TEMPLATE: &str = "{heading}## Summary

| Repository | Commit | Score | Score Delta | Report |
| --- | --- | --- | --- | --- |
{rows}";

const REPORT_HEADING: &str = "# OpenSSF Scorecard Report\n\n";

const ISSUE_TEMPLATE: &str = "Hello!

There are changes in your OpenSSF Scorecard report.

Please check the following changes:

| Repository | Previous Score | Score | Score Delta | Report |
| --- | --- | --- | --- | --- |
{rows}
_This issue was created automatically by scorecard-monitor._
";

/// Markdown renderer for row views.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    /// Omit the top-level heading; the report is embedded in another document
    pub embedded: bool,
}

impl MarkdownRenderer {
    pub fn new(embedded: bool) -> Self {
        Self { embedded }
    }

    /// Full report over every row.
    pub fn render_report(&self, rows: &[ReportRow]) -> String {
        let heading = if self.embedded { "" } else { REPORT_HEADING };
        let body: String = rows
            .iter()
            .map(|row| {
                format!(
                    "| {} | {} | {} | {} | [Details]({}) |\n",
                    repository_cell(row),
                    commit_cell(row),
                    score_cell(row),
                    format_delta(row.delta),
                    row.report_url
                )
            })
            .collect();

        let rendered = REPORT_TEMPLATE
            .replace("{heading}", heading)
            .replace("{rows}", &body);
        if self.embedded {
            format!("\n{rendered}")
        } else {
            rendered
        }
    }

    /// Issue body over the changed rows.
    pub fn render_issue(&self, rows: &[ReportRow]) -> String {
        let body: String = rows
            .iter()
            .map(|row| {
                format!(
                    "| {} | {} | {} | {} | [Details]({}) |\n",
                    repository_cell(row),
                    row.previous_score.map(format_score).unwrap_or_else(|| "-".into()),
                    score_cell(row),
                    format_delta(row.delta),
                    row.report_url
                )
            })
            .collect();

        ISSUE_TEMPLATE.replace("{rows}", &body)
    }
}

fn repository_cell(row: &ReportRow) -> String {
    let name = row.id.full_name();
    if row.id.platform.contains('.') {
        format!("[{name}](https://{}/{name})", row.id.platform)
    } else {
        name
    }
}

fn commit_cell(row: &ReportRow) -> String {
    match &row.commit {
        Some(commit) => format!("`{}`", commit.chars().take(7).collect::<String>()),
        None => "-".to_string(),
    }
}

fn score_cell(row: &ReportRow) -> String {
    match &row.badge_url {
        Some(badge) => format!("![{}]({badge})", format_score(row.score)),
        None => format_score(row.score),
    }
}

fn format_score(score: f64) -> String {
    format!("{score:.1}")
}

/// Signed one-decimal delta, `-` when there is nothing to compare against.
pub fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) if d > 0.0 => format!("+{d:.1}"),
        Some(d) if d < 0.0 => format!("{d:.1}"),
        Some(_) => "0.0".to_string(),
        None => "-".to_string(),
    }
}
