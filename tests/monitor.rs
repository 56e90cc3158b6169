//! End-to-end runs of the monitor against a temporary directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use scorecard_monitor::error::{AppError, Result};
use scorecard_monitor::models::{
    Config, Database, FetchFailure, RepositoryId, ScoreResult, ScoreSnapshot,
};
use scorecard_monitor::pipeline::{Services, run_monitor};
use scorecard_monitor::services::{
    IssueRef, IssueTracker, RepositoryDiscovery, ScoreFetcher, VersionControl,
};
use scorecard_monitor::storage::{LocalStorage, MonitorStorage};
use tempfile::TempDir;

/// Serves canned snapshots keyed by repository name.
#[derive(Default)]
struct FakeScorecard {
    scores: Mutex<HashMap<String, ScoreSnapshot>>,
}

impl FakeScorecard {
    fn set(&self, name: &str, score: f64, date: &str, commit: &str) {
        self.scores.lock().unwrap().insert(
            name.to_string(),
            ScoreSnapshot::new(score, date, Some(commit.to_string())),
        );
    }
}

#[async_trait]
impl ScoreFetcher for FakeScorecard {
    async fn fetch(&self, id: &RepositoryId) -> std::result::Result<ScoreResult, FetchFailure> {
        let snapshot = self.scores.lock().unwrap().get(&id.name).cloned();
        match snapshot {
            Some(snapshot) => Ok(ScoreResult {
                id: id.clone(),
                snapshot,
            }),
            None => Err(FetchFailure {
                id: id.clone(),
                message: "404 Not Found".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct FakeTracker {
    issues: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn create_issue(&self, title: &str, body: &str) -> Result<IssueRef> {
        let mut issues = self.issues.lock().unwrap();
        issues.push((title.to_string(), body.to_string()));
        Ok(IssueRef {
            number: issues.len() as u64,
            html_url: format!("https://github.com/acme/security/issues/{}", issues.len()),
        })
    }
}

/// Lists canned repositories per organization.
#[derive(Default)]
struct FakeDiscovery {
    orgs: HashMap<String, Vec<String>>,
}

#[async_trait]
impl RepositoryDiscovery for FakeDiscovery {
    async fn list_org_repositories(&self, org: &str) -> Result<Vec<RepositoryId>> {
        let names = self
            .orgs
            .get(org)
            .ok_or_else(|| AppError::github(format!("GET /orgs/{org}/repos returned 404")))?;
        Ok(names
            .iter()
            .map(|name| RepositoryId::new("github.com", org, name.as_str()))
            .collect())
    }
}

#[derive(Default)]
struct FakeGit {
    commits: Mutex<Vec<Vec<PathBuf>>>,
}

#[async_trait]
impl VersionControl for FakeGit {
    async fn commit(&self, paths: &[PathBuf]) -> Result<()> {
        self.commits.lock().unwrap().push(paths.to_vec());
        Ok(())
    }

    async fn push(&self) -> Result<()> {
        Ok(())
    }
}

struct Harness {
    tmp: TempDir,
    config: Config,
    scorecard: FakeScorecard,
    tracker: FakeTracker,
    discovery: FakeDiscovery,
    git: FakeGit,
}

impl Harness {
    fn new(repos: &[&str]) -> Self {
        let tmp = TempDir::new().unwrap();
        let scope: Vec<_> = repos
            .iter()
            .map(|name| serde_json::json!({"platform": "github.com", "org": "acme", "repo": name}))
            .collect();
        std::fs::write(
            tmp.path().join("scope.json"),
            serde_json::to_string(&scope).unwrap(),
        )
        .unwrap();

        let mut config = Config::default();
        config.github.token = Some("test-token".to_string());
        config.github.repository = Some("acme/security".to_string());
        config.issue.enabled = true;
        config.git.auto_commit = true;
        config.scorecard.max_request_in_parallel = 2;

        Self {
            tmp,
            config,
            scorecard: FakeScorecard::default(),
            tracker: FakeTracker::default(),
            discovery: FakeDiscovery::default(),
            git: FakeGit::default(),
        }
    }

    fn storage(&self) -> LocalStorage {
        LocalStorage::new(self.tmp.path(), self.config.paths.clone())
    }

    async fn run(&self) -> Result<scorecard_monitor::pipeline::RunSummary> {
        let services = Services {
            fetcher: &self.scorecard,
            discovery: Some(&self.discovery),
            issues: Some(&self.tracker),
            vcs: Some(&self.git),
        };
        run_monitor(&self.config, &self.storage(), &services).await
    }

    fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.tmp.path().join(name)).ok()
    }

    async fn database(&self) -> Database {
        self.storage().load_database().await.unwrap()
    }
}

fn id(name: &str) -> RepositoryId {
    RepositoryId::new("github.com", "acme", name)
}

#[tokio::test]
async fn first_run_records_scores_without_notifying() {
    let harness = Harness::new(&["widget", "gadget", "sprocket"]);
    harness.scorecard.set("widget", 7.2, "2024-01-01", "abc");
    harness.scorecard.set("gadget", 5.5, "2024-01-01", "def");
    harness.scorecard.set("sprocket", 9.1, "2024-01-01", "ghi");

    let summary = harness.run().await.unwrap();
    assert!(summary.database_changed);
    assert!(summary.committed);
    assert_eq!(summary.changed_repositories, 0);
    assert!(summary.issue.is_none());

    let db = harness.database().await;
    for name in ["widget", "gadget", "sprocket"] {
        let history = db.get(&id(name)).unwrap();
        assert!(history.current.is_some());
        assert!(history.previous.is_empty());
    }

    let report = harness.read("report.md").unwrap();
    let widget = report.find("acme/widget").unwrap();
    let gadget = report.find("acme/gadget").unwrap();
    let sprocket = report.find("acme/sprocket").unwrap();
    assert!(widget < gadget && gadget < sprocket);

    assert!(harness.tracker.issues.lock().unwrap().is_empty());
    assert_eq!(harness.git.commits.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unchanged_second_run_is_a_no_op() {
    let harness = Harness::new(&["widget"]);
    harness.scorecard.set("widget", 7.2, "2024-01-01", "abc");
    harness.run().await.unwrap();

    std::fs::write(harness.tmp.path().join("report.md"), "sentinel").unwrap();
    let database_before = harness.read("database.json").unwrap();

    let summary = harness.run().await.unwrap();
    assert!(!summary.database_changed);
    assert!(!summary.committed);
    assert_eq!(harness.read("report.md").unwrap(), "sentinel");
    assert_eq!(harness.read("database.json").unwrap(), database_before);
    assert_eq!(harness.git.commits.lock().unwrap().len(), 1);
    assert!(harness.tracker.issues.lock().unwrap().is_empty());
}

#[tokio::test]
async fn score_change_updates_history_and_creates_issue() {
    let harness = Harness::new(&["widget", "gadget"]);
    harness.scorecard.set("widget", 6.0, "2024-01-01", "aaa");
    harness.scorecard.set("gadget", 5.0, "2024-01-01", "ccc");
    harness.run().await.unwrap();

    harness.scorecard.set("widget", 7.2, "2024-02-01", "bbb");
    harness.scorecard.set("gadget", 5.0, "2024-02-01", "ddd");
    let summary = harness.run().await.unwrap();

    assert!(summary.database_changed);
    assert_eq!(summary.changed_repositories, 1);
    assert_eq!(summary.issue.as_ref().unwrap().number, 1);

    let db = harness.database().await;
    let widget = db.get(&id("widget")).unwrap();
    assert_eq!(widget.previous.len(), 1);
    assert_eq!(widget.previous[0].score, 6.0);
    assert_eq!(widget.current.as_ref().unwrap().score, 7.2);

    // Same score on a new date is still a new observation.
    let gadget = db.get(&id("gadget")).unwrap();
    assert_eq!(gadget.previous.len(), 1);
    assert_eq!(gadget.current.as_ref().unwrap().date, "2024-02-01");

    let issues = harness.tracker.issues.lock().unwrap();
    assert_eq!(issues.len(), 1);
    let (title, body) = &issues[0];
    assert_eq!(title, "OpenSSF Scorecard Report Updated!");
    assert!(body.contains("acme/widget"));
    assert!(body.contains("+1.2"));
    assert!(!body.contains("acme/gadget"));
    assert!(body.contains("compare/aaa/bbb"));
}

#[tokio::test]
async fn fetch_failure_aborts_without_persisting() {
    let harness = Harness::new(&["widget", "missing", "gadget"]);
    harness.scorecard.set("widget", 7.2, "2024-01-01", "abc");
    harness.scorecard.set("gadget", 5.5, "2024-01-01", "def");

    let err = harness.run().await.unwrap_err();
    match err {
        AppError::Fetch { repository, .. } => assert_eq!(repository, "github.com/acme/missing"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(harness.read("database.json").is_none());
    assert!(harness.read("report.md").is_none());
    assert!(harness.git.commits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn tag_mode_embeds_report_in_existing_document() {
    let mut harness = Harness::new(&["widget"]);
    harness.config.report.tags_enabled = true;
    harness.scorecard.set("widget", 7.2, "2024-01-01", "abc");

    let start = harness.config.report.start_tag.clone();
    let end = harness.config.report.end_tag.clone();
    std::fs::write(
        harness.tmp.path().join("report.md"),
        format!("# Security\n\nIntro.\n\n{start}\nold table\n{end}\n\nFooter.\n"),
    )
    .unwrap();

    harness.run().await.unwrap();

    let report = harness.read("report.md").unwrap();
    assert!(report.starts_with("# Security\n\nIntro.\n\n"));
    assert!(report.ends_with(&format!("{end}\n\nFooter.\n")));
    assert!(report.contains("acme/widget"));
    assert!(!report.contains("old table"));
    assert_eq!(report.matches(start.as_str()).count(), 1);
}

#[tokio::test]
async fn invalid_scope_is_a_configuration_error() {
    let harness = Harness::new(&["widget"]);
    std::fs::write(harness.tmp.path().join("scope.json"), r#"{"not": "a list"}"#).unwrap();

    let err = harness.run().await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(harness.read("database.json").is_none());
}

#[tokio::test]
async fn auto_scope_appends_discovered_repositories() {
    let mut harness = Harness::new(&["widget"]);
    harness.config.auto_scope.enabled = true;
    harness.config.auto_scope.orgs = vec!["acme".to_string(), "labs".to_string()];
    harness.discovery.orgs.insert(
        "acme".to_string(),
        vec!["gadget".to_string(), "widget".to_string(), ".github".to_string()],
    );
    harness
        .discovery
        .orgs
        .insert("labs".to_string(), vec!["toolkit".to_string()]);
    for name in ["widget", "gadget", ".github", "toolkit"] {
        harness.scorecard.set(name, 5.0, "2024-01-01", "abc");
    }

    let summary = harness.run().await.unwrap();
    assert_eq!(summary.repositories, 4);

    let db = harness.database().await;
    assert_eq!(db.len(), 4);
    assert!(db.get(&id(".github")).is_some());
    assert!(db.get(&RepositoryId::new("github.com", "labs", "toolkit")).is_some());

    let report = harness.read("report.md").unwrap();
    let positions: Vec<usize> = ["acme/widget", "acme/gadget", "acme/.github", "labs/toolkit"]
        .iter()
        .map(|name| report.find(name).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(report.matches("[acme/widget]").count(), 1);

    let scope = harness.read("scope.json").unwrap();
    assert!(!scope.contains("gadget"));
}

#[tokio::test]
async fn auto_scope_discovery_failure_aborts_run() {
    let mut harness = Harness::new(&["widget"]);
    harness.config.auto_scope.enabled = true;
    harness.config.auto_scope.orgs = vec!["unknown".to_string()];
    harness.scorecard.set("widget", 5.0, "2024-01-01", "abc");

    let err = harness.run().await.unwrap_err();
    assert!(matches!(err, AppError::GitHub(_)));
    assert!(harness.read("database.json").is_none());
}
