// src/services/github.rs

//! GitHub API client for issue creation and organization discovery.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Config, RepositoryId};
use crate::utils::join_segments;

/// Platform discovered repositories are recorded under.
pub const GITHUB_PLATFORM: &str = "github.com";

const PAGE_SIZE: usize = 100;

/// A created issue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub html_url: String,
}

/// Destination for change notifications.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn create_issue(&self, title: &str, body: &str) -> Result<IssueRef>;
}

/// Source of repositories for organization-wide scope.
#[async_trait]
pub trait RepositoryDiscovery: Send + Sync {
    async fn list_org_repositories(&self, org: &str) -> Result<Vec<RepositoryId>>;
}

#[derive(Debug, Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct OrgRepository {
    name: String,
    #[serde(default)]
    archived: bool,
}

/// GitHub REST API client.
pub struct GithubClient {
    client: Client,
    api_base_url: String,
    repository: Option<String>,
    include_archived: bool,
}

impl GithubClient {
    pub fn new(config: &Config, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| AppError::config("GitHub token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(&config.scorecard.user_agent)
            .timeout(Duration::from_secs(config.scorecard.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_base_url: config.github.api_base_url.clone(),
            repository: config.github.repository.clone(),
            include_archived: config.auto_scope.include_archived,
        })
    }

    fn issues_url(&self) -> Result<url::Url> {
        let repository = self
            .repository
            .as_deref()
            .ok_or_else(|| AppError::config("github.repository is not configured"))?;
        let (owner, name) = split_repository(repository)?;
        join_segments(&self.api_base_url, &["repos", owner, name, "issues"])
    }

    fn org_repos_url(&self, org: &str, page: usize) -> Result<url::Url> {
        let mut url = join_segments(&self.api_base_url, &["orgs", org, "repos"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &PAGE_SIZE.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    async fn get_checked(&self, url: url::Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::github(format!("GET {url} returned {status}: {body}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn create_issue(&self, title: &str, body: &str) -> Result<IssueRef> {
        let url = self.issues_url()?;
        let payload = serde_json::to_vec(&NewIssue { title, body })?;

        let response = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AppError::github(format!("POST {url} returned {status}: {text}")));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl RepositoryDiscovery for GithubClient {
    async fn list_org_repositories(&self, org: &str) -> Result<Vec<RepositoryId>> {
        let listed = collect_pages(|page| async move {
            let body = self.get_checked(self.org_repos_url(org, page)?).await?;
            Ok::<_, AppError>(serde_json::from_str::<Vec<OrgRepository>>(&body)?)
        })
        .await?;

        let repositories: Vec<RepositoryId> = listed
            .into_iter()
            .filter(|r| self.include_archived || !r.archived)
            .map(|r| RepositoryId::new(GITHUB_PLATFORM, org, r.name))
            .collect();

        log::debug!("Discovered {} repositories in {}", repositories.len(), org);
        Ok(repositories)
    }
}

/// Request pages starting at 1 until one comes back short of [`PAGE_SIZE`].
async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let batch = fetch_page(page).await?;
        let fetched = batch.len();
        items.extend(batch);

        if fetched < PAGE_SIZE {
            break;
        }
        page += 1;
    }
    Ok(items)
}

/// Split `owner/name` into its parts.
pub fn split_repository(repository: &str) -> Result<(&str, &str)> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(AppError::config(format!(
            "repository '{repository}' must be in owner/name form"
        ))),
    }
}
