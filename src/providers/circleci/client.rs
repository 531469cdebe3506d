use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{CircleError, Result};

use super::types::{Build, BuildDetails, Project, TestResults};

const TOKEN_HEADER: &str = "circle-token";

/// Remote build service operations consumed by the build cache.
#[async_trait]
pub trait BuildApi: Send + Sync {
    /// Most recent build, restricted to `branch` when given.
    async fn latest_build(&self, project: &Project, branch: Option<&str>) -> Result<Option<Build>>;

    /// Most recent builds across all branches.
    async fn recent_builds(&self, project: &Project, limit: usize) -> Result<Vec<Build>>;

    async fn build_details(&self, project: &Project, build_num: u64) -> Result<BuildDetails>;

    async fn test_results(&self, project: &Project, build_num: u64) -> Result<TestResults>;

    /// Start a new build of `branch`.
    async fn trigger(&self, project: &Project, branch: &str) -> Result<()>;

    async fn cancel(&self, project: &Project, build_num: u64) -> Result<()>;
}

/// CircleCI v1.1 REST API client.
pub struct CircleClient {
    client: Client,
    api_url: Url,
    vcs_type: String,
}

impl CircleClient {
    /// Create a new CircleCI API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base URL (e.g., <https://circleci.com/api/v1.1/>)
    /// * `vcs_type` - VCS segment of project paths ("github")
    /// * `token` - CircleCI API token, sent with every request
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the token cannot be
    /// used as a header value.
    pub fn new(base_url: &str, vcs_type: &str, token: &Token) -> Result<Self> {
        let mut token_value = HeaderValue::from_str(token.as_str())
            .map_err(|e| CircleError::Config(format!("Invalid token: {e}")))?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(TOKEN_HEADER, token_value);

        let client = Client::builder()
            .user_agent(concat!("circle-status/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| CircleError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(base_url)
            .map_err(|e| CircleError::Config(format!("Invalid base URL: {e}")))?;

        if api_url.cannot_be_a_base() {
            return Err(CircleError::Config(format!("Invalid base URL: {base_url}")));
        }

        Ok(Self {
            client,
            api_url,
            vcs_type: vcs_type.to_string(),
        })
    }

    /// Construct `project/{vcs}/{owner}/{repo}/{extra..}`
    fn project_url(&self, project: &Project, extra: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("project")
                .push(&self.vcs_type)
                .push(&project.owner)
                .push(&project.name)
                .extend(extra);
        }
        url
    }

    fn builds_url(&self, project: &Project, branch: Option<&str>, limit: usize) -> Url {
        let mut url = match branch {
            Some(branch) => self.project_url(project, &["tree", branch]),
            None => self.project_url(project, &[]),
        };
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url.path());
        let response = self.client.get(url).send().await?;
        Self::parse_response(response).await
    }

    async fn post(&self, url: Url) -> Result<()> {
        debug!("POST {}", url.path());
        let response = self.client.post(url).send().await?;
        let _: serde_json::Value = Self::parse_response(response).await?;
        Ok(())
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(CircleError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl BuildApi for CircleClient {
    async fn latest_build(&self, project: &Project, branch: Option<&str>) -> Result<Option<Build>> {
        info!(
            "Fetching latest build for {}/{} (branch: {})",
            project.owner,
            project.name,
            branch.unwrap_or("any")
        );
        let builds: Vec<Build> = self.get_json(self.builds_url(project, branch, 1)).await?;
        Ok(builds.into_iter().next())
    }

    async fn recent_builds(&self, project: &Project, limit: usize) -> Result<Vec<Build>> {
        info!(
            "Fetching up to {limit} recent builds for {}/{}",
            project.owner, project.name
        );
        self.get_json(self.builds_url(project, None, limit)).await
    }

    async fn build_details(&self, project: &Project, build_num: u64) -> Result<BuildDetails> {
        let build_num = build_num.to_string();
        self.get_json(self.project_url(project, &[build_num.as_str()]))
            .await
    }

    async fn test_results(&self, project: &Project, build_num: u64) -> Result<TestResults> {
        let build_num = build_num.to_string();
        self.get_json(self.project_url(project, &[build_num.as_str(), "tests"]))
            .await
    }

    async fn trigger(&self, project: &Project, branch: &str) -> Result<()> {
        info!("Triggering build of {branch}");
        self.post(self.project_url(project, &["tree", branch])).await
    }

    async fn cancel(&self, project: &Project, build_num: u64) -> Result<()> {
        info!("Cancelling build #{build_num}");
        let build_num = build_num.to_string();
        self.post(self.project_url(project, &[build_num.as_str(), "cancel"]))
            .await
    }
}
