use crate::config::SonarConfig;
use crate::error::FetchError;
use crate::retry::RetryPolicy;
use crate::types::{Finding, HotspotsResponse, IssuesResponse, RawIssue};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

const ISSUES_SEARCH_PATH: &str = "/api/issues/search";
const HOTSPOTS_SEARCH_PATH: &str = "/api/hotspots/search";

/// Source of findings to fix
pub trait FindingsSource {
    async fn fetch_issues(&self) -> Result<Vec<Finding>, FetchError>;
    async fn fetch_hotspots(&self) -> Result<Vec<Finding>, FetchError>;
}

/// Client for the SonarQube/SonarCloud web API
pub struct SonarClient {
    client: reqwest::Client,
    base_url: String,
    project_key: String,
    token: String,
    retry: RetryPolicy,
}

impl SonarClient {
    pub fn new(config: &SonarConfig, token: &str, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_key: config.project_key.clone(),
            token: token.to_string(),
            retry,
        }
    }

    fn request(&self, path: &str, key_param: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(&[(key_param, self.project_key.as_str())])
            .basic_auth(&self.token, None::<&str>)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        key_param: &str,
    ) -> Result<T, FetchError> {
        debug!("GET {}{} for {}", self.base_url, path, self.project_key);
        let response = self.request(path, key_param).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        trace!("Findings response: {}", text);
        Ok(serde_json::from_str(&text)?)
    }
}

impl FindingsSource for SonarClient {
    async fn fetch_issues(&self) -> Result<Vec<Finding>, FetchError> {
        let response: IssuesResponse = self
            .retry
            .run("Issues request", || {
                self.get_json(ISSUES_SEARCH_PATH, "componentKeys")
            })
            .await?;
        Ok(locate_all(select_issues(response.issues), Finding::from_issue))
    }

    async fn fetch_hotspots(&self) -> Result<Vec<Finding>, FetchError> {
        let response: HotspotsResponse = self
            .retry
            .run("Hotspots request", || {
                self.get_json(HOTSPOTS_SEARCH_PATH, "projectKey")
            })
            .await?;
        Ok(locate_all(response.hotspots, Finding::from_hotspot))
    }
}

/// Keep only issues that carry at least one flow
pub fn select_issues(issues: Vec<RawIssue>) -> Vec<RawIssue> {
    issues
        .into_iter()
        .filter(|issue| !issue.flows.is_empty())
        .collect()
}

fn locate_all<R, F>(raw: Vec<R>, locate: F) -> Vec<Finding>
where
    F: Fn(R) -> Result<Finding, crate::error::FixError>,
{
    raw.into_iter()
        .filter_map(|r| match locate(r) {
            Ok(finding) => Some(finding),
            Err(e) => {
                warn!("Skipping finding: {}", e);
                None
            }
        })
        .collect()
}
