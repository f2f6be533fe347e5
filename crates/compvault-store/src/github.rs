use std::time::Duration;

use async_trait::async_trait;
use compvault_core::{
    contents::{ContentsApi, PutFileRequest, RemoteFile},
    revision::{StoreLocation, DEFAULT_BRANCH, DEFAULT_PATH},
    Result, VaultError,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Response, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub repository holding the encrypted collection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub api_base: Option<String>,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

impl GitHubConfig {
    pub fn location(&self) -> StoreLocation {
        StoreLocation::new(&self.owner, &self.repo)
            .with_branch(&self.branch)
            .with_path(&self.path)
    }
}

/// `ContentsApi` over GitHub's REST contents endpoint.
pub struct GitHubContents {
    api_base: String,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl GitHubContents {
    pub fn new(cfg: &GitHubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VaultError::internal(format!("http client init failed: {e}")))?;
        Ok(Self {
            api_base: cfg
                .api_base
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            headers: headers(&cfg.token)?,
            client,
        })
    }

    fn url(&self, location: &StoreLocation) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            location.owner,
            location.repo,
            location.path.trim_start_matches('/')
        )
    }
}

fn headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("token {token}"))
        .map_err(|_| VaultError::validation("GitHub token contains invalid characters"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github.v3+json"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static("compvault"));
    Ok(headers)
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl ContentsApi for GitHubContents {
    fn name(&self) -> &'static str {
        "github"
    }

    #[instrument(skip_all, fields(owner = %location.owner, repo = %location.repo, path = %location.path))]
    async fn get_file(&self, location: &StoreLocation) -> Result<Option<RemoteFile>> {
        let resp = self
            .client
            .get(self.url(location))
            .headers(self.headers.clone())
            .query(&[("ref", location.branch.as_str())])
            .send()
            .await
            .map_err(network_err)?;

        let status = resp.status();
        debug!(status = status.as_u16(), "contents read");
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(VaultError::transport(
                Some(status.as_u16()),
                error_message(resp).await,
            ));
        }

        let body: ContentsResponse = resp.json().await.map_err(network_err)?;
        let content_base64 = body.content.ok_or_else(|| {
            VaultError::transport(
                Some(status.as_u16()),
                "response carried no inline content",
            )
        })?;
        Ok(Some(RemoteFile {
            content_base64,
            sha: body.sha,
        }))
    }

    #[instrument(skip_all, fields(owner = %location.owner, repo = %location.repo, path = %location.path, create = request.sha.is_none()))]
    async fn put_file(&self, location: &StoreLocation, request: PutFileRequest) -> Result<String> {
        let mut body = json!({
            "message": request.message,
            "content": request.content_base64,
            "branch": location.branch,
        });
        if let Some(sha) = &request.sha {
            body["sha"] = json!(sha);
        }

        let resp = self
            .client
            .put(self.url(location))
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(network_err)?;

        let status = resp.status();
        debug!(status = status.as_u16(), "contents write");
        if !status.is_success() {
            let message = error_message(resp).await;
            return Err(match status {
                StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                    VaultError::conflict(message)
                }
                // The file exists but we believed it absent.
                StatusCode::UNPROCESSABLE_ENTITY if request.sha.is_none() => {
                    VaultError::conflict(message)
                }
                _ => VaultError::transport(Some(status.as_u16()), message),
            });
        }

        let body: PutResponse = resp.json().await.map_err(network_err)?;
        Ok(body.content.sha)
    }
}

fn network_err(err: reqwest::Error) -> VaultError {
    VaultError::transport(err.status().map(|s| s.as_u16()), err.to_string())
}

/// Provider's `message` field when the body is GitHub's error JSON, else the raw text.
async fn error_message(resp: Response) -> String {
    let status = resp.status();
    match resp.text().await {
        Ok(text) => match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.message,
            Err(_) if !text.trim().is_empty() => text,
            Err(_) => format!("GitHub API error: {}", status.as_u16()),
        },
        Err(_) => format!("GitHub API error: {}", status.as_u16()),
    }
}
