use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{GitHubError, Result};
use crate::token::AccessToken;
use crate::utils::send_for_text;

pub const DEFAULT_REPO_DESCRIPTION: &str = "Repository created by chat-archiver";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Add conversation from chat-archiver";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoDescriptor {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub owner: Option<RepoOwner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentInfo {
    pub path: String,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDescriptor {
    pub content: ContentInfo,
    #[serde(default)]
    pub commit: Option<CommitInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    description: &'a str,
    private: bool,
}

#[derive(Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
}

/// Thin REST glue for publishing conversations. Every call is single-shot:
/// no retry and no idempotency, so repeating a call may create a duplicate
/// repository or overwrite a file.
#[derive(Debug, Clone)]
pub struct RepoPublisher {
    client: Arc<ClientWithMiddleware>,
    api_base_url: String,
    branch: String,
    private_repos: bool,
}

impl RepoPublisher {
    pub fn new(client: Arc<ClientWithMiddleware>, api_base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
            branch: chat_core::config::DEFAULT_BRANCH.to_string(),
            private_repos: false,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_private_repos(mut self, private_repos: bool) -> Self {
        self.private_repos = private_repos;
        self
    }

    /// `POST /user/repos`; success iff the response carries an `id`
    pub async fn create_repository(
        &self,
        token: &AccessToken,
        name: &str,
        description: Option<&str>,
    ) -> Result<RepoDescriptor> {
        let url = self.endpoint(&["user", "repos"])?;
        let body = CreateRepoRequest {
            name,
            description: description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(DEFAULT_REPO_DESCRIPTION),
            private: self.private_repos,
        };

        let request = self.authorized(Method::POST, &url, token).json(&body);
        let value = self
            .send(request, Method::POST, &url, "Failed to create repository")
            .await?;
        expect_field(value, "id", "Failed to create repository")
    }

    /// `PUT /repos/{owner}/{repo}/contents/{path}` with base64 content;
    /// success iff the response carries `content`
    pub async fn put_file(
        &self,
        token: &AccessToken,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        commit_message: Option<&str>,
    ) -> Result<CommitDescriptor> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(&segments)?;

        let body = PutContentRequest {
            message: commit_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_COMMIT_MESSAGE),
            content: STANDARD.encode(content.as_bytes()),
            branch: &self.branch,
        };

        let request = self.authorized(Method::PUT, &url, token).json(&body);
        let value = self
            .send(request, Method::PUT, &url, "Failed to commit to repository")
            .await?;
        expect_field(value, "content", "Failed to commit to repository")
    }

    /// `GET /user`; success iff the response carries `login`
    pub async fn get_authenticated_user(&self, token: &AccessToken) -> Result<GitHubUser> {
        let url = self.endpoint(&["user"])?;
        let request = self.authorized(Method::GET, &url, token);
        let value = self
            .send(request, Method::GET, &url, "Failed to get user info")
            .await?;
        expect_field(value, "login", "Failed to get user info")
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.api_base_url).map_err(|e| {
            GitHubError::ClientSetup(format!("invalid API base URL {}: {e}", self.api_base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                GitHubError::ClientSetup(format!(
                    "API base URL cannot be a base: {}",
                    self.api_base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    fn authorized(
        &self,
        method: Method,
        url: &str,
        token: &AccessToken,
    ) -> reqwest_middleware::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("token {}", token.as_str()))
            .header("Accept", GITHUB_ACCEPT)
    }

    async fn send(
        &self,
        request: reqwest_middleware::RequestBuilder,
        method: Method,
        url: &str,
        fallback: &str,
    ) -> Result<Value> {
        let (status, body) = send_for_text(request, method, url).await?;
        serde_json::from_str::<Value>(&body).map_err(|_| {
            log::error!("{} returned non-JSON body with status {}", url, status);
            GitHubError::RemoteApi(format!("{fallback} (HTTP {status})"))
        })
    }
}

/// Success is decided by the presence of `field`, not by the status code.
fn expect_field<T: DeserializeOwned>(value: Value, field: &str, fallback: &str) -> Result<T> {
    if value.get(field).map_or(true, Value::is_null) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string();
        return Err(GitHubError::RemoteApi(message));
    }

    serde_json::from_value(value)
        .map_err(|e| GitHubError::RemoteApi(format!("{fallback}: unexpected response ({e})")))
}
