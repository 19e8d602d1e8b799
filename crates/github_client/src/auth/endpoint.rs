use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Method;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::session::{
    DeviceAuthorizationSession, PollOutcome, DEFAULT_EXPIRES_IN_SECS, DEFAULT_POLL_INTERVAL_SECS,
};
use crate::error::{GitHubError, Result};
use crate::token::AccessToken;
use crate::utils::send_for_text;

pub const DEVICE_CODE_PATH: &str = "/login/device/code";
pub const ACCESS_TOKEN_PATH: &str = "/login/oauth/access_token";
pub const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Device code response from GitHub
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: Option<String>,
    pub user_code: Option<String>,
    pub verification_uri: Option<String>,
    pub expires_in: Option<u64>,
    pub interval: Option<u64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl DeviceCodeResponse {
    /// Validates the response and opens a session issued at `issued_at`
    pub fn into_session(
        self,
        client_id: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<DeviceAuthorizationSession> {
        if let Some(error) = self.error {
            return Err(GitHubError::Protocol(describe_error(
                &error,
                self.error_description.as_deref(),
            )));
        }

        let device_code = non_empty(self.device_code)
            .ok_or_else(|| missing_field("device_code"))?;
        let user_code = non_empty(self.user_code).ok_or_else(|| missing_field("user_code"))?;
        let verification_uri =
            non_empty(self.verification_uri).ok_or_else(|| missing_field("verification_uri"))?;
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = i64::try_from(expires_in)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                GitHubError::Protocol(format!(
                    "Device code response has invalid expires_in {expires_in}"
                ))
            })?;

        Ok(DeviceAuthorizationSession {
            client_id: client_id.to_string(),
            device_code,
            user_code,
            verification_uri,
            poll_interval_seconds: self.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            expires_at,
            attempts: 0,
        })
    }
}

/// Access token response from GitHub
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AccessTokenResponse {
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Classifies the response. A body with neither a token nor an error
    /// code is a protocol violation.
    pub fn into_poll_outcome(self) -> Result<PollOutcome> {
        if let Some(token) = non_empty(self.access_token) {
            return Ok(PollOutcome::Authorized(AccessToken::new(token)));
        }

        match self.error.as_deref() {
            Some("authorization_pending") => Ok(PollOutcome::Pending),
            Some("slow_down") => Ok(PollOutcome::SlowDown),
            Some("access_denied") => Ok(PollOutcome::Denied),
            Some("expired_token") => Ok(PollOutcome::Expired),
            Some(other) => Ok(PollOutcome::OtherError(describe_error(
                other,
                self.error_description.as_deref(),
            ))),
            None => Err(GitHubError::Protocol(
                "Token response contains neither access_token nor error".to_string(),
            )),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn missing_field(field: &str) -> GitHubError {
    GitHubError::Protocol(format!("Device code response is missing {field}"))
}

fn describe_error(error: &str, description: Option<&str>) -> String {
    match description {
        Some(desc) if !desc.is_empty() => format!("{error} - {desc}"),
        _ => error.to_string(),
    }
}

/// The remote authorization server. One call per method invocation; the
/// device flow owns all scheduling.
#[async_trait]
pub trait OAuthEndpoint: Send + Sync {
    async fn request_device_code(&self, client_id: &str, scopes: &str)
        -> Result<DeviceCodeResponse>;

    async fn exchange_device_code(
        &self,
        client_id: &str,
        device_code: &str,
    ) -> Result<AccessTokenResponse>;
}

/// GitHub's OAuth endpoints over HTTP
#[derive(Debug, Clone)]
pub struct GitHubOAuthClient {
    client: Arc<ClientWithMiddleware>,
    login_base_url: String,
}

impl GitHubOAuthClient {
    pub fn new(client: Arc<ClientWithMiddleware>, login_base_url: impl Into<String>) -> Self {
        Self {
            client,
            login_base_url: login_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_form<T>(&self, path: &str, params: &[(&str, &str)], what: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.login_base_url, path);
        let request = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .form(params);

        let (status, body) = send_for_text(request, Method::POST, &url).await?;

        if !status.is_success() {
            return Err(GitHubError::Protocol(format!(
                "{what} failed: HTTP {status} - {body}"
            )));
        }

        serde_json::from_str::<T>(&body)
            .map_err(|e| GitHubError::Protocol(format!("Failed to parse {what} response: {e}")))
    }
}

#[async_trait]
impl OAuthEndpoint for GitHubOAuthClient {
    async fn request_device_code(
        &self,
        client_id: &str,
        scopes: &str,
    ) -> Result<DeviceCodeResponse> {
        let params = [("client_id", client_id), ("scope", scopes)];
        self.post_form(DEVICE_CODE_PATH, &params, "Device code request")
            .await
    }

    async fn exchange_device_code(
        &self,
        client_id: &str,
        device_code: &str,
    ) -> Result<AccessTokenResponse> {
        let params = [
            ("client_id", client_id),
            ("device_code", device_code),
            ("grant_type", DEVICE_GRANT_TYPE),
        ];
        self.post_form(ACCESS_TOKEN_PATH, &params, "Access token request")
            .await
    }
}
